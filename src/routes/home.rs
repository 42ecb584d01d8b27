use dioxus::prelude::*;

use crate::components::ChatDisplay;
use crate::stores::settings_store::FEED_SETTINGS;

#[component]
pub fn Home() -> Element {
    let commons_id = FEED_SETTINGS.read().default_commons_id;

    rsx! {
        section {
            class: "max-w-2xl mx-auto py-6 space-y-4",
            h2 {
                class: "px-4 text-xl font-bold",
                "Commons {commons_id} chat"
            }
            ChatDisplay { commons_id }
        }
    }
}
