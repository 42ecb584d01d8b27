use dioxus::prelude::*;

use crate::components::ChatDisplay;
use crate::routes::Route;

#[component]
pub fn CommonsChat(commons_id: i64) -> Element {
    rsx! {
        section {
            class: "max-w-2xl mx-auto py-6 space-y-4",
            div {
                class: "px-4 flex items-center justify-between",
                h2 {
                    class: "text-xl font-bold",
                    "Commons {commons_id} chat"
                }
                nav {
                    class: "flex gap-3 text-sm",
                    if commons_id > 1 {
                        Link {
                            to: Route::CommonsChat { commons_id: commons_id - 1 },
                            class: "hover:underline",
                            "← Previous commons"
                        }
                    }
                    Link {
                        to: Route::CommonsChat { commons_id: commons_id + 1 },
                        class: "hover:underline",
                        "Next commons →"
                    }
                }
            }
            ChatDisplay { commons_id }
        }
    }
}
