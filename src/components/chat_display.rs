use dioxus::prelude::*;

use crate::components::ChatMessageDisplay;
use crate::hooks::use_chat_feed;

/// Scrollable chat feed for a commons, newest message at the bottom.
///
/// Older pages are loaded with the "More messages" control, which turns
/// into an end-of-feed marker once the backend reports the last page.
#[component]
pub fn ChatDisplay(commons_id: i64) -> Element {
    let feed = use_chat_feed(commons_id);
    let load_more = feed.load_more;
    let rows = feed.rows.read();
    let loading_more = *feed.loading_more.read();

    rsx! {
        div {
            class: "px-4",
            style: "display: flex; flex-direction: column-reverse; overflow-y: scroll; max-height: 300px;",
            "data-testid": "ChatDisplay",

            for row in rows.iter() {
                ChatMessageDisplay {
                    key: "{row.message.id}",
                    row: row.clone()
                }
            }

            if *feed.can_load_more.read() {
                button {
                    class: "px-3 py-1 text-sm rounded-lg border border-border hover:bg-accent disabled:opacity-50",
                    style: "margin-top: 8px;",
                    "data-testid": "ChatDisplay-More",
                    disabled: loading_more,
                    onclick: move |_| load_more.call(()),
                    if loading_more {
                        "Loading..."
                    } else {
                        "More messages"
                    }
                }
            } else {
                div {
                    class: "text-sm text-muted-foreground",
                    style: "text-align: center; opacity: 0.7; margin-top: 4px;",
                    "data-testid": "ChatDisplay-End",
                    "No more messages"
                }
            }
        }
    }
}
