use dioxus::prelude::*;

use crate::utils::ordered_view::FeedRow;
use crate::utils::time::format_timestamp;

/// One chat message with its resolved author name
#[component]
pub fn ChatMessageDisplay(row: FeedRow) -> Element {
    let id = row.message.id;
    let date = format_timestamp(&row.message.timestamp);
    let initial = row.username.chars().next().unwrap_or('?').to_uppercase().to_string();

    rsx! {
        div {
            class: "flex gap-3 py-2",
            "data-testid": "ChatMessageDisplay-{id}",
            div {
                class: "w-8 h-8 flex-shrink-0 rounded-full bg-blue-600 flex items-center justify-center text-white text-xs font-bold",
                "{initial}"
            }
            div {
                class: "flex-1 min-w-0",
                div {
                    class: "flex items-baseline gap-2",
                    span {
                        class: "font-semibold text-sm truncate",
                        "data-testid": "ChatMessageDisplay-{id}-User",
                        "{row.username}"
                    }
                    span {
                        class: "text-xs text-muted-foreground",
                        "data-testid": "ChatMessageDisplay-{id}-Date",
                        "{date}"
                    }
                }
                p {
                    class: "text-sm whitespace-pre-wrap break-words mt-1",
                    "data-testid": "ChatMessageDisplay-{id}-Message",
                    "{row.message.text}"
                }
            }
        }
    }
}
