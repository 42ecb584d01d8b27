use dioxus::prelude::*;

pub mod home;
pub mod commons_chat;

use home::Home;
use commons_chat::CommonsChat;

/// App routes
#[derive(Clone, Routable, Debug, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/")]
        Home {},

        #[route("/commons/:commons_id")]
        CommonsChat { commons_id: i64 },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div {
            class: "min-h-screen bg-background transition-colors",
            header {
                class: "sticky top-0 z-20 bg-background/80 backdrop-blur-sm border-b border-border",
                div {
                    class: "max-w-2xl mx-auto px-4 py-3 flex items-center justify-between",
                    Link {
                        to: Route::Home {},
                        class: "text-lg font-bold",
                        "Commons Chat"
                    }
                }
            }
            main {
                Outlet::<Route> {}
            }
        }
    }
}
