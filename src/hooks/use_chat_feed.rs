//! use_chat_feed hook - live, paginated chat feed for one commons
//!
//! Owns a [`FeedAccumulator`] and an [`IdentityIndex`] and keeps them fed:
//! - page 0 and the identity list are polled every refresh interval
//! - the deepest loaded page is repolled alongside while paginating
//! - `load_more` fetches the next older page immediately
//!
//! Changing `commons_id` starts a new session: state is cleared, the old
//! polling task is cancelled and responses still in flight are discarded.

use dioxus::core::Task;
use dioxus::prelude::*;

use crate::services::chat_api::ChatApi;
use crate::services::feed_sync;
use crate::stores::feed_accumulator::FeedAccumulator;
use crate::stores::settings_store::FEED_SETTINGS;
use crate::utils::identity_index::IdentityIndex;
use crate::utils::ordered_view::{snapshot, FeedRow};

/// Return type for the use_chat_feed hook
#[derive(Clone, Copy)]
pub struct UseChatFeed {
    /// Messages joined with usernames, newest first
    pub rows: Memo<Vec<FeedRow>>,
    /// Whether older pages may still exist
    pub can_load_more: Memo<bool>,
    /// Whether a requested older page has not arrived yet
    pub loading_more: Memo<bool>,
    /// Request the next older page
    pub load_more: Callback<()>,
}

/// Hook driving the chat feed for `commons_id`
///
/// # Example
/// ```rust
/// let feed = use_chat_feed(commons_id);
///
/// for row in feed.rows.read().iter() {
///     ChatMessageDisplay { key: "{row.message.id}", row: row.clone() }
/// }
/// if *feed.can_load_more.read() {
///     button { onclick: move |_| feed.load_more.call(()), "More messages" }
/// }
/// ```
pub fn use_chat_feed(commons_id: i64) -> UseChatFeed {
    let mut feed = use_signal(|| FeedAccumulator::new(FEED_SETTINGS.peek().page_size));
    let mut identities = use_signal(IdentityIndex::default);
    let mut poll_task = use_signal(|| None::<Task>);

    use_effect(use_reactive(&commons_id, move |commons_id| {
        // Cancel the previous session's polling loop
        if let Some(task) = poll_task.peek().as_ref() {
            task.cancel();
        }

        if feed.write().reset_for_session(commons_id) {
            identities.set(IdentityIndex::default());
        }

        let settings = FEED_SETTINGS.peek().clone();
        let api = ChatApi::new(settings.api_base.clone());

        let new_task = spawn(async move {
            loop {
                // Tagging through peek keeps the row memos quiet until a page lands
                let (live, history) = {
                    let feed = feed.peek();
                    (feed.live_request(), feed.history_request())
                };

                let tick = feed_sync::poll_tick(&api, commons_id, live, history).await;

                for fetch in [tick.live, tick.history].into_iter().flatten() {
                    feed.write().on_fetched(fetch);
                }
                if let Some(index) = tick.identities {
                    // Identity polls are not generation-tagged; check the session instead
                    if feed.peek().commons_id() == Some(commons_id) && *identities.peek() != index {
                        identities.set(index);
                    }
                }

                gloo_timers::future::TimeoutFuture::new(settings.refresh_interval_ms).await;
            }
        });

        poll_task.set(Some(new_task));
    }));

    // Stop polling on unmount
    use_drop(move || {
        if let Some(task) = poll_task.peek().as_ref() {
            task.cancel();
        }
    });

    let load_more = use_callback(move |()| {
        let Some(request) = feed.write().request_more() else {
            return;
        };

        let api = ChatApi::new(FEED_SETTINGS.peek().api_base.clone());
        spawn(async move {
            let fetch = feed_sync::fetch_arrival(&api, request).await;
            feed.write().on_fetched(fetch);
        });
    });

    let rows = use_memo(move || snapshot(&feed.read(), &identities.read()));
    let can_load_more = use_memo(move || feed.read().can_load_more());
    let loading_more = use_memo(move || feed.read().is_loading_more());

    UseChatFeed {
        rows,
        can_load_more,
        loading_more,
        load_more,
    }
}
