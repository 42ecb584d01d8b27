//! Fetch side of the chat feed polling loop
//!
//! Turns tagged [`PageRequest`]s into [`PageFetch`] outcomes and identity
//! polls into fresh [`IdentityIndex`]es. Transport failures are logged; a
//! failed page comes back as [`PageFetch::Failed`] for the accumulator to
//! judge, a failed identity poll as `None`.

use crate::services::chat_api::ChatBackend;
use crate::stores::feed_accumulator::{PageArrival, PageFetch, PageRequest};
use crate::utils::identity_index::IdentityIndex;

/// Everything fetched during one polling tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollTick {
    pub live: Option<PageFetch>,
    pub history: Option<PageFetch>,
    pub identities: Option<IdentityIndex>,
}

/// Fetch the page for `request`
pub async fn fetch_arrival<B: ChatBackend + ?Sized>(backend: &B, request: PageRequest) -> PageFetch {
    match backend
        .fetch_page(request.commons_id, request.page_index, request.page_size)
        .await
    {
        Ok(page) => PageFetch::Arrived(PageArrival { request, page }),
        Err(e) => {
            log::warn!(
                "Failed to fetch chat page {} for commons {}: {}",
                request.page_index,
                request.commons_id,
                e
            );
            PageFetch::Failed(request)
        }
    }
}

/// Fetch and index the identity reference set for `commons_id`
pub async fn fetch_identities<B: ChatBackend + ?Sized>(backend: &B, commons_id: i64) -> Option<IdentityIndex> {
    match backend.fetch_identities(commons_id).await {
        Ok(entries) => Some(IdentityIndex::from_entries(entries)),
        Err(e) => {
            log::warn!("Failed to fetch user commons for commons {}: {}", commons_id, e);
            None
        }
    }
}

/// Run one polling tick: the live page, the history page when paginating,
/// and the identity set, all concurrently
pub async fn poll_tick<B: ChatBackend + ?Sized>(
    backend: &B,
    commons_id: i64,
    live: Option<PageRequest>,
    history: Option<PageRequest>,
) -> PollTick {
    let (live, history, identities) = tokio::join!(
        fetch_optional(backend, live),
        fetch_optional(backend, history),
        fetch_identities(backend, commons_id)
    );

    PollTick {
        live,
        history,
        identities,
    }
}

async fn fetch_optional<B: ChatBackend + ?Sized>(backend: &B, request: Option<PageRequest>) -> Option<PageFetch> {
    match request {
        Some(request) => Some(fetch_arrival(backend, request).await),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chat_api::{decode_identities, decode_page, FetchError, FetchResult, Page};
    use crate::stores::feed_accumulator::FeedAccumulator;
    use crate::utils::identity_index::{IdentityEntry, ANONYMOUS};
    use crate::utils::ordered_view::{snapshot, FeedRow};
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Backend serving canned response bodies
    #[derive(Default)]
    struct MockBackend {
        pages: HashMap<(i64, u32), String>,
        identities: HashMap<i64, String>,
        calls: RefCell<Vec<(i64, u32, u32)>>,
    }

    impl MockBackend {
        fn page(mut self, commons_id: i64, page_index: u32, body: impl Into<String>) -> Self {
            self.pages.insert((commons_id, page_index), body.into());
            self
        }

        fn users(mut self, commons_id: i64, body: impl Into<String>) -> Self {
            self.identities.insert(commons_id, body.into());
            self
        }
    }

    #[async_trait(?Send)]
    impl ChatBackend for MockBackend {
        async fn fetch_page(&self, commons_id: i64, page_index: u32, page_size: u32) -> FetchResult<Page> {
            self.calls.borrow_mut().push((commons_id, page_index, page_size));
            self.pages
                .get(&(commons_id, page_index))
                .map(|body| decode_page(body))
                .ok_or_else(|| FetchError::Status { status: 404, status_text: "Not Found".to_string() })
        }

        async fn fetch_identities(&self, commons_id: i64) -> FetchResult<Vec<IdentityEntry>> {
            self.identities
                .get(&commons_id)
                .map(|body| decode_identities(body))
                .ok_or_else(|| FetchError::Request("connection refused".to_string()))
        }
    }

    fn messages_json(ids: impl IntoIterator<Item = i64>) -> String {
        let items: Vec<String> = ids
            .into_iter()
            .map(|id| {
                format!(
                    r#"{{"id": {id}, "userId": {user}, "message": "message {id}", "timestamp": "2023-08-18T02:59:{sec:02}.000+00:00"}}"#,
                    id = id,
                    user = (id - 1) % 10 + 1,
                    sec = id
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    fn page_json(ids: impl IntoIterator<Item = i64>, last: bool) -> String {
        format!(r#"{{"content": {}, "last": {}}}"#, messages_json(ids), last)
    }

    fn ten_users_json() -> String {
        let users: Vec<String> = (1..=10)
            .map(|id| format!(r#"{{"id": {id}, "commonsId": 1, "userId": {id}, "username": "User {id}"}}"#, id = id))
            .collect();
        format!("[{}]", users.join(","))
    }

    /// Drives an accumulator and identity index the way the polling hook does
    struct Harness {
        feed: FeedAccumulator,
        identities: IdentityIndex,
    }

    impl Harness {
        fn new(commons_id: i64) -> Self {
            let mut feed = FeedAccumulator::new(10);
            feed.reset_for_session(commons_id);
            Self {
                feed,
                identities: IdentityIndex::default(),
            }
        }

        fn tick(&mut self, backend: &MockBackend) {
            let commons_id = self.feed.commons_id().unwrap();
            let live = self.feed.live_request();
            let history = self.feed.history_request();
            let tick = block_on(poll_tick(backend, commons_id, live, history));

            for fetch in [tick.live, tick.history].into_iter().flatten() {
                self.feed.on_fetched(fetch);
            }
            if let Some(identities) = tick.identities {
                self.identities = identities;
            }
        }

        fn load_more(&mut self, backend: &MockBackend) {
            if let Some(request) = self.feed.request_more() {
                self.feed.on_fetched(block_on(fetch_arrival(backend, request)));
            }
        }

        fn rows(&self) -> Vec<FeedRow> {
            snapshot(&self.feed, &self.identities)
        }

        fn ids(&self) -> Vec<i64> {
            self.rows().iter().map(|row| row.message.id).collect()
        }
    }

    #[test]
    fn test_three_messages_with_usernames() {
        let backend = MockBackend::default()
            .page(1, 0, page_json(1..=3, true))
            .users(
                1,
                r#"[{"userId": 1, "username": "George Washington"},
                    {"userId": 2, "username": "Thomas Jefferson"},
                    {"userId": 3, "username": "John Adams"}]"#,
            );

        let mut harness = Harness::new(1);
        harness.tick(&backend);

        let rows = harness.rows();
        assert_eq!(harness.ids(), vec![3, 2, 1]);
        assert_eq!(rows[0].username, "John Adams");
        assert_eq!(rows[1].username, "Thomas Jefferson");
        assert_eq!(rows[2].username, "George Washington");
        assert_eq!(rows[2].message.text, "message 1");
        assert!(!harness.feed.can_load_more());
    }

    #[test]
    fn test_load_more_appends_older_page() {
        let backend = MockBackend::default()
            .page(1, 0, page_json((3..=12).rev(), false))
            .page(1, 1, page_json((1..=2).rev(), true))
            .users(1, ten_users_json());

        let mut harness = Harness::new(1);
        harness.tick(&backend);
        assert_eq!(harness.ids(), (3..=12).rev().collect::<Vec<i64>>());
        assert!(harness.feed.can_load_more());

        harness.load_more(&backend);
        assert_eq!(harness.ids(), (1..=12).rev().collect::<Vec<i64>>());
        assert!(!harness.feed.can_load_more());
        assert!(backend.calls.borrow().contains(&(1, 1, 10)));

        // Polling continues on both slots without duplicating rows
        harness.tick(&backend);
        harness.tick(&backend);
        assert_eq!(harness.ids(), (1..=12).rev().collect::<Vec<i64>>());

        for row in harness.rows() {
            let expected = format!("User {}", (row.message.id - 1) % 10 + 1);
            assert_eq!(row.username, expected);
        }
    }

    #[test]
    fn test_user_without_username_is_anonymous() {
        let backend = MockBackend::default()
            .page(
                1,
                0,
                r#"{"content": [{"id": 999, "userId": 123, "message": "Hi", "timestamp": "2023-01-01"}], "last": true}"#,
            )
            .users(1, r#"[{"userId": 123}]"#);

        let mut harness = Harness::new(1);
        harness.tick(&backend);

        let rows = harness.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, ANONYMOUS);
    }

    #[test]
    fn test_absent_body_yields_empty_feed() {
        let backend = MockBackend::default().page(1, 0, "").users(1, "[]");

        let mut harness = Harness::new(1);
        harness.tick(&backend);

        assert!(harness.rows().is_empty());
        assert!(!harness.feed.can_load_more());
    }

    #[test]
    fn test_null_body_yields_empty_feed() {
        let backend = MockBackend::default().page(1, 0, "null").users(1, "null");

        let mut harness = Harness::new(1);
        harness.tick(&backend);

        assert!(harness.rows().is_empty());
        assert!(harness.identities.is_empty());
        assert!(!harness.feed.can_load_more());
    }

    #[test]
    fn test_transport_failure_keeps_last_state() {
        let good = MockBackend::default()
            .page(1, 0, page_json(1..=3, false))
            .users(1, ten_users_json());
        let down = MockBackend::default();

        let mut harness = Harness::new(1);
        harness.tick(&good);
        harness.tick(&down);

        assert_eq!(harness.ids(), vec![3, 2, 1]);
        assert_eq!(harness.identities.len(), 10);
        assert!(harness.feed.can_load_more());
    }

    #[test]
    fn test_failed_initial_load_shows_end_of_feed() {
        let down = MockBackend::default();

        let mut harness = Harness::new(1);
        harness.tick(&down);

        assert!(harness.rows().is_empty());
        assert!(!harness.feed.can_load_more());
        assert!(harness.feed.request_more().is_none());

        // Still failing: nothing changes
        harness.tick(&down);
        assert!(harness.rows().is_empty());
        assert!(!harness.feed.can_load_more());

        // Backend comes back: the live page takes over
        let good = MockBackend::default()
            .page(1, 0, page_json((3..=12).rev(), false))
            .users(1, ten_users_json());
        harness.tick(&good);
        assert_eq!(harness.ids(), (3..=12).rev().collect::<Vec<i64>>());
        assert!(harness.feed.can_load_more());
    }

    #[test]
    fn test_failed_load_more_is_retried_by_polling() {
        let backend = MockBackend::default()
            .page(1, 0, page_json(3..=4, false))
            .users(1, "[]");

        let mut harness = Harness::new(1);
        harness.tick(&backend);
        harness.load_more(&backend);
        assert!(harness.feed.is_loading_more());
        assert_eq!(harness.ids(), vec![4, 3]);

        let backend = backend.page(1, 1, page_json(1..=2, true));
        harness.tick(&backend);
        assert!(!harness.feed.is_loading_more());
        assert_eq!(harness.ids(), vec![4, 3, 2, 1]);
        assert!(!harness.feed.can_load_more());
    }

    #[test]
    fn test_poll_tick_skips_history_before_paginating() {
        let backend = MockBackend::default().page(1, 0, page_json(1..=2, true)).users(1, "[]");

        let mut harness = Harness::new(1);
        harness.tick(&backend);

        assert_eq!(*backend.calls.borrow(), vec![(1, 0, 10)]);
    }
}
