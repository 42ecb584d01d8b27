//! Chat feed reconciler
//!
//! Owns the pagination cursor, the deduplicated set of messages received so
//! far and the exhaustion flag, and folds every page response into them.
//!
//! Two fetch slots feed the accumulator:
//! - the live slot (page 0), repolled for the whole session and treated as
//!   the authoritative snapshot of the newest window
//! - the history slot (the deepest requested page), fetched on
//!   [`FeedAccumulator::request_more`] and repolled while paginating
//!
//! Every request is tagged with the generation current at dispatch time.
//! The generation moves on each session reset and each `request_more`, and
//! responses carrying an older generation are discarded on arrival.

use std::cell::Cell;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::services::chat_api::{ChatMessage, Page};

/// Which fetch slot a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSlot {
    /// Page 0, the live window
    Live,
    /// A deeper page loaded on demand
    History,
}

/// Position of the deepest requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub page_index: u32,
    pub page_size: u32,
}

/// A page fetch tagged with the state it was dispatched under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub commons_id: i64,
    pub page_index: u32,
    pub page_size: u32,
    pub generation: u64,
    pub seq: u64,
}

impl PageRequest {
    pub fn slot(&self) -> FetchSlot {
        if self.page_index == 0 {
            FetchSlot::Live
        } else {
            FetchSlot::History
        }
    }
}

/// A page response paired with the request that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct PageArrival {
    pub request: PageRequest,
    pub page: Page,
}

/// Outcome of dispatching one [`PageRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch {
    Arrived(PageArrival),
    /// The transport failed; no page was received
    Failed(PageRequest),
}

/// Result of folding one arrival into the accumulator
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The page was merged
    Applied { added: usize, removed: usize },
    /// The response no longer matches the current state and was ignored
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
struct Stored {
    message: ChatMessage,
    source: FetchSlot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedAccumulator {
    commons_id: Option<i64>,
    cursor: Cursor,
    generation: u64,
    next_seq: Cell<u64>,
    last_live_seq: Option<u64>,
    history_pending: bool,
    accumulated: HashMap<i64, Stored>,
    exhausted: bool,
}

impl FeedAccumulator {
    pub fn new(page_size: u32) -> Self {
        Self {
            commons_id: None,
            cursor: Cursor {
                page_index: 0,
                page_size: page_size.max(1),
            },
            generation: 0,
            next_seq: Cell::new(0),
            last_live_seq: None,
            history_pending: false,
            accumulated: HashMap::new(),
            exhausted: false,
        }
    }

    pub fn commons_id(&self) -> Option<i64> {
        self.commons_id
    }

    #[allow(dead_code)]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[allow(dead_code)]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether the renderer should offer "load more"
    pub fn can_load_more(&self) -> bool {
        !self.exhausted
    }

    /// Whether the deepest requested page is still on its way
    pub fn is_loading_more(&self) -> bool {
        self.history_pending
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    #[allow(dead_code)]
    pub fn contains(&self, id: i64) -> bool {
        self.accumulated.contains_key(&id)
    }

    /// Slot that currently owns message `id`
    #[allow(dead_code)]
    pub fn source_of(&self, id: i64) -> Option<FetchSlot> {
        self.accumulated.get(&id).map(|stored| stored.source)
    }

    /// Accumulated messages in no particular order
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.accumulated.values().map(|stored| &stored.message)
    }

    /// Start a session for `commons_id`.
    ///
    /// Returns `false` and keeps everything when the session is already for
    /// that commons. Otherwise clears all state and invalidates in-flight
    /// responses from the previous session.
    pub fn reset_for_session(&mut self, commons_id: i64) -> bool {
        if self.commons_id == Some(commons_id) {
            return false;
        }

        log::info!("Starting chat feed session for commons {}", commons_id);
        self.commons_id = Some(commons_id);
        self.cursor.page_index = 0;
        self.generation += 1;
        self.last_live_seq = None;
        self.history_pending = false;
        self.accumulated.clear();
        self.exhausted = false;
        true
    }

    /// Request for the next poll of page 0
    pub fn live_request(&self) -> Option<PageRequest> {
        self.tag_request(0)
    }

    /// Request for the next poll of the deepest page, if paginating
    pub fn history_request(&self) -> Option<PageRequest> {
        if self.cursor.page_index == 0 {
            return None;
        }
        self.tag_request(self.cursor.page_index)
    }

    /// Advance the cursor by one page.
    ///
    /// No-op when the feed is exhausted, when the previously requested page
    /// has not arrived yet, or before a session has started. Otherwise
    /// returns the request for the new page, which the caller dispatches.
    pub fn request_more(&mut self) -> Option<PageRequest> {
        if self.exhausted {
            log::debug!("Chat feed exhausted, ignoring load more");
            return None;
        }
        if self.history_pending {
            log::debug!("Page {} still loading, ignoring load more", self.cursor.page_index);
            return None;
        }
        if self.commons_id.is_none() {
            return None;
        }

        self.cursor.page_index += 1;
        self.generation += 1;
        self.history_pending = true;
        log::info!("Loading older chat messages (page {})", self.cursor.page_index);
        self.tag_request(self.cursor.page_index)
    }

    /// Fold a page response into the accumulated set.
    ///
    /// Page 0 replaces the live window; deeper pages are unioned by id with
    /// first-seen winning. Responses from a previous session or generation,
    /// live responses older than one already applied, and history responses
    /// for a page other than the cursor's are discarded.
    pub fn on_page_arrived(&mut self, arrival: PageArrival) -> MergeOutcome {
        let PageArrival { request, page } = arrival;

        if self.commons_id != Some(request.commons_id) || request.generation != self.generation {
            log::debug!(
                "Discarding stale chat page {} (generation {}, current {})",
                request.page_index,
                request.generation,
                self.generation
            );
            return MergeOutcome::Discarded;
        }

        match request.slot() {
            FetchSlot::Live => {
                if self.last_live_seq.is_some_and(|last| request.seq <= last) {
                    log::debug!("Discarding out-of-order live page (seq {})", request.seq);
                    return MergeOutcome::Discarded;
                }
                self.last_live_seq = Some(request.seq);

                let outcome = self.replace_live_window(page.items);
                if self.cursor.page_index == 0 {
                    self.exhausted = page.is_last_page;
                }
                outcome
            }
            FetchSlot::History => {
                if request.page_index != self.cursor.page_index {
                    log::debug!(
                        "Discarding chat page {} (cursor at {})",
                        request.page_index,
                        self.cursor.page_index
                    );
                    return MergeOutcome::Discarded;
                }

                self.history_pending = false;
                let added = self.union_history(page.items);
                self.exhausted |= page.is_last_page;
                MergeOutcome::Applied { added, removed: 0 }
            }
        }
    }

    /// Fold the outcome of a fetch into the accumulated set
    pub fn on_fetched(&mut self, fetch: PageFetch) -> MergeOutcome {
        match fetch {
            PageFetch::Arrived(arrival) => self.on_page_arrived(arrival),
            PageFetch::Failed(request) => self.on_page_failed(request),
        }
    }

    /// Handle a request whose transport failed.
    ///
    /// Until a live page has been applied in this session, a failed live
    /// poll counts as "no data" and is merged as an empty last page, so an
    /// unreachable feed does not offer "load more". Any other failure keeps
    /// the current state.
    pub fn on_page_failed(&mut self, request: PageRequest) -> MergeOutcome {
        if request.slot() != FetchSlot::Live || self.last_live_seq.is_some() {
            return MergeOutcome::Discarded;
        }

        log::debug!("No live chat page yet for commons {}, showing empty feed", request.commons_id);
        self.on_page_arrived(PageArrival {
            request,
            page: Page::empty_last(),
        })
    }

    // Takes `&self`: tagging must not mark a feed signal dirty.
    fn tag_request(&self, page_index: u32) -> Option<PageRequest> {
        let commons_id = self.commons_id?;
        let seq = self.next_seq.get() + 1;
        self.next_seq.set(seq);
        Some(PageRequest {
            commons_id,
            page_index,
            page_size: self.cursor.page_size,
            generation: self.generation,
            seq,
        })
    }

    fn replace_live_window(&mut self, items: Vec<ChatMessage>) -> MergeOutcome {
        let incoming: HashSet<i64> = items.iter().map(|message| message.id).collect();
        let floor = incoming.iter().min().copied();
        let paginating = self.cursor.page_index > 0;

        // Entries below the new window slid into pages the user already
        // loaded; keep them as history instead of dropping them.
        let mut removed = 0;
        self.accumulated.retain(|id, stored| {
            if stored.source != FetchSlot::Live || incoming.contains(id) {
                return true;
            }
            if paginating && floor.is_some_and(|floor| *id < floor) {
                stored.source = FetchSlot::History;
                return true;
            }
            removed += 1;
            false
        });

        let mut added = 0;
        for message in items {
            let id = message.id;
            let previous = self.accumulated.insert(
                id,
                Stored {
                    message,
                    source: FetchSlot::Live,
                },
            );
            if previous.is_none() {
                added += 1;
            }
        }

        log::debug!("Live chat window merged: {} added, {} removed", added, removed);
        MergeOutcome::Applied { added, removed }
    }

    fn union_history(&mut self, items: Vec<ChatMessage>) -> usize {
        let mut added = 0;
        for message in items {
            if let Entry::Vacant(slot) = self.accumulated.entry(message.id) {
                slot.insert(Stored {
                    message,
                    source: FetchSlot::History,
                });
                added += 1;
            }
        }
        log::debug!("Chat history page merged: {} added", added);
        added
    }
}
