use crate::services::chat_api::ChatMessage;
use crate::stores::feed_accumulator::FeedAccumulator;
use crate::utils::identity_index::IdentityIndex;

/// A message joined with the display name of its author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub message: ChatMessage,
    pub username: String,
}

/// Ordered, identity-joined view of the accumulated feed, newest (highest
/// id) first. Built from a fresh copy on every call; the accumulator's
/// storage is never reordered.
pub fn snapshot(feed: &FeedAccumulator, identities: &IdentityIndex) -> Vec<FeedRow> {
    let mut rows: Vec<FeedRow> = feed
        .messages()
        .map(|message| FeedRow {
            username: identities.resolve(message.user_id).to_string(),
            message: message.clone(),
        })
        .collect();

    rows.sort_by(|a, b| b.message.id.cmp(&a.message.id));
    rows
}
