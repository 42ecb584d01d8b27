use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display name used when a user has no resolvable name
pub const ANONYMOUS: &str = "Anonymous";

/// One entry of the identity reference set (a user-commons record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEntry {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Lookup from user id to display name.
///
/// Rebuilt wholesale from each identity poll. Users listed without a name
/// are stored with an empty name, so "known but blank" and "unknown" stay
/// distinguishable in the index even though both resolve to [`ANONYMOUS`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityIndex {
    names: HashMap<i64, String>,
}

impl IdentityIndex {
    pub fn from_entries(entries: impl IntoIterator<Item = IdentityEntry>) -> Self {
        let mut index = Self::default();
        index.rebuild(entries);
        index
    }

    /// Replace the whole index with `entries`
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = IdentityEntry>) {
        self.names = entries
            .into_iter()
            .map(|entry| (entry.user_id, entry.username.unwrap_or_default()))
            .collect();
    }

    /// Display name for `user_id`, or [`ANONYMOUS`] if missing or empty
    pub fn resolve(&self, user_id: i64) -> &str {
        match self.names.get(&user_id) {
            Some(name) if !name.is_empty() => name.as_str(),
            _ => ANONYMOUS,
        }
    }

    #[allow(dead_code)]
    pub fn contains(&self, user_id: i64) -> bool {
        self.names.contains_key(&user_id)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
