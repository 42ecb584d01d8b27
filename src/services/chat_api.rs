//! Chat backend transport
//!
//! Fetches chat pages and the user-commons identity list over HTTP and
//! decodes the bodies tolerantly: a missing or malformed body never becomes
//! an error, it degrades to an empty (exhausted) page or an empty identity
//! list. Only transport failures surface as [`FetchError`].

use async_trait::async_trait;
use gloo_net::http::Request;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::utils::identity_index::IdentityEntry;

/// Path of the paginated chat feed endpoint
const CHAT_PAGE_PATH: &str = "/api/chat/get";

/// Path of the user-commons (identity) endpoint
const USER_COMMONS_PATH: &str = "/api/usercommons/commons/all";

/// A chat message as delivered by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "message", default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: String,
}

/// One page of the chat feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<ChatMessage>,
    pub is_last_page: bool,
}

impl Page {
    /// The fail-safe page used when a response has no usable content
    pub fn empty_last() -> Self {
        Self {
            items: Vec::new(),
            is_last_page: true,
        }
    }
}

/// Raw page envelope (`{ "content": [...], "last": bool }`)
#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    last: Option<bool>,
}

// =============================================================================
// Errors
// =============================================================================

/// Transport-level failure while talking to the chat backend
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request could not be sent or no response arrived
    Request(String),
    /// The backend answered with a non-success status
    Status { status: u16, status_text: String },
    /// The response body could not be read
    Body(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(msg) => write!(f, "Request failed: {}", msg),
            Self::Status { status, status_text } => {
                write!(f, "Backend returned status {} {}", status, status_text)
            }
            Self::Body(msg) => write!(f, "Failed to read response body: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Result type alias for chat backend calls
pub type FetchResult<T> = Result<T, FetchError>;

// =============================================================================
// Decoding
// =============================================================================

/// Decode a chat page body.
///
/// `null`, non-JSON, a missing `content` or a non-array `content` all yield
/// [`Page::empty_last`]. Items that fail to decode are skipped. A missing
/// `last` flag is read as `true`.
pub fn decode_page(body: &str) -> Page {
    let raw = match serde_json::from_str::<Option<RawPage>>(body) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            log::warn!("Chat page response was null, treating as last page");
            return Page::empty_last();
        }
        Err(e) => {
            log::warn!("Malformed chat page response, treating as last page: {}", e);
            return Page::empty_last();
        }
    };

    let items = match raw.content {
        Some(Value::Array(items)) => items,
        _ => {
            log::warn!("Chat page response has no content array, treating as last page");
            return Page::empty_last();
        }
    };

    let items = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ChatMessage>(item) {
            Ok(message) => Some(message),
            Err(e) => {
                log::warn!("Skipping malformed chat message: {}", e);
                None
            }
        })
        .collect();

    Page {
        items,
        is_last_page: raw.last.unwrap_or(true),
    }
}

/// Decode a user-commons body into identity entries.
///
/// Anything other than a JSON array yields an empty list; entries without a
/// numeric `userId` are skipped.
pub fn decode_identities(body: &str) -> Vec<IdentityEntry> {
    let items = match serde_json::from_str::<Option<Value>>(body) {
        Ok(Some(Value::Array(items))) => items,
        Ok(_) => {
            log::warn!("User commons response is not a list, using empty identity set");
            return Vec::new();
        }
        Err(e) => {
            log::warn!("Malformed user commons response, using empty identity set: {}", e);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<IdentityEntry>(item).ok())
        .collect()
}

// =============================================================================
// Backend seam
// =============================================================================

/// Source of chat pages and identity lists
///
/// Not `Send` on any target: the HTTP implementation awaits gloo-net
/// futures.
#[async_trait(?Send)]
pub trait ChatBackend {
    /// Fetch page `page_index` of the chat feed for a commons
    async fn fetch_page(&self, commons_id: i64, page_index: u32, page_size: u32) -> FetchResult<Page>;

    /// Fetch the identity reference set for a commons
    async fn fetch_identities(&self, commons_id: i64) -> FetchResult<Vec<IdentityEntry>>;
}

/// HTTP client for the chat backend
#[derive(Debug, Clone, PartialEq)]
pub struct ChatApi {
    base_url: String,
}

impl ChatApi {
    /// Create a client; an empty base URL targets the page's own origin
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    /// URL of one chat page
    pub fn page_url(&self, commons_id: i64, page_index: u32, page_size: u32) -> String {
        let params = [
            ("commonsId", commons_id.to_string()),
            ("page", page_index.to_string()),
            ("size", page_size.to_string()),
        ];
        format!("{}{}?{}", self.base_url, CHAT_PAGE_PATH, query_string(&params))
    }

    /// URL of the user-commons list
    pub fn user_commons_url(&self, commons_id: i64) -> String {
        let params = [("commonsId", commons_id.to_string())];
        format!("{}{}?{}", self.base_url, USER_COMMONS_PATH, query_string(&params))
    }

    async fn get_text(&self, url: &str) -> FetchResult<String> {
        let response = Request::get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !response.ok() {
            return Err(FetchError::Status {
                status: response.status(),
                status_text: response.status_text(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))
    }
}

#[async_trait(?Send)]
impl ChatBackend for ChatApi {
    async fn fetch_page(&self, commons_id: i64, page_index: u32, page_size: u32) -> FetchResult<Page> {
        let url = self.page_url(commons_id, page_index, page_size);
        let body = self.get_text(&url).await?;
        Ok(decode_page(&body))
    }

    async fn fetch_identities(&self, commons_id: i64) -> FetchResult<Vec<IdentityEntry>> {
        let url = self.user_commons_url(commons_id);
        let body = self.get_text(&url).await?;
        Ok(decode_identities(&body))
    }
}

fn query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
