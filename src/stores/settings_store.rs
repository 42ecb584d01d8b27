/// Chat feed settings
/// Read once from LocalStorage, falling back to built-in defaults
use dioxus::prelude::*;
use serde::{Deserialize, Serialize};

/// Messages requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Polling interval for the live page and the identity list
pub const DEFAULT_REFRESH_INTERVAL_MS: u32 = 2000;
pub const MIN_REFRESH_INTERVAL_MS: u32 = 500;
pub const MAX_REFRESH_INTERVAL_MS: u32 = 60_000;

/// Commons shown on the home route
pub const DEFAULT_COMMONS_ID: i64 = 1;

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
const STORAGE_KEY: &str = "commons_chat_settings";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedSettings {
    /// Backend origin; empty means the page's own origin
    pub api_base: String,
    pub page_size: u32,
    pub refresh_interval_ms: u32,
    pub default_commons_id: i64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            default_commons_id: DEFAULT_COMMONS_ID,
        }
    }
}

impl FeedSettings {
    /// Clamp numeric settings into their supported ranges
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    pub fn sanitized(mut self) -> Self {
        self.page_size = self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        self.refresh_interval_ms = self
            .refresh_interval_ms
            .clamp(MIN_REFRESH_INTERVAL_MS, MAX_REFRESH_INTERVAL_MS);
        self.api_base = self.api_base.trim().to_string();
        self
    }
}

/// Global settings state
pub static FEED_SETTINGS: GlobalSignal<FeedSettings> = Signal::global(load_settings);

/// Load settings from LocalStorage, or defaults if absent or unreadable
pub fn load_settings() -> FeedSettings {
    #[cfg(target_arch = "wasm32")]
    {
        use gloo_storage::{LocalStorage, Storage};

        match LocalStorage::get::<FeedSettings>(STORAGE_KEY) {
            Ok(settings) => {
                log::info!("Loaded chat settings from storage");
                return settings.sanitized();
            }
            Err(e) => {
                log::info!("Using default chat settings ({})", e);
            }
        }
    }

    FeedSettings::default()
}
