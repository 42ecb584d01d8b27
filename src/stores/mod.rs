// State management
// Feed reconciliation state and app settings

pub mod feed_accumulator;
pub mod settings_store;
