// Backend access
// Chat transport and the fetch side of feed polling

pub mod chat_api;
pub mod feed_sync;
