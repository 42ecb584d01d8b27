pub mod use_chat_feed;

pub use use_chat_feed::use_chat_feed;
