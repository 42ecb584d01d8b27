// UI Components

pub mod chat_display;
pub mod chat_message_display;

pub use chat_display::ChatDisplay;
pub use chat_message_display::ChatMessageDisplay;
