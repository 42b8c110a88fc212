//! UI components for the chat window

pub mod header;
pub mod input_bar;
pub mod message_list;

pub use header::{Header, ResetDialog, SUBTITLE, TITLE};
pub use input_bar::{InputBar, INPUT_HINT, LISTENING_HINT};
pub use message_list::MessageList;
