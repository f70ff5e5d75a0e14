//! Terminal front ends: the chat-style generator and the deck previewer.

pub mod interactive;
pub mod preview;
mod terminal;

pub use interactive::{Command, InteractiveApp};
pub use preview::{SlidePreview, SlideView};
