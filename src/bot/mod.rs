//! Conversation core — command interception and the per-user state machine.

pub mod command;
pub mod conversation;
pub mod render;

pub use command::Command;
pub use conversation::CourseBot;
