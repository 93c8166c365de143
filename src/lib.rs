//! Course bot — onboarding, placement quiz and course purchase over chat.

pub mod app;
pub mod bot;
pub mod catalog;
pub mod channels;
pub mod config;
pub mod error;
pub mod quiz;
pub mod reminder;
pub mod session;
pub mod store;
