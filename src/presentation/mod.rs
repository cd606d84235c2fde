// Presentation layer - HTTP handlers and request extraction
pub mod app_state;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod query;
