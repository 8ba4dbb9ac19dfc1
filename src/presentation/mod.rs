// Presentation layer - Read-only HTTP view of the monitor
pub mod app_state;
pub mod handlers;
