pub mod app;
pub mod chat;
pub mod config;
pub mod creativity;
pub mod handler;
pub mod image;
pub mod session;
pub mod state;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use chat::{ChatBackend, ChatEndpoint, ChatError, IntelliChatClient, FALLBACK_REPLY};
pub use config::Config;
pub use creativity::Creativity;
pub use image::{ImageBackend, ImageError, ImageStudio, PlaceholderImages};
pub use session::Session;
pub use state::{Speaker, Turn};
