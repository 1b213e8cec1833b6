pub mod ai;
pub mod app;
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod handler;
pub mod state;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use ai::{ChatBackend, CompletionRequest, HttpBackend};
pub use backend::{BackendConfig, BackendMode};
pub use config::Config;
pub use controller::{perform, ChatController, Completion, Effect};
pub use error::ChatError;
pub use state::{ChatMessage, ChatRole, Conversation};
