pub mod conversations;
pub mod health;

// Re-export all handlers for easy route registration
pub use conversations::{recent_conversations, search_conversations};
pub use health::{health_handler, health_live_handler, health_ready_handler};
