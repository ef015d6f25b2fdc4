// Store adapter — one trait, two interchangeable SQLite representations.
//
// All latest-per-contact / search / pagination SQL lives inside the backend
// impls; nothing above this layer knows which representation is in use.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

mod document;
mod relational;

pub use document::DocumentStore;
pub use relational::RelationalStore;

#[cfg(test)]
pub(crate) mod test_helpers;

use crate::models::{ConversationItem, NewContact, NewMessage};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Case-insensitive substring predicate over contact name, contact email and
/// message content (logical OR). Owns the escaped `%term%` LIKE pattern so the
/// term's own `%`, `_` and `\` match literally.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    pattern: String,
}

impl SearchTerm {
    pub fn new(term: &str) -> Self {
        Self {
            pattern: format!("%{}%", escape_like(term)),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Escape LIKE wildcards for literal substring matching.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub contacts: u64,
    pub messages: u64,
}

/// Uniform read access to the contact/message data, regardless of how the
/// engine lays it out.
///
/// Reads are single statements, so every call observes a consistent snapshot:
/// no partially committed rows, and every pair fully committed before the call
/// began is visible. The adapter takes no locks and never retries.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Top-1-per-group: for each contact with at least one (matching) message,
    /// return the message with the maximum timestamp — ties broken by highest
    /// message id — ordered by that timestamp descending (same tie-break),
    /// windowed by limit/offset.
    ///
    /// When a filter is given, the predicate restricts the contact×message
    /// join *before* latest-message selection: the message shown is the latest
    /// among the messages that matched (a name/email match qualifies all of a
    /// contact's messages, so the global latest is shown).
    async fn fetch_latest_per_contact(
        &self,
        filter: Option<&SearchTerm>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ConversationItem>, StoreError>;

    /// Number of distinct contacts with at least one (matching) message.
    async fn count_conversations(&self, filter: Option<&SearchTerm>) -> Result<i64, StoreError>;

    /// Write path, used only by the seeder and by tests.
    async fn insert_contact(&self, contact: &NewContact) -> Result<i64, StoreError>;

    /// Batched message insert inside a single transaction.
    async fn insert_messages_batch(&self, messages: &[NewMessage]) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;
}
