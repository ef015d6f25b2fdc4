use serde::{Deserialize, Serialize};

/// Insert payload for a contact. The store assigns the identifier.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Insert payload for a message. `timestamp` is the logical send/receive time
/// (unix seconds), distinct from the record-creation time the store assigns.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub contact_id: i64,
    pub content: String,
    pub timestamp: i64,
}

/// One row of a conversation listing: a contact paired with its most recent
/// (optionally filter-matching) message. Derived on every query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItem {
    pub contact_id: i64,
    pub name: String,
    pub email: String,
    pub last_message: String,
    pub last_message_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl Pagination {
    /// `total_pages` is computed from the total alone, so a page far past the
    /// end still reports the real page count. `(total - 1) / limit + 1` rather
    /// than the `total + limit - 1` form: the latter overflows when a caller
    /// passes a limit near `i64::MAX`.
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total == 0 { 1 } else { (total - 1) / limit + 1 };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Response shape shared by `listRecent` and `search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationPage {
    pub conversations: Vec<ConversationItem>,
    pub pagination: Pagination,
}
