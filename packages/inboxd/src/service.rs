use std::sync::Arc;

use thiserror::Error;

use crate::models::{ConversationPage, Pagination};
use crate::store::{ConversationStore, SearchTerm, StoreError};

pub const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The two public entry points over the store: recent conversations and
/// conversation search. Stateless; the only shared state is the store's
/// connection pool.
#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn list_recent(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<ConversationPage, ServiceError> {
        self.fetch_page(None, page, limit).await
    }

    pub async fn search(
        &self,
        term: &str,
        page: i64,
        limit: i64,
    ) -> Result<ConversationPage, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Search term is required".to_string(),
            ));
        }
        self.fetch_page(Some(SearchTerm::new(term)), page, limit)
            .await
    }

    async fn fetch_page(
        &self,
        filter: Option<SearchTerm>,
        page: i64,
        limit: i64,
    ) -> Result<ConversationPage, ServiceError> {
        if page < 1 {
            return Err(ServiceError::InvalidInput(
                "page must be at least 1".to_string(),
            ));
        }
        if limit < 1 {
            return Err(ServiceError::InvalidInput(
                "limit must be at least 1".to_string(),
            ));
        }

        let offset = (page - 1).saturating_mul(limit);
        let filter = filter.as_ref();

        // The count and the window run concurrently and may observe slightly
        // different snapshots under concurrent writes; each statement on its
        // own is consistent.
        let (conversations, total) = tokio::try_join!(
            self.store.fetch_latest_per_contact(filter, limit, offset),
            self.store.count_conversations(filter),
        )?;

        Ok(ConversationPage {
            conversations,
            pagination: Pagination::new(total, page, limit),
        })
    }
}
