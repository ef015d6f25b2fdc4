use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use crate::models::{ConversationItem, NewContact, NewMessage};

use super::{ConversationStore, SearchTerm, StoreError, StoreStats};

/// Relational representation: a `contacts` table joined to a `messages` table,
/// with a covering index on (contact_id, timestamp DESC, id DESC).
#[derive(Clone)]
pub struct RelationalStore {
    pool: SqlitePool,
}

impl RelationalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for RelationalStore {
    async fn fetch_latest_per_contact(
        &self,
        filter: Option<&SearchTerm>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ConversationItem>, StoreError> {
        let rows = match filter {
            // Unfiltered: correlated top-1 subquery. The
            // (contact_id, timestamp DESC, id DESC) index satisfies the inner
            // select with one seek per contact, so cost scales with the number
            // of contacts touched, not the number of messages.
            None => {
                sqlx::query(
                    r#"
                    SELECT c.id AS contact_id, c.name, c.email,
                           m.content AS last_message, m.timestamp AS last_message_time
                    FROM contacts c
                    JOIN messages m ON m.contact_id = c.id
                    WHERE m.id = (
                        SELECT id FROM messages
                        WHERE contact_id = c.id
                        ORDER BY timestamp DESC, id DESC
                        LIMIT 1
                    )
                    ORDER BY m.timestamp DESC, m.id DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            // Filtered: the predicate restricts the join before the window
            // selection, so the surviving row per contact is the latest among
            // the messages that matched.
            Some(term) => {
                sqlx::query(
                    r#"
                    SELECT contact_id, name, email,
                           content AS last_message, timestamp AS last_message_time
                    FROM (
                        SELECT c.id AS contact_id, c.name, c.email,
                               m.content, m.timestamp, m.id AS message_id,
                               ROW_NUMBER() OVER (
                                   PARTITION BY m.contact_id
                                   ORDER BY m.timestamp DESC, m.id DESC
                               ) AS rn
                        FROM contacts c
                        JOIN messages m ON m.contact_id = c.id
                        WHERE c.name LIKE ?1 ESCAPE '\'
                           OR c.email LIKE ?1 ESCAPE '\'
                           OR m.content LIKE ?1 ESCAPE '\'
                    )
                    WHERE rn = 1
                    ORDER BY last_message_time DESC, message_id DESC
                    LIMIT ?2 OFFSET ?3
                    "#,
                )
                .bind(term.pattern())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|row| ConversationItem {
                contact_id: row.get("contact_id"),
                name: row.get("name"),
                email: row.get("email"),
                last_message: row.get("last_message"),
                last_message_time: row.get("last_message_time"),
            })
            .collect())
    }

    async fn count_conversations(&self, filter: Option<&SearchTerm>) -> Result<i64, StoreError> {
        let row = match filter {
            None => {
                sqlx::query("SELECT COUNT(DISTINCT contact_id) AS total FROM messages")
                    .fetch_one(&self.pool)
                    .await?
            }
            Some(term) => {
                sqlx::query(
                    r#"
                    SELECT COUNT(DISTINCT c.id) AS total
                    FROM contacts c
                    JOIN messages m ON m.contact_id = c.id
                    WHERE c.name LIKE ?1 ESCAPE '\'
                       OR c.email LIKE ?1 ESCAPE '\'
                       OR m.content LIKE ?1 ESCAPE '\'
                    "#,
                )
                .bind(term.pattern())
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(row.get("total"))
    }

    async fn insert_contact(&self, contact: &NewContact) -> Result<i64, StoreError> {
        let result = sqlx::query("INSERT INTO contacts (name, email, phone) VALUES (?, ?, ?)")
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.phone)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn insert_messages_batch(&self, messages: &[NewMessage]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for message in messages {
            sqlx::query("INSERT INTO messages (contact_id, content, timestamp) VALUES (?, ?, ?)")
                .bind(message.contact_id)
                .bind(&message.content)
                .bind(message.timestamp)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!("Inserted {} messages in batch", messages.len());
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM contacts) AS contacts,
                (SELECT COUNT(*) FROM messages) AS messages
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            contacts: row.get::<i64, _>("contacts") as u64,
            messages: row.get::<i64, _>("messages") as u64,
        })
    }
}
