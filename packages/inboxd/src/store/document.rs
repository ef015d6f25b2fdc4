use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use crate::models::{ConversationItem, NewContact, NewMessage};

use super::{ConversationStore, SearchTerm, StoreError, StoreStats};

/// Document representation: `contact_docs` and `message_docs` hold one JSON
/// document per row, queried through json_extract. The expression index on
/// (contact_id, timestamp DESC, id DESC) plays the same role as the relational
/// one.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for DocumentStore {
    async fn fetch_latest_per_contact(
        &self,
        filter: Option<&SearchTerm>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ConversationItem>, StoreError> {
        let rows = match filter {
            None => {
                sqlx::query(
                    r#"
                    SELECT c.id AS contact_id,
                           json_extract(c.doc, '$.name') AS name,
                           json_extract(c.doc, '$.email') AS email,
                           json_extract(m.doc, '$.content') AS last_message,
                           json_extract(m.doc, '$.timestamp') AS last_message_time
                    FROM contact_docs c
                    JOIN message_docs m ON json_extract(m.doc, '$.contact_id') = c.id
                    WHERE m.id = (
                        SELECT id FROM message_docs
                        WHERE json_extract(doc, '$.contact_id') = c.id
                        ORDER BY json_extract(doc, '$.timestamp') DESC, id DESC
                        LIMIT 1
                    )
                    ORDER BY last_message_time DESC, m.id DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            Some(term) => {
                sqlx::query(
                    r#"
                    SELECT contact_id, name, email,
                           content AS last_message, timestamp AS last_message_time
                    FROM (
                        SELECT c.id AS contact_id,
                               json_extract(c.doc, '$.name') AS name,
                               json_extract(c.doc, '$.email') AS email,
                               json_extract(m.doc, '$.content') AS content,
                               json_extract(m.doc, '$.timestamp') AS timestamp,
                               m.id AS message_id,
                               ROW_NUMBER() OVER (
                                   PARTITION BY json_extract(m.doc, '$.contact_id')
                                   ORDER BY json_extract(m.doc, '$.timestamp') DESC, m.id DESC
                               ) AS rn
                        FROM contact_docs c
                        JOIN message_docs m ON json_extract(m.doc, '$.contact_id') = c.id
                        WHERE json_extract(c.doc, '$.name') LIKE ?1 ESCAPE '\'
                           OR json_extract(c.doc, '$.email') LIKE ?1 ESCAPE '\'
                           OR json_extract(m.doc, '$.content') LIKE ?1 ESCAPE '\'
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
                sqlx::query(
                    "SELECT COUNT(DISTINCT json_extract(doc, '$.contact_id')) AS total FROM message_docs",
                )
                .fetch_one(&self.pool)
                .await?
            }
            Some(term) => {
                sqlx::query(
                    r#"
                    SELECT COUNT(DISTINCT c.id) AS total
                    FROM contact_docs c
                    JOIN message_docs m ON json_extract(m.doc, '$.contact_id') = c.id
                    WHERE json_extract(c.doc, '$.name') LIKE ?1 ESCAPE '\'
                       OR json_extract(c.doc, '$.email') LIKE ?1 ESCAPE '\'
                       OR json_extract(m.doc, '$.content') LIKE ?1 ESCAPE '\'
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
        let doc = serde_json::json!({
            "name": contact.name,
            "email": contact.email,
            "phone": contact.phone,
            "created_at": chrono::Utc::now().timestamp(),
        })
        .to_string();

        let result = sqlx::query("INSERT INTO contact_docs (doc) VALUES (?)")
            .bind(&doc)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn insert_messages_batch(&self, messages: &[NewMessage]) -> Result<(), StoreError> {
        let created_at = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for message in messages {
            let doc = serde_json::json!({
                "contact_id": message.contact_id,
                "content": message.content,
                "timestamp": message.timestamp,
                "created_at": created_at,
            })
            .to_string();

            sqlx::query("INSERT INTO message_docs (doc) VALUES (?)")
                .bind(&doc)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!("Inserted {} message documents in batch", messages.len());
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM contact_docs) AS contacts,
                (SELECT COUNT(*) FROM message_docs) AS messages
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
