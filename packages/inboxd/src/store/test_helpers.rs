use sqlx::sqlite::SqlitePoolOptions;

use crate::config::Backend;

use super::{DocumentStore, RelationalStore};

/// Create a fresh in-memory SQLite pool with the given backend's schema
/// applied. Each call returns an isolated database.
pub async fn test_pool(backend: Backend) -> sqlx::SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    crate::db::run_migrations(&pool, backend)
        .await
        .expect("Failed to run migrations");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("Failed to enable foreign keys");

    pool
}

pub async fn relational_store() -> RelationalStore {
    RelationalStore::new(test_pool(Backend::Relational).await)
}

pub async fn document_store() -> DocumentStore {
    DocumentStore::new(test_pool(Backend::Document).await)
}

/// Behavior checks shared by both backends. Each backend module wires these
/// into its own #[tokio::test] wrappers, so every property is exercised
/// against both representations.
pub mod scenarios {
    use crate::models::{NewContact, NewMessage};
    use crate::store::{ConversationStore, SearchTerm};

    async fn add_contact(store: &dyn ConversationStore, name: &str, email: &str) -> i64 {
        store
            .insert_contact(&NewContact {
                name: name.to_string(),
                email: email.to_string(),
                phone: "+1-555-000-0000".to_string(),
            })
            .await
            .unwrap()
    }

    async fn add_message(store: &dyn ConversationStore, contact_id: i64, content: &str, ts: i64) {
        store
            .insert_messages_batch(&[NewMessage {
                contact_id,
                content: content.to_string(),
                timestamp: ts,
            }])
            .await
            .unwrap();
    }

    pub async fn check_latest_message_per_contact(store: &dyn ConversationStore) {
        let id = add_contact(store, "Ada Lovelace", "ada@example.com").await;
        add_message(store, id, "first", 100).await;
        add_message(store, id, "third", 300).await;
        add_message(store, id, "second", 200).await;

        let items = store.fetch_latest_per_contact(None, 50, 0).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].contact_id, id);
        assert_eq!(items[0].last_message, "third");
        assert_eq!(items[0].last_message_time, 300);
    }

    pub async fn check_timestamp_tie_break(store: &dyn ConversationStore) {
        let id = add_contact(store, "Grace Hopper", "grace@example.com").await;
        add_message(store, id, "earlier insert", 500).await;
        add_message(store, id, "later insert", 500).await;

        // Same timestamp: the higher message id (later insert) wins.
        let items = store.fetch_latest_per_contact(None, 50, 0).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].last_message, "later insert");
    }

    pub async fn check_contact_without_messages(store: &dyn ConversationStore) {
        let with_msg = add_contact(store, "Alan Turing", "alan@example.com").await;
        add_contact(store, "Silent Bob", "bob@example.com").await;
        add_message(store, with_msg, "hello", 100).await;

        let items = store.fetch_latest_per_contact(None, 50, 0).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].contact_id, with_msg);
        assert_eq!(store.count_conversations(None).await.unwrap(), 1);
    }

    pub async fn check_pagination_covers_all(store: &dyn ConversationStore) {
        for i in 0..5i64 {
            let id = add_contact(
                store,
                &format!("Contact {}", i),
                &format!("c{}@example.com", i),
            )
            .await;
            add_message(store, id, &format!("msg {}", i), 100 + i).await;
        }

        let total = store.count_conversations(None).await.unwrap();
        assert_eq!(total, 5);

        // Concatenating all pages yields each conversation exactly once, in
        // non-increasing timestamp order across page boundaries.
        let mut seen = Vec::new();
        let mut last_ts = i64::MAX;
        for page in 0..3 {
            let items = store.fetch_latest_per_contact(None, 2, page * 2).await.unwrap();
            for item in items {
                assert!(item.last_message_time <= last_ts);
                last_ts = item.last_message_time;
                assert!(!seen.contains(&item.contact_id));
                seen.push(item.contact_id);
            }
        }
        assert_eq!(seen.len(), 5);

        // A window past the end is empty, not an error.
        let past_end = store.fetch_latest_per_contact(None, 2, 100).await.unwrap();
        assert!(past_end.is_empty());
    }

    pub async fn check_search_latest_matching(store: &dyn ConversationStore) {
        let id = add_contact(store, "Mary Shelley", "mary@example.com").await;
        add_message(store, id, "blue fish", 100).await;
        add_message(store, id, "red bird", 200).await;
        add_message(store, id, "blue whale", 300).await;

        let other = add_contact(store, "No Match", "nomatch@example.net").await;
        add_message(store, other, "green tea", 400).await;

        // Term matches the messages at t=100 and t=300: the later one is shown.
        let term = SearchTerm::new("blue");
        let items = store
            .fetch_latest_per_contact(Some(&term), 50, 0)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].contact_id, id);
        assert_eq!(items[0].last_message, "blue whale");
        assert_eq!(items[0].last_message_time, 300);
    }

    pub async fn check_search_name_match(store: &dyn ConversationStore) {
        let id = add_contact(store, "Alice Johnson", "alice@example.com").await;
        add_message(store, id, "about the meeting", 100).await;
        add_message(store, id, "running late", 200).await;

        // A name match qualifies every message, so the global latest is shown
        // even though no message content contains the term.
        let term = SearchTerm::new("johnson");
        let items = store
            .fetch_latest_per_contact(Some(&term), 50, 0)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].last_message, "running late");
        assert_eq!(store.count_conversations(Some(&term)).await.unwrap(), 1);
    }

    pub async fn check_search_case_insensitive(store: &dyn ConversationStore) {
        let id = add_contact(store, "Carol Danvers", "carol@example.com").await;
        add_message(store, id, "Project Update attached", 100).await;

        for needle in ["project update", "PROJECT", "Danvers", "CAROL@"] {
            let term = SearchTerm::new(needle);
            let items = store
                .fetch_latest_per_contact(Some(&term), 50, 0)
                .await
                .unwrap();
            assert_eq!(items.len(), 1, "term {:?} should match", needle);
        }
    }

    pub async fn check_search_literal_wildcards(store: &dyn ConversationStore) {
        let exact = add_contact(store, "Percent", "percent@example.com").await;
        add_message(store, exact, "we are 100% done", 100).await;
        let decoy = add_contact(store, "Decoy", "decoy@example.com").await;
        add_message(store, decoy, "we are 100x done", 200).await;

        let term = SearchTerm::new("100%");
        let items = store
            .fetch_latest_per_contact(Some(&term), 50, 0)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].contact_id, exact);

        let term = SearchTerm::new("100_");
        let items = store
            .fetch_latest_per_contact(Some(&term), 50, 0)
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    pub async fn check_counts(store: &dyn ConversationStore) {
        let a = add_contact(store, "Aa", "a@example.com").await;
        add_message(store, a, "one", 100).await;
        add_message(store, a, "two", 200).await;
        let b = add_contact(store, "Bb", "b@example.com").await;
        add_message(store, b, "unique needle here", 300).await;
        add_contact(store, "Cc", "c@example.com").await;

        assert_eq!(store.count_conversations(None).await.unwrap(), 2);

        let term = SearchTerm::new("needle");
        assert_eq!(store.count_conversations(Some(&term)).await.unwrap(), 1);

        let term = SearchTerm::new("no such thing anywhere");
        assert_eq!(store.count_conversations(Some(&term)).await.unwrap(), 0);
    }

    pub async fn check_stats(store: &dyn ConversationStore) {
        let a = add_contact(store, "Aa", "a@example.com").await;
        add_message(store, a, "one", 100).await;
        add_message(store, a, "two", 200).await;

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.contacts, 1);
        assert_eq!(stats.messages, 2);
    }
}
