//! Behaviour every checkpoint backend must share. Postgres runs only when
//! `TEST_POSTGRES_URL` points at a scratch database.

use std::collections::HashSet;
use std::sync::Arc;

use tempfile::tempdir;
use threadchat_checkpoint::{
    CheckpointError, CheckpointStore, MemoryCheckpointStore, PostgresCheckpointStore,
    SqliteCheckpointStore,
};
use threadchat_core::Message;

fn conversation(turns: usize) -> Vec<Message> {
    let mut messages = Vec::new();
    for i in 0..turns {
        messages.push(Message::user(format!("question {i}")));
        messages.push(Message::assistant(format!("answer {i}"), Vec::new()));
    }
    messages
}

async fn save_then_load_returns_exact_sequence(store: &dyn CheckpointStore) {
    let messages = conversation(2);
    store.save("thread-a", &messages).await.unwrap();

    let loaded = store.load("thread-a").await.unwrap();
    assert_eq!(loaded, messages);
}

async fn unknown_thread_is_empty_not_error(store: &dyn CheckpointStore) {
    assert!(store.load("never-saved").await.unwrap().is_empty());
}

async fn repeated_saves_are_idempotent_and_listed_once(store: &dyn CheckpointStore) {
    let messages = conversation(1);
    let first = store.save("thread-b", &messages).await.unwrap();
    let second = store.save("thread-b", &messages).await.unwrap();

    assert_eq!(second.step, first.step + 1);
    assert_eq!(store.load("thread-b").await.unwrap(), messages);

    let threads = store.list_threads().await.unwrap();
    let unique: HashSet<&String> = threads.iter().collect();
    assert_eq!(unique.len(), threads.len());
    assert!(threads.contains(&"thread-b".to_string()));
}

async fn latest_snapshot_wins(store: &dyn CheckpointStore) {
    store.save("thread-c", &conversation(1)).await.unwrap();
    store.save("thread-c", &conversation(3)).await.unwrap();

    let checkpoint = store.latest("thread-c").await.unwrap().expect("checkpoint");
    assert_eq!(checkpoint.messages.len(), 6);
    assert_eq!(checkpoint.step, 2);
}

async fn listing_preserves_first_commit_order(store: &dyn CheckpointStore) {
    store.save("order-1", &conversation(1)).await.unwrap();
    store.save("order-2", &conversation(1)).await.unwrap();
    store.save("order-1", &conversation(2)).await.unwrap();

    let threads = store.list_threads().await.unwrap();
    let first = threads.iter().position(|t| t == "order-1").unwrap();
    let second = threads.iter().position(|t| t == "order-2").unwrap();
    assert!(first < second);
}

async fn invalid_thread_id_is_rejected(store: &dyn CheckpointStore) {
    let err = store.save("", &conversation(1)).await.unwrap_err();
    assert!(matches!(err, CheckpointError::InvalidThreadId(_)));
}

async fn concurrent_writers_never_tear(store: Arc<dyn CheckpointStore>) {
    let mut handles = Vec::new();
    for turns in 1..=8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.save("shared", &conversation(turns)).await.map(|c| c.step)
        }));
    }

    let mut steps = HashSet::new();
    for handle in handles {
        steps.insert(handle.await.unwrap().unwrap());
    }
    assert_eq!(steps.len(), 8);

    let loaded = store.load("shared").await.unwrap();
    assert!(!loaded.is_empty());
    let contents: Vec<&str> = loaded.iter().map(Message::content).collect();
    let expected: Vec<String> = conversation(loaded.len() / 2)
        .iter()
        .map(|m| m.content().to_string())
        .collect();
    assert_eq!(contents, expected);
}

async fn run_contract(store: Arc<dyn CheckpointStore>) {
    store.init().await.unwrap();
    save_then_load_returns_exact_sequence(store.as_ref()).await;
    unknown_thread_is_empty_not_error(store.as_ref()).await;
    repeated_saves_are_idempotent_and_listed_once(store.as_ref()).await;
    latest_snapshot_wins(store.as_ref()).await;
    listing_preserves_first_commit_order(store.as_ref()).await;
    invalid_thread_id_is_rejected(store.as_ref()).await;
    concurrent_writers_never_tear(store).await;
}

#[tokio::test]
async fn memory_store_contract() {
    run_contract(Arc::new(MemoryCheckpointStore::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_store_contract() {
    let dir = tempdir().expect("temp dir");
    run_contract(Arc::new(SqliteCheckpointStore::new(dir.path().join("threads.db")))).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn postgres_store_contract() {
    let Ok(url) = std::env::var("TEST_POSTGRES_URL") else {
        return;
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("connect");
    let prefix = format!("contract_{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0));
    run_contract(Arc::new(PostgresCheckpointStore::with_table_prefix(pool, &prefix))).await;
}
