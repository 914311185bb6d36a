//! Integration tests for the SQLite storage tier.

use std::sync::Arc;

use kimai_common::storage::{SqlitePool, StorageConfig, StorageError};
use tempfile::TempDir;

fn open_pool(dir: &TempDir) -> SqlitePool {
    SqlitePool::new(&StorageConfig::new(dir.path().join("kimai.sqlite")).with_pool_size(2))
        .expect("pool created")
}

#[test]
fn foreign_keys_are_enforced_on_every_connection() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir);

    {
        let conn = pool.get().unwrap();
        conn.execute_batch(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY);
             CREATE TABLE projects (id INTEGER PRIMARY KEY,
                customer_id INTEGER NOT NULL REFERENCES customers(id));",
        )
        .unwrap();
    }

    let conn = pool.get().unwrap();
    let err = conn.execute("INSERT INTO projects (customer_id) VALUES (?1)", &[&99]).unwrap_err();
    assert!(matches!(err, StorageError::Rusqlite(_)));
}

#[test]
fn transactions_are_available_through_deref() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir);

    let mut conn = pool.get().unwrap();
    conn.execute("CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT UNIQUE)", &[]).unwrap();

    {
        let tx = conn.transaction().unwrap();
        tx.execute("INSERT INTO tags (name) VALUES ('a')", []).unwrap();
        tx.execute("INSERT INTO tags (name) VALUES ('b')", []).unwrap();
        tx.rollback().unwrap();
    }

    let count: i64 = conn.query_row("SELECT COUNT(*) FROM tags", &[], |r| r.get(0)).unwrap();
    assert_eq!(count, 0);
}

#[test]
fn pool_is_shareable_across_threads() {
    let dir = TempDir::new().unwrap();
    let pool = Arc::new(open_pool(&dir));

    pool.get().unwrap().execute("CREATE TABLE t (v INTEGER)", &[]).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                pool.get().unwrap().execute("INSERT INTO t (v) VALUES (?1)", &[&i]).unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let sum: i64 = pool.get().unwrap().query_row("SELECT SUM(v) FROM t", &[], |r| r.get(0)).unwrap();
    assert_eq!(sum, 6);
}
