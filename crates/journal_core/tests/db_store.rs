use journal_core::db::migrations::latest_version;
use journal_core::{DbError, ErrorKind, RepoError, Store};
use rusqlite::Connection;

const TABLES: [&str; 6] = [
    "prompts",
    "responses",
    "affirmations",
    "completion_logs",
    "gratitude_items",
    "creativity_entries",
];

#[test]
fn open_in_memory_applies_all_migrations() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.connection().unwrap();

    assert_eq!(schema_version(conn), latest_version());
    for table in TABLES {
        assert_table_exists(conn, table);
    }
}

#[test]
fn opening_same_file_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    let mut first = Store::open(&path).unwrap();
    first
        .connection()
        .unwrap()
        .execute(
            "INSERT INTO prompts (text, created_at) VALUES ('kept across opens', 1);",
            [],
        )
        .unwrap();
    first.close().unwrap();

    let second = Store::open(&path).unwrap();
    assert_eq!(second.path(), Some(path.as_path()));
    let conn = second.connection().unwrap();
    assert_eq!(schema_version(conn), latest_version());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM prompts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_corrupt_file_is_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.db");
    std::fs::write(&path, vec![b'x'; 4096]).unwrap();

    let err = Store::open(&path).unwrap_err();
    assert!(matches!(err, DbError::StorageUnavailable { path: Some(ref p), .. } if p == &path));
    assert_eq!(RepoError::from(err).kind(), ErrorKind::StorageUnavailable);
}

#[test]
fn opening_unreachable_path_is_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("nested").join("journal.db");

    let err = Store::open(&path).unwrap_err();
    assert!(err.is_unavailable());
}

#[cfg(unix)]
#[test]
fn opening_read_only_file_is_storage_unavailable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readonly.db");
    Store::open(&path).unwrap().close().unwrap();

    let set_mode = |target: &std::path::Path, mode: u32| {
        std::fs::set_permissions(target, std::fs::Permissions::from_mode(mode)).unwrap();
    };
    set_mode(&path, 0o444);
    set_mode(dir.path(), 0o555);

    // Privileged users bypass file modes; nothing to observe then.
    let writable = std::fs::OpenOptions::new().write(true).open(&path).is_ok();
    let result = if writable { None } else { Some(Store::open(&path)) };

    set_mode(dir.path(), 0o755);
    set_mode(&path, 0o644);

    if let Some(result) = result {
        let err = result.unwrap_err();
        assert!(matches!(err, DbError::StorageUnavailable { path: Some(ref p), .. } if p == &path));
        assert_eq!(RepoError::from(err).kind(), ErrorKind::StorageUnavailable);
    }
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match Store::open(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let store = Store::open_in_memory().unwrap();
    let result = store.connection().unwrap().execute(
        "INSERT INTO responses (prompt_id, text, created_at, updated_at) VALUES (404, 'orphan', 1, 1);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn close_is_safe_to_repeat_and_blocks_further_use() {
    let mut store = Store::open_in_memory().unwrap();
    store.close().unwrap();
    store.close().unwrap();

    let err = store.connection().unwrap_err();
    assert!(matches!(err, DbError::Closed));
    assert_eq!(RepoError::from(err).kind(), ErrorKind::StorageUnavailable);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
