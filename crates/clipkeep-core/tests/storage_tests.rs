use clipkeep_core::collab::{AuditLog, LockSource};
use clipkeep_core::storage::{Database, Store};

#[test]
fn test_record_and_query_deletion() {
    let db = Database::open_in_memory().unwrap();
    assert!(!db.has_deletion_record("/clips/owl_80p_20210102T150405Z.wav").unwrap());

    let id = db
        .record_deletion("/clips/owl_80p_20210102T150405Z.wav")
        .unwrap();
    assert!(id > 0);
    assert!(db.has_deletion_record("/clips/owl_80p_20210102T150405Z.wav").unwrap());
    assert!(!db.has_deletion_record("/clips/duck_80p_20210102T150405Z.wav").unwrap());
    assert_eq!(db.deletion_count().unwrap(), 1);
}

#[test]
fn test_recent_deletions_newest_first() {
    let db = Database::open_in_memory().unwrap();
    for name in ["a.wav", "b.wav", "c.wav"] {
        db.record_deletion(name).unwrap();
    }

    let recent = db.recent_deletions(2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].filename, "c.wav");
    assert_eq!(recent[1].filename, "b.wav");
    assert!(chrono::DateTime::parse_from_rfc3339(&recent[0].deleted_at).is_ok());
}

#[test]
fn test_locked_clip_paths_roundtrip() {
    let db = Database::open_in_memory().unwrap();
    db.insert_locked_clip("2024/06/owl_80p_20240601T000000Z.wav")
        .unwrap();
    db.insert_locked_clip("2024/06/owl_80p_20240601T000000Z.wav")
        .unwrap();
    db.insert_locked_clip("/abs/duck_70p_20240601T000000Z.wav")
        .unwrap();

    let paths = db.locked_clip_paths().unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths.contains("/abs/duck_70p_20240601T000000Z.wav"));

    assert!(db
        .remove_locked_clip("/abs/duck_70p_20240601T000000Z.wav")
        .unwrap());
    assert!(!db.remove_locked_clip("/abs/never-locked.wav").unwrap());
    assert_eq!(db.list_locked_clips().unwrap().len(), 1);
}

#[test]
fn test_audit_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("audit.db");
    let db_path = db_path.to_str().unwrap();

    {
        let db = Database::open(db_path).unwrap();
        db.record_deletion("a.wav").unwrap();
    }

    let db = Database::open(db_path).unwrap();
    assert!(db.has_deletion_record("a.wav").unwrap());
}

#[test]
fn test_reopen_at_current_version_skips_schema() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("audit.db");
    let db_path = db_path.to_str().unwrap();

    {
        let db = Database::open(db_path).unwrap();
        assert_eq!(db.schema_version().unwrap(), 1);
        // Only a fresh database gets the schema; a dropped index stays dropped.
        db.connection()
            .execute_batch("DROP INDEX idx_deletion_audit_filename;")
            .unwrap();
    }

    let db = Database::open(db_path).unwrap();
    assert_eq!(db.schema_version().unwrap(), 1);
    let index_count: i64 = db
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'idx_deletion_audit_filename'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(index_count, 0);
}

#[test]
fn test_store_implements_collaborators() {
    let store = Store::open_in_memory().unwrap();
    store
        .db()
        .unwrap()
        .insert_locked_clip("/clips/owl.wav")
        .unwrap();

    let locked = store.locked_clip_paths().unwrap();
    assert!(locked.contains("/clips/owl.wav"));

    store.record_deletion("/clips/duck.wav").unwrap();
    assert!(store.has_deletion_record("/clips/duck.wav").unwrap());
}
