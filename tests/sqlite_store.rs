//! SQLite Store Tests
//!
//! The ordering core over a real database file:
//! - Uniqueness enforced by the schema, sentinel included
//! - Renumbering and repair under row-by-row constraint checks
//! - Rollback of self-owned transactions on disk
//! - Two connections sharing one scope

use rankkeeper::ordering::{OrderErrorCode, OrderMaintainer};
use rankkeeper::store::{
    NewRecord, OrderedRecord, Query, Rank, RecordId, RecordStore, Scope, SqliteStore, StoreError,
    TableLayout, SENTINEL_RANK,
};
use serde_json::json;
use tempfile::TempDir;

fn open(dir: &TempDir) -> SqliteStore {
    SqliteStore::open(dir.path().join("ranks.db"), TableLayout::default()).unwrap()
}

fn seed(m: &OrderMaintainer, store: &mut SqliteStore, scope: &Scope, ids: &[&str]) {
    for id in ids {
        m.insert(
            &mut *store,
            NewRecord::with_id(RecordId::new(*id), scope.clone(), json!({ "title": id })),
            None,
        )
        .unwrap();
    }
}

fn fetch(store: &SqliteStore, scope: &Scope, id: &str) -> OrderedRecord {
    store.find_by_id(scope, &RecordId::new(id)).unwrap().unwrap()
}

fn layout(m: &OrderMaintainer, store: &SqliteStore, scope: &Scope) -> Vec<(String, Rank)> {
    m.list(store, Query::scope(scope.clone()))
        .unwrap()
        .into_iter()
        .map(|r| (r.id.to_string(), r.order))
        .collect()
}

#[test]
fn test_scenario_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let m = OrderMaintainer::new();
    let scope = Scope::all();
    {
        let mut store = open(&dir);
        seed(&m, &mut store, &scope, &["A", "B", "C", "D"]);
        let mut c = fetch(&store, &scope, "C");
        m.move_up(&mut store, &scope, &mut c, None).unwrap();
        m.delete(&mut store, &scope, &RecordId::new("B"), None).unwrap();
    }

    let store = open(&dir);
    assert_eq!(
        layout(&m, &store, &scope),
        vec![("A".to_string(), 1), ("C".to_string(), 2), ("D".to_string(), 3)]
    );
    assert_eq!(fetch(&store, &scope, "C").payload, json!({"title": "C"}));
}

#[test]
fn test_schema_rejects_second_sentinel() {
    let dir = TempDir::new().unwrap();
    let m = OrderMaintainer::new();
    let scope = Scope::all();
    let mut store = open(&dir);
    seed(&m, &mut store, &scope, &["a", "b"]);

    store.set_order(&scope, &RecordId::new("a"), SENTINEL_RANK).unwrap();
    let err = store
        .set_order(&scope, &RecordId::new("b"), SENTINEL_RANK)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::UniqueViolation {
            order: SENTINEL_RANK,
            ..
        }
    ));
}

#[test]
fn test_delete_from_middle_of_large_scope() {
    let dir = TempDir::new().unwrap();
    let m = OrderMaintainer::new();
    let scope = Scope::partition("list-7");
    let mut store = open(&dir);
    let ids: Vec<String> = (0..50).map(|i| format!("r{:02}", i)).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    seed(&m, &mut store, &scope, &refs);

    m.delete(&mut store, &scope, &RecordId::new("r10"), None).unwrap();
    let ranks: Vec<Rank> = layout(&m, &store, &scope).into_iter().map(|(_, r)| r).collect();
    assert_eq!(ranks, (1..=49).collect::<Vec<Rank>>());
    assert_eq!(fetch(&store, &scope, "r11").order, 11);
    assert_eq!(fetch(&store, &scope, "r09").order, 10);
}

#[test]
fn test_locked_scope_on_disk() {
    let dir = TempDir::new().unwrap();
    let m = OrderMaintainer::new();
    let scope = Scope::all();
    let mut store = open(&dir);
    seed(&m, &mut store, &scope, &["a", "b", "c"]);

    // A move that died after parking its record and committed anyway
    store.set_order(&scope, &RecordId::new("b"), SENTINEL_RANK).unwrap();

    let mut c = fetch(&store, &scope, "c");
    let err = m.move_up(&mut store, &scope, &mut c, None).unwrap_err();
    assert_eq!(err.code(), OrderErrorCode::LockedScope);
    assert!(store.active_transaction().is_none());

    let report = m.verify_scope(&store, &scope).unwrap();
    assert_eq!(report.sentinel, Some(RecordId::new("b")));
    assert_eq!(report.gaps, vec![2]);

    let outcome = m.repair_scope(&mut store, &scope, None).unwrap();
    assert_eq!(outcome.reassigned, 1);
    assert!(m.verify_scope(&store, &scope).unwrap().is_dense());

    assert!(m.move_up(&mut store, &scope, &mut c, None).unwrap().is_moved());
    assert_eq!(
        layout(&m, &store, &scope),
        vec![("a".to_string(), 1), ("c".to_string(), 2), ("b".to_string(), 3)]
    );
}

#[test]
fn test_repair_reverses_rank_collisions() {
    let dir = TempDir::new().unwrap();
    let m = OrderMaintainer::new();
    let scope = Scope::all();
    let mut store = open(&dir);
    seed(&m, &mut store, &scope, &["a", "b", "c", "d"]);

    // Reverse the whole scope with ranks above N so the rewrite has to
    // pass through values other rows still hold
    for (id, rank) in [("a", 40), ("b", 30), ("c", 20), ("d", 10)] {
        store.set_order(&scope, &RecordId::new(id), rank).unwrap();
    }
    m.repair_scope(&mut store, &scope, None).unwrap();
    assert_eq!(
        layout(&m, &store, &scope),
        vec![
            ("d".to_string(), 1),
            ("c".to_string(), 2),
            ("b".to_string(), 3),
            ("a".to_string(), 4)
        ]
    );
}

#[test]
fn test_caller_transaction_rollback_on_disk() {
    let dir = TempDir::new().unwrap();
    let m = OrderMaintainer::new();
    let scope = Scope::all();
    let mut store = open(&dir);
    seed(&m, &mut store, &scope, &["a", "b", "c"]);

    let tx = store.begin_transaction().unwrap();
    let mut c = fetch(&store, &scope, "c");
    m.move_up(&mut store, &scope, &mut c, Some(&tx)).unwrap();
    m.delete(&mut store, &scope, &RecordId::new("a"), Some(&tx)).unwrap();
    store.rollback(tx).unwrap();

    let reopened = open(&dir);
    assert_eq!(
        layout(&m, &reopened, &scope),
        vec![("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)]
    );
}

#[test]
fn test_second_connection_sees_committed_move() {
    let dir = TempDir::new().unwrap();
    let m = OrderMaintainer::new();
    let scope = Scope::all();
    let mut first = open(&dir);
    seed(&m, &mut first, &scope, &["a", "b"]);

    let tx = first.begin_transaction().unwrap();
    let mut b = fetch(&first, &scope, "b");
    m.move_up(&mut first, &scope, &mut b, Some(&tx)).unwrap();
    first.commit(tx).unwrap();

    let mut second = open(&dir);
    let c = m
        .insert(
            &mut second,
            NewRecord::with_id(RecordId::new("c"), scope.clone(), json!({})),
            None,
        )
        .unwrap();
    assert_eq!(c.order, 3);
    assert_eq!(
        layout(&m, &first, &scope),
        vec![("b".to_string(), 1), ("a".to_string(), 2), ("c".to_string(), 3)]
    );
}

#[test]
fn test_custom_table_layout() {
    let dir = TempDir::new().unwrap();
    let m = OrderMaintainer::new();
    let layout_cfg = TableLayout::new("tasks", "position").unwrap();
    let mut store = SqliteStore::open(dir.path().join("tasks.db"), layout_cfg).unwrap();
    let scope = Scope::partition("board-1");

    seed(&m, &mut store, &scope, &["t1", "t2"]);
    let mut t2 = fetch(&store, &scope, "t2");
    m.move_up(&mut store, &scope, &mut t2, None).unwrap();
    assert_eq!(
        layout(&m, &store, &scope),
        vec![("t2".to_string(), 1), ("t1".to_string(), 2)]
    );

    assert!(TableLayout::new("tasks; --", "position").is_err());
}
