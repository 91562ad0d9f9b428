//! Move crash test scenarios
//!
//! - Crash with the record parked on the sentinel → scope unchanged, not locked
//! - Crash after the neighbor moved → scope unchanged, not locked

use crate::crash::harness::{assert_crashed_at, CrashDb};
use rankkeeper::crash_point::points;

fn before() -> Vec<(String, u32)> {
    vec![
        ("a".to_string(), 1),
        ("b".to_string(), 2),
        ("c".to_string(), 3),
    ]
}

/// Test: crash after step 1 leaves no sentinel behind
#[test]
fn test_move_crash_after_sentinel_leaves_scope_dense() {
    let db = CrashDb::seeded(&["a", "b", "c"]);

    let result = db.run_with_crash_point(points::MOVE_AFTER_SENTINEL, &["move-up", "--id", "c"]);
    assert_crashed_at(&result, points::MOVE_AFTER_SENTINEL);

    assert_eq!(db.ranks(), before());
    assert!(db.report().is_dense());
}

/// Test: crash after step 2 leaves no half-swapped pair
#[test]
fn test_move_crash_after_neighbor_leaves_scope_dense() {
    let db = CrashDb::seeded(&["a", "b", "c"]);

    let result = db.run_with_crash_point(points::MOVE_AFTER_NEIGHBOR, &["move-down", "--id", "a"]);
    assert_crashed_at(&result, points::MOVE_AFTER_NEIGHBOR);

    assert_eq!(db.ranks(), before());
    assert!(db.report().is_dense());
}

/// Test: the scope accepts moves again right after a crashed move
#[test]
fn test_scope_not_wedged_after_crashed_move() {
    let db = CrashDb::seeded(&["a", "b", "c"]);

    let crashed = db.run_with_crash_point(points::MOVE_AFTER_SENTINEL, &["move-up", "--id", "b"]);
    assert_crashed_at(&crashed, points::MOVE_AFTER_SENTINEL);

    let data = db.expect_ok(&["move-up", "--id", "b"]);
    assert_eq!(data["result"], "moved");
    assert_eq!(data["from"], 2);
    assert_eq!(data["to"], 1);
    assert_eq!(
        db.ranks(),
        vec![
            ("b".to_string(), 1),
            ("a".to_string(), 2),
            ("c".to_string(), 3)
        ]
    );
}

/// Test: a boundary no-op never reaches a crash point
#[test]
fn test_boundary_move_skips_crash_points() {
    let db = CrashDb::seeded(&["a", "b"]);

    let result = db.run_with_crash_point(points::MOVE_AFTER_SENTINEL, &["move-up", "--id", "a"]);
    assert!(!result.crashed);
    let response = result.response();
    assert_eq!(response["data"]["result"], "unchanged");
    assert_eq!(response["data"]["boundary"], "first");
}
