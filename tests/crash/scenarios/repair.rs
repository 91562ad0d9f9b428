//! Repair scenarios
//!
//! A store that lets a partial move commit leaves a sentinel behind. These
//! plant that state directly and check the CLI brings the scope back.

use crate::crash::harness::CrashDb;
use rankkeeper::store::SENTINEL_RANK;

/// Test: locked scope rejects moves until repaired
#[test]
fn test_planted_sentinel_locks_until_repair() {
    let db = CrashDb::seeded(&["a", "b", "c"]);
    db.plant_rank("c", SENTINEL_RANK);

    let rejected = db.run(&["move-up", "--id", "b"]);
    assert!(!rejected.crashed);
    assert!(!rejected.exit_status.map(|s| s.success()).unwrap_or(true));
    let response = rejected.response();
    assert_eq!(response["status"], "error");
    assert_eq!(response["code"], "ORDER_LOCKED_SCOPE");

    let verify = db.expect_ok(&["verify"]);
    assert_eq!(verify["dense"], false);
    assert_eq!(verify["report"]["sentinel"], "c");

    let repaired = db.expect_ok(&["repair"]);
    assert_eq!(repaired["reassigned"], 1);
    assert_eq!(
        db.ranks(),
        vec![
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("c".to_string(), 3)
        ]
    );

    db.expect_ok(&["move-up", "--id", "b"]);
}

/// Test: sentinel with the neighbor already shifted completes the move
#[test]
fn test_repair_completes_half_done_swap() {
    let db = CrashDb::seeded(&["a", "b", "c"]);
    // c was moving up: c parked, b already took rank 3
    db.plant_rank("c", SENTINEL_RANK);
    db.plant_rank("b", 3);

    db.expect_ok(&["repair"]);
    assert_eq!(
        db.ranks(),
        vec![
            ("a".to_string(), 1),
            ("c".to_string(), 2),
            ("b".to_string(), 3)
        ]
    );
    assert_eq!(db.expect_ok(&["verify"])["dense"], true);
}
