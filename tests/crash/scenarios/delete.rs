//! Delete crash test scenarios
//!
//! - Crash between row removal and renumbering → row still present, no gap

use crate::crash::harness::{assert_crashed_at, CrashDb};
use rankkeeper::crash_point::points;

/// Test: no gap if crash before renumber
#[test]
fn test_delete_crash_before_renumber_keeps_row() {
    let db = CrashDb::seeded(&["a", "b", "c", "d"]);

    let result = db.run_with_crash_point(points::DELETE_BEFORE_RENUMBER, &["delete", "--id", "b"]);
    assert_crashed_at(&result, points::DELETE_BEFORE_RENUMBER);

    let ranks = db.ranks();
    assert_eq!(ranks.len(), 4);
    assert_eq!(ranks[1], ("b".to_string(), 2));
    assert!(db.report().is_dense());

    // Retried delete completes
    db.expect_ok(&["delete", "--id", "b"]);
    assert_eq!(
        db.ranks(),
        vec![
            ("a".to_string(), 1),
            ("c".to_string(), 2),
            ("d".to_string(), 3)
        ]
    );
}
