//! Insert crash test scenarios
//!
//! - Crash after rank assignment, before the row is written → nothing written

use crate::crash::harness::{assert_crashed_at, CrashDb};
use rankkeeper::crash_point::points;

/// Test: half-done insert leaves no row and no reserved rank
#[test]
fn test_insert_crash_before_write_writes_nothing() {
    let db = CrashDb::seeded(&["a", "b"]);

    let result = db.run_with_crash_point(points::INSERT_BEFORE_WRITE, &["insert", "--id", "c"]);
    assert_crashed_at(&result, points::INSERT_BEFORE_WRITE);
    assert_eq!(db.ranks().len(), 2);

    let data = db.expect_ok(&["insert", "--id", "c"]);
    assert_eq!(data["order"], 3);
    assert!(db.report().is_dense());
}
