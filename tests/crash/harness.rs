//! Crash test harness for subprocess management
//!
//! - Starts the `rankkeeper` binary against a temp database
//! - Injects crashes via `RANKKEEPER_CRASH_POINT`
//! - Reads post-crash state straight from the database file

use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use rankkeeper::crash_point::CRASH_POINT_ENV;
use rankkeeper::ordering::{OrderMaintainer, ScopeReport};
use rankkeeper::store::{Query, Rank, RecordId, RecordStore, Scope, SqliteStore, TableLayout};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Result of one `rankkeeper` invocation
#[derive(Debug)]
pub struct CrashTestResult {
    /// Whether the process died instead of exiting cleanly
    pub crashed: bool,
    pub exit_status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
}

impl CrashTestResult {
    /// Parsed stdout response line
    pub fn response(&self) -> Value {
        serde_json::from_str(self.stdout.trim()).unwrap_or_else(|e| {
            panic!(
                "stdout is not a JSON response ({}): {:?}\nstderr:\n{}",
                e, self.stdout, self.stderr
            )
        })
    }
}

/// A temp database driven through the CLI
pub struct CrashDb {
    dir: TempDir,
    config: PathBuf,
}

impl CrashDb {
    /// Initialize a database and insert `ids` in order into the whole-table scope
    pub fn seeded(ids: &[&str]) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config = dir.path().join("rankkeeper.json");
        let db = dir.path().join("ranks.db");
        fs::write(
            &config,
            json!({ "database_path": db.to_string_lossy() }).to_string(),
        )
        .expect("write config");

        let harness = Self { dir, config };
        harness.expect_ok(&["init"]);
        for &id in ids {
            harness.expect_ok(&["insert", "--id", id, "--payload", r#"{"seed":true}"#]);
        }
        harness
    }

    /// Run a command without crash injection
    pub fn run(&self, args: &[&str]) -> CrashTestResult {
        self.execute(None, args)
    }

    /// Run a command with `crash_point` armed
    pub fn run_with_crash_point(&self, crash_point: &str, args: &[&str]) -> CrashTestResult {
        self.execute(Some(crash_point), args)
    }

    /// Run a command that must succeed and return its `data`
    pub fn expect_ok(&self, args: &[&str]) -> Value {
        let result = self.run(args);
        let response = result.response();
        assert_eq!(
            response["status"], "ok",
            "rankkeeper {:?} failed: {}\nstderr:\n{}",
            args, response, result.stderr
        );
        response["data"].clone()
    }

    fn execute(&self, crash_point: Option<&str>, args: &[&str]) -> CrashTestResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_rankkeeper"));
        cmd.args(args).arg("--config").arg(&self.config);
        cmd.env_remove(CRASH_POINT_ENV);
        if let Some(point) = crash_point {
            cmd.env(CRASH_POINT_ENV, point);
        }

        match cmd.output() {
            Ok(output) => CrashTestResult {
                crashed: output.status.code().is_none(),
                exit_status: Some(output.status),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            },
            Err(e) => CrashTestResult {
                crashed: true,
                exit_status: None,
                stdout: String::new(),
                stderr: format!("Failed to execute: {}", e),
            },
        }
    }

    /// Open the database directly
    pub fn store(&self) -> SqliteStore {
        SqliteStore::open(self.dir.path().join("ranks.db"), TableLayout::default())
            .expect("open database")
    }

    /// `(id, rank)` in rank order
    pub fn ranks(&self) -> Vec<(String, Rank)> {
        OrderMaintainer::new()
            .list(&self.store(), Query::scope(Scope::all()))
            .expect("list scope")
            .into_iter()
            .map(|r| (r.id.to_string(), r.order))
            .collect()
    }

    pub fn report(&self) -> ScopeReport {
        OrderMaintainer::new()
            .verify_scope(&self.store(), &Scope::all())
            .expect("verify scope")
    }

    /// Put a record on a rank behind the ordering core's back
    pub fn plant_rank(&self, id: &str, rank: Rank) {
        self.store()
            .set_order(&Scope::all(), &RecordId::new(id), rank)
            .expect("plant rank");
    }
}

/// Assert the process died at `crash_point` and printed no response
pub fn assert_crashed_at(result: &CrashTestResult, crash_point: &str) {
    if !result.crashed {
        report_failure(crash_point, "crash", "process abort", &result.stdout, &result.stderr);
        panic!("process did not crash at {}", crash_point);
    }
    assert!(result.stdout.trim().is_empty());
    assert!(result.stderr.contains(crash_point));
}

/// Report crash test failure
pub fn report_failure(crash_point: &str, operation: &str, expected: &str, actual: &str, logs: &str) {
    eprintln!("=== CRASH TEST FAILURE ===");
    eprintln!("Crash point: {}", crash_point);
    eprintln!("Operation: {}", operation);
    eprintln!("Expected: {}", expected);
    eprintln!("Actual: {}", actual);
    eprintln!("Logs:\n{}", logs);
    eprintln!("==========================");
}
