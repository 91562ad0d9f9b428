//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code after one
//! JSON error line on stdout.

use std::fmt;
use std::io;

use crate::ordering::OrderError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout/JSON)
    IoError,
    /// Database already exists
    AlreadyInitialized,
    /// Database missing
    NotInitialized,
    /// Bad argument value
    InvalidArgument,
    /// Ordering operation failed; carries its own code
    Order(crate::ordering::OrderErrorCode),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "RANK_CLI_CONFIG_ERROR",
            Self::IoError => "RANK_CLI_IO_ERROR",
            Self::AlreadyInitialized => "RANK_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "RANK_CLI_NOT_INITIALIZED",
            Self::InvalidArgument => "RANK_CLI_INVALID_ARGUMENT",
            Self::Order(code) => code.code(),
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidArgument, msg)
    }

    pub fn already_initialized(path: &std::path::Path) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("database {} already exists", path.display()),
        )
    }

    pub fn not_initialized(path: &std::path::Path) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!(
                "database {} not found. Run 'rankkeeper init' first.",
                path.display()
            ),
        )
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<OrderError> for CliError {
    fn from(e: OrderError) -> Self {
        Self::new(CliErrorCode::Order(e.code()), e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        OrderError::from(e).into()
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
