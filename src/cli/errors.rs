//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::continuity::ContinuityError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing, malformed or invalid
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Planner refused to build a plan
    PlanRejected,
    /// Saved manifest no longer matches its hash
    AuditMismatch,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONTINUITY_CLI_CONFIG_ERROR",
            Self::IoError => "CONTINUITY_CLI_IO_ERROR",
            Self::PlanRejected => "CONTINUITY_CLI_PLAN_REJECTED",
            Self::AuditMismatch => "CONTINUITY_CLI_AUDIT_MISMATCH",
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

    pub fn plan_rejected(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::PlanRejected, msg)
    }

    pub fn audit_mismatch(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::AuditMismatch, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

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

impl From<ContinuityError> for CliError {
    fn from(e: ContinuityError) -> Self {
        let message = format!("{} ({})", e, e.code());
        match e {
            ContinuityError::NoPrimary | ContinuityError::NoSuitableTarget => {
                Self::plan_rejected(message)
            }
            ContinuityError::Io(_)
            | ContinuityError::Serialization(_)
            | ContinuityError::ActionFailed { .. } => Self::io_error(message),
            ContinuityError::InvalidClusterSize(_)
            | ContinuityError::InvalidNode { .. }
            | ContinuityError::DuplicateNode(_)
            | ContinuityError::InvalidHeartbeat { .. }
            | ContinuityError::InvalidPolicy(_) => Self::config_error(message),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
