//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the engine reports back to its callers.

use thiserror::Error;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently from the calculation layer up to the API.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::InvalidPeriod { year: 2025, month: 13 };
/// assert_eq!(error.to_string(), "Invalid payroll period: 2025-13");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// The year/month pair does not denote a calendar month.
    #[error("Invalid payroll period: {year}-{month}")]
    InvalidPeriod {
        /// The requested year.
        year: i32,
        /// The requested month.
        month: u32,
    },

    /// A period designator string could not be parsed.
    #[error("Invalid period format '{value}': expected YYYY-M, YYYY-MM-DD or RFC 3339")]
    InvalidPeriodFormat {
        /// The raw value that failed to parse.
        value: String,
    },

    /// No payroll run exists with the given id.
    #[error("Payroll run not found: {run_id}")]
    RunNotFound {
        /// The missing run id.
        run_id: i64,
    },

    /// No employee exists with the given id.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The missing employee id.
        employee_id: i64,
    },

    /// No payroll item exists with the given id.
    #[error("Payroll item not found: {item_id}")]
    ItemNotFound {
        /// The missing item id.
        item_id: i64,
    },

    /// A record failed validation before any mutation took place.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The storage backend failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the backend failure.
        message: String,
    },

    /// Token signing or password hash handling failed.
    #[error("Authentication error: {message}")]
    Auth {
        /// A description of the failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl EngineError {
    /// Builds a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds a [`EngineError::Auth`] error with a context prefix.
    pub fn auth(context: &str, error: impl std::fmt::Display) -> Self {
        EngineError::Auth {
            message: format!("{context}: {error}"),
        }
    }

    /// Builds a [`EngineError::Storage`] error with a context prefix.
    pub fn storage(context: &str, error: impl std::fmt::Display) -> Self {
        EngineError::Storage {
            message: format!("{context}: {error}"),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
