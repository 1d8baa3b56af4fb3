//! Error types for psql-lite.
//!
//! Defines the main error enum used throughout the runner.

use thiserror::Error;

/// Main error type for psql-lite operations.
#[derive(Error, Debug)]
pub enum PsqlError {
    /// Input stream errors (nothing ready to read, unreadable or non-UTF-8 input).
    #[error("Input error: {0}")]
    Input(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution errors (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Output sink errors (closed pipe, full disk, etc.)
    #[error("Output error: {0}")]
    Output(String),

    /// Configuration errors (invalid config file, missing required values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PsqlError {
    /// Creates an input error with the given message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an output error with the given message.
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Input(_) => "Input Error",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Output(_) => "Output Error",
            Self::Config(_) => "Configuration Error",
        }
    }

    /// Returns the bare message without the category prefix.
    ///
    /// This is what ends up on the error sink, so database diagnostics are
    /// reported exactly as the server phrased them.
    pub fn description(&self) -> &str {
        match self {
            Self::Input(msg)
            | Self::Connection(msg)
            | Self::Query(msg)
            | Self::Output(msg)
            | Self::Config(msg) => msg,
        }
    }
}

/// Result type alias using PsqlError.
pub type Result<T> = std::result::Result<T, PsqlError>;
