//! Error types for roster generation.

use thiserror::Error;

/// Result type for roster operations
pub type Result<T> = std::result::Result<T, RosterError>;

/// Errors that can occur while loading input or configuration
#[derive(Error, Debug)]
pub enum RosterError {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed availability CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Unparseable TOML configuration
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration parsed but holds out-of-range values
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The availability table has no timestamp column
    #[error("Missing timestamp column '{0}' in availability table")]
    MissingTimeColumn(String),
}
