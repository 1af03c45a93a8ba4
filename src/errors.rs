//! Error handling for the voting system

/// Result type alias for the voting system
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the voting system
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Menu or ballot input that could not be understood
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Registrant is below the minimum voting age
    #[error("Voter must be at least {minimum} years old (got {age})")]
    Ineligible { age: u32, minimum: u32 },

    /// Voter already has a recorded vote
    #[error("Voter {voter_id} has already voted")]
    DuplicateVote { voter_id: String },

    /// Voter id was never issued
    #[error("Unknown voter ID: {voter_id}")]
    UnknownVoterId { voter_id: String },

    /// No free voter id found within the attempt bound
    #[error("Could not allocate a unique voter ID after {attempts} attempts")]
    IdExhausted { attempts: u32 },

    /// Storage invariant violations and backend failures
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// SQLite errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON encoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Console I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the session can carry on after reporting this error.
    ///
    /// Storage, I/O and configuration failures abort the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::Ineligible { .. }
                | Self::DuplicateVote { .. }
                | Self::UnknownVoterId { .. }
        )
    }
}

/// Convenience macros for creating specific error types
#[macro_export]
macro_rules! input_error {
    ($msg:expr) => {
        $crate::Error::invalid_input($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::invalid_input(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr) => {
        $crate::Error::storage($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::storage(format!($fmt, $($arg)*))
    };
}
