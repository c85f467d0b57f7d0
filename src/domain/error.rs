use thiserror::Error;

/// Failure reported by a persistence handler.
///
/// The cache layer never produces, wraps or translates these; whatever the
/// inner handler returns reaches the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("{what} `{identifier}` not found")]
    NotFound {
        what: &'static str,
        identifier: String,
    },
    #[error("invalid argument `{argument}`: {message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },
    #[error("bad state: {message}")]
    BadState { message: String },
    #[error("conflicting concurrent modification: {message}")]
    Conflict { message: String },
    #[error("storage error: {0}")]
    Storage(String),
}

impl PersistenceError {
    pub fn not_found(what: &'static str, identifier: impl ToString) -> Self {
        Self::NotFound {
            what,
            identifier: identifier.to_string(),
        }
    }

    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    pub fn bad_state(message: impl Into<String>) -> Self {
        Self::BadState {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn from_storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
