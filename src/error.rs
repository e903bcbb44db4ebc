use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes surfaced to users. Display strings are the exact
/// user-facing notice texts, so callers can toast `err.to_string()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// An operation that needs a signed-in user ran without one.
    #[error("Please log in to continue.")]
    AuthenticationRequired,

    /// Login rejected. Never distinguishes unknown email from bad password.
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// The requested diagram id does not resolve. Terminal for the caller.
    #[error("The requested resource was not found.")]
    NotFound,

    /// Share target email has no account.
    #[error("User not found with that email.")]
    UserNotFound,

    /// The capability check said no, or the store rejected the write.
    #[error("You don't have permission to perform this action.")]
    PermissionDenied,

    /// Backend failure. Local state survives so the caller can retry.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
