//! Error types for the session layer.

/// Errors that can occur while setting up the session systems.
///
/// The systems themselves never fail at runtime: a wrong password or an
/// unknown command is an answer to the player, not an error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The accounts data isn't a JSON object of `username → password`.
    #[error("invalid credentials file: {0}")]
    InvalidCredentials(#[source] serde_json::Error),

    /// The accounts file couldn't be read.
    #[error("failed to read credentials: {0}")]
    Io(#[from] std::io::Error),
}
