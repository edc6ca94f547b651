//! Error types for the protocol layer.

/// Errors that can occur while decoding or parsing client input.
///
/// None of these are fatal to a connection. The session layer reports
/// them back to the player (or drops the line) and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The line was not valid UTF-8.
    #[error("line is not valid UTF-8 (first bad byte at {0})")]
    InvalidUtf8(usize),

    /// Nothing to parse (blank or whitespace-only line).
    #[error("empty command")]
    Empty,

    /// The first word is not a verb we know.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A known verb with missing or unusable arguments.
    /// For example `go` with no direction, or `sayto` with no message.
    #[error("malformed {verb} command: {reason}")]
    Malformed {
        /// The verb that was recognised.
        verb: &'static str,
        /// What was wrong with its arguments.
        reason: &'static str,
    },
}
