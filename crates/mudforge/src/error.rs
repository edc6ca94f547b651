//! Unified error type for Mudforge.

use mudforge_ecs::EntityId;
use mudforge_protocol::ProtocolError;
use mudforge_session::SessionError;
use mudforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MudError {
    /// A transport-level error (bind, accept, send).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (undecodable line, unknown command).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (credentials file).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A configuration value couldn't be used.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why a connection ownership switch was refused.
///
/// Always a wiring bug in whoever asked for the switch, never something a
/// player can cause. The switch is aborted before anything changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// The source entity holds no connection to hand over.
    #[error("entity {0} has no connection to switch")]
    NoConnection(EntityId),

    /// Source and target are the same entity.
    #[error("cannot switch entity {0} onto itself")]
    SelfSwitch(EntityId),

    /// The target entity doesn't exist.
    #[error("switch target {0} does not exist")]
    NoSuchEntity(EntityId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let mud_err: MudError = err.into();
        assert!(matches!(mud_err, MudError::Transport(_)));
        assert!(mud_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownCommand("dance".into());
        let mud_err: MudError = err.into();
        assert!(matches!(mud_err, MudError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = mudforge_session::InMemoryCredentials::from_json_str("[]").unwrap_err();
        let mud_err: MudError = err.into();
        assert!(matches!(mud_err, MudError::Session(_)));
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy");
        let mud_err: MudError = err.into();
        assert!(matches!(mud_err, MudError::Io(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = MudError::Config("PORT must be a number".into());
        assert_eq!(err.to_string(), "invalid configuration: PORT must be a number");
    }
}
