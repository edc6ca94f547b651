//! The component set.
//!
//! Components are plain data records with no behaviour. The set is
//! closed: [`Component`] is an enum with one variant per kind, and the
//! registry keys everything on the [`ComponentKind`] tag. Typed access
//! goes through [`ComponentData`], so `world.get::<LoggingIn>(id)` is a
//! tag comparison plus a match, never a runtime type check.

use mudforge_transport::ConnectionId;

/// The tag of a [`Component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    HasConnection,
    LoggingIn,
    LoggingOut,
    InGameWorld,
}

/// The entity is bound to a live transport connection.
///
/// An entity holds at most one of these (like every component), which is
/// what makes "one connection per entity" hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasConnection {
    /// The bound connection.
    pub conn: ConnectionId,
    /// Set when the connection was moved here from another entity rather
    /// than freshly accepted. Login logic ignores such assignments.
    pub was_reassigned: bool,
}

impl HasConnection {
    /// A freshly accepted connection.
    pub fn new(conn: ConnectionId) -> Self {
        Self {
            conn,
            was_reassigned: false,
        }
    }

    /// A connection re-homed from another entity.
    pub fn reassigned(conn: ConnectionId) -> Self {
        Self {
            conn,
            was_reassigned: true,
        }
    }
}

/// Where an entity is in the username/password exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginState {
    #[default]
    WaitingUsername,
    WaitingPassword,
}

/// The entity is going through the login handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingIn {
    pub state: LoginState,
    /// The candidate username, once one has been entered.
    pub username: Option<String>,
}

/// Marker: the player asked to leave. When the entity's connection goes
/// away, the entity goes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoggingOut;

/// The entity is an authenticated player in the game world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InGameWorld {
    pub username: String,
}

impl InGameWorld {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Any component, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    HasConnection(HasConnection),
    LoggingIn(LoggingIn),
    LoggingOut(LoggingOut),
    InGameWorld(InGameWorld),
}

impl Component {
    /// This component's tag.
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::HasConnection(_) => ComponentKind::HasConnection,
            Self::LoggingIn(_) => ComponentKind::LoggingIn,
            Self::LoggingOut(_) => ComponentKind::LoggingOut,
            Self::InGameWorld(_) => ComponentKind::InGameWorld,
        }
    }
}

/// A concrete component payload with a constant tag.
///
/// Implemented for every payload type; it's what lets the registry and
/// the subscription helpers be generic over "a kind of component".
pub trait ComponentData: Into<Component> + Sized + 'static {
    /// The tag this payload is stored under.
    const KIND: ComponentKind;

    /// Borrows the payload out of `component` if it has this kind.
    fn from_component(component: &Component) -> Option<&Self>;

    /// Mutably borrows the payload out of `component` if it has this kind.
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
}

macro_rules! component_data {
    ($($name:ident),* $(,)?) => {
        $(
            impl From<$name> for Component {
                fn from(component: $name) -> Self {
                    Component::$name(component)
                }
            }

            impl ComponentData for $name {
                const KIND: ComponentKind = ComponentKind::$name;

                fn from_component(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$name(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                    match component {
                        Component::$name(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

component_data!(HasConnection, LoggingIn, LoggingOut, InGameWorld);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let conn = ConnectionId::new(1);
        assert_eq!(
            Component::from(HasConnection::new(conn)).kind(),
            ComponentKind::HasConnection
        );
        assert_eq!(
            Component::from(LoggingIn::default()).kind(),
            ComponentKind::LoggingIn
        );
        assert_eq!(Component::from(LoggingOut).kind(), ComponentKind::LoggingOut);
        assert_eq!(
            Component::from(InGameWorld::new("Celidur")).kind(),
            ComponentKind::InGameWorld
        );
    }

    #[test]
    fn test_from_component_wrong_kind_returns_none() {
        let component = Component::from(LoggingOut);
        assert!(InGameWorld::from_component(&component).is_none());
        assert!(LoggingOut::from_component(&component).is_some());
    }

    #[test]
    fn test_from_component_mut_allows_in_place_update() {
        let mut component = Component::from(LoggingIn::default());

        let login = LoggingIn::from_component_mut(&mut component).unwrap();
        login.state = LoginState::WaitingPassword;

        assert_eq!(
            LoggingIn::from_component(&component).unwrap().state,
            LoginState::WaitingPassword
        );
    }

    #[test]
    fn test_has_connection_constructors_set_reassigned_flag() {
        let conn = ConnectionId::new(5);
        assert!(!HasConnection::new(conn).was_reassigned);
        assert!(HasConnection::reassigned(conn).was_reassigned);
    }
}
