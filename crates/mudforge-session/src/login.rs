//! The username/password handshake.
//!
//! ```text
//!  HasConnection assigned (fresh)
//!          │
//!          ▼
//!  ┌──────────────────┐  line   ┌──────────────────┐  match   LoginSuccess
//!  │ WaitingUsername  │ ──────→ │ WaitingPassword  │ ───────→ (LoggingIn removed)
//!  └──────────────────┘         └──────────────────┘
//!          ▲       mismatch (retry prompt)  │
//!          └────────────────────────────────┘
//! ```
//!
//! The state lives in the entity's [`LoggingIn`] component; the system
//! itself only holds the credential store.

use std::sync::Arc;

use mudforge_ecs::{
    HasConnection, LoggingIn, LoginState, LoginSuccess, PlayerInput, SendData, System,
    SystemContext, World,
};

use crate::CredentialStore;

pub const USERNAME_PROMPT: &str = "Welcome! Please enter your username: ";
pub const PASSWORD_PROMPT: &str = "Please enter your password: ";
pub const LOGGING_IN: &str = "Logging you in...\n";
pub const RETRY_PROMPT: &str =
    "\nYour username or password was incorrect. Please try again.\nPlease enter your username: ";

/// Runs the handshake for every freshly connected entity.
pub struct LoginSystem<C> {
    credentials: Arc<C>,
}

impl<C: CredentialStore> LoginSystem<C> {
    pub fn new(credentials: Arc<C>) -> Self {
        Self { credentials }
    }
}

impl<C: CredentialStore> System for LoginSystem<C> {
    fn name(&self) -> &'static str {
        "login"
    }

    fn configure(&mut self, ctx: &mut SystemContext<'_>) {
        ctx.on_assigned::<HasConnection>(|world, entity, conn| {
            // A re-homed connection belongs to someone already logged in.
            if conn.was_reassigned {
                return;
            }
            if let Err(e) = world.add_component(entity, LoggingIn::default()) {
                tracing::warn!(%entity, error = %e, "cannot start login");
                return;
            }
            world.emit(SendData::new(entity, USERNAME_PROMPT));
        });

        let credentials = Arc::clone(&self.credentials);
        ctx.subscribe::<PlayerInput>(move |world, input| {
            advance(world, credentials.as_ref(), input);
        });
    }
}

/// Feeds one input line into the entity's handshake, if it has one.
fn advance<C: CredentialStore>(world: &mut World, credentials: &C, input: &PlayerInput) {
    let entity = input.entity;
    let Some(login) = world.get_mut::<LoggingIn>(entity) else {
        return;
    };

    match login.state {
        LoginState::WaitingUsername => {
            login.username = Some(input.line.clone());
            login.state = LoginState::WaitingPassword;
            world.emit(SendData::new(entity, PASSWORD_PROMPT));
        }
        LoginState::WaitingPassword => {
            let username = login.username.take().unwrap_or_default();
            if credentials.verify(&username, &input.line) {
                world.emit(SendData::new(entity, LOGGING_IN));
                world.remove_component::<LoggingIn>(entity);
                tracing::info!(%entity, %username, "login succeeded");
                world.emit(LoginSuccess { username, entity });
            } else {
                login.state = LoginState::WaitingUsername;
                tracing::info!(%entity, "login failed");
                world.emit(SendData::new(entity, RETRY_PROMPT));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mudforge_ecs::{EntityId, EventKind};
    use mudforge_transport::ConnectionId;

    use super::*;
    use crate::InMemoryCredentials;

    /// A world with only the login system attached, plus logs of what it
    /// sent and which logins succeeded.
    struct Harness {
        world: World,
        sent: Arc<Mutex<Vec<String>>>,
        logins: Arc<Mutex<Vec<LoginSuccess>>>,
    }

    impl Harness {
        fn new() -> Self {
            let mut world = World::new();
            let credentials = InMemoryCredentials::new().with_account("Celidur", "password");
            world.add_system(LoginSystem::new(Arc::new(credentials)));

            let sent = Arc::new(Mutex::new(Vec::new()));
            let log = Arc::clone(&sent);
            world.subscribe::<SendData>(move |_, event| log.lock().unwrap().push(event.data.clone()));
            let logins = Arc::new(Mutex::new(Vec::new()));
            let log = Arc::clone(&logins);
            world.subscribe::<LoginSuccess>(move |_, event| log.lock().unwrap().push(event.clone()));

            Self {
                world,
                sent,
                logins,
            }
        }

        fn connect(&mut self) -> EntityId {
            let entity = self.world.create_entity().unwrap();
            self.world
                .add_component(entity, HasConnection::new(ConnectionId::new(1)))
                .unwrap();
            entity
        }

        fn input(&mut self, entity: EntityId, line: &str) {
            self.world.emit(PlayerInput::new(entity, line));
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_configure_subscribes_to_assignment_and_input() {
        let harness = Harness::new();
        assert_eq!(harness.world.subscriber_count(EventKind::ComponentAssigned), 1);
        assert_eq!(harness.world.subscriber_count(EventKind::PlayerInput), 1);
    }

    #[test]
    fn test_fresh_connection_starts_handshake() {
        let mut harness = Harness::new();

        let entity = harness.connect();

        assert_eq!(
            harness.world.get::<LoggingIn>(entity),
            Some(&LoggingIn::default())
        );
        assert_eq!(harness.sent(), vec![USERNAME_PROMPT]);
    }

    #[test]
    fn test_reassigned_connection_does_not_start_handshake() {
        let mut harness = Harness::new();
        let entity = harness.world.create_entity().unwrap();

        harness
            .world
            .add_component(entity, HasConnection::reassigned(ConnectionId::new(9)))
            .unwrap();

        assert!(!harness.world.has::<LoggingIn>(entity));
        assert!(harness.sent().is_empty());
    }

    #[test]
    fn test_username_advances_to_password() {
        let mut harness = Harness::new();
        let entity = harness.connect();

        harness.input(entity, "Celidur");

        let login = harness.world.get::<LoggingIn>(entity).unwrap();
        assert_eq!(login.state, LoginState::WaitingPassword);
        assert_eq!(login.username.as_deref(), Some("Celidur"));
        assert_eq!(harness.sent().last().map(String::as_str), Some(PASSWORD_PROMPT));
    }

    #[test]
    fn test_correct_password_emits_single_login_success() {
        let mut harness = Harness::new();
        let entity = harness.connect();

        harness.input(entity, "Celidur");
        harness.input(entity, "password");

        assert!(!harness.world.has::<LoggingIn>(entity));
        assert_eq!(
            *harness.logins.lock().unwrap(),
            vec![LoginSuccess {
                username: "Celidur".into(),
                entity,
            }]
        );
        assert_eq!(harness.sent().last().map(String::as_str), Some(LOGGING_IN));
    }

    #[test]
    fn test_wrong_password_returns_to_username() {
        let mut harness = Harness::new();
        let entity = harness.connect();

        harness.input(entity, "Celidur");
        harness.input(entity, "wrong");

        assert_eq!(
            harness.world.get::<LoggingIn>(entity).unwrap().state,
            LoginState::WaitingUsername
        );
        assert!(harness.logins.lock().unwrap().is_empty());
        assert_eq!(harness.sent().last().map(String::as_str), Some(RETRY_PROMPT));
    }

    #[test]
    fn test_unknown_username_gets_same_retry_prompt() {
        let mut harness = Harness::new();
        let entity = harness.connect();

        harness.input(entity, "Nobody");
        harness.input(entity, "password");

        assert!(harness.logins.lock().unwrap().is_empty());
        assert_eq!(harness.sent().last().map(String::as_str), Some(RETRY_PROMPT));
    }

    #[test]
    fn test_retry_after_failure_can_succeed() {
        let mut harness = Harness::new();
        let entity = harness.connect();

        for line in ["Celidur", "nope", "Celidur", "password"] {
            harness.input(entity, line);
        }

        assert_eq!(harness.logins.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_input_after_login_is_ignored() {
        let mut harness = Harness::new();
        let entity = harness.connect();
        harness.input(entity, "Celidur");
        harness.input(entity, "password");
        let before = harness.sent().len();

        harness.input(entity, "look");

        assert_eq!(harness.sent().len(), before);
        assert_eq!(harness.logins.lock().unwrap().len(), 1);
    }
}
