//! Player session systems for Mudforge.
//!
//! Two systems sit on top of the registry and turn raw input lines into
//! a logged-in player:
//!
//! 1. **Login** ([`LoginSystem`]): the username/password handshake each
//!    new connection goes through, checked against a [`CredentialStore`].
//! 2. **Routing** ([`SessionRouter`]): what happens after. It places the
//!    player in the world (re-attaching them to the identity they left
//!    behind if the connection dropped), answers commands, and releases
//!    the entity after `quit`.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)       ← owns the world, attaches the network system first
//!     ↕
//! Session (this crate) ← LoginSystem, SessionRouter
//!     ↕
//! ECS + Protocol       ← World, components, events; the command parser
//! ```
//!
//! # Registration order
//!
//! Attach the router *before* the login system. Both subscribe to
//! `PlayerInput`; with the router first, the password line that completes
//! a login has already been passed over by the router (the entity wasn't
//! in the world yet) and is never treated as a command.

mod credentials;
mod error;
mod login;
mod router;

pub use credentials::{CredentialStore, InMemoryCredentials};
pub use error::SessionError;
pub use login::{LOGGING_IN, LoginSystem, PASSWORD_PROMPT, RETRY_PROMPT, USERNAME_PROMPT};
pub use router::{FAREWELL, SessionRouter, UNHANDLED_REPLY, UNKNOWN_REPLY, UsernameDirectory};
