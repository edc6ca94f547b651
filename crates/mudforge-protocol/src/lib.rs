//! Wire protocol for Mudforge.
//!
//! Clients speak newline-delimited UTF-8 text in both directions. This
//! crate covers the two things the server needs to understand them:
//!
//! - **Framing** ([`decode_line`]): turning the raw bytes of one line
//!   into a `String` (dropping a telnet-style `\r`, rejecting bad UTF-8).
//! - **Commands** ([`parse`], [`Command`]): turning a line typed by an
//!   in-game player into a structured command.
//!
//! # Architecture
//!
//! ```text
//! Transport (raw line bytes) → Protocol (String / Command) → Session (player context)
//! ```
//!
//! The protocol layer knows nothing about connections, entities, or who
//! is logged in. The session layer decides which lines are passwords and
//! which are commands.

mod command;
mod error;
mod line;

pub use command::{Command, Direction, parse};
pub use error::ProtocolError;
pub use line::decode_line;
