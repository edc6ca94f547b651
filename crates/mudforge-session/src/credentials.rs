//! Where passwords come from.
//!
//! The login handshake doesn't know or care how accounts are stored. It
//! asks a [`CredentialStore`] for the password of a username and compares
//! strings. Swap the store to change the policy (a file, a database, a
//! hashing scheme) without touching the handshake.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::SessionError;

/// Read-only account lookup.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because the store is shared (behind an `Arc`)
/// with bus handlers, and the world they live in moves into its own task.
pub trait CredentialStore: Send + Sync + 'static {
    /// The stored password for `username`, if the account exists.
    fn lookup(&self, username: &str) -> Option<String>;

    /// Returns `true` if `password` is exactly the stored password for
    /// `username`. Unknown usernames never verify.
    fn verify(&self, username: &str, password: &str) -> bool {
        self.lookup(username)
            .is_some_and(|stored| stored == password)
    }
}

/// A fixed set of accounts held in memory.
///
/// Deserializes from a flat JSON object of `username → password`:
///
/// ```
/// use mudforge_session::{CredentialStore, InMemoryCredentials};
///
/// let store = InMemoryCredentials::from_json_str(r#"{ "Celidur": "password" }"#).unwrap();
/// assert!(store.verify("Celidur", "password"));
/// assert!(!store.verify("Celidur", "Password"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct InMemoryCredentials {
    accounts: HashMap<String, String>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_account(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.insert(username, password);
        self
    }

    /// Adds or replaces an account.
    pub fn insert(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.accounts.insert(username.into(), password.into());
    }

    /// Parses a JSON object of `username → password`.
    ///
    /// # Errors
    /// [`SessionError::InvalidCredentials`] if the text isn't such an
    /// object.
    pub fn from_json_str(json: &str) -> Result<Self, SessionError> {
        serde_json::from_str(json).map_err(SessionError::InvalidCredentials)
    }

    /// Reads and parses an accounts file.
    ///
    /// # Errors
    /// [`SessionError::Io`] if the file can't be read,
    /// [`SessionError::InvalidCredentials`] if it doesn't parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl CredentialStore for InMemoryCredentials {
    fn lookup(&self, username: &str) -> Option<String> {
        self.accounts.get(username).cloned()
    }
}
