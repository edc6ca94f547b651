//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use mudforge_transport::DEFAULT_MAX_LINE_LEN;

use crate::MudError;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3333";
/// Default idle period after which a silent connection is closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Configuration for a [`MudServer`](crate::MudServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// How long a connection may stay silent before it is closed.
    pub idle_timeout: Duration,
    /// Longest line a client may send; longer ones drop the connection.
    pub max_line_len: usize,
    /// JSON accounts file (`{ "user": "password" }`), if any.
    pub accounts_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            accounts_path: None,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `PORT` | listen on `0.0.0.0:$PORT` |
    /// | `MUDFORGE_IDLE_TIMEOUT_SECS` | idle timeout in whole seconds |
    /// | `MUDFORGE_MAX_LINE_LEN` | longest accepted line, in bytes |
    /// | `MUDFORGE_ACCOUNTS` | path of a JSON accounts file |
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    /// [`MudError::Config`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, MudError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MudError> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| MudError::Config(format!("PORT must be a port number, got {port:?}")))?;
            config.bind_addr = format!("0.0.0.0:{port}");
        }

        if let Some(secs) = lookup("MUDFORGE_IDLE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                MudError::Config(format!(
                    "MUDFORGE_IDLE_TIMEOUT_SECS must be a number of seconds, got {secs:?}"
                ))
            })?;
            if secs == 0 {
                return Err(MudError::Config(
                    "MUDFORGE_IDLE_TIMEOUT_SECS must be greater than zero".into(),
                ));
            }
            config.idle_timeout = Duration::from_secs(secs);
        }

        if let Some(len) = lookup("MUDFORGE_MAX_LINE_LEN") {
            config.max_line_len = len
                .trim()
                .parse()
                .ok()
                .filter(|&n: &usize| n > 0)
                .ok_or_else(|| {
                    MudError::Config(format!(
                        "MUDFORGE_MAX_LINE_LEN must be a positive byte count, got {len:?}"
                    ))
                })?;
        }

        config.accounts_path = lookup("MUDFORGE_ACCOUNTS")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_empty_gives_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr, "0.0.0.0:3333");
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.max_line_len, 4096);
    }

    #[test]
    fn test_from_lookup_port_sets_bind_addr() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "4000")])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:4000");
    }

    #[test]
    fn test_from_lookup_bad_port_is_config_error() {
        let result = ServerConfig::from_lookup(lookup(&[("PORT", "telnet")]));
        assert!(matches!(result, Err(MudError::Config(_))));

        let result = ServerConfig::from_lookup(lookup(&[("PORT", "70000")]));
        assert!(matches!(result, Err(MudError::Config(_))));
    }

    #[test]
    fn test_from_lookup_idle_timeout_and_accounts() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("MUDFORGE_IDLE_TIMEOUT_SECS", "30"),
            ("MUDFORGE_ACCOUNTS", "/etc/mud/accounts.json"),
        ]))
        .unwrap();

        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert_eq!(
            config.accounts_path,
            Some(PathBuf::from("/etc/mud/accounts.json"))
        );
    }

    #[test]
    fn test_from_lookup_zero_idle_timeout_is_rejected() {
        let result = ServerConfig::from_lookup(lookup(&[("MUDFORGE_IDLE_TIMEOUT_SECS", "0")]));
        assert!(matches!(result, Err(MudError::Config(_))));
    }

    #[test]
    fn test_from_lookup_max_line_len() {
        let config = ServerConfig::from_lookup(lookup(&[("MUDFORGE_MAX_LINE_LEN", "512")])).unwrap();
        assert_eq!(config.max_line_len, 512);

        let result = ServerConfig::from_lookup(lookup(&[("MUDFORGE_MAX_LINE_LEN", "0")]));
        assert!(matches!(result, Err(MudError::Config(_))));
    }
}
