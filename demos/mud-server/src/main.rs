use mudforge::prelude::*;

/// Accounts used when no `MUDFORGE_ACCOUNTS` file is given.
fn demo_accounts() -> InMemoryCredentials {
    InMemoryCredentials::new()
        .with_account("Celidur", "password")
        .with_account("Faerhan", "hunter2")
}

fn load_accounts(config: &ServerConfig) -> Result<InMemoryCredentials, MudError> {
    match &config.accounts_path {
        Some(path) => {
            let accounts = InMemoryCredentials::from_path(path)?;
            tracing::info!(path = %path.display(), accounts = accounts.len(), "accounts loaded");
            Ok(accounts)
        }
        None => {
            tracing::warn!("no MUDFORGE_ACCOUNTS file, using demo accounts");
            Ok(demo_accounts())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), MudError> {
    mudforge::init_tracing("info");

    let config = ServerConfig::from_env()?;
    let accounts = load_accounts(&config)?;

    let server = MudServerBuilder::new().config(config).build(accounts).await?;
    tracing::info!(addr = %server.local_addr()?, "telnet here to play");

    server.run().await
}
