//! The `prephub login` and `prephub logout` commands.

use std::path::PathBuf;

use anyhow::{Context, Result};

use prephub_providers::config::load_config_from;
use prephub_providers::ApiClient;

pub async fn execute(
    email: String,
    password: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let password = match password {
        Some(p) => p,
        None => std::env::var("PREPHUB_PASSWORD")
            .context("no password given: pass --password or set PREPHUB_PASSWORD")?,
    };

    let client = ApiClient::new(&config.api_base_url, config.request_timeout())?;
    let credentials = client
        .login(&email, &password)
        .await
        .context("login failed")?;

    let store = config.credential_store();
    let mut auth = config.auth_context();
    auth.sign_in(&store, credentials)?;

    if let Some(user) = auth.user() {
        println!("Signed in as {} <{}>", user.name, user.email);
    }
    println!("Credentials saved to {}", store.path().display());
    Ok(())
}

pub fn logout(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = config.credential_store();
    let mut auth = config.auth_context();
    auth.teardown(&store)?;
    println!("Signed out.");
    Ok(())
}
