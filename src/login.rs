use log::info;

use crate::auth::Token;
use crate::config::{ConfigStore, StoredConfig};
use crate::error::{DevopsError, Result};
use crate::providers::gitlab::client::GitLabClient;
use crate::providers::gitlab::types::User;

#[derive(Debug)]
pub enum LoginOutcome {
    /// The token works and the pair was persisted
    Saved(User),
    /// GitLab rejected the token; nothing was persisted
    InvalidToken,
}

/// Checks the token against `GET /user` and persists host and token when it
/// is accepted.
///
/// # Errors
///
/// Returns an error if the server cannot be reached, answers with anything
/// other than success or 401, or the config cannot be written.
pub async fn verify_and_save(store: &ConfigStore, host: &str, token: Token) -> Result<LoginOutcome> {
    let client = GitLabClient::new(host, token.clone())?;

    let user = match client.current_user().await {
        Ok(user) => user,
        Err(DevopsError::InvalidCredentials) => return Ok(LoginOutcome::InvalidToken),
        Err(e) => return Err(e),
    };

    info!("Token belongs to {}", user.username);
    store.write(&StoredConfig::new(host, token.as_str()))?;
    Ok(LoginOutcome::Saved(user))
}
