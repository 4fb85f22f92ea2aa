use super::core::GitLabClient;
use crate::error::Result;
use crate::providers::gitlab::types::User;

impl GitLabClient {
    /// Fetches the user the token belongs to. Used to verify credentials.
    pub async fn current_user(&self) -> Result<User> {
        let url = self.endpoint(&["user"])?;
        self.get(url).await
    }
}
