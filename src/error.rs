use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevopsError {
    #[error("GitLab access is not configured (missing {missing}). Run `devops login`")]
    Unconfigured { missing: String },

    #[error("Resource does not exist: {0}")]
    NotFound(String),

    #[error("GitLab rejected the access token. Run `devops login` to configure a new one")]
    InvalidCredentials,

    #[error("A variable named {0} already exists")]
    Conflict(String),

    #[error("GitLab API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open browser: {0}")]
    Browser(String),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl DevopsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, DevopsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_name_the_remedy() {
        let unconfigured = DevopsError::Unconfigured {
            missing: "token".into(),
        };
        assert!(unconfigured.to_string().contains("devops login"));
        assert!(DevopsError::InvalidCredentials
            .to_string()
            .contains("devops login"));
    }
}
