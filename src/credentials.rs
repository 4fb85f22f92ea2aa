use log::debug;

use crate::auth::Token;
use crate::config::{Credentials, StoredConfig};
use crate::error::{DevopsError, Result};

pub const HOST_ENV: &str = "GITLAB_HOST";
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

/// Servers offered by `devops login`, besides typing another one.
pub const HOST_OPTIONS: &[(&str, &str)] = &[
    ("GitLab DGTI (SFP)", "https://gitlab.funcionpublica.gob.mx"),
    ("GitLab.com", "https://gitlab.com"),
];

/// Values passed explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub host: Option<String>,
    pub token: Option<String>,
}

/// Merges flags, environment and stored config into effective credentials.
///
/// Each field is resolved on its own: flag, then environment variable, then
/// stored file. A user can pass `--host` and still rely on a stored token.
pub struct CredentialResolver<'a> {
    stored: StoredConfig,
    env: Box<dyn Fn(&str) -> Option<String> + 'a>,
}

impl<'a> CredentialResolver<'a> {
    /// Resolver reading `GITLAB_HOST`/`GITLAB_TOKEN` from the process environment.
    pub fn new(stored: Option<StoredConfig>) -> Self {
        Self::with_env(stored, |name| std::env::var(name).ok())
    }

    pub fn with_env(
        stored: Option<StoredConfig>,
        env: impl Fn(&str) -> Option<String> + 'a,
    ) -> Self {
        Self {
            stored: stored.unwrap_or_default(),
            env: Box::new(env),
        }
    }

    pub fn host(&self, overrides: &CredentialOverrides) -> Option<String> {
        self.pick(overrides.host.as_deref(), HOST_ENV, self.stored.host.as_deref())
    }

    pub fn token(&self, overrides: &CredentialOverrides) -> Option<String> {
        self.pick(
            overrides.token.as_deref(),
            TOKEN_ENV,
            self.stored.token.as_deref(),
        )
    }

    /// Produces the effective host/token pair.
    ///
    /// # Errors
    ///
    /// Returns [`DevopsError::Unconfigured`] naming every field still missing.
    pub fn resolve(&self, overrides: &CredentialOverrides) -> Result<Credentials> {
        match (self.host(overrides), self.token(overrides)) {
            (Some(host), Some(token)) => Ok(Credentials {
                host,
                token: Token::from(token),
            }),
            (host, token) => {
                let missing: Vec<&str> = [("host", host.is_none()), ("token", token.is_none())]
                    .into_iter()
                    .filter_map(|(name, missing)| missing.then_some(name))
                    .collect();
                Err(DevopsError::Unconfigured {
                    missing: missing.join(" and "),
                })
            }
        }
    }

    fn pick(&self, flag: Option<&str>, env_name: &str, stored: Option<&str>) -> Option<String> {
        if let Some(value) = non_blank(flag) {
            debug!("Using {env_name} value from command line");
            return Some(value);
        }
        if let Some(value) = non_blank((self.env)(env_name).as_deref()) {
            debug!("Using {env_name} value from environment");
            return Some(value);
        }
        non_blank(stored)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn stored() -> Option<StoredConfig> {
        Some(StoredConfig::new("https://stored.example.com", "stored-token"))
    }

    fn overrides(host: Option<&str>, token: Option<&str>) -> CredentialOverrides {
        CredentialOverrides {
            host: host.map(String::from),
            token: token.map(String::from),
        }
    }

    #[test]
    fn test_flag_beats_env_and_stored() {
        let resolver = CredentialResolver::with_env(
            stored(),
            env_of(&[(HOST_ENV, "https://env.example.com"), (TOKEN_ENV, "env-token")]),
        );

        let creds = resolver
            .resolve(&overrides(Some("https://flag.example.com"), Some("flag-token")))
            .unwrap();
        assert_eq!(creds.host, "https://flag.example.com");
        assert_eq!(creds.token.as_str(), "flag-token");
    }

    #[test]
    fn test_env_beats_stored() {
        let resolver = CredentialResolver::with_env(
            stored(),
            env_of(&[(HOST_ENV, "https://env.example.com"), (TOKEN_ENV, "env-token")]),
        );

        let creds = resolver.resolve(&CredentialOverrides::default()).unwrap();
        assert_eq!(creds.host, "https://env.example.com");
        assert_eq!(creds.token.as_str(), "env-token");
    }

    #[test]
    fn test_fields_resolve_independently() {
        let resolver = CredentialResolver::with_env(stored(), env_of(&[]));

        let creds = resolver
            .resolve(&overrides(Some("https://flag.example.com"), None))
            .unwrap();
        assert_eq!(creds.host, "https://flag.example.com");
        assert_eq!(creds.token.as_str(), "stored-token");

        let resolver =
            CredentialResolver::with_env(stored(), env_of(&[(TOKEN_ENV, "env-token")]));
        let creds = resolver.resolve(&CredentialOverrides::default()).unwrap();
        assert_eq!(creds.host, "https://stored.example.com");
        assert_eq!(creds.token.as_str(), "env-token");
    }

    #[test]
    fn test_blank_values_fall_through() {
        let resolver = CredentialResolver::with_env(stored(), env_of(&[(HOST_ENV, "  ")]));

        let creds = resolver.resolve(&overrides(Some(""), None)).unwrap();
        assert_eq!(creds.host, "https://stored.example.com");
    }

    #[test]
    fn test_nothing_configured_is_unconfigured() {
        let resolver = CredentialResolver::with_env(None, env_of(&[]));

        let err = resolver.resolve(&CredentialOverrides::default()).unwrap_err();
        match err {
            DevopsError::Unconfigured { missing } => assert_eq!(missing, "host and token"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reset_config_is_unconfigured() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(temp_dir.path());
        store
            .write(&StoredConfig::new("https://gitlab.com", "glpat-test"))
            .unwrap();
        store.reset().unwrap();

        let resolver = CredentialResolver::with_env(store.read().unwrap(), env_of(&[]));
        let err = resolver.resolve(&CredentialOverrides::default()).unwrap_err();
        assert!(matches!(err, DevopsError::Unconfigured { .. }));

        let err = resolver
            .resolve(&overrides(Some("https://gitlab.com"), None))
            .unwrap_err();
        assert!(err.to_string().contains("missing token"));
        assert!(err.to_string().contains("devops login"));
    }
}
