use log::{debug, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{DevopsError, Result};

/// Every list call fetches a single page of this size.
pub(super) const PER_PAGE: u32 = 100;
pub(super) const FIRST_PAGE: u32 = 1;

pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Token,
}

impl GitLabClient {
    /// Creates a client for the REST API of `host`.
    ///
    /// `host` may omit the scheme (`gitlab.com`), in which case HTTPS is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(host: &str, token: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("devops/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DevopsError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = api_base(host)?;
        debug!("Using GitLab API at {api_url}");

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    /// Helper to get client
    pub(super) fn client(&self) -> &Client {
        &self.client
    }

    pub fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.as_str())
    }

    /// Builds an API URL from raw path segments.
    ///
    /// Each segment is percent-encoded on its own, so a path identifier such
    /// as `group/project` becomes `group%2Fproject`.
    pub(super) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| DevopsError::Config(format!("Invalid API base URL: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(super) async fn get<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send(self.client.get(url)).await
    }

    /// GET with the fixed pagination parameters.
    pub(super) async fn get_page<T>(&self, url: Url) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.send(
            self.client
                .get(url)
                .query(&[("per_page", PER_PAGE), ("page", FIRST_PAGE)]),
        )
        .await
    }

    /// Sends an authenticated request and maps HTTP failures onto domain errors.
    pub(super) async fn send<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.auth_request(request).send().await?;
        let status = response.status();
        let url = response.url().clone();
        debug!("{status} {url}");

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(match status {
            StatusCode::NOT_FOUND => DevopsError::NotFound(url.to_string()),
            StatusCode::UNAUTHORIZED => DevopsError::InvalidCredentials,
            StatusCode::BAD_REQUEST => match taken_key(&body) {
                Some(key) => DevopsError::Conflict(key),
                None => api_error(status, body),
            },
            _ => api_error(status, body),
        })
    }
}

fn api_error(status: StatusCode, message: String) -> DevopsError {
    warn!("GitLab API returned {status}: {message}");
    DevopsError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Normalizes a host into the `api/v4/` base URL.
pub(super) fn api_base(host: &str) -> Result<Url> {
    let host = host.trim();
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let with_slash = if with_scheme.ends_with('/') {
        with_scheme
    } else {
        format!("{with_scheme}/")
    };

    Url::parse(&with_slash)
        .map_err(|e| DevopsError::Config(format!("Invalid GitLab host '{host}': {e}")))?
        .join("api/v4/")
        .map_err(|e| DevopsError::Config(format!("Invalid API base URL: {e}")))
}

/// Extracts the offending key from a "has already been taken" validation error.
///
/// GitLab answers `{"message": {"key": ["FOO has already been taken"]}}`.
fn taken_key(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["message"]["key"]
        .as_array()?
        .iter()
        .filter_map(serde_json::Value::as_str)
        .find(|msg| msg.contains("has already been taken"))
        .map(|msg| {
            msg.trim_end_matches("has already been taken")
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .to_string()
        })
}
