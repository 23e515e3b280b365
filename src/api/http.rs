//! HTTP utilities for Beatport API calls

use super::auth::OAuthSession;
use super::error::{AuthError, Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("beatport-rs/", env!("CARGO_PKG_VERSION"));

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Path and query of a URL, for error messages (never includes the host)
fn path_url(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

/// HTTP client wrapper that signs every request with the OAuth1 session
#[derive(Clone)]
pub struct BeatportHttpClient {
    client: Client,
}

impl BeatportHttpClient {
    /// Create a new HTTP client with the given extra default headers
    pub fn new(headers: &HashMap<String, String>) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::Config(format!("invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Config(format!("invalid value for header '{key}': {e}")))?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers)
            .build()?;

        Ok(Self { client })
    }

    /// Signed GET returning the decoded JSON body
    pub async fn get(&self, url: &str, session: &OAuthSession) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let parsed = Url::parse(url)?;
        let response = self
            .client
            .get(parsed.clone())
            .header(AUTHORIZATION, session.authorization_header("GET", &parsed))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error connecting to Beatport API: {}", e);
                Error::Transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("Error reading Beatport API response: {}", e);
            Error::Transport(e)
        })?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "Error {} for '{}': {}",
                status.as_u16(),
                path_url(&parsed),
                sanitize_for_log(&body)
            );
            return Err(Error::Status {
                status: status.as_u16(),
                path: path_url(&parsed),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse response JSON: {}", e);
            Error::InvalidResponse(format!("failed to parse response JSON: {e}"))
        })
    }

    /// Signed POST to an OAuth token endpoint, returning the raw
    /// form-encoded body. A non-success status means the request was denied.
    pub async fn post_token(&self, url: &str, session: &OAuthSession) -> Result<String> {
        tracing::debug!("POST {}", url);

        let parsed = Url::parse(url)?;
        let response = self
            .client
            .post(parsed.clone())
            .header(AUTHORIZATION, session.authorization_header("POST", &parsed))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error connecting to Beatport API: {}", e);
                Error::Transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("Error reading Beatport token response: {}", e);
            Error::Transport(e)
        })?;

        if !status.is_success() {
            tracing::error!(
                "Token request denied: {} - {}",
                status,
                sanitize_for_log(&body)
            );
            return Err(AuthError::TokenRequestDenied {
                status: status.as_u16(),
                body: sanitize_for_log(&body),
            }
            .into());
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.starts_with(&"x".repeat(200)));
        assert!(out.ends_with("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = sanitize_for_log(&body);
        assert!(out.contains("[truncated, 300 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("{\"error\":\n\t\"bad\"}"), "{\"error\":\"bad\"}");
    }

    #[test]
    fn test_path_url() {
        let url = Url::parse("https://oauth-api.beatport.com/catalog/3/tracks?id=1").unwrap();
        assert_eq!(path_url(&url), "/catalog/3/tracks?id=1");
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "v".to_string());
        assert!(matches!(
            BeatportHttpClient::new(&headers),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_user_agent_format() {
        assert!(USER_AGENT.starts_with("beatport-rs/"));
    }
}
