//! OAuth1 authentication
//!
//! Holds the consumer and resource-owner credentials, signs requests with
//! HMAC-SHA1 (RFC 5849) and drives the three-legged
//! request-token -> authorize -> access-token exchange.

use super::error::{AuthError, Result};
use super::http::BeatportHttpClient;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::{form_urlencoded, Position, Url};

type HmacSha1 = Hmac<Sha1>;

/// Out-of-band callback: the user copies the verifier data by hand
pub const CALLBACK_OOB: &str = "oob";

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Percent-encode per RFC 3986 (unreserved characters pass through)
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// OAuth1 session state.
///
/// `resource_owner_key`/`resource_owner_secret` hold the temporary request
/// token during the handshake and the permanent access token afterwards.
#[derive(Clone)]
pub struct OAuthSession {
    client_key: String,
    client_secret: String,
    resource_owner_key: Option<String>,
    resource_owner_secret: Option<String>,
    verifier: Option<String>,
    callback: String,
}

impl std::fmt::Debug for OAuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Security: never print secrets
        f.debug_struct("OAuthSession")
            .field("client_key", &self.client_key)
            .field("resource_owner_key", &self.resource_owner_key)
            .field("has_verifier", &self.verifier.is_some())
            .finish_non_exhaustive()
    }
}

impl OAuthSession {
    pub fn new(client_key: &str, client_secret: &str) -> Self {
        Self {
            client_key: client_key.to_string(),
            client_secret: client_secret.to_string(),
            resource_owner_key: None,
            resource_owner_secret: None,
            verifier: None,
            callback: CALLBACK_OOB.to_string(),
        }
    }

    /// Same consumer credentials, no resource owner
    pub fn consumer_only(&self) -> Self {
        Self::new(&self.client_key, &self.client_secret)
    }

    /// Replace the resource-owner token pair and drop any pending verifier
    pub fn set_resource_owner(&mut self, key: Option<String>, secret: Option<String>) {
        self.resource_owner_key = key;
        self.resource_owner_secret = secret;
        self.verifier = None;
    }

    pub fn resource_owner_key(&self) -> Option<&str> {
        self.resource_owner_key.as_deref()
    }

    pub fn resource_owner_secret(&self) -> Option<&str> {
        self.resource_owner_secret.as_deref()
    }

    /// Build the `Authorization: OAuth ...` header for a request
    pub fn authorization_header(&self, method: &str, url: &Url) -> String {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp();
        self.signed_header(method, url, &nonce, timestamp)
    }

    fn signed_header(&self, method: &str, url: &Url, nonce: &str, timestamp: i64) -> String {
        let mut params = self.oauth_params(nonce, timestamp);
        let base = signature_base_string(method, url, &params);
        params.push(("oauth_signature".to_string(), self.sign(&base)));

        let fields = params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {fields}")
    }

    fn oauth_params(&self, nonce: &str, timestamp: i64) -> Vec<(String, String)> {
        let mut params = vec![
            ("oauth_consumer_key".to_string(), self.client_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];

        match &self.resource_owner_key {
            Some(token) => params.push(("oauth_token".to_string(), token.clone())),
            // Only the request-token leg carries a callback
            None => params.push(("oauth_callback".to_string(), self.callback.clone())),
        }
        if let Some(verifier) = &self.verifier {
            params.push(("oauth_verifier".to_string(), verifier.clone()));
        }

        params
    }

    /// HMAC-SHA1 over the base string, base64-encoded
    fn sign(&self, base_string: &str) -> String {
        let key = format!(
            "{}&{}",
            encode(&self.client_secret),
            encode(self.resource_owner_secret.as_deref().unwrap_or(""))
        );
        let mut mac =
            HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any size");
        mac.update(base_string.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Step 1: obtain a temporary request token
    pub async fn fetch_request_token(
        &mut self,
        http: &BeatportHttpClient,
        url: &str,
    ) -> Result<(String, String)> {
        self.set_resource_owner(None, None);
        let body = http.post_token(url, self).await?;
        let (token, secret) = parse_token_response(&body)?;
        self.set_resource_owner(Some(token.clone()), Some(secret.clone()));
        tracing::debug!("Obtained OAuth request token");
        Ok((token, secret))
    }

    /// Step 2: URL the user visits to approve the request token
    pub fn authorization_url(&self, url: &str) -> std::result::Result<String, AuthError> {
        let token = self.resource_owner_key.as_deref().ok_or(AuthError::TokenMissing)?;
        Ok(format!("{}?oauth_token={}", url, encode(token)))
    }

    /// Take the token and verifier out of the URL-encoded data shown to the
    /// user after authorizing. Accepts a bare query string or a full URL.
    pub fn parse_authorization_response(
        &mut self,
        response: &str,
    ) -> std::result::Result<(), AuthError> {
        let query = response.split_once('?').map_or(response, |(_, q)| q);

        let mut token = None;
        let mut verifier = None;
        for (key, value) in form_urlencoded::parse(query.trim().as_bytes()) {
            match key.as_ref() {
                "oauth_token" => token = Some(value.into_owned()),
                "oauth_verifier" => verifier = Some(value.into_owned()),
                _ => {}
            }
        }

        let token = token.ok_or(AuthError::TokenMissing)?;
        let verifier = verifier.ok_or(AuthError::VerifierMissing)?;

        // A token other than the pending request token invalidates its secret
        if self.resource_owner_key.as_deref() != Some(token.as_str()) {
            self.resource_owner_secret = None;
        }
        self.resource_owner_key = Some(token);
        self.verifier = Some(verifier);
        Ok(())
    }

    /// Step 3: exchange the verified request token for the access token
    pub async fn fetch_access_token(
        &mut self,
        http: &BeatportHttpClient,
        url: &str,
    ) -> Result<(String, String)> {
        if self.verifier.is_none() {
            return Err(AuthError::VerifierMissing.into());
        }
        let body = http.post_token(url, self).await?;
        let (token, secret) = parse_token_response(&body)?;
        self.set_resource_owner(Some(token.clone()), Some(secret.clone()));
        Ok((token, secret))
    }
}

/// RFC 5849 section 3.4.1 signature base string
fn signature_base_string(method: &str, url: &Url, oauth_params: &[(String, String)]) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    params.sort();

    let normalized = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_url = &url[..Position::AfterPath];

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(base_url),
        encode(&normalized)
    )
}

/// Parse a form-encoded `oauth_token=..&oauth_token_secret=..` body
fn parse_token_response(body: &str) -> std::result::Result<(String, String), AuthError> {
    let mut token = None;
    let mut secret = None;
    for (key, value) in form_urlencoded::parse(body.trim().as_bytes()) {
        match key.as_ref() {
            "oauth_token" => token = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {}
        }
    }

    match (token, secret) {
        (Some(token), Some(secret)) if !token.is_empty() => Ok((token, secret)),
        _ => Err(AuthError::TokenMissing),
    }
}
