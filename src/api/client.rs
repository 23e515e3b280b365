//! Beatport Client
//!
//! Main client for the catalog API, combining the OAuth1 session, the HTTP
//! transport and the resource materializer.

use super::auth::OAuthSession;
use super::error::{Error, Result};
use super::http::BeatportHttpClient;
use super::query::QueryParams;
use crate::config::Config;
use crate::resource::{Materialized, Materializer, Resource, ResourceKind, TypeRegistry};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_HOST: &str = "oauth-api.beatport.com";
pub const DEFAULT_API_VERSION: &str = "3";

const REQUEST_TOKEN_PATH: &str = "/identity/1/oauth/request-token";
const AUTHORIZE_PATH: &str = "/identity/1/oauth/authorize";
const ACCESS_TOKEN_PATH: &str = "/identity/1/oauth/access-token";

/// Builder for [`Client`]. Building never touches the network.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    api_key: String,
    api_secret: String,
    access_token: Option<String>,
    access_secret: Option<String>,
    headers: HashMap<String, String>,
    host: String,
    use_ssl: bool,
    api_version: String,
    registry: TypeRegistry,
}

impl ClientBuilder {
    pub fn new(api_key: &str, api_secret: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            access_token: None,
            access_secret: None,
            headers: HashMap::new(),
            host: DEFAULT_HOST.to_string(),
            use_ssl: true,
            api_version: DEFAULT_API_VERSION.to_string(),
            registry: TypeRegistry::default(),
        }
    }

    /// Previously obtained access token pair
    pub fn access_token(mut self, token: &str, secret: &str) -> Self {
        self.access_token = Some(token.to_string());
        self.access_secret = Some(secret.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Host, optionally with a port (`127.0.0.1:8080`)
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn use_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn api_version(mut self, version: &str) -> Self {
        self.api_version = version.to_string();
        self
    }

    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Result<Client> {
        let http = BeatportHttpClient::new(&self.headers)?;

        let mut session = OAuthSession::new(&self.api_key, &self.api_secret);
        session.set_resource_owner(self.access_token, self.access_secret);

        Ok(Client {
            session,
            http,
            pending: None,
            materializer: Materializer::new(self.registry),
            host: self.host,
            use_ssl: self.use_ssl,
            api_version: self.api_version,
        })
    }
}

/// Beatport catalog client.
///
/// Owns the mutable OAuth session, so it is deliberately not `Clone`; share
/// it behind your own synchronization if needed. Requests are issued one at
/// a time and nothing is cached.
pub struct Client {
    /// Signs catalog requests; holds only the access token pair
    session: OAuthSession,
    /// Request-token leg of a handshake in progress
    pending: Option<OAuthSession>,
    http: BeatportHttpClient,
    materializer: Materializer,
    host: String,
    use_ssl: bool,
    api_version: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("use_ssl", &self.use_ssl)
            .field("api_version", &self.api_version)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn builder(api_key: &str, api_secret: &str) -> ClientBuilder {
        ClientBuilder::new(api_key, api_secret)
    }

    /// Build a client from the user configuration (environment overrides
    /// included)
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .effective_api_key()
            .ok_or_else(|| Error::Config("missing API key (set BEATPORT_API_KEY)".to_string()))?;
        let api_secret = config.effective_api_secret().ok_or_else(|| {
            Error::Config("missing API secret (set BEATPORT_API_SECRET)".to_string())
        })?;

        let mut builder = ClientBuilder::new(&api_key, &api_secret)
            .host(&config.host)
            .use_ssl(config.use_ssl)
            .api_version(&config.api_version)
            .headers(config.headers.clone());

        if let (Some(token), Some(secret)) = (
            config.effective_access_token(),
            config.effective_access_secret(),
        ) {
            builder = builder.access_token(&token, &secret);
        }

        builder.build()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Start the OAuth handshake: fetch a request token and return the URL
    /// the user has to visit to authorize this application
    ///
    /// The handshake runs on its own session: the current access token keeps
    /// signing catalog requests until [`authenticate`](Self::authenticate)
    /// succeeds.
    pub async fn get_authorize_url(&mut self) -> Result<String> {
        let request_token_url = self.make_url(REQUEST_TOKEN_PATH);
        let mut handshake = self.session.consumer_only();
        handshake
            .fetch_request_token(&self.http, &request_token_url)
            .await?;

        let url = handshake.authorization_url(&self.make_url(AUTHORIZE_PATH))?;
        self.pending = Some(handshake);
        Ok(url)
    }

    /// Exchange the URL-encoded data shown after authorizing for the
    /// permanent `(token, secret)` pair
    pub async fn get_access_token(&mut self, auth_response: &str) -> Result<(String, String)> {
        let mut handshake = match &self.pending {
            Some(pending) => pending.clone(),
            None => self.session.consumer_only(),
        };
        handshake.parse_authorization_response(auth_response)?;

        let access_token_url = self.make_url(ACCESS_TOKEN_PATH);
        let pair = handshake
            .fetch_access_token(&self.http, &access_token_url)
            .await?;
        self.pending = None;
        Ok(pair)
    }

    /// [`get_access_token`](Self::get_access_token), keeping the pair on
    /// success
    pub async fn authenticate(&mut self, auth_response: &str) -> Result<()> {
        match self.get_access_token(auth_response).await {
            Ok((token, secret)) => {
                self.session.set_resource_owner(Some(token), Some(secret));
                tracing::info!("Beatport authentication succeeded");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Beatport token authentication request failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.resource_owner_key()
    }

    pub fn access_secret(&self) -> Option<&str> {
        self.session.resource_owner_secret()
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    pub fn protocol(&self) -> &'static str {
        if self.use_ssl {
            "https"
        } else {
            "http"
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.materializer.registry()
    }

    /// Absolute URL for `path`; one leading `/` is optional
    pub fn make_url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}://{}/{}", self.protocol(), self.host, path)
    }

    /// Catalog root, e.g. `https://oauth-api.beatport.com/catalog/3`
    pub fn catalog_url(&self) -> String {
        self.make_url(&format!("catalog/{}", self.api_version))
    }

    /// `{catalog}/{type}[/{id}][/{relation}]?{query}`, with the access
    /// token appended when authenticated
    pub fn object_url(
        &self,
        object_type: &str,
        id: Option<&str>,
        relation: Option<&str>,
        params: &QueryParams,
    ) -> Result<String> {
        if !self.registry().contains(object_type) {
            tracing::error!("Unknown resource type: {}", object_type);
            return Err(Error::UnknownType(object_type.to_string()));
        }

        let mut url = format!("{}/{}", self.catalog_url(), urlencoding::encode(object_type));
        for segment in [id, relation].into_iter().flatten() {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }

        let mut query = params.clone();
        if let Some(token) = self.access_token() {
            query.insert("access_token", token);
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.encode());
        }

        Ok(url)
    }

    // =========================================================================
    // Catalog requests
    // =========================================================================

    /// GET a catalog object (or one of its relations) and materialize it.
    ///
    /// `parent` becomes the parent context of the returned records.
    pub async fn get_object(
        &self,
        object_type: &str,
        id: Option<&str>,
        relation: Option<&str>,
        parent: Option<&Resource>,
        params: &QueryParams,
    ) -> Result<Materialized> {
        let url = self.object_url(object_type, id, relation, params)?;
        let json = self.http.get(&url, &self.session).await?;

        if let Some(error) = json.get("error") {
            let target = [Some(object_type), id, relation]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join("/");
            let message = error_message(error);
            tracing::error!("API error for {}: {}", target, message);
            return Err(Error::Api { target, message });
        }

        let parent_record = parent.map(Resource::to_map);
        self.materializer.materialize(&json, parent_record.as_ref())
    }

    /// GET an endpoint and return its raw `"results"` array.
    ///
    /// Unlike [`get_object`](Self::get_object) nothing is materialized.
    pub async fn get_query(&self, endpoint: &str, params: &QueryParams) -> Result<Vec<Value>> {
        let mut url = self.make_url(endpoint);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.encode());
        }

        let mut json = self.http.get(&url, &self.session).await?;

        if let Some(error) = json.get("error") {
            let message = error_message(error);
            tracing::error!("API error for {}: {}", endpoint, message);
            return Err(Error::Api {
                target: endpoint.to_string(),
                message,
            });
        }

        match json.get_mut("results").map(Value::take) {
            Some(Value::Array(results)) => Ok(results),
            _ => Err(Error::InvalidResponse(format!(
                "no \"results\" array in response from {endpoint}"
            ))),
        }
    }

    /// Catalog search, as used for matching local files: free-text `query`
    /// plus optional facets such as `artistName:Daft Punk`
    pub async fn search(&self, query: &str, facets: Option<&str>) -> Result<Vec<Value>> {
        let mut params = QueryParams::new().with("query", query);
        if let Some(facets) = facets {
            params.insert("facets", facets);
        }
        self.get_query(&format!("catalog/{}/search", self.api_version), &params)
            .await
    }

    /// Fetch exactly one resource of `kind`
    pub async fn get_resource(&self, kind: ResourceKind, id: &str) -> Result<Resource> {
        self.get_object(kind.tag(), Some(id), None, None, &QueryParams::new())
            .await?
            .into_single()
            .ok_or_else(|| {
                Error::InvalidResponse(format!("expected a single {} for id {}", kind.tag(), id))
            })
    }

    pub async fn get_track(&self, id: &str) -> Result<Resource> {
        self.get_resource(ResourceKind::Track, id).await
    }

    pub async fn get_release(&self, id: &str) -> Result<Resource> {
        self.get_resource(ResourceKind::Release, id).await
    }

    pub async fn get_artist(&self, id: &str) -> Result<Resource> {
        self.get_resource(ResourceKind::Artist, id).await
    }

    pub async fn get_label(&self, id: &str) -> Result<Resource> {
        self.get_resource(ResourceKind::Label, id).await
    }

    pub async fn get_chart(&self, id: &str) -> Result<Resource> {
        self.get_resource(ResourceKind::Chart, id).await
    }

    pub async fn get_genre(&self, id: &str) -> Result<Resource> {
        self.get_resource(ResourceKind::Genre, id).await
    }
}

/// Human-readable text of an `"error"` entry
fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> Client {
        Client::builder("key", "secret").build().unwrap()
    }

    #[test]
    fn test_make_url_strips_one_leading_slash() {
        let c = client();
        assert_eq!(
            c.make_url("/catalog/3/tracks"),
            "https://oauth-api.beatport.com/catalog/3/tracks"
        );
        assert_eq!(
            c.make_url("catalog/3/tracks"),
            "https://oauth-api.beatport.com/catalog/3/tracks"
        );
        assert_eq!(c.make_url(""), "https://oauth-api.beatport.com/");
    }

    #[test]
    fn test_protocol_follows_use_ssl() {
        let c = Client::builder("key", "secret")
            .use_ssl(false)
            .host("127.0.0.1:8080")
            .build()
            .unwrap();
        assert_eq!(c.protocol(), "http");
        assert_eq!(c.make_url("/x"), "http://127.0.0.1:8080/x");
    }

    #[test]
    fn test_object_url_without_token_has_no_query() {
        let url = client()
            .object_url("track", Some("12857"), None, &QueryParams::new())
            .unwrap();
        assert_eq!(url, "https://oauth-api.beatport.com/catalog/3/track/12857");
    }

    #[test]
    fn test_object_url_appends_access_token() {
        let c = Client::builder("key", "secret")
            .access_token("tok", "sec")
            .build()
            .unwrap();
        let url = c
            .object_url("track", Some("12857"), None, &QueryParams::new())
            .unwrap();
        assert_eq!(
            url,
            "https://oauth-api.beatport.com/catalog/3/track/12857?access_token=tok"
        );
    }

    #[test]
    fn test_object_url_with_relation_and_params() {
        let params = QueryParams::new().with("index", 2).with("perPage", 50);
        let url = client()
            .object_url("artist", Some("7"), Some("releases"), &params)
            .unwrap();
        assert_eq!(
            url,
            "https://oauth-api.beatport.com/catalog/3/artist/7/releases?index=2&perPage=50"
        );
    }

    #[test]
    fn test_object_url_rejects_unknown_type() {
        let err = client()
            .object_url("bogus_type", None, None, &QueryParams::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownType(ref t) if t == "bogus_type"));
    }

    #[test]
    fn test_get_object_unknown_type_fails_before_io() {
        let result = tokio_test::block_on(client().get_object(
            "bogus_type",
            Some("1"),
            None,
            None,
            &QueryParams::new(),
        ));
        assert!(matches!(result, Err(Error::UnknownType(_))));
    }

    #[test]
    fn test_object_url_type_only() {
        let url = client()
            .object_url("genre", None, None, &QueryParams::new())
            .unwrap();
        assert_eq!(url, "https://oauth-api.beatport.com/catalog/3/genre");
    }

    #[test]
    fn test_catalog_url_uses_api_version() {
        let c = Client::builder("key", "secret").api_version("4").build().unwrap();
        assert_eq!(c.catalog_url(), "https://oauth-api.beatport.com/catalog/4");
    }

    #[test]
    fn test_builder_access_token_marks_authenticated() {
        assert!(!client().is_authenticated());
        let c = Client::builder("key", "secret")
            .access_token("tok", "sec")
            .build()
            .unwrap();
        assert!(c.is_authenticated());
        assert_eq!(c.access_token(), Some("tok"));
        assert_eq!(c.access_secret(), Some("sec"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = Config {
            api_key: None,
            api_secret: None,
            ..Config::default()
        };
        if std::env::var("BEATPORT_API_KEY").is_err() {
            assert!(matches!(Client::from_config(&config), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_debug_hides_tokens() {
        let c = Client::builder("key", "secret")
            .access_token("tok", "very-secret")
            .build()
            .unwrap();
        let out = format!("{c:?}");
        assert!(out.contains("authenticated: true"));
        assert!(!out.contains("very-secret"));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(&json!("Not found")), "Not found");
        assert_eq!(error_message(&json!({"message": "Bad id", "code": 400})), "Bad id");
        assert_eq!(error_message(&json!(404)), "404");
    }
}
