//! Error types for the Beatport client

use thiserror::Error;

/// Failures during the OAuth1 three-legged handshake
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token request denied ({status}): {body}")]
    TokenRequestDenied { status: u16, body: String },

    #[error("response does not contain oauth_token and oauth_token_secret")]
    TokenMissing,

    #[error("authorization response does not contain an oauth_verifier")]
    VerifierMissing,
}

/// A response that no longer matches the type registry
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("type tag `{0}` is not registered")]
    UnregisteredType(String),

    #[error("record has no type tag and no typed parent")]
    MissingType,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("error connecting to Beatport API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error for {target}: {message}")]
    Api { target: String, message: String },

    #[error("HTTP {status} for '{path}'")]
    Status { status: u16, path: String },

    #[error("unknown resource type: {0}")]
    UnknownType(String),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("invalid URL: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
