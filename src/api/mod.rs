//! Beatport API interaction module
//!
//! This module provides the core functionality for talking to the Beatport
//! catalog API, including OAuth1 authentication, the HTTP transport and the
//! client that ties them to the resource layer.
//!
//! # Module Structure
//!
//! - [`auth`] - OAuth1 request signing and the three-legged handshake
//! - [`client`] - Main client: URL building, catalog requests
//! - [`error`] - Error taxonomy
//! - [`http`] - Signed HTTP calls
//! - [`query`] - Query parameters
//!
//! # Example
//!
//! ```ignore
//! use beatport::Client;
//!
//! async fn example() -> beatport::Result<()> {
//!     let client = Client::builder("api-key", "api-secret")
//!         .access_token("token", "secret")
//!         .build()?;
//!     let track = client.get_track("12857425").await?;
//!     println!("{track}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod query;
