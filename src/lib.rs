//! Beatport catalog API client
//!
//! OAuth1 three-legged authentication plus typed access to the catalog:
//! tracks, artists, releases, genres, charts, labels and keys. Responses are
//! materialized into generic [`Resource`] records and one-to-many relations
//! can be streamed page by page.

pub mod api;
pub mod config;
pub mod resource;

pub use api::client::{Client, ClientBuilder};
pub use api::error::{AuthError, Error, Result, SchemaError};
pub use api::query::QueryParams;
pub use config::Config;
pub use resource::{
    Collection, Field, Materialized, Materializer, RelationPager, Resource, ResourceKind,
    TypeRegistry,
};
