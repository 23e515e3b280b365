//! Resource layer
//!
//! Turns decoded catalog responses into typed records and walks paginated
//! relations between them.
//!
//! # Architecture
//!
//! - [`registry`] - Maps API type tags to resource kinds
//! - [`model`] - The `Resource` record, its fields and collections
//! - [`materializer`] - Recursive JSON-to-resource conversion
//! - [`pager`] - Lazy `index`-based relation pagination
//!
//! # Example
//!
//! ```ignore
//! use beatport::{Client, QueryParams};
//! use futures::{pin_mut, StreamExt};
//!
//! async fn releases(client: &Client) -> beatport::Result<()> {
//!     let artist = client.get_artist("3547").await?;
//!     let releases = artist.iter_relation(client, "releases", QueryParams::new());
//!     pin_mut!(releases);
//!     while let Some(release) = releases.next().await {
//!         println!("{}", release?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod materializer;
pub mod model;
pub mod pager;
pub mod registry;

pub use materializer::Materializer;
pub use model::{BackRelation, Collection, Field, Materialized, Resource};
pub use pager::RelationPager;
pub use registry::{ResourceKind, TypeRegistry};
