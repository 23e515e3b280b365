//! Relation pagination
//!
//! Streams a one-to-many relation of a resource (an artist's releases, a
//! release's tracks) using the API's `index` offset parameter.

use super::model::Resource;
use crate::api::client::Client;
use crate::api::error::{Error, Result};
use crate::api::query::QueryParams;
use futures::stream::{self, Stream, StreamExt};

/// Page-by-page walk over a relation endpoint.
///
/// Starts at `index = 0`, advances by the number of items each page returns
/// and stops at the first empty page. Forward-only: once exhausted (or after
/// an error) it never issues another request.
///
/// The server is assumed to page without overlap and in order. If it
/// returns overlapping or reordered pages, items may repeat or be skipped.
pub struct RelationPager<'a> {
    client: &'a Client,
    owner: &'a Resource,
    relation: String,
    params: QueryParams,
    index: usize,
    exhausted: bool,
}

impl<'a> RelationPager<'a> {
    pub fn new(client: &'a Client, owner: &'a Resource, relation: &str, params: QueryParams) -> Self {
        Self {
            client,
            owner,
            relation: relation.to_string(),
            params,
            index: 0,
            exhausted: false,
        }
    }

    /// Offset the next request will use
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fetch the next page. `Ok(None)` once the relation is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Resource>>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut params = self.params.clone();
        params.insert("index", self.index);

        let items = match self
            .owner
            .get_relation(self.client, &self.relation, params)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                self.exhausted = true;
                return Err(e);
            }
        };

        if items.is_empty() {
            tracing::debug!(
                "Relation '{}' of {} exhausted at index {}",
                self.relation,
                self.owner,
                self.index
            );
            self.exhausted = true;
            return Ok(None);
        }

        self.index += items.len();
        Ok(Some(items))
    }

    /// Drain every page into one list
    pub async fn collect_all(mut self) -> Result<Vec<Resource>> {
        let mut all_items = Vec::new();
        while let Some(items) = self.next_page().await? {
            all_items.extend(items);
        }
        Ok(all_items)
    }

    /// Lazy stream of the relation's items. An error is yielded once and
    /// ends the stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Resource>> + 'a {
        stream::unfold(self, |mut pager| async move {
            match pager.next_page().await {
                Ok(Some(items)) => Some((Ok(items), pager)),
                Ok(None) => None,
                Err(e) => Some((Err(e), pager)),
            }
        })
        .flat_map(|page| {
            let results: Vec<Result<Resource>> = match page {
                Ok(items) => items.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(results)
        })
    }
}

impl Resource {
    /// One page of `relation`, with this resource as the parent context
    pub async fn get_relation(
        &self,
        client: &Client,
        relation: &str,
        params: QueryParams,
    ) -> Result<Vec<Resource>> {
        let id = self
            .id()
            .ok_or_else(|| Error::InvalidResponse(format!("{self} has no id")))?;

        let result = client
            .get_object(self.type_tag(), Some(&id), Some(relation), Some(self), &params)
            .await?;
        Ok(result.into_resources())
    }

    /// Stream every item of `relation`, one request per page
    pub fn iter_relation<'a>(
        &'a self,
        client: &'a Client,
        relation: &str,
        params: QueryParams,
    ) -> impl Stream<Item = Result<Resource>> + 'a {
        RelationPager::new(client, self, relation, params).into_stream()
    }

    pub fn relation_pager<'a>(
        &'a self,
        client: &'a Client,
        relation: &str,
        params: QueryParams,
    ) -> RelationPager<'a> {
        RelationPager::new(client, self, relation, params)
    }
}
