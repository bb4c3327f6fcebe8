//! Offset pagination over one kind's listing endpoint.
//!
//! A page shorter than the requested size, or an empty page, ends the
//! enumeration. Backend total counts are never consulted.

use futures::stream::{self, Stream, TryStreamExt};
use std::future::Future;

use super::types::ResourceRef;
use crate::services::errors::{MigrationError, MigrationResult};

/// Pagination position for one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub offset: usize,
    pub page_size: usize,
}

impl Cursor {
    pub fn first(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn advance(self) -> Self {
        Self {
            offset: self.offset + self.page_size,
            page_size: self.page_size,
        }
    }

    /// Zero-based page number, for endpoints that page by index
    pub fn page_index(&self) -> usize {
        self.offset / self.page_size
    }
}

/// One fetched page together with the cursor that produced it
#[derive(Debug, Clone)]
pub struct Page {
    pub cursor: Cursor,
    pub items: Vec<ResourceRef>,
}

/// Drive `fetch` from offset zero until a short or empty page.
///
/// The stream is lazy: nothing is fetched until it is polled, and each page
/// is requested only after the previous one was consumed. A failed fetch is
/// yielded as the last element; no further pages are requested after it.
pub fn pages<'a, F, Fut>(
    page_size: usize,
    fetch: F,
) -> impl Stream<Item = MigrationResult<Page>> + Send + 'a
where
    F: FnMut(Cursor) -> Fut + Send + 'a,
    Fut: Future<Output = MigrationResult<Vec<ResourceRef>>> + Send + 'a,
{
    stream::try_unfold(
        (fetch, Some(Cursor::first(page_size))),
        |(mut fetch, cursor)| async move {
            let Some(cursor) = cursor else {
                return Ok::<_, MigrationError>(None);
            };

            let items = fetch(cursor).await?;
            if items.is_empty() {
                return Ok(None);
            }

            let next = if items.len() < cursor.page_size {
                None
            } else {
                Some(cursor.advance())
            };

            Ok(Some((Page { cursor, items }, (fetch, next))))
        },
    )
}

/// Flattened view of [`pages`]: every item in page order
pub fn items<'a, F, Fut>(
    page_size: usize,
    fetch: F,
) -> impl Stream<Item = MigrationResult<ResourceRef>> + Send + 'a
where
    F: FnMut(Cursor) -> Fut + Send + 'a,
    Fut: Future<Output = MigrationResult<Vec<ResourceRef>>> + Send + 'a,
{
    pages(page_size, fetch)
        .map_ok(|page| stream::iter(page.items.into_iter().map(Ok::<_, MigrationError>)))
        .try_flatten()
}

#[cfg(test)]
#[path = "paginator_test.rs"]
mod paginator_test;
