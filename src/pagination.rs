//! Incremental post pagination.
//!
//! The listing starts from the first page of search results and grows one
//! page at a time. [`PaginationState`] is an immutable-update container: the
//! only way to grow it is [`PaginationState::load_next_page`], which borrows
//! the current state and returns a new one. The owner swaps its state for
//! the returned value, so a failed load leaves the previous state exactly as
//! it was and two loads can never interleave on the same value.
//!
//! ```text
//! seed(page 1)           items = [A, B]      next_page = Some(page2)
//! load_next_page()  →    items = [A, B, C]   next_page = None
//! load_next_page()  →    unchanged, no request made
//! ```

use crate::client::{ContentError, ContentSource};
use crate::types::{PostSummary, SearchResponse};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationState {
    items: Vec<PostSummary>,
    next_page: Option<String>,
}

impl PaginationState {
    /// Start from the first page of results.
    pub fn seed(first_page: SearchResponse) -> Self {
        Self::default().append(first_page)
    }

    pub fn items(&self) -> &[PostSummary] {
        &self.items
    }

    /// Cursor for the following page, `None` once the listing is exhausted.
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Merge one more page of results: its items go after the existing ones
    /// and its cursor replaces the current one.
    pub fn append(&self, page: SearchResponse) -> Self {
        let mut items = self.items.clone();
        items.extend(page.results.into_iter().map(PostSummary::from));
        Self {
            items,
            next_page: page.next_page,
        }
    }

    /// Fetch the page behind the current cursor and return the grown state.
    ///
    /// With no cursor left this returns an unchanged copy without touching
    /// `source`. Errors are returned as-is and never retried.
    pub async fn load_next_page(
        &self,
        source: &dyn ContentSource,
    ) -> Result<Self, ContentError> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(self.clone());
        };
        debug!("loading next listing page: {cursor}");
        let page = source.fetch_page(cursor).await?;
        Ok(self.append(page))
    }
}
