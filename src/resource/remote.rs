//! Remote data-access contract
//!
//! The loader and the forms talk to the backend only through
//! [`ResourceApi`], so the HTTP client can be swapped for an in-memory
//! fake in tests.

use super::model::{CreateInput, RecordId, ResourceKind, ResourceRecord, UpdateInput};
use crate::api::error::ApiResult;
use futures::future::BoxFuture;

/// Number of rows shown per page, for every resource kind
pub const PAGE_SIZE: usize = 5;

/// Slice of a collection requested for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: usize,
    pub limit: usize,
}

impl PageWindow {
    /// Window for a 1-based page number. Page 0 is treated as page 1.
    pub fn for_page(page: u32, page_size: usize) -> Self {
        let index = page.max(1) as usize - 1;
        Self {
            skip: index * page_size,
            limit: page_size,
        }
    }

    /// Apply the window locally, for endpoints that return everything
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.skip).take(self.limit).collect()
    }
}

/// list/create/update/delete per resource kind
pub trait ResourceApi: Send + Sync {
    fn list(&self, kind: ResourceKind, window: PageWindow)
        -> BoxFuture<'_, ApiResult<Vec<ResourceRecord>>>;

    fn create(&self, input: CreateInput) -> BoxFuture<'_, ApiResult<ResourceRecord>>;

    fn update(&self, id: RecordId, input: UpdateInput) -> BoxFuture<'_, ApiResult<ResourceRecord>>;

    fn delete(&self, kind: ResourceKind, id: RecordId) -> BoxFuture<'_, ApiResult<()>>;
}
