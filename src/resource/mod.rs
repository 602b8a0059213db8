//! Resource abstraction layer
//!
//! Typed records for each administered kind, the per-kind registry that
//! drives the table columns and messages, and the two behaviours shared by
//! every listing: the row action dispatcher and the paginated loader.
//!
//! # Architecture
//!
//! - [`model`] - Resource kinds, records and mutation payloads
//! - [`registry`] - Loads per-kind definitions from embedded JSON
//! - [`display`] - Response extraction and table row rendering
//! - [`dispatch`] - Edit/delete dispatch for one row
//! - [`loader`] - Page cache with placeholder, prefetch and invalidation
//! - [`remote`] - The [`ResourceApi`] contract the backend implements
//!
//! # Resource Definitions
//!
//! Kinds are described in `src/resources/resources.json`: API path, whether
//! the endpoint paginates server side, columns, and the success messages
//! shown after a mutation.

pub mod dispatch;
pub mod display;
pub mod loader;
pub mod model;
pub mod registry;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::{ActionDispatcher, EditFormInput, EditorKind, ModalState, RowAction};
pub use loader::{CacheKey, LoaderEvent, PageLoader, PageState};
pub use model::{CreateInput, RecordId, ResourceKind, ResourceRecord, UpdateInput};
pub use registry::{get_resource, is_editable, ResourceDef};
pub use remote::{PageWindow, ResourceApi, PAGE_SIZE};
