//! API interaction module
//!
//! Talks to the mentorship REST backend.
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer token handling and the password login flow
//! - [`client`] - Main client, implements [`crate::resource::ResourceApi`]
//! - [`error`] - Structured API errors with optional server `detail`
//! - [`http`] - HTTP utilities for REST calls
//!
//! # Example
//!
//! ```ignore
//! use tadmin::api::{auth::Credentials, client::ApiClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = ApiClient::new("http://localhost:8000", Credentials::with_token("..."))?;
//!     let items = client.get_json(&client.collection_url(ResourceKind::Item)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
