//! tadmin - terminal admin console for the mentorship API.
//!
//! Lists items, users, questionnaires and mentors one page at a time and
//! offers create, edit and delete actions on them.
//!
//! - [`resource`] - resource kinds, row action dispatch and the page loader
//! - [`api`] - REST client implementing [`resource::ResourceApi`]
//! - [`form`] - create/edit form state and validation
//! - [`app`] - application state driven by [`event`] and drawn by [`ui`]

pub mod api;
pub mod app;
pub mod config;
pub mod event;
pub mod form;
pub mod notification;
pub mod resource;
pub mod ui;

/// Version injected at compile time via TADMIN_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TADMIN_VERSION") {
    Some(v) => v,
    None => "dev",
};
