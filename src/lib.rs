//! Tag-invalidated caching proxy for content-repository persistence handlers.
//!
//! The crate is layered the same way the handlers are consumed:
//!
//! - [`domain`]: value objects returned by the storage engine and the shared
//!   [`domain::error::PersistenceError`].
//! - [`application`]: the inner handler traits (one per domain area) and the
//!   [`application::persistence::PersistenceHandler`] facade contract.
//! - [`cache`]: identifier generation, tag-aware stores, the generic
//!   read-through helper and one cache handler per domain area.
//! - [`config`] and [`infra`]: settings, telemetry and process plumbing.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
