//! Handler contracts consumed and implemented by the cache layer.

pub mod error;
pub mod handlers;
pub mod persistence;
