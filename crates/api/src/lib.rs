//! HTTP API layer for opencourse.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: Catalog, authoring, enrollment, progress and analytics routes
//! - **Extractors**: Authentication
//! - **Middleware**: Bearer-token resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
