//! HTTP layer for yatube-rs.
//!
//! - **Views**: server-rendered HTML pages (maud) for feeds, posts and auth
//! - **Admin**: JSON moderation endpoints under `/admin/`
//! - **Extractors**: authenticated, optional and admin users
//! - **Middleware**: session token resolution
//! - **Cache**: time-boxed cache for the landing page
//!
//! Built on Axum 0.8 with the Tower middleware stack.

pub mod cache;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod templates;
pub mod views;

pub use cache::PageCache;
pub use error::PageError;
pub use middleware::{AppState, auth_middleware};
pub use views::{app, router};
