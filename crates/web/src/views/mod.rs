//! Routes.

mod admin;
mod auth;
mod posts;

use axum::{Router, http::Uri, middleware};

pub use admin::AdminListQuery;
pub use posts::{MAX_UPLOAD_BYTES, PageQuery, PostSubmission};

use crate::error::PageError;
use crate::middleware::{AppState, auth_middleware};

/// Every route, without state.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .fallback(not_found)
}

/// The full application: routes, session middleware and state.
pub fn app(state: AppState) -> Router {
    router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

async fn not_found(uri: Uri) -> PageError {
    PageError::not_found(uri.path())
}
