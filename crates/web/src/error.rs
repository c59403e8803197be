//! HTML error responses.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use yatube_common::AppError;

use crate::templates::errors;

/// An [`AppError`] rendered as an HTML page.
#[derive(Debug)]
pub struct PageError {
    error: AppError,
    path: String,
}

impl PageError {
    /// Wrap an error raised while serving `path`.
    #[must_use]
    pub fn new(error: AppError, path: impl Into<String>) -> Self {
        Self {
            error,
            path: path.into(),
        }
    }

    /// 404 for `path`.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(AppError::NotFound(path.clone()), path)
    }

    /// The wrapped error.
    #[must_use]
    pub const fn error(&self) -> &AppError {
        &self.error
    }
}

impl From<AppError> for PageError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            path: String::new(),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();

        if self.error.is_server_error() {
            tracing::error!(error = %self.error, code = self.error.error_code(), "Server error occurred");
        } else {
            tracing::debug!(error = %self.error, code = self.error.error_code(), "Client error occurred");
        }

        let (status, body) = match status {
            StatusCode::NOT_FOUND => (status, errors::not_found(&self.path)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                (StatusCode::FORBIDDEN, errors::forbidden())
            }
            s if s.is_server_error() => (StatusCode::INTERNAL_SERVER_ERROR, errors::server_error()),
            _ => (status, errors::bad_request(&self.error.to_string())),
        };

        (status, Html(body.into_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_page() {
        let response = PageError::not_found("/nonexist-page/").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_error_is_500() {
        let response = PageError::from(AppError::Database("boom".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthorized_renders_403() {
        let response = PageError::from(AppError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_group_not_found_is_404() {
        let error = PageError::new(AppError::GroupNotFound("cats".to_string()), "/group/cats/");
        assert!(error.error().is_not_found());
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }
}
