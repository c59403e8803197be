//! JSON responses for the admin endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use yatube_common::{Page, PageMeta};

/// How an absent value is displayed.
pub const EMPTY_VALUE_DISPLAY: &str = "-пусто-";

/// Standard admin response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            data,
            pagination: None,
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// One page of rows.
    pub fn page<U>(page: Page<U>, row: impl FnMut(U) -> T) -> Self {
        Self {
            pagination: Some(page.meta),
            data: page.items.into_iter().map(row).collect(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Display value of an optional column.
#[must_use]
pub fn display_or_empty(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(EMPTY_VALUE_DISPLAY)
        .to_string()
}
