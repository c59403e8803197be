//! Application state and request middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use yatube_core::{CommentService, FollowService, GroupService, PostService, UserService};

use crate::cache::PageCache;

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub group_service: GroupService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub follow_service: FollowService,
    pub page_cache: PageCache,
}

/// Resolve the session user from the `token` cookie or a bearer token.
///
/// A stale or unknown token leaves the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = session_token(&req) {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Failed to resolve session");
            }
            Err(_) => {
                tracing::debug!("Ignoring unknown session token");
            }
        }
    }

    next.run(req).await
}

fn session_token(req: &Request<Body>) -> Option<String> {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get(TOKEN_COOKIE)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_from_cookie() {
        let req = Request::builder()
            .header(header::COOKIE, "theme=dark; token=abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(session_token(&req).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_token_from_bearer() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer xyz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(session_token(&req).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let req = Request::builder()
            .header(header::COOKIE, "token=from-cookie")
            .header(header::AUTHORIZATION, "Bearer from-header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(session_token(&req).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_no_token() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Basic dXNlcg==")
            .body(Body::empty())
            .unwrap();
        assert!(session_token(&req).is_none());
    }
}
