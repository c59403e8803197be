//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use yatube_common::AppError;
use yatube_db::entities::user;

/// Login page that protected routes send anonymous visitors to.
pub const LOGIN_PATH: &str = "/auth/login/";

/// Authenticated user extractor.
///
/// Anonymous requests are redirected to the login page with the current
/// path in `next`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                let next = parts
                    .uri
                    .path_and_query()
                    .map_or("/", |pq| pq.as_str());
                Redirect::to(&login_url(next))
            })
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Administrator extractor. Anyone else gets a 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<user::Model>() {
            Some(user) if user.is_admin => Ok(Self(user.clone())),
            Some(_) => Err(AppError::Forbidden("Admin access required".to_string())),
            None => Err(AppError::Forbidden("Authentication required".to_string())),
        }
    }
}

/// Login URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

/// Where to go after login: `next` when it is a local path, else `/`.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        // Browsers read `\` as `/`, so `/\host` is protocol-relative too.
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode, header};
    use axum::response::IntoResponse;
    use chrono::Utc;

    fn user(is_admin: bool) -> user::Model {
        user::Model {
            id: "u1".to_string(),
            username: "leo".to_string(),
            name: None,
            password: String::new(),
            token: None,
            is_admin,
            created_at: Utc::now().into(),
        }
    }

    fn request_parts(uri: &str, user: Option<user::Model>) -> Parts {
        let mut req = Request::builder().uri(uri).body(()).unwrap();
        if let Some(user) = user {
            req.extensions_mut().insert(user);
        }
        req.into_parts().0
    }

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(
            login_url("/create/?a=1"),
            "/auth/login/?next=%2Fcreate%2F%3Fa%3D1"
        );
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/follow/")), "/follow/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("/posts/\\x")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[tokio::test]
    async fn test_auth_user_redirects_anonymous() {
        let mut parts = request_parts("/create/", None);
        let rejection = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err()
            .into_response();

        assert_eq!(rejection.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            rejection.headers()[header::LOCATION],
            "/auth/login/?next=%2Fcreate%2F"
        );
    }

    #[tokio::test]
    async fn test_admin_user_rejects_regular_user() {
        let mut parts = request_parts("/admin/posts/", Some(user(false)));
        let result = AdminUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let mut parts = request_parts("/admin/posts/", Some(user(true)));
        assert!(AdminUser::from_request_parts(&mut parts, &()).await.is_ok());
    }
}
