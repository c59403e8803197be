//! Signup, login and logout.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use maud::Markup;
use serde::Deserialize;
use validator::Validate;
use yatube_common::AppError;
use yatube_core::{FieldErrors, RegisterInput};

use crate::error::PageError;
use crate::extractors::{MaybeAuthUser, safe_next};
use crate::middleware::{AppState, TOKEN_COOKIE};
use crate::templates;

const INVALID_LOGIN: &str = "Пожалуйста, введите правильные имя пользователя и пароль. \
                             Оба поля могут быть чувствительны к регистру.";
const USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";

/// Account pages, mounted under `/auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup/", get(signup_form).post(signup))
        .route("/login/", get(login_form).post(login))
        .route("/logout/", get(logout).post(logout))
}

#[derive(Debug, Default, Deserialize)]
struct SignupInput {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginInput {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NextQuery {
    next: Option<String>,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn signup_form() -> Markup {
    templates::auth::signup("", "", &FieldErrors::new())
}

async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<SignupInput>,
) -> Result<Response, PageError> {
    let name = input.name.clone().unwrap_or_default();
    let register = RegisterInput {
        username: input.username.trim().to_string(),
        password: input.password,
        name: input.name,
    };

    if let Err(e) = register.validate() {
        let errors = FieldErrors::from(e);
        return Ok(templates::auth::signup(&register.username, &name, &errors).into_response());
    }

    let username = register.username.clone();
    match state.user_service.register(register).await {
        Ok(user) => {
            let jar = match user.token {
                Some(token) => jar.add(session_cookie(token)),
                None => jar,
            };
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(AppError::Conflict(_)) => {
            let mut errors = FieldErrors::new();
            errors.add("username", USERNAME_TAKEN);
            Ok(templates::auth::signup(&username, &name, &errors).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn login_form(Query(query): Query<NextQuery>) -> Markup {
    templates::auth::login("", query.next.as_deref(), &FieldErrors::new())
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<LoginInput>,
) -> Result<Response, PageError> {
    match state
        .user_service
        .login(input.username.trim(), &input.password)
        .await
    {
        Ok((user, token)) => {
            tracing::info!(username = %user.username, "Logged in");
            let next = safe_next(input.next.as_deref()).to_string();
            Ok((jar.add(session_cookie(token)), Redirect::to(&next)).into_response())
        }
        Err(AppError::Unauthorized) => {
            let mut errors = FieldErrors::new();
            errors.add("__all__", INVALID_LOGIN);
            Ok(
                templates::auth::login(&input.username, input.next.as_deref(), &errors)
                    .into_response(),
            )
        }
        Err(e) => Err(e.into()),
    }
}

async fn logout(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: CookieJar,
) -> Result<Response, PageError> {
    if let Some(user) = user {
        // Rotating the token ends every session of this account
        state.user_service.regenerate_token(&user.id).await?;
        tracing::info!(username = %user.username, "Logged out");
    }

    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    Ok((jar, Redirect::to("/")).into_response())
}
