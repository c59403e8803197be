//! Feed, post and follow pages.

use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request, State},
    http::{Uri, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use maud::Markup;
use serde::Deserialize;
use yatube_common::AppError;
use yatube_core::{
    CommentForm, EditOutcome, FieldErrors, ImageUpload, ModelForm, PostForm, is_author,
};

use crate::cache::{INDEX_PAGE_KEY, PageCache};
use crate::error::PageError;
use crate::extractors::{AuthUser, MaybeAuthUser};
use crate::middleware::AppState;
use crate::templates::{
    self,
    posts::{DetailContext, ProfileContext},
    profile_url,
};

/// Largest accepted post submission, image included.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Public pages.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route(
            "/profile/{username}/follow/",
            get(profile_follow).post(profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            get(profile_unfollow).post(profile_unfollow),
        )
        .route("/posts/{post_id}/", get(post_detail))
        .route(
            "/posts/{post_id}/edit/",
            get(post_edit_form)
                .post(post_edit)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/posts/{post_id}/comment/",
            get(comment_redirect).post(add_comment),
        )
        .route(
            "/create/",
            get(post_create_form)
                .post(post_create)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/follow/", get(follow_index))
}

/// `?page=` of a list page. Kept raw: the paginator decides what it means.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

fn detail_url(post_id: &str) -> String {
    format!("/posts/{post_id}/")
}

// ==================== Feeds ====================

async fn index(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    // Resolve first so junk `?page=` values share the entry of the page
    // they land on.
    let meta = state.post_service.index_meta(query.page.as_deref()).await?;
    let key = PageCache::key(
        INDEX_PAGE_KEY,
        viewer.as_ref().map(|u| u.id.as_str()),
        meta.number,
    );

    let body = state
        .page_cache
        .get_or_render(&key, || async {
            let posts = state.post_service.index_page(meta).await?;
            Ok(templates::posts::index(viewer.as_ref(), &posts).into_string())
        })
        .await?;

    Ok(Html(body))
}

async fn group_posts(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> Result<Markup, PageError> {
    let group = state
        .group_service
        .get_by_slug(&slug)
        .await
        .map_err(|e| PageError::new(e, uri.path()))?;
    let posts = state
        .post_service
        .group_feed(&group, query.page.as_deref())
        .await?;

    Ok(templates::posts::group_list(viewer.as_ref(), &group, &posts))
}

async fn profile(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> Result<Markup, PageError> {
    let author = state
        .user_service
        .get_by_username(&username)
        .await
        .map_err(|e| PageError::new(e, uri.path()))?;
    let posts = state
        .post_service
        .author_feed(&author, query.page.as_deref())
        .await?;

    // No button on your own profile or for anonymous visitors
    let following = match &viewer {
        Some(v) if v.id != author.id => Some(
            state
                .follow_service
                .is_following(Some(v), &author)
                .await?,
        ),
        _ => None,
    };
    let (followers, following_count) = state.follow_service.counts(&author.id).await?;

    let ctx = ProfileContext {
        author: &author,
        posts: &posts,
        followers,
        following_count,
        following,
    };
    Ok(templates::posts::profile(viewer.as_ref(), &ctx))
}

async fn follow_index(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Markup, PageError> {
    let posts = state
        .post_service
        .follow_feed(&user.id, query.page.as_deref())
        .await?;
    Ok(templates::posts::follow_index(Some(&user), &posts))
}

// ==================== Posts ====================

async fn post_detail(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(post_id): Path<String>,
    uri: Uri,
) -> Result<Markup, PageError> {
    let view = state
        .post_service
        .get_view(&post_id)
        .await
        .map_err(|e| PageError::new(e, uri.path()))?;
    let author_posts = state
        .post_service
        .count_by_author(&view.post.author_id)
        .await?;
    let comments = state.comment_service.list_for_post(&view.post.id).await?;

    let ctx = DetailContext {
        post: &view,
        author_posts,
        comments: &comments,
        can_edit: viewer.as_ref().is_some_and(|v| is_author(v, &view.post)),
    };
    Ok(templates::posts::post_detail(viewer.as_ref(), &ctx))
}

async fn post_create_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Markup, PageError> {
    let groups = state.group_service.list_all().await?;
    Ok(templates::posts::post_form(
        Some(&user),
        &PostForm::default(),
        &FieldErrors::new(),
        &groups,
        None,
    ))
}

async fn post_create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PostSubmission(form): PostSubmission,
) -> Result<Response, PageError> {
    let groups = state.group_service.list_all().await?;

    match form.validate(&groups) {
        Ok(record) => {
            state.post_service.create(&user, record).await?;
            Ok(Redirect::to(&profile_url(&user.username)).into_response())
        }
        Err(errors) => {
            tracing::debug!(errors = %errors, "Rejected new post");
            Ok(
                templates::posts::post_form(Some(&user), &form, &errors, &groups, None)
                    .into_response(),
            )
        }
    }
}

async fn post_edit_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    uri: Uri,
) -> Result<Response, PageError> {
    let post = state
        .post_service
        .get(&post_id)
        .await
        .map_err(|e| PageError::new(e, uri.path()))?;
    if !is_author(&user, &post) {
        return Ok(Redirect::to(&detail_url(&post.id)).into_response());
    }

    let groups = state.group_service.list_all().await?;
    Ok(templates::posts::post_form(
        Some(&user),
        &PostForm::from_post(&post),
        &FieldErrors::new(),
        &groups,
        Some(&post.id),
    )
    .into_response())
}

async fn post_edit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    uri: Uri,
    PostSubmission(form): PostSubmission,
) -> Result<Response, PageError> {
    let post = state
        .post_service
        .get(&post_id)
        .await
        .map_err(|e| PageError::new(e, uri.path()))?;
    if !is_author(&user, &post) {
        return Ok(Redirect::to(&detail_url(&post.id)).into_response());
    }

    let groups = state.group_service.list_all().await?;
    let record = match form.validate(&groups) {
        Ok(record) => record,
        Err(errors) => {
            return Ok(templates::posts::post_form(
                Some(&user),
                &form,
                &errors,
                &groups,
                Some(&post.id),
            )
            .into_response());
        }
    };

    let post = match state.post_service.edit(&user, &post.id, record).await? {
        EditOutcome::Saved(post) | EditOutcome::NotAuthor(post) => post,
    };
    Ok(Redirect::to(&detail_url(&post.id)).into_response())
}

// ==================== Comments ====================

#[derive(Debug, Default, Deserialize)]
struct CommentInput {
    #[serde(default)]
    text: String,
}

async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    uri: Uri,
    Form(input): Form<CommentInput>,
) -> Result<Redirect, PageError> {
    let post = state
        .post_service
        .get(&post_id)
        .await
        .map_err(|e| PageError::new(e, uri.path()))?;

    let form = CommentForm { text: input.text };
    match form.validate(&()) {
        Ok(record) => {
            state.comment_service.add(&user, &post.id, record).await?;
        }
        Err(errors) => {
            tracing::debug!(post_id = %post.id, errors = %errors, "Rejected comment");
        }
    }

    Ok(Redirect::to(&detail_url(&post.id)))
}

async fn comment_redirect(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(post_id): Path<String>,
    uri: Uri,
) -> Result<Redirect, PageError> {
    let post = state
        .post_service
        .get(&post_id)
        .await
        .map_err(|e| PageError::new(e, uri.path()))?;
    Ok(Redirect::to(&detail_url(&post.id)))
}

// ==================== Follows ====================

async fn profile_follow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
    uri: Uri,
) -> Result<Redirect, PageError> {
    let author = state
        .follow_service
        .follow(&user, &username)
        .await
        .map_err(|e| PageError::new(e, uri.path()))?;
    Ok(Redirect::to(&profile_url(&author.username)))
}

async fn profile_unfollow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
    uri: Uri,
) -> Result<Redirect, PageError> {
    let author = state
        .follow_service
        .unfollow(&user, &username)
        .await
        .map_err(|e| PageError::new(e, uri.path()))?;
    Ok(Redirect::to(&profile_url(&author.username)))
}

// ==================== Submission ====================

/// Post form fields from a multipart or urlencoded body.
#[derive(Debug)]
pub struct PostSubmission(pub PostForm);

#[derive(Debug, Default, Deserialize)]
struct PostInput {
    #[serde(default)]
    text: String,
    group: Option<String>,
}

impl<S> FromRequest<S> for PostSubmission
where
    S: Send + Sync,
{
    type Rejection = PageError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(input) = Form::<PostInput>::from_request(req, state)
                .await
                .map_err(|e| bad_request(e.body_text()))?;
            return Ok(Self(PostForm {
                text: input.text,
                group: input.group,
                image: None,
            }));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        let mut form = PostForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| bad_request(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => {
                    form.text = field.text().await.map_err(|e| bad_request(e.body_text()))?;
                }
                "group" => {
                    form.group = Some(field.text().await.map_err(|e| bad_request(e.body_text()))?);
                }
                "image" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| bad_request(e.body_text()))?
                        .to_vec();
                    form.image = Some(ImageUpload { filename, data });
                }
                _ => {}
            }
        }

        Ok(Self(form))
    }
}

fn bad_request(message: String) -> PageError {
    PageError::from(AppError::BadRequest(message))
}
