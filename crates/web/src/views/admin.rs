//! Moderation endpoints.
//!
//! JSON over the same services the pages use. Every route requires an
//! administrator; anyone else gets a 403.

#![allow(missing_docs)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use yatube_common::{AppError, AppResult};
use yatube_core::{CommentView, CreateGroupInput, FollowView, PostView};
use yatube_db::entities::{group, post, user};

use crate::extractors::AdminUser;
use crate::middleware::AppState;
use crate::response::{ApiResponse, display_or_empty};

/// Admin routes, mounted under `/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/", get(list_posts))
        .route("/posts/{id}/", patch(set_post_group).delete(delete_post))
        .route("/groups/", get(list_groups).post(create_group))
        .route("/groups/{id}/", patch(rename_group).delete(delete_group))
        .route("/comments/", get(list_comments))
        .route("/comments/{id}/", delete(delete_comment))
        .route("/follows/", get(list_follows))
        .route("/follows/{id}/", delete(delete_follow))
        .route("/users/", get(list_users))
        .route("/users/{id}/", delete(delete_user))
}

/// Search, filters and page of an admin list.
#[derive(Debug, Default, Deserialize)]
pub struct AdminListQuery {
    pub q: Option<String>,
    /// Publication day, `YYYY-MM-DD` (posts only).
    pub date: Option<String>,
    /// Author username (comments only).
    pub author: Option<String>,
    pub page: Option<String>,
}

impl AdminListQuery {
    fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    fn date(&self) -> AppResult<Option<NaiveDate>> {
        match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("Invalid date: {raw:?}"))),
            None => Ok(None),
        }
    }
}

// ==================== Rows ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRow {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<FixedOffset>,
    pub author: String,
    pub group: String,
    pub image: String,
}

impl From<PostView> for PostRow {
    fn from(view: PostView) -> Self {
        Self {
            id: view.post.id,
            text: view.post.text,
            created_at: view.post.created_at,
            author: view.author.username,
            group: display_or_empty(view.group.as_ref().map(|g| g.title.as_str())),
            image: display_or_empty(view.image_url.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupRow {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<group::Model> for GroupRow {
    fn from(group: group::Model) -> Self {
        Self {
            description: display_or_empty(Some(&group.description)),
            id: group.id,
            title: group.title,
            slug: group.slug,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<CommentView> for CommentRow {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            post_id: view.comment.post_id,
            author: view.author.username,
            text: view.comment.text,
            created_at: view.comment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FollowRow {
    pub id: String,
    pub user: String,
    pub author: String,
}

impl From<FollowView> for FollowRow {
    fn from(view: FollowView) -> Self {
        Self {
            id: view.follow.id,
            user: view.user.username,
            author: view.author.username,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub name: String,
    pub is_admin: bool,
    pub created_at: DateTime<FixedOffset>,
}

impl From<user::Model> for UserRow {
    fn from(user: user::Model) -> Self {
        Self {
            name: display_or_empty(user.name.as_deref()),
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

// ==================== Posts ====================

async fn list_posts(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<ApiResponse<Vec<PostRow>>> {
    let page = state
        .post_service
        .search(query.search(), query.date()?, query.page.as_deref())
        .await?;
    Ok(ApiResponse::page(page, PostRow::from))
}

#[derive(Debug, Deserialize)]
pub struct SetGroupRequest {
    /// Group ID; `null` or empty clears the group.
    pub group: Option<String>,
}

async fn set_post_group(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetGroupRequest>,
) -> AppResult<ApiResponse<PostRow>> {
    let post: post::Model = state
        .post_service
        .set_group(&id, req.group.as_deref())
        .await?;
    tracing::info!(admin = %admin.username, post_id = %post.id, "Changed post group");
    let view = state.post_service.get_view(&post.id).await?;
    Ok(ApiResponse::ok(PostRow::from(view)))
}

async fn delete_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.post_service.delete(&id).await?;
    tracing::info!(admin = %admin.username, post_id = %id, "Admin deleted post");
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Groups ====================

async fn list_groups(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<ApiResponse<Vec<GroupRow>>> {
    let page = state
        .group_service
        .search(query.search(), query.page.as_deref())
        .await?;
    Ok(ApiResponse::page(page, GroupRow::from))
}

async fn create_group(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<impl IntoResponse> {
    let group = state.group_service.create(input).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(GroupRow::from(group))))
}

#[derive(Debug, Deserialize)]
pub struct RenameGroupRequest {
    pub title: String,
}

async fn rename_group(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameGroupRequest>,
) -> AppResult<ApiResponse<GroupRow>> {
    let group = state.group_service.rename(&id, &req.title).await?;
    Ok(ApiResponse::ok(GroupRow::from(group)))
}

async fn delete_group(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.group_service.delete(&id).await?;
    tracing::info!(admin = %admin.username, group_id = %id, "Admin deleted group");
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Comments ====================

async fn list_comments(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<ApiResponse<Vec<CommentRow>>> {
    let page = state
        .comment_service
        .search(
            query.search(),
            query.author.as_deref().map(str::trim),
            query.page.as_deref(),
        )
        .await?;
    Ok(ApiResponse::page(page, CommentRow::from))
}

async fn delete_comment(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.comment_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Follows ====================

async fn list_follows(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<ApiResponse<Vec<FollowRow>>> {
    let page = state
        .follow_service
        .search(query.search(), query.page.as_deref())
        .await?;
    Ok(ApiResponse::page(page, FollowRow::from))
}

async fn delete_follow(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.follow_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Users ====================

async fn list_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<ApiResponse<Vec<UserRow>>> {
    let page = state
        .user_service
        .search(query.search(), query.page.as_deref())
        .await?;
    Ok(ApiResponse::page(page, UserRow::from))
}

async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if admin.id == id {
        return Err(AppError::BadRequest(
            "Administrators cannot delete their own account".to_string(),
        ));
    }
    state.user_service.delete(&id).await?;
    tracing::info!(admin = %admin.username, user_id = %id, "Admin deleted user");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_date() {
        let query = AdminListQuery {
            date: Some("2026-10-19".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.date().unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19)
        );

        let blank = AdminListQuery {
            date: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.date().unwrap(), None);

        let bad = AdminListQuery {
            date: Some("19.10.2026".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad.date(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_query_search_ignores_blank() {
        let query = AdminListQuery {
            q: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(query.search().is_none());
    }

    #[test]
    fn test_group_row_empty_description() {
        let row = GroupRow::from(group::Model {
            id: "g1".to_string(),
            title: "Коты".to_string(),
            slug: "koty".to_string(),
            description: String::new(),
        });
        assert_eq!(row.description, "-пусто-");
    }
}
