//! Post repository.
//!
//! Every list query orders newest first (`created_at DESC, id DESC`) and is
//! paired with a `count_*` query so callers can build page-number
//! pagination.

use std::sync::Arc;

use crate::entities::{Follow, Post, follow, post};
use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, sea_query::Query,
};
use yatube_common::{AppError, AppResult};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a post to another group, or out of any group.
    pub async fn set_group(&self, id: &str, group_id: Option<String>) -> AppResult<post::Model> {
        let model = post::ActiveModel {
            id: Set(id.to_string()),
            group_id: Set(group_id),
            ..Default::default()
        };
        self.update(model).await
    }

    /// Delete a post. Its comments go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ==================== Feeds ====================

    /// All posts (landing feed).
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<post::Model>> {
        self.fetch_page(Post::find(), limit, offset).await
    }

    /// Count all posts.
    pub async fn count_all(&self) -> AppResult<u64> {
        self.count(Post::find()).await
    }

    /// Posts filed under a group.
    pub async fn find_by_group(
        &self,
        group_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        self.fetch_page(Self::by_group(group_id), limit, offset)
            .await
    }

    /// Count posts filed under a group.
    pub async fn count_by_group(&self, group_id: &str) -> AppResult<u64> {
        self.count(Self::by_group(group_id)).await
    }

    /// Posts written by a user.
    pub async fn find_by_author(
        &self,
        author_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        self.fetch_page(Self::by_author(author_id), limit, offset)
            .await
    }

    /// Count posts written by a user.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        self.count(Self::by_author(author_id)).await
    }

    /// Posts by every author the user follows.
    pub async fn find_feed(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        self.fetch_page(Self::feed(user_id), limit, offset).await
    }

    /// Count posts in the follow feed of a user.
    pub async fn count_feed(&self, user_id: &str) -> AppResult<u64> {
        self.count(Self::feed(user_id)).await
    }

    // ==================== Admin ====================

    /// List posts for the admin surface.
    ///
    /// `query` matches a substring of the text; `created_on` keeps only posts
    /// published on that (UTC) day.
    pub async fn search(
        &self,
        query: Option<&str>,
        created_on: Option<NaiveDate>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        self.fetch_page(Self::admin_filter(query, created_on), limit, offset)
            .await
    }

    /// Count posts matching [`Self::search`].
    pub async fn count_search(
        &self,
        query: Option<&str>,
        created_on: Option<NaiveDate>,
    ) -> AppResult<u64> {
        self.count(Self::admin_filter(query, created_on)).await
    }

    fn by_group(group_id: &str) -> Select<Post> {
        Post::find().filter(post::Column::GroupId.eq(group_id))
    }

    fn by_author(author_id: &str) -> Select<Post> {
        Post::find().filter(post::Column::AuthorId.eq(author_id))
    }

    fn feed(user_id: &str) -> Select<Post> {
        Post::find().filter(
            post::Column::AuthorId.in_subquery(
                Query::select()
                    .column(follow::Column::AuthorId)
                    .from(Follow)
                    .and_where(follow::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
    }

    fn admin_filter(query: Option<&str>, created_on: Option<NaiveDate>) -> Select<Post> {
        let mut condition = Condition::all();

        if let Some(q) = query.filter(|q| !q.is_empty()) {
            condition = condition.add(post::Column::Text.contains(q));
        }

        if let Some(day) = created_on {
            let start = Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN));
            let end = start + chrono::Duration::days(1);
            condition = condition
                .add(post::Column::CreatedAt.gte(start))
                .add(post::Column::CreatedAt.lt(end));
        }

        Post::find().filter(condition)
    }

    async fn fetch_page(
        &self,
        select: Select<Post>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        select
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count(&self, select: Select<Post>) -> AppResult<u64> {
        select
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
