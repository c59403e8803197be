//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, Post, User, comment, post, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, sea_query::Query,
};
use yatube_common::{AppError, AppResult};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments on a post, oldest first.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Comment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List comments for the admin surface, newest first.
    ///
    /// `query` matches a substring of the commented post's text or of the
    /// comment author's username; `author_id` keeps one author's comments.
    pub async fn search(
        &self,
        query: Option<&str>,
        author_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Self::admin_filter(query, author_id)
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments matching [`Self::search`].
    pub async fn count_search(
        &self,
        query: Option<&str>,
        author_id: Option<&str>,
    ) -> AppResult<u64> {
        Self::admin_filter(query, author_id)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn admin_filter(query: Option<&str>, author_id: Option<&str>) -> Select<Comment> {
        let mut condition = Condition::all();

        if let Some(q) = query.filter(|q| !q.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(
                        comment::Column::PostId.in_subquery(
                            Query::select()
                                .column(post::Column::Id)
                                .from(Post)
                                .and_where(post::Column::Text.contains(q))
                                .to_owned(),
                        ),
                    )
                    .add(
                        comment::Column::AuthorId.in_subquery(
                            Query::select()
                                .column(user::Column::Id)
                                .from(User)
                                .and_where(user::Column::Username.contains(q))
                                .to_owned(),
                        ),
                    ),
            );
        }

        if let Some(author) = author_id {
            condition = condition.add(comment::Column::AuthorId.eq(author));
        }

        Comment::find().filter(condition)
    }
}
