//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, User, follow, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, sea_query::Query,
};
use yatube_common::{AppError, AppResult};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow edge by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<follow::Model>> {
        Follow::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the edge `user_id -> author_id`.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        author_id: &str,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user follows an author.
    pub async fn is_following(&self, user_id: &str, author_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, author_id).await?.is_some())
    }

    /// Create a new follow edge.
    ///
    /// A unique-constraint violation (the edge already exists) is reported as
    /// [`AppError::Conflict`].
    pub async fn create(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| super::insert_error(&e, "already following"))
    }

    /// Delete a follow edge by ID.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Follow::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete the edge `user_id -> author_id` if present.
    pub async fn delete_by_pair(&self, user_id: &str, author_id: &str) -> AppResult<u64> {
        let result = Follow::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count authors a user follows.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count followers of an author.
    pub async fn count_followers(&self, author_id: &str) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List follow edges for the admin surface, newest first.
    ///
    /// `query` matches a substring of either side's username.
    pub async fn search(
        &self,
        query: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<follow::Model>> {
        Self::admin_filter(query)
            .order_by_desc(follow::Column::CreatedAt)
            .order_by_desc(follow::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count follow edges matching [`Self::search`].
    pub async fn count_search(&self, query: Option<&str>) -> AppResult<u64> {
        Self::admin_filter(query)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn admin_filter(query: Option<&str>) -> Select<Follow> {
        let Some(q) = query.filter(|q| !q.is_empty()) else {
            return Follow::find();
        };

        let matching_users = Query::select()
            .column(user::Column::Id)
            .from(User)
            .and_where(user::Column::Username.contains(q))
            .to_owned();

        Follow::find().filter(
            Condition::any()
                .add(follow::Column::UserId.in_subquery(matching_users.clone()))
                .add(follow::Column::AuthorId.in_subquery(matching_users)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait};
    use std::sync::Arc;

    fn create_test_follow(id: &str, user_id: &str, author_id: &str) -> follow::Model {
        follow::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_following_true() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow("f1", "u1", "u2")]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(repo.is_following("u1", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_following_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(!repo.is_following("u1", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert_eq!(repo.delete_by_pair("u1", "u2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_followers() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4))
                }]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert_eq!(repo.count_followers("u2").await.unwrap(), 4);
    }

    #[test]
    fn test_admin_filter_without_query_is_unfiltered() {
        let sql = FollowRepository::admin_filter(Some(""))
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_admin_filter_matches_either_side() {
        let sql = FollowRepository::admin_filter(Some("leo"))
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""follow"."user_id" IN (SELECT"#));
        assert!(sql.contains(r#""follow"."author_id" IN (SELECT"#));
        assert!(sql.contains(r#""user"."username" LIKE '%leo%'"#));
    }
}
