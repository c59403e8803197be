//! Follow service.
//!
//! Follow edges are unique per `(user, author)` pair and a user never
//! follows themselves. Both operations are idempotent.

use std::collections::HashMap;

use sea_orm::Set;
use serde::Serialize;
use yatube_common::{AppError, AppResult, IdGenerator, Page, Paginator, SharedClock};
use yatube_db::{
    entities::{follow, user},
    repositories::{FollowRepository, UserRepository},
};

/// A follow edge with both users.
#[derive(Debug, Clone, Serialize)]
pub struct FollowView {
    pub follow: follow::Model,
    pub user: user::Model,
    pub author: user::Model,
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
    clock: SharedClock,
    paginator: Paginator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub fn new(
        follow_repo: FollowRepository,
        user_repo: UserRepository,
        clock: SharedClock,
        paginator: Paginator,
    ) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
            clock,
            paginator,
        }
    }

    /// Follow `author_username`. Returns the author.
    ///
    /// Following yourself or someone already followed does nothing.
    pub async fn follow(&self, user: &user::Model, author_username: &str) -> AppResult<user::Model> {
        let author = self.user_repo.get_by_username(author_username).await?;

        if author.id == user.id {
            return Ok(author);
        }
        if self.follow_repo.is_following(&user.id, &author.id).await? {
            return Ok(author);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            author_id: Set(author.id.clone()),
            created_at: Set(self.clock.now().into()),
        };

        match self.follow_repo.create(model).await {
            Ok(_) => {
                tracing::info!(user = %user.username, author = %author.username, "Followed");
            }
            // Lost a race with an identical request; the edge exists.
            Err(AppError::Conflict(_)) => {
                tracing::debug!(user = %user.username, author = %author.username, "Follow already recorded");
            }
            Err(e) => return Err(e),
        }

        Ok(author)
    }

    /// Stop following `author_username`. Returns the author.
    pub async fn unfollow(
        &self,
        user: &user::Model,
        author_username: &str,
    ) -> AppResult<user::Model> {
        let author = self.user_repo.get_by_username(author_username).await?;
        let removed = self.follow_repo.delete_by_pair(&user.id, &author.id).await?;
        if removed > 0 {
            tracing::info!(user = %user.username, author = %author.username, "Unfollowed");
        }
        Ok(author)
    }

    /// Whether `viewer` follows `author`. Anonymous viewers follow nobody.
    pub async fn is_following(
        &self,
        viewer: Option<&user::Model>,
        author: &user::Model,
    ) -> AppResult<bool> {
        match viewer {
            Some(v) if v.id != author.id => self.follow_repo.is_following(&v.id, &author.id).await,
            _ => Ok(false),
        }
    }

    /// Follower and following counts of a user.
    pub async fn counts(&self, user_id: &str) -> AppResult<(u64, u64)> {
        let followers = self.follow_repo.count_followers(user_id).await?;
        let following = self.follow_repo.count_following(user_id).await?;
        Ok((followers, following))
    }

    /// List follow edges for the admin surface.
    pub async fn search(
        &self,
        query: Option<&str>,
        page: Option<&str>,
    ) -> AppResult<Page<FollowView>> {
        let count = self.follow_repo.count_search(query).await?;
        let meta = self.paginator.page_meta(count, page);
        let follows = self
            .follow_repo
            .search(query, meta.per_page, meta.offset())
            .await?;

        let mut ids: Vec<String> = follows
            .iter()
            .flat_map(|f| [f.user_id.clone(), f.author_id.clone()])
            .collect();
        ids.sort_unstable();
        ids.dedup();
        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let lookup = |id: &str| {
            users
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::UserNotFound(id.to_string()))
        };
        let views = follows
            .into_iter()
            .map(|follow| {
                Ok(FollowView {
                    user: lookup(&follow.user_id)?,
                    author: lookup(&follow.author_id)?,
                    follow,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page::new(views, meta))
    }

    /// Delete a follow edge by ID.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let follow = self
            .follow_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Follow {id}")))?;
        self.follow_repo.delete(&follow.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use yatube_common::SystemClock;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            name: None,
            password: String::new(),
            token: None,
            is_admin: false,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_follow(id: &str, user_id: &str, author_id: &str) -> follow::Model {
        follow::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(follow_db: MockDatabase, user_db: MockDatabase) -> FollowService {
        FollowService::new(
            FollowRepository::new(Arc::new(follow_db.into_connection())),
            UserRepository::new(Arc::new(user_db.into_connection())),
            Arc::new(SystemClock),
            Paginator::default(),
        )
    }

    fn empty() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    #[tokio::test]
    async fn test_follow_yourself_is_noop() {
        let me = create_test_user("u1", "leo");
        // No follow queries are queued: touching the follow table would fail.
        let service = service(empty(), empty().append_query_results([[me.clone()]]));

        let author = service.follow(&me, "leo").await.unwrap();
        assert_eq!(author.id, "u1");
    }

    #[tokio::test]
    async fn test_follow_twice_creates_one_edge() {
        let me = create_test_user("u1", "leo");
        let author = create_test_user("u2", "anton");

        // Second call finds the edge and returns before inserting.
        let service = service(
            empty().append_query_results([[create_test_follow("f1", "u1", "u2")]]),
            empty().append_query_results([[author]]),
        );

        let result = service.follow(&me, "anton").await.unwrap();
        assert_eq!(result.id, "u2");
    }

    #[tokio::test]
    async fn test_follow_creates_edge() {
        let me = create_test_user("u1", "leo");
        let author = create_test_user("u2", "anton");

        let service = service(
            empty()
                .append_query_results([Vec::<follow::Model>::new()])
                .append_query_results([[create_test_follow("f1", "u1", "u2")]]),
            empty().append_query_results([[author]]),
        );

        assert!(service.follow(&me, "anton").await.is_ok());
    }

    #[tokio::test]
    async fn test_follow_unknown_author() {
        let me = create_test_user("u1", "leo");
        let service = service(
            empty(),
            empty().append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.follow(&me, "ghost").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_unfollow_without_follow_is_noop() {
        let me = create_test_user("u1", "leo");
        let service = service(
            empty().append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]),
            empty().append_query_results([[create_test_user("u2", "anton")]]),
        );

        assert!(service.unfollow(&me, "anton").await.is_ok());
    }

    #[tokio::test]
    async fn test_is_following_anonymous_and_self() {
        let author = create_test_user("u1", "leo");
        let service = service(empty(), empty());

        assert!(!service.is_following(None, &author).await.unwrap());
        assert!(!service.is_following(Some(&author), &author).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_attaches_both_users() {
        let service = service(
            empty()
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[create_test_follow("f1", "u1", "u2")]]),
            empty().append_query_results([[
                create_test_user("u1", "leo"),
                create_test_user("u2", "anton"),
            ]]),
        );

        let page = service.search(Some("leo"), None).await.unwrap();
        assert_eq!(page.items[0].user.username, "leo");
        assert_eq!(page.items[0].author.username, "anton");
    }
}
