//! Comment service.

use std::collections::HashMap;

use sea_orm::Set;
use serde::Serialize;
use yatube_common::{AppError, AppResult, IdGenerator, Page, Paginator, SharedClock};
use yatube_db::{
    entities::{comment, user},
    repositories::{CommentRepository, PostRepository, UserRepository},
};

use crate::forms::CommentRecord;

/// A comment with its author.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub comment: comment::Model,
    pub author: user::Model,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
    clock: SharedClock,
    paginator: Paginator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
        clock: SharedClock,
        paginator: Paginator,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
            clock,
            paginator,
        }
    }

    /// Comment on a post as `author`.
    pub async fn add(
        &self,
        author: &user::Model,
        post_id: &str,
        record: CommentRecord,
    ) -> AppResult<comment::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            author_id: Set(author.id.clone()),
            text: Set(record.text),
            created_at: Set(self.clock.now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::debug!(comment_id = %comment.id, post_id = %comment.post_id, "Added comment");
        Ok(comment)
    }

    /// Comments on a post, oldest first.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;
        self.hydrate(comments).await
    }

    /// List comments for the admin surface.
    ///
    /// `author` is a username; an unknown one yields an empty page.
    pub async fn search(
        &self,
        query: Option<&str>,
        author: Option<&str>,
        page: Option<&str>,
    ) -> AppResult<Page<CommentView>> {
        let author_id = match author.filter(|a| !a.is_empty()) {
            Some(username) => match self.user_repo.find_by_username(username).await? {
                Some(user) => Some(user.id),
                None => return Ok(Page::new(vec![], self.paginator.page_meta(0, page))),
            },
            None => None,
        };

        let count = self
            .comment_repo
            .count_search(query, author_id.as_deref())
            .await?;
        let meta = self.paginator.page_meta(count, page);
        let comments = self
            .comment_repo
            .search(query, author_id.as_deref(), meta.per_page, meta.offset())
            .await?;
        Ok(Page::new(self.hydrate(comments).await?, meta))
    }

    /// Delete a comment.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let comment = self
            .comment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {id}")))?;
        self.comment_repo.delete(&comment.id).await?;
        tracing::info!(comment_id = %comment.id, "Deleted comment");
        Ok(())
    }

    async fn hydrate(&self, comments: Vec<comment::Model>) -> AppResult<Vec<CommentView>> {
        let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        comments
            .into_iter()
            .map(|comment| {
                let author = authors
                    .get(&comment.author_id)
                    .cloned()
                    .ok_or_else(|| AppError::UserNotFound(comment.author_id.clone()))?;
                Ok(CommentView { comment, author })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{CommentForm, ModelForm};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use yatube_common::SystemClock;
    use yatube_db::entities::post;

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

    fn create_test_comment(id: &str, author_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: "p1".to_string(),
            author_id: author_id.to_string(),
            text: "Комментарий".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(
        comment_db: MockDatabase,
        post_db: MockDatabase,
        user_db: MockDatabase,
    ) -> CommentService {
        CommentService::new(
            CommentRepository::new(Arc::new(comment_db.into_connection())),
            PostRepository::new(Arc::new(post_db.into_connection())),
            UserRepository::new(Arc::new(user_db.into_connection())),
            Arc::new(SystemClock),
            Paginator::default(),
        )
    }

    fn empty() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    #[tokio::test]
    async fn test_add_to_missing_post() {
        let service = service(
            empty(),
            empty().append_query_results([Vec::<post::Model>::new()]),
            empty(),
        );

        let record = CommentForm {
            text: "hello".to_string(),
        }
        .validate(&())
        .unwrap();

        let result = service
            .add(&create_test_user("u1", "leo"), "missing", record)
            .await;
        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_add() {
        let post = post::Model {
            id: "p1".to_string(),
            text: "post".to_string(),
            author_id: "u2".to_string(),
            group_id: None,
            image: None,
            created_at: Utc::now().into(),
        };
        let service = service(
            empty().append_query_results([[create_test_comment("c1", "u1")]]),
            empty().append_query_results([[post]]),
            empty(),
        );

        let record = CommentForm {
            text: "Комментарий".to_string(),
        }
        .validate(&())
        .unwrap();

        let comment = service
            .add(&create_test_user("u1", "leo"), "p1", record)
            .await
            .unwrap();
        assert_eq!(comment.post_id, "p1");
        assert_eq!(comment.author_id, "u1");
    }

    #[tokio::test]
    async fn test_list_for_post_attaches_authors() {
        let service = service(
            empty().append_query_results([[
                create_test_comment("c1", "u1"),
                create_test_comment("c2", "u2"),
            ]]),
            empty(),
            empty().append_query_results([[
                create_test_user("u1", "leo"),
                create_test_user("u2", "anton"),
            ]]),
        );

        let comments = service.list_for_post("p1").await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].author.username, "anton");
    }

    #[tokio::test]
    async fn test_search_unknown_author_is_empty() {
        let service = service(
            empty(),
            empty(),
            empty().append_query_results([Vec::<user::Model>::new()]),
        );

        let page = service.search(None, Some("ghost"), None).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.meta.num_pages, 1);
    }
}
