//! Post service: feeds, authoring and moderation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::Set;
use serde::Serialize;
use yatube_common::{
    AppError, AppResult, IdGenerator, Page, PageMeta, Paginator, SharedClock, StorageBackend,
    generate_storage_key,
};
use yatube_db::{
    entities::{group, post, user},
    repositories::{GroupRepository, PostRepository, UserRepository},
};

use crate::forms::{PostRecord, ValidImage};

/// Storage prefix for post images.
const IMAGE_PREFIX: &str = "posts";

/// A post with everything a card needs to render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub post: post::Model,
    pub author: user::Model,
    pub group: Option<group::Model>,
    pub image_url: Option<String>,
}

/// Result of an edit attempt.
#[derive(Debug, Clone)]
pub enum EditOutcome {
    /// The post was saved.
    Saved(post::Model),
    /// The actor is not the author; nothing changed.
    NotAuthor(post::Model),
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    clock: SharedClock,
    paginator: Paginator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        storage: Arc<dyn StorageBackend>,
        clock: SharedClock,
        paginator: Paginator,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            storage,
            id_gen: IdGenerator::new(),
            clock,
            paginator,
        }
    }

    /// Get a post by ID.
    pub async fn get(&self, id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// Get a post by ID with its author and group.
    pub async fn get_view(&self, id: &str) -> AppResult<PostView> {
        let post = self.post_repo.get_by_id(id).await?;
        let mut views = self.hydrate(vec![post]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Number of posts by an author.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        self.post_repo.count_by_author(author_id).await
    }

    // ==================== Feeds ====================

    /// Landing feed: every post, newest first.
    pub async fn index(&self, page: Option<&str>) -> AppResult<Page<PostView>> {
        let meta = self.index_meta(page).await?;
        self.index_page(meta).await
    }

    /// Where `page` lands in the landing feed right now.
    pub async fn index_meta(&self, page: Option<&str>) -> AppResult<PageMeta> {
        let count = self.post_repo.count_all().await?;
        Ok(self.paginator.page_meta(count, page))
    }

    /// One already-resolved page of the landing feed.
    pub async fn index_page(&self, meta: PageMeta) -> AppResult<Page<PostView>> {
        let posts = self
            .post_repo
            .find_all(meta.per_page, meta.offset())
            .await?;
        Ok(Page::new(self.hydrate(posts).await?, meta))
    }

    /// Posts in a group.
    pub async fn group_feed(
        &self,
        group: &group::Model,
        page: Option<&str>,
    ) -> AppResult<Page<PostView>> {
        let count = self.post_repo.count_by_group(&group.id).await?;
        let meta = self.paginator.page_meta(count, page);
        let posts = self
            .post_repo
            .find_by_group(&group.id, meta.per_page, meta.offset())
            .await?;
        Ok(Page::new(self.hydrate(posts).await?, meta))
    }

    /// Posts by one author.
    pub async fn author_feed(
        &self,
        author: &user::Model,
        page: Option<&str>,
    ) -> AppResult<Page<PostView>> {
        let count = self.post_repo.count_by_author(&author.id).await?;
        let meta = self.paginator.page_meta(count, page);
        let posts = self
            .post_repo
            .find_by_author(&author.id, meta.per_page, meta.offset())
            .await?;
        Ok(Page::new(self.hydrate(posts).await?, meta))
    }

    /// Posts by every author `user_id` follows.
    pub async fn follow_feed(&self, user_id: &str, page: Option<&str>) -> AppResult<Page<PostView>> {
        let count = self.post_repo.count_feed(user_id).await?;
        let meta = self.paginator.page_meta(count, page);
        let posts = self
            .post_repo
            .find_feed(user_id, meta.per_page, meta.offset())
            .await?;
        Ok(Page::new(self.hydrate(posts).await?, meta))
    }

    // ==================== Authoring ====================

    /// Publish a validated post as `author`.
    pub async fn create(&self, author: &user::Model, record: PostRecord) -> AppResult<post::Model> {
        let image = match &record.image {
            Some(image) => Some(self.store_image(&author.id, image).await?),
            None => None,
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(record.text),
            author_id: Set(author.id.clone()),
            group_id: Set(record.group_id),
            image: Set(image.clone()),
            created_at: Set(self.clock.now().into()),
        };

        let post = match self.post_repo.create(model).await {
            Ok(post) => post,
            Err(e) => {
                if let Some(key) = &image {
                    self.remove_image(key).await;
                }
                return Err(e);
            }
        };
        tracing::info!(post_id = %post.id, author = %author.username, "Created post");
        Ok(post)
    }

    /// Apply a validated edit if `actor` wrote the post.
    ///
    /// The author and publication time never change. Without a new image
    /// the old one is kept.
    pub async fn edit(
        &self,
        actor: &user::Model,
        post_id: &str,
        record: PostRecord,
    ) -> AppResult<EditOutcome> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if !is_author(actor, &post) {
            tracing::debug!(post_id = %post.id, actor = %actor.username, "Edit by non-author ignored");
            return Ok(EditOutcome::NotAuthor(post));
        }

        let old_image = post.image.clone();
        let new_image = match &record.image {
            Some(image) => Some(self.store_image(&actor.id, image).await?),
            None => None,
        };

        let mut active: post::ActiveModel = post.into();
        active.text = Set(record.text);
        active.group_id = Set(record.group_id);
        if let Some(key) = &new_image {
            active.image = Set(Some(key.clone()));
        }
        let post = match self.post_repo.update(active).await {
            Ok(post) => post,
            Err(e) => {
                if let Some(key) = &new_image {
                    self.remove_image(key).await;
                }
                return Err(e);
            }
        };

        if let (Some(_), Some(old)) = (new_image, old_image) {
            self.remove_image(&old).await;
        }

        tracing::info!(post_id = %post.id, "Edited post");
        Ok(EditOutcome::Saved(post))
    }

    // ==================== Admin ====================

    /// List posts for the admin surface.
    pub async fn search(
        &self,
        query: Option<&str>,
        created_on: Option<NaiveDate>,
        page: Option<&str>,
    ) -> AppResult<Page<PostView>> {
        let count = self.post_repo.count_search(query, created_on).await?;
        let meta = self.paginator.page_meta(count, page);
        let posts = self
            .post_repo
            .search(query, created_on, meta.per_page, meta.offset())
            .await?;
        Ok(Page::new(self.hydrate(posts).await?, meta))
    }

    /// File a post under another group, or under none.
    pub async fn set_group(&self, post_id: &str, group_id: Option<&str>) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let group_id = match group_id.filter(|g| !g.is_empty()) {
            Some(id) => Some(self.group_repo.get_by_id(id).await?.id),
            None => None,
        };
        self.post_repo.set_group(&post.id, group_id).await
    }

    /// Delete a post with its comments and image.
    pub async fn delete(&self, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.post_repo.delete(&post.id).await?;
        if let Some(key) = &post.image {
            self.remove_image(key).await;
        }
        tracing::info!(post_id = %post.id, "Deleted post");
        Ok(())
    }

    // ==================== Helpers ====================

    /// Public URL of a stored image.
    #[must_use]
    pub fn image_url(&self, key: &str) -> String {
        self.storage.public_url(key)
    }

    async fn store_image(&self, user_id: &str, image: &ValidImage) -> AppResult<String> {
        let name = format!("upload.{}", image.extension());
        let key = generate_storage_key(IMAGE_PREFIX, user_id, &name, self.clock.now());
        let uploaded = self
            .storage
            .upload(&key, &image.data, image.content_type())
            .await?;
        tracing::debug!(
            key = %uploaded.key,
            original = %image.filename,
            size = uploaded.size,
            md5 = %uploaded.md5,
            "Stored post image"
        );
        Ok(uploaded.key)
    }

    async fn remove_image(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete post image");
        }
    }

    /// Attach authors and groups, loaded in one query each.
    async fn hydrate(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostView>> {
        let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut group_ids: Vec<String> = posts.iter().filter_map(|p| p.group_id.clone()).collect();
        group_ids.sort_unstable();
        group_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let groups: HashMap<String, group::Model> = self
            .group_repo
            .find_by_ids(&group_ids)
            .await?
            .into_iter()
            .map(|g| (g.id.clone(), g))
            .collect();

        posts
            .into_iter()
            .map(|post| {
                let author = authors
                    .get(&post.author_id)
                    .cloned()
                    .ok_or_else(|| AppError::UserNotFound(post.author_id.clone()))?;
                let group = post.group_id.as_ref().and_then(|id| groups.get(id).cloned());
                let image_url = post.image.as_deref().map(|key| self.image_url(key));
                Ok(PostView {
                    post,
                    author,
                    group,
                    image_url,
                })
            })
            .collect()
    }
}

/// Whether `user` wrote `post`.
#[must_use]
pub fn is_author(user: &user::Model, post: &post::Model) -> bool {
    user.id == post.author_id
}
