//! Group service.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator, Page, Paginator};
use yatube_db::{entities::group, repositories::GroupRepository};

/// Maximum slug length (the column is `VARCHAR(50)`).
pub const MAX_SLUG_LENGTH: usize = 50;

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s_-]").expect("compile slug filter regex"));
static SLUG_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_-]+").expect("compile slug separator regex"));

/// Group service for business logic.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    id_gen: IdGenerator,
    paginator: Paginator,
}

/// Input for creating a group.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Derived from the title when omitted.
    #[validate(length(max = 50))]
    pub slug: Option<String>,

    #[serde(default)]
    pub description: String,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub fn new(group_repo: GroupRepository, paginator: Paginator) -> Self {
        Self {
            group_repo,
            id_gen: IdGenerator::new(),
            paginator,
        }
    }

    /// Get a group by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<group::Model> {
        self.group_repo.get_by_slug(slug).await
    }

    /// All groups, for the post form's choice list.
    pub async fn list_all(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_all().await
    }

    /// Create a group.
    pub async fn create(&self, input: CreateGroupInput) -> AppResult<group::Model> {
        input.validate()?;

        let slug = match input.slug.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => slugify(&input.title),
        };
        if slug.is_empty() || slugify(&slug) != slug {
            return Err(AppError::Validation(format!("Invalid slug: {slug:?}")));
        }

        if self.group_repo.find_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A group with slug {slug:?} already exists"
            )));
        }

        let model = group::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title.trim().to_string()),
            slug: Set(slug),
            description: Set(input.description),
        };

        let group = self.group_repo.create(model).await?;
        tracing::info!(group_id = %group.id, slug = %group.slug, "Created group");
        Ok(group)
    }

    /// Change a group's title.
    pub async fn rename(&self, id: &str, title: &str) -> AppResult<group::Model> {
        let title = title.trim();
        if title.is_empty() || title.chars().count() > 200 {
            return Err(AppError::Validation(
                "Title must be 1 to 200 characters".to_string(),
            ));
        }

        let group = self.group_repo.get_by_id(id).await?;
        let mut active: group::ActiveModel = group.into();
        active.title = Set(title.to_string());
        self.group_repo.update(active).await
    }

    /// Delete a group. Its posts stay, without a group.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let group = self.group_repo.get_by_id(id).await?;
        self.group_repo.delete(&group.id).await?;
        tracing::info!(group_id = %group.id, "Deleted group");
        Ok(())
    }

    /// List groups for the admin surface.
    pub async fn search(
        &self,
        slug: Option<&str>,
        page: Option<&str>,
    ) -> AppResult<Page<group::Model>> {
        let count = self.group_repo.count_search(slug).await?;
        let meta = self.paginator.page_meta(count, page);
        let groups = self
            .group_repo
            .search(slug, meta.per_page, meta.offset())
            .await?;
        Ok(Page::new(groups, meta))
    }
}

/// Turn a title into a URL slug.
///
/// Cyrillic is transliterated, anything else outside `[a-z0-9_-]` is
/// dropped, runs of whitespace, `_` and `-` collapse into one `-`, and the
/// result is cut to [`MAX_SLUG_LENGTH`].
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut ascii = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        match transliterate(c) {
            Some(latin) => ascii.push_str(latin),
            None => ascii.push(c),
        }
    }

    let filtered = NON_SLUG_CHARS.replace_all(&ascii, "");
    let joined = SLUG_SEPARATORS.replace_all(filtered.trim(), "-");

    joined
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_LENGTH)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

const fn transliterate(c: char) -> Option<&'static str> {
    Some(match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "c",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sh",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_group(id: &str, slug: &str) -> group::Model {
        group::Model {
            id: id.to_string(),
            title: "Лев Толстой".to_string(),
            slug: slug.to_string(),
            description: String::new(),
        }
    }

    fn service(db: MockDatabase) -> GroupService {
        GroupService::new(
            GroupRepository::new(Arc::new(db.into_connection())),
            Paginator::default(),
        )
    }

    #[test]
    fn test_slugify_latin() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("snake_case and--dashes"), "snake-case-and-dashes");
    }

    #[test]
    fn test_slugify_cyrillic() {
        assert_eq!(slugify("Лев Толстой"), "lev-tolstoj");
        assert_eq!(slugify("Объявления"), "obyavleniya");
    }

    #[test]
    fn test_slugify_truncates() {
        let slug = slugify(&"a ".repeat(100));
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_slugify_nothing_usable() {
        assert_eq!(slugify("!!!"), "");
    }

    #[tokio::test]
    async fn test_create_derives_slug_from_title() {
        let created = create_test_group("g1", "lev-tolstoj");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group::Model>::new()])
                .append_query_results([[created]]),
        );

        let group = service
            .create(CreateGroupInput {
                title: "Лев Толстой".to_string(),
                slug: None,
                description: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(group.slug, "lev-tolstoj");
    }

    #[tokio::test]
    async fn test_create_duplicate_slug() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "tolstoy")]]),
        );

        let result = service
            .create(CreateGroupInput {
                title: "Tolstoy".to_string(),
                slug: Some("tolstoy".to_string()),
                description: String::new(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_slug() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .create(CreateGroupInput {
                title: "Tolstoy".to_string(),
                slug: Some("Not A Slug".to_string()),
                description: String::new(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rename() {
        let mut renamed = create_test_group("g1", "tolstoy");
        renamed.title = "Толстой".to_string();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "tolstoy")]])
                .append_query_results([[renamed]]),
        );

        let group = service.rename("g1", " Толстой ").await.unwrap();
        assert_eq!(group.title, "Толстой");
    }

    #[tokio::test]
    async fn test_get_by_slug_missing() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group::Model>::new()]),
        );

        assert!(matches!(
            service.get_by_slug("nope").await,
            Err(AppError::GroupNotFound(_))
        ));
    }
}
