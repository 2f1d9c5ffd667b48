//! Article service
//!
//! Implements the article use-cases:
//! - Create: assign id, timestamps and slug, then persist
//! - Update: merge a partial payload over the stored article, recompute
//!   the slug and bump `updated_at`
//!
//! The service talks to storage only through `ArticleRepository`; id and
//! time come from injected `IdGenerator` and `Clock` implementations.

use crate::db::repositories::ArticleRepository;
use crate::models::{Article, CreateArticleInput, UpdateArticleInput};
use crate::services::clock::Clock;
use crate::services::id_generator::IdGenerator;
use anyhow::Context;
use std::sync::Arc;

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// No article carries the requested slug
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Input rejected before touching storage
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Storage failure
    #[error("Storage error: {0}")]
    StorageError(#[from] anyhow::Error),
}

/// Article service
pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl ArticleService {
    /// Create a new article service
    ///
    /// # Arguments
    /// * `repo` - Article repository
    /// * `ids` - Id generator for new articles
    /// * `clock` - Time source for `created_at` / `updated_at`
    pub fn new(
        repo: Arc<dyn ArticleRepository>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repo, ids, clock }
    }

    /// Create a new article
    ///
    /// No existence check is made: two articles with the same title get the
    /// same slug, and slug lookups return the most recent one.
    ///
    /// # Errors
    /// - `ValidationError` if the title is empty
    /// - `StorageError` if the repository rejects the write
    pub async fn create(&self, input: CreateArticleInput) -> Result<Article, ArticleServiceError> {
        validate_title(&input.title)?;

        let now = self.clock.now();
        let article = Article {
            id: self.ids.next_id(),
            slug: generate_slug(&input.title),
            title: input.title,
            body: input.body,
            description: input.description,
            tag_list: input.tag_list,
            created_at: now,
            updated_at: now,
        };

        self.repo
            .create(&article)
            .await
            .context("Failed to create article")?;

        tracing::info!(id = %article.id, slug = %article.slug, "Article created");
        Ok(article)
    }

    /// Update the article currently behind `slug`
    ///
    /// Omitted fields keep their stored value. The slug is always recomputed
    /// from the resulting title. The merge runs inside the repository's
    /// atomic update, so concurrent partial updates never drop each other.
    ///
    /// # Errors
    /// - `NotFound` if no article carries `slug`
    /// - `ValidationError` if an empty title is supplied
    /// - `StorageError` if the repository fails
    pub async fn update(
        &self,
        slug: &str,
        input: UpdateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        if let Some(title) = &input.title {
            validate_title(title)?;
        }

        let now = self.clock.now();
        let article = self
            .repo
            .update_by_slug(slug, &|existing: Article| {
                let mut article = input.clone().apply_to(existing);
                article.slug = generate_slug(&article.title);
                article.updated_at = now.max(article.created_at);
                article
            })
            .await
            .context("Failed to update article")?
            .ok_or_else(|| ArticleServiceError::NotFound(slug.to_string()))?;

        tracing::info!(id = %article.id, slug = %article.slug, "Article updated");
        Ok(article)
    }
}

fn validate_title(title: &str) -> Result<(), ArticleServiceError> {
    if title.is_empty() {
        return Err(ArticleServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// ASCII replacement for common Latin letters with diacritics and ligatures.
/// Expects lowercase input.
fn transliterate(c: char) -> Option<&'static str> {
    let ascii = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(ascii)
}

/// Derive a URL-friendly slug from a title
///
/// Lower-cases the title, maps accented Latin letters to ASCII, spells `&`
/// as `and` and drops apostrophes and combining marks. Other letters and digits (CJK included)
/// are kept; every other run of characters becomes one hyphen, never at
/// either end.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    let mut buf = [0u8; 4];

    for c in title.to_lowercase().chars() {
        match c {
            '\'' | '\u{2019}' => {}
            // Combining diacritical marks, e.g. from lowercasing 'İ'
            '\u{0300}'..='\u{036F}' => {}
            '&' => {
                push_word(&mut slug, "and", true);
                pending_hyphen = true;
            }
            c if c.is_ascii_alphanumeric() => {
                push_word(&mut slug, c.encode_utf8(&mut buf), pending_hyphen);
                pending_hyphen = false;
            }
            c => match transliterate(c) {
                Some(ascii) => {
                    push_word(&mut slug, ascii, pending_hyphen);
                    pending_hyphen = false;
                }
                None if c.is_alphanumeric() => {
                    push_word(&mut slug, c.encode_utf8(&mut buf), pending_hyphen);
                    pending_hyphen = false;
                }
                None => pending_hyphen = true,
            },
        }
    }

    slug
}

fn push_word(slug: &mut String, word: &str, separate: bool) {
    if separate && !slug.is_empty() {
        slug.push('-');
    }
    slug.push_str(word);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{InMemoryArticleRepository, MemoryStore};
    use crate::config::{DatabaseConfig, DatabaseDriver};
    use crate::db::repositories::SqlxArticleRepository;
    use crate::db::{create_pool, create_test_pool, migrations};
    use crate::services::clock::FixedClock;
    use crate::services::id_generator::{IncrementIdGenerator, UuidGenerator};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2010, 11, 10, 0, 0, 0).unwrap()
    }

    fn memory_service(at: DateTime<Utc>) -> ArticleService {
        ArticleService::new(
            InMemoryArticleRepository::boxed(MemoryStore::new()),
            Arc::new(IncrementIdGenerator::new()),
            Arc::new(FixedClock(at)),
        )
    }

    async fn database_service(at: DateTime<Utc>) -> ArticleService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ArticleService::new(
            SqlxArticleRepository::boxed(pool),
            Arc::new(UuidGenerator),
            Arc::new(FixedClock(at)),
        )
    }

    fn sample_input() -> CreateArticleInput {
        CreateArticleInput::new(
            "The title",
            "description",
            vec!["tag1".to_string(), "tag2".to_string()],
            "body",
        )
    }

    // ========================================================================
    // Slug generation tests
    // ========================================================================

    #[test]
    fn test_generate_slug_simple() {
        assert_eq!(generate_slug("The title"), "the-title");
        assert_eq!(generate_slug("The title updated"), "the-title-updated");
    }

    #[test]
    fn test_generate_slug_punctuation_and_spacing() {
        assert_eq!(generate_slug("  Hello,   World! "), "hello-world");
        assert_eq!(generate_slug("snake_case--title"), "snake-case-title");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_generate_slug_transliterates_latin() {
        assert_eq!(generate_slug("Crème Brûlée"), "creme-brulee");
        assert_eq!(generate_slug("Straße"), "strasse");
        assert_eq!(generate_slug("Ærø"), "aero");
    }

    #[test]
    fn test_generate_slug_drops_combining_marks() {
        assert_eq!(generate_slug("İstanbul Guide"), "istanbul-guide");
        assert_eq!(generate_slug("Cafe\u{0301} Noir"), "cafe-noir");
    }

    #[test]
    fn test_generate_slug_ampersand_and_apostrophes() {
        assert_eq!(generate_slug("Rock & Roll"), "rock-and-roll");
        assert_eq!(generate_slug("AT&T"), "at-and-t");
        assert_eq!(generate_slug("Don't Stop"), "dont-stop");
        assert_eq!(generate_slug("It\u{2019}s here"), "its-here");
    }

    #[test]
    fn test_generate_slug_keeps_cjk() {
        assert_eq!(generate_slug("技术文章"), "技术文章");
        assert_eq!(generate_slug("Tech 技术"), "tech-技术");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_slug_is_well_formed(title in "[a-zA-Z0-9 _&'.,!éüßÆ技术-]{0,40}") {
            let slug = generate_slug(&title);

            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.chars().any(|c| c.is_ascii_uppercase()));
            prop_assert!(slug.chars().all(|c| c == '-' || c.is_alphanumeric()));
            prop_assert_eq!(generate_slug(&slug), slug.clone());
        }
    }

    // ========================================================================
    // Create tests
    // ========================================================================

    #[tokio::test]
    async fn test_create_assigns_id_slug_and_timestamps() {
        let service = memory_service(fixed_time());

        let article = service.create(sample_input()).await.unwrap();

        assert_eq!(article.id, "1");
        assert_eq!(article.slug, "the-title");
        assert_eq!(article.title, "The title");
        assert_eq!(article.tag_list, vec!["tag1", "tag2"]);
        assert_eq!(article.created_at, fixed_time());
        assert_eq!(article.updated_at, fixed_time());
    }

    #[tokio::test]
    async fn test_create_empty_title_fails() {
        let service = memory_service(fixed_time());
        let mut input = sample_input();
        input.title = String::new();

        let result = service.create(input).await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_whitespace_title_is_accepted() {
        let service = memory_service(fixed_time());
        let mut input = sample_input();
        input.title = "   ".to_string();

        let article = service.create(input).await.unwrap();
        assert_eq!(article.title, "   ");
        assert_eq!(article.slug, "");
    }

    #[tokio::test]
    async fn test_create_same_title_twice_shares_slug() {
        let service = database_service(fixed_time()).await;

        let first = service.create(sample_input()).await.unwrap();
        let second = service.create(sample_input()).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.slug, second.slug);

        // Updating through the shared slug reaches the newer article
        let updated = service
            .update("the-title", UpdateArticleInput::default().with_body("new"))
            .await
            .unwrap();
        assert_eq!(updated.id, second.id);
    }

    // ========================================================================
    // Update tests
    // ========================================================================

    #[tokio::test]
    async fn test_update_recomputes_slug_and_applies_fields() {
        for service in [
            memory_service(fixed_time()),
            database_service(fixed_time()).await,
        ] {
            let created = service.create(sample_input()).await.unwrap();

            let input = UpdateArticleInput::default()
                .with_title("The title updated")
                .with_body("body updated")
                .with_tag_list(vec!["tag3".to_string()]);
            let updated = service.update("the-title", input).await.unwrap();

            assert_eq!(updated.id, created.id);
            assert_eq!(updated.slug, "the-title-updated");
            assert_eq!(updated.body, "body updated");
            assert_eq!(updated.description, "description");
            assert_eq!(updated.tag_list, vec!["tag3"]);
            assert_eq!(updated.created_at, created.created_at);
        }
    }

    #[tokio::test]
    async fn test_update_missing_slug_fails() {
        let service = memory_service(fixed_time());

        let result = service
            .update("nope", UpdateArticleInput::default().with_body("x"))
            .await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(slug)) if slug == "nope"));
    }

    #[tokio::test]
    async fn test_update_empty_title_fails() {
        let service = memory_service(fixed_time());
        service.create(sample_input()).await.unwrap();

        let result = service
            .update("the-title", UpdateArticleInput::default().with_title(""))
            .await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_never_moves_updated_at_before_created_at() {
        let store = MemoryStore::new();
        let repo = InMemoryArticleRepository::boxed(store);
        let ids: Arc<dyn IdGenerator> = Arc::new(IncrementIdGenerator::new());
        let later = fixed_time() + Duration::days(1);

        let creator = ArticleService::new(repo.clone(), ids.clone(), Arc::new(FixedClock(later)));
        creator.create(sample_input()).await.unwrap();

        // A clock behind the creation time
        let updater = ArticleService::new(repo, ids, Arc::new(FixedClock(fixed_time())));
        let updated = updater
            .update("the-title", UpdateArticleInput::default().with_body("b"))
            .await
            .unwrap();

        assert_eq!(updated.updated_at, later);
    }

    // ========================================================================
    // Concurrency tests
    // ========================================================================

    /// Race a body-only update against a description-only update on the same
    /// article; both changes must survive every round.
    async fn assert_concurrent_partial_updates_survive(repo: Arc<dyn ArticleRepository>) {
        let service = Arc::new(ArticleService::new(
            repo.clone(),
            Arc::new(IncrementIdGenerator::new()),
            Arc::new(FixedClock(fixed_time())),
        ));
        service.create(sample_input()).await.unwrap();

        for round in 0..10 {
            let body = format!("NEW BODY {}", round);
            let description = format!("NEW DESC {}", round);

            let body_task = {
                let service = service.clone();
                let input = UpdateArticleInput::default().with_body(body.clone());
                tokio::spawn(async move { service.update("the-title", input).await })
            };
            let description_task = {
                let service = service.clone();
                let input = UpdateArticleInput::default().with_description(description.clone());
                tokio::spawn(async move { service.update("the-title", input).await })
            };

            let (body_result, description_result) = tokio::join!(body_task, description_task);
            body_result.expect("Task panicked").expect("Body update failed");
            description_result
                .expect("Task panicked")
                .expect("Description update failed");

            let stored = repo.find_by_slug("the-title").await.unwrap().unwrap();
            assert_eq!(stored.body, body);
            assert_eq!(stored.description, description);
            assert_eq!(stored.tag_list, vec!["tag1", "tag2"]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_partial_updates_in_memory() {
        assert_concurrent_partial_updates_survive(InMemoryArticleRepository::boxed(
            MemoryStore::new(),
        ))
        .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_partial_updates_in_database() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: temp_dir.path().join("conduit.db").to_string_lossy().to_string(),
        };
        let pool = create_pool(&config).await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        assert_concurrent_partial_updates_survive(SqlxArticleRepository::boxed(pool.clone())).await;
        pool.close().await;
    }
}
