use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Catalog column that receives a processed media URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogTarget {
    ContentVideo(Uuid),
    EpisodeVideo(Uuid),
    ContentPoster(Uuid),
    UserAvatar(Uuid),
}

impl fmt::Display for CatalogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogTarget::ContentVideo(id) => write!(f, "content {} video", id),
            CatalogTarget::EpisodeVideo(id) => write!(f, "episode {} video", id),
            CatalogTarget::ContentPoster(id) => write!(f, "content {} poster", id),
            CatalogTarget::UserAvatar(id) => write!(f, "user {} avatar", id),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog record for {0} does not exist")]
    MissingRecord(CatalogTarget),

    #[error("content {0} not found")]
    ContentNotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Object locations referenced by a content record and its episodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ContentMedia {
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub video_url: Option<String>,
    pub episode_video_urls: Vec<String>,
}

impl ContentMedia {
    pub fn locations(&self) -> Vec<String> {
        [&self.poster_url, &self.backdrop_url, &self.video_url]
            .into_iter()
            .flatten()
            .chain(self.episode_video_urls.iter())
            .filter(|url| !url.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// The slice of the content/episode/user schema the pipeline touches.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn current_avatar_url(&self, user_id: Uuid) -> Result<Option<String>, CatalogError>;

    async fn apply_processed(&self, target: CatalogTarget, url: &str) -> Result<(), CatalogError>;

    async fn content_media(&self, content_id: Uuid) -> Result<Option<ContentMedia>, CatalogError>;

    async fn delete_content(&self, content_id: Uuid) -> Result<bool, CatalogError>;
}

pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ContentMediaRow {
    poster_url: Option<String>,
    backdrop_url: Option<String>,
    video_url: Option<String>,
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn current_avatar_url(&self, user_id: Uuid) -> Result<Option<String>, CatalogError> {
        let avatar: Option<Option<String>> =
            sqlx::query_scalar("SELECT avatar_url FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(avatar.flatten())
    }

    async fn apply_processed(&self, target: CatalogTarget, url: &str) -> Result<(), CatalogError> {
        let (sql, id) = match target {
            CatalogTarget::ContentVideo(id) => (
                "UPDATE contents SET video_url = $1, status = 'READY', updated_at = NOW() WHERE id = $2",
                id,
            ),
            CatalogTarget::EpisodeVideo(id) => (
                "UPDATE episodes SET video_url = $1, status = 'READY', updated_at = NOW() WHERE id = $2",
                id,
            ),
            CatalogTarget::ContentPoster(id) => (
                "UPDATE contents SET poster_url = $1, updated_at = NOW() WHERE id = $2",
                id,
            ),
            CatalogTarget::UserAvatar(id) => (
                "UPDATE users SET avatar_url = $1, updated_at = NOW() WHERE id = $2",
                id,
            ),
        };

        let result = sqlx::query(sql).bind(url).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::MissingRecord(target));
        }
        Ok(())
    }

    async fn content_media(&self, content_id: Uuid) -> Result<Option<ContentMedia>, CatalogError> {
        let row = sqlx::query_as::<_, ContentMediaRow>(
            "SELECT poster_url, backdrop_url, video_url FROM contents WHERE id = $1",
        )
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let episode_video_urls: Vec<String> = sqlx::query_scalar(
            "SELECT video_url FROM episodes WHERE content_id = $1 AND video_url IS NOT NULL",
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ContentMedia {
            poster_url: row.poster_url,
            backdrop_url: row.backdrop_url,
            video_url: row.video_url,
            episode_video_urls,
        }))
    }

    async fn delete_content(&self, content_id: Uuid) -> Result<bool, CatalogError> {
        let result = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(content_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_skip_missing_and_blank_fields() {
        let media = ContentMedia {
            poster_url: Some("s3://media/poster.jpg".into()),
            backdrop_url: Some(" ".into()),
            video_url: None,
            episode_video_urls: vec!["s3://media/e1.mp4".into(), "s3://media/e2.mp4".into()],
        };

        assert_eq!(
            media.locations(),
            vec![
                "s3://media/poster.jpg".to_string(),
                "s3://media/e1.mp4".to_string(),
                "s3://media/e2.mp4".to_string(),
            ]
        );
    }
}
