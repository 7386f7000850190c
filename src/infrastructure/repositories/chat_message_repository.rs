//! Chat Message Repository Implementation
//!
//! PostgreSQL implementation of the ChatMessageRepository trait with
//! id-cursor pagination.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{ChatMessage, ChatMessageRepository, NewChatMessage};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: i64,
    friendship_id: i64,
    sender_id: i64,
    content: Option<String>,
    image_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        ChatMessage {
            id: row.id,
            friendship_id: row.friendship_id,
            sender_id: row.sender_id,
            content: row.content,
            image_path: row.image_path,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL chat message repository implementation.
#[derive(Clone)]
pub struct PgChatMessageRepository {
    pool: PgPool,
}

impl PgChatMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatMessageRepository for PgChatMessageRepository {
    async fn create(&self, message: &NewChatMessage) -> Result<ChatMessage, AppError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO chat_messages (friendship_id, sender_id, content, image_path)
            VALUES ($1, $2, $3, $4)
            RETURNING id, friendship_id, sender_id, content, image_path, created_at
            "#,
        )
        .bind(message.friendship_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(&message.image_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_before(
        &self,
        friendship_id: i64,
        before: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let rows = match before {
            Some(before_id) => {
                sqlx::query_as::<_, ChatMessageRow>(
                    r#"
                    SELECT id, friendship_id, sender_id, content, image_path, created_at
                    FROM chat_messages
                    WHERE friendship_id = $1 AND id < $2
                    ORDER BY id DESC
                    LIMIT $3
                    "#,
                )
                .bind(friendship_id)
                .bind(before_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ChatMessageRow>(
                    r#"
                    SELECT id, friendship_id, sender_id, content, image_path, created_at
                    FROM chat_messages
                    WHERE friendship_id = $1
                    ORDER BY id DESC
                    LIMIT $2
                    "#,
                )
                .bind(friendship_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, friendship_id: i64) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM chat_messages WHERE friendship_id = $1",
        )
        .bind(friendship_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn latest_per_friendship(
        &self,
        friendship_ids: &[i64],
    ) -> Result<Vec<ChatMessage>, AppError> {
        if friendship_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT DISTINCT ON (friendship_id)
                   id, friendship_id, sender_id, content, image_path, created_at
            FROM chat_messages
            WHERE friendship_id = ANY($1)
            ORDER BY friendship_id, id DESC
            "#,
        )
        .bind(friendship_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
