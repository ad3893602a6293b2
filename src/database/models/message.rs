use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};

use crate::database::DatabaseError;

const MESSAGE_COLUMNS: &str = "m.id, m.user_id, m.chat_id, m.content, m.archived, m.created_at, m.updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub user_id: i64,
    pub chat_id: i64,
    pub content: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author and chat are bound here and never change afterwards
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: i64,
    pub chat_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct MessageChanges {
    pub content: Option<String>,
    pub archived: Option<bool>,
}

impl Message {
    pub async fn find(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<Message>, DatabaseError> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = $1");
        Ok(sqlx::query_as::<_, Message>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn insert(executor: impl PgExecutor<'_>, new: &NewMessage) -> Result<Message, DatabaseError> {
        let sql = format!(
            "INSERT INTO messages AS m (user_id, chat_id, content) VALUES ($1, $2, $3) RETURNING {MESSAGE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Message>(&sql)
            .bind(new.user_id)
            .bind(new.chat_id)
            .bind(&new.content)
            .fetch_one(executor)
            .await?)
    }

    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: i64,
        changes: &MessageChanges,
    ) -> Result<Message, DatabaseError> {
        let sql = format!(
            "UPDATE messages AS m SET \
                content = COALESCE($2, m.content), \
                archived = COALESCE($3, m.archived), \
                updated_at = NOW() \
             WHERE m.id = $1 RETURNING {MESSAGE_COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .bind(&changes.content)
            .bind(changes.archived)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Message not found".to_string()))
    }

    pub async fn delete(executor: impl PgExecutor<'_>, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1").bind(id).execute(executor).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Message not found".to_string()));
        }
        Ok(())
    }

    /// Cascade step of a chat archive. Returns how many rows flipped.
    pub async fn archive_all_in_chat(executor: impl PgExecutor<'_>, chat_id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE messages SET archived = TRUE, updated_at = NOW() WHERE chat_id = $1 AND archived = FALSE",
        )
        .bind(chat_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// One page of messages ordered by id; `author` restricts the page to one user's messages
    pub async fn page(
        executor: impl PgExecutor<'_>,
        author: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, DatabaseError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages m \
             WHERE ($1::BIGINT IS NULL OR m.user_id = $1) \
             ORDER BY m.id LIMIT $2 OFFSET $3"
        );
        Ok(sqlx::query_as::<_, Message>(&sql)
            .bind(author)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await?)
    }

    pub async fn count(executor: impl PgExecutor<'_>, author: Option<i64>) -> Result<i64, DatabaseError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE ($1::BIGINT IS NULL OR user_id = $1)")
                .bind(author)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }
}
