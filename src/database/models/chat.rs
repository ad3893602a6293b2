use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool};

use super::message::Message;
use crate::database::DatabaseError;

const CHAT_COLUMNS: &str = "c.id, c.user_id, c.archived, c.created_at, c.updated_at";

const CHAT_RELATIONS: &str = "ARRAY(SELECT m.id FROM messages m WHERE m.chat_id = c.id ORDER BY m.id) AS messages";

#[derive(Debug, Clone, FromRow)]
pub struct Chat {
    pub id: i64,
    pub user_id: i64,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chat row joined with its message ids in ascending order
#[derive(Debug, Clone, FromRow)]
pub struct ChatDetail {
    #[sqlx(flatten)]
    pub chat: Chat,
    pub messages: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewChat {
    pub user_id: i64,
}

/// Only `archived` is mutable; the owner is fixed at creation
#[derive(Debug, Clone, Default)]
pub struct ChatChanges {
    pub archived: Option<bool>,
}

/// A chat archive cascades to its messages only on the false -> true edge
pub fn is_archive_transition(before: bool, after: bool) -> bool {
    !before && after
}

impl Chat {
    pub async fn find(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<Chat>, DatabaseError> {
        let sql = format!("SELECT {CHAT_COLUMNS} FROM chats c WHERE c.id = $1");
        Ok(sqlx::query_as::<_, Chat>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn insert(executor: impl PgExecutor<'_>, new: &NewChat) -> Result<Chat, DatabaseError> {
        let sql = format!("INSERT INTO chats AS c (user_id) VALUES ($1) RETURNING {CHAT_COLUMNS}");
        Ok(sqlx::query_as::<_, Chat>(&sql).bind(new.user_id).fetch_one(executor).await?)
    }

    /// Update a chat and, on an archive transition, archive every message in it.
    ///
    /// The parent row is locked for the whole read-modify-write so two concurrent
    /// archive requests cannot both observe `archived = false` and skip the cascade.
    pub async fn update(pool: &PgPool, id: i64, changes: &ChatChanges) -> Result<Chat, DatabaseError> {
        let mut tx = pool.begin().await?;

        let lock_sql = format!("SELECT {CHAT_COLUMNS} FROM chats c WHERE c.id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Chat>(&lock_sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Chat not found".to_string()))?;

        let archived = changes.archived.unwrap_or(current.archived);
        let update_sql = format!(
            "UPDATE chats AS c SET archived = $2, updated_at = NOW() WHERE c.id = $1 RETURNING {CHAT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Chat>(&update_sql)
            .bind(id)
            .bind(archived)
            .fetch_one(&mut *tx)
            .await?;

        if is_archive_transition(current.archived, updated.archived) {
            let archived_messages = Message::archive_all_in_chat(&mut *tx, id).await?;
            tracing::debug!("Chat {} archived, cascaded to {} messages", id, archived_messages);
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Messages of the chat go with the row (ON DELETE CASCADE)
    pub async fn delete(executor: impl PgExecutor<'_>, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1").bind(id).execute(executor).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Chat not found".to_string()));
        }
        Ok(())
    }

    pub async fn count_all(executor: impl PgExecutor<'_>) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats").fetch_one(executor).await?;
        Ok(count)
    }
}

impl ChatDetail {
    pub async fn find(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<ChatDetail>, DatabaseError> {
        let sql = format!("SELECT {CHAT_COLUMNS}, {CHAT_RELATIONS} FROM chats c WHERE c.id = $1");
        Ok(sqlx::query_as::<_, ChatDetail>(&sql).bind(id).fetch_optional(executor).await?)
    }

    /// One page of chats ordered by id; `owner` restricts the page to one user's chats
    pub async fn page(
        executor: impl PgExecutor<'_>,
        owner: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatDetail>, DatabaseError> {
        let sql = format!(
            "SELECT {CHAT_COLUMNS}, {CHAT_RELATIONS} FROM chats c \
             WHERE ($1::BIGINT IS NULL OR c.user_id = $1) \
             ORDER BY c.id LIMIT $2 OFFSET $3"
        );
        Ok(sqlx::query_as::<_, ChatDetail>(&sql)
            .bind(owner)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await?)
    }

    pub async fn count(executor: impl PgExecutor<'_>, owner: Option<i64>) -> Result<i64, DatabaseError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chats WHERE ($1::BIGINT IS NULL OR user_id = $1)")
                .bind(owner)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unarchived_to_archived_cascades() {
        assert!(is_archive_transition(false, true));
        assert!(!is_archive_transition(true, true));
        assert!(!is_archive_transition(true, false));
        assert!(!is_archive_transition(false, false));
    }
}
