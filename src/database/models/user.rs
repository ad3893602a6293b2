use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};

use crate::database::DatabaseError;

const USER_COLUMNS: &str = "u.id, u.username, u.password, u.email, u.is_staff, u.is_superuser, u.date_joined";

const USER_RELATIONS: &str = "ARRAY(SELECT c.id FROM chats c WHERE c.user_id = u.id ORDER BY c.id) AS chats, \
     ARRAY(SELECT m.id FROM messages m WHERE m.user_id = u.id ORDER BY m.id) AS messages";

/// Stored account. `password` holds an argon2 PHC string, never plaintext.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

/// User row joined with the ids of everything it owns
#[derive(Debug, Clone, FromRow)]
pub struct UserDetail {
    #[sqlx(flatten)]
    pub user: User,
    pub chats: Vec<i64>,
    pub messages: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl User {
    pub async fn find(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn find_by_username(
        executor: impl PgExecutor<'_>,
        username: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = $1");
        Ok(sqlx::query_as::<_, User>(&sql).bind(username).fetch_optional(executor).await?)
    }

    pub async fn exists(executor: impl PgExecutor<'_>, id: i64) -> Result<bool, DatabaseError> {
        let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(found)
    }

    pub async fn insert(executor: impl PgExecutor<'_>, new: &NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users AS u (username, password, email, is_staff, is_superuser) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(&new.username)
            .bind(&new.password_hash)
            .bind(&new.email)
            .bind(new.is_staff)
            .bind(new.is_superuser)
            .fetch_one(executor)
            .await?)
    }

    /// Apply every change in one statement so a failing column leaves the row as it was
    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: i64,
        changes: &UserChanges,
    ) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users AS u SET \
                username = COALESCE($2, u.username), \
                password = COALESCE($3, u.password), \
                email = COALESCE($4, u.email), \
                is_staff = COALESCE($5, u.is_staff), \
                is_superuser = COALESCE($6, u.is_superuser) \
             WHERE u.id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&changes.username)
            .bind(&changes.password_hash)
            .bind(&changes.email)
            .bind(changes.is_staff)
            .bind(changes.is_superuser)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    /// Owned chats and messages go with the row (ON DELETE CASCADE)
    pub async fn delete(executor: impl PgExecutor<'_>, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(executor).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

impl UserDetail {
    pub async fn find(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<UserDetail>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS}, {USER_RELATIONS} FROM users u WHERE u.id = $1");
        Ok(sqlx::query_as::<_, UserDetail>(&sql).bind(id).fetch_optional(executor).await?)
    }

    /// One page of users ordered by id; `only` restricts the page to a single user
    pub async fn page(
        executor: impl PgExecutor<'_>,
        only: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserDetail>, DatabaseError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, {USER_RELATIONS} FROM users u \
             WHERE ($1::BIGINT IS NULL OR u.id = $1) \
             ORDER BY u.id LIMIT $2 OFFSET $3"
        );
        Ok(sqlx::query_as::<_, UserDetail>(&sql)
            .bind(only)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await?)
    }

    pub async fn count(executor: impl PgExecutor<'_>, only: Option<i64>) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::BIGINT IS NULL OR id = $1)")
            .bind(only)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
