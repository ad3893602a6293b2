use anyhow::Context;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::hash_password;
use crate::cli::OutputFormat;
use crate::database::models::{NewUser, User};
use crate::serializers::user::{validate_email, validate_username};

pub async fn handle(
    pool: &PgPool,
    username: &str,
    password: &str,
    email: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    validate_username(username).map_err(|e| anyhow::anyhow!("username: {e}"))?;
    validate_email(email).map_err(|e| anyhow::anyhow!("email: {e}"))?;
    if password.is_empty() {
        anyhow::bail!("password: This field may not be blank.");
    }

    let new_user = NewUser {
        username: username.to_string(),
        password_hash: hash_password(password)?,
        email: email.to_string(),
        is_staff: true,
        is_superuser: true,
    };
    let user = User::insert(pool, &new_user)
        .await
        .with_context(|| format!("failed to create superuser '{username}'"))?;

    output_format.print(
        &format!("Superuser '{}' created (id {})", user.username, user.id),
        &json!({ "id": user.id, "username": user.username }),
    )
}
