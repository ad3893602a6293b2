// handlers/public/users.rs - POST /users/create/

use axum::extract::State;

use crate::api::{ApiResponse, ApiResult};
use crate::auth::hash_password;
use crate::database::models::{NewUser, User, UserDetail};
use crate::serializers::{JsonObject, UserCreate, UserRepresentation};
use crate::state::AppState;

/// POST /users/create/ - open sign-up.
///
/// `is_staff` and `is_superuser` are accepted by the schema but always stored
/// as false; privileges are only granted by an admin update or the CLI.
pub async fn user_create(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> ApiResult<UserRepresentation> {
    let create = UserCreate::parse(body)?;

    if create.is_staff || create.is_superuser {
        tracing::warn!("Sign-up for '{}' requested admin flags; ignoring", create.username);
    }

    let new_user = NewUser {
        username: create.username,
        password_hash: hash_password(&create.password)?,
        email: create.email,
        is_staff: false,
        is_superuser: false,
    };
    let user = User::insert(&state.pool, &new_user).await?;
    tracing::info!("Created user '{}' (id {})", user.username, user.id);

    let detail = UserDetail {
        user,
        chats: Vec::new(),
        messages: Vec::new(),
    };
    Ok(ApiResponse::created(detail.into()))
}
