// handlers/protected/users.rs - /users/ (list, me, admin detail)

use axum::extract::{Extension, State};

use crate::api::{ApiResponse, ApiResult, Paginated, Pagination};
use crate::auth::hash_password;
use crate::database::models::{User, UserChanges, UserDetail};
use crate::error::ApiError;
use crate::handlers::ObjectId;
use crate::policy::Actor;
use crate::serializers::{JsonObject, UserRepresentation, UserUpdate};
use crate::state::AppState;

/// GET /users/ - staff see everyone, everybody else sees only themselves
pub async fn user_list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    mut page: Pagination,
) -> ApiResult<Paginated<UserRepresentation>> {
    let scope = actor.list_scope();
    let count = UserDetail::count(&state.pool, scope).await?;
    page.clamp_to(count)?;

    let rows = UserDetail::page(&state.pool, scope, page.limit(), page.offset()).await?;
    let results = rows.into_iter().map(UserRepresentation::from).collect();
    Ok(ApiResponse::success(page.paginate(count, results)))
}

/// GET /users/me/ - the authenticated principal, staff or not
pub async fn user_me(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> ApiResult<UserRepresentation> {
    let detail = UserDetail::find(&state.pool, actor.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    Ok(ApiResponse::success(detail.into()))
}

/// GET /users/{id}/ - admin only
pub async fn user_retrieve(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ObjectId(id): ObjectId,
) -> ApiResult<UserRepresentation> {
    actor.require_admin()?;

    let detail = UserDetail::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    Ok(ApiResponse::success(detail.into()))
}

/// PATCH /users/{id}/ - admin only, partial
pub async fn user_update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ObjectId(id): ObjectId,
    body: Result<JsonObject, ApiError>,
) -> ApiResult<UserRepresentation> {
    actor.require_admin()?;

    if User::find(&state.pool, id).await?.is_none() {
        return Err(ApiError::not_found("Not found."));
    }

    let JsonObject(body) = body?;
    let update = UserUpdate::parse(body)?;
    let password_hash = match &update.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    let changes = UserChanges {
        username: update.username,
        password_hash,
        email: update.email,
        is_staff: update.is_staff,
        is_superuser: update.is_superuser,
    };

    User::update(&state.pool, id, &changes).await?;
    tracing::info!("Admin {} updated user {}", actor.id, id);

    let detail = UserDetail::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    Ok(ApiResponse::success(detail.into()))
}

/// DELETE /users/{id}/ - admin only; owned chats and messages cascade
pub async fn user_delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ObjectId(id): ObjectId,
) -> ApiResult<()> {
    actor.require_admin()?;

    User::delete(&state.pool, id).await?;
    tracing::info!("Admin {} deleted user {}", actor.id, id);
    Ok(ApiResponse::no_content())
}
