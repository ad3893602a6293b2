// handlers/protected/chats.rs - /chats/

use axum::extract::{Extension, State};

use crate::api::{ApiResponse, ApiResult, Paginated, Pagination};
use crate::database::models::{Chat, ChatDetail, NewChat, User};
use crate::error::ApiError;
use crate::handlers::ObjectId;
use crate::policy::{Actor, Policy};
use crate::serializers::{ChatCreate, ChatRepresentation, ChatUpdate, JsonObject};
use crate::state::AppState;

async fn fetch_chat_detail(state: &AppState, id: i64) -> Result<ChatDetail, ApiError> {
    ChatDetail::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))
}

/// GET /chats/ - staff see every chat, everybody else only their own
pub async fn chat_list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    mut page: Pagination,
) -> ApiResult<Paginated<ChatRepresentation>> {
    let scope = actor.list_scope();
    let count = ChatDetail::count(&state.pool, scope).await?;
    page.clamp_to(count)?;

    let rows = ChatDetail::page(&state.pool, scope, page.limit(), page.offset()).await?;
    let results = rows.into_iter().map(ChatRepresentation::from).collect();
    Ok(ApiResponse::success(page.paginate(count, results)))
}

/// POST /chats/create/ - the owner is whoever the body names
pub async fn chat_create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonObject(body): JsonObject,
) -> ApiResult<ChatRepresentation> {
    let create = ChatCreate::parse(body)?;

    if !User::exists(&state.pool, create.user).await? {
        return Err(ApiError::field_error(
            "user",
            format!("Invalid pk \"{}\" - object does not exist.", create.user),
        ));
    }

    let chat = Chat::insert(&state.pool, &NewChat { user_id: create.user }).await?;
    tracing::info!("User {} created chat {} owned by {}", actor.id, chat.id, chat.user_id);

    let detail = ChatDetail {
        chat,
        messages: Vec::new(),
    };
    Ok(ApiResponse::created(detail.into()))
}

/// GET /chats/{id}/ - owner or admin; a foreign chat is 403, a missing one 404
pub async fn chat_retrieve(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ObjectId(id): ObjectId,
) -> ApiResult<ChatRepresentation> {
    let detail = fetch_chat_detail(&state, id).await?;
    Policy::OwnerOrAdmin.enforce(&actor, &detail.chat)?;
    Ok(ApiResponse::success(detail.into()))
}

/// GET /chats/detail/{id}/ - admin only
pub async fn chat_admin_retrieve(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ObjectId(id): ObjectId,
) -> ApiResult<ChatRepresentation> {
    actor.require_admin()?;

    let detail = fetch_chat_detail(&state, id).await?;
    Ok(ApiResponse::success(detail.into()))
}

/// PATCH /chats/{id}/ - admin only. Archiving cascades to the chat's messages.
pub async fn chat_update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ObjectId(id): ObjectId,
    body: Result<JsonObject, ApiError>,
) -> ApiResult<ChatRepresentation> {
    actor.require_admin()?;

    if Chat::find(&state.pool, id).await?.is_none() {
        return Err(ApiError::not_found("Not found."));
    }

    let JsonObject(body) = body?;
    let changes = ChatUpdate::parse(body)?.into_changes();
    let chat = Chat::update(&state.pool, id, &changes).await?;
    tracing::info!("Admin {} updated chat {} (archived: {})", actor.id, id, chat.archived);

    let detail = fetch_chat_detail(&state, id).await?;
    Ok(ApiResponse::success(detail.into()))
}

/// DELETE /chats/{id}/ - admin only; messages cascade
pub async fn chat_delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ObjectId(id): ObjectId,
) -> ApiResult<()> {
    actor.require_admin()?;

    Chat::delete(&state.pool, id).await?;
    tracing::info!("Admin {} deleted chat {}", actor.id, id);
    Ok(ApiResponse::no_content())
}
