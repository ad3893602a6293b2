// handlers/protected/messages.rs - /messages/

use axum::extract::{Extension, State};

use crate::api::{ApiResponse, ApiResult, Paginated, Pagination};
use crate::database::models::{Chat, Message, NewMessage, User};
use crate::error::ApiError;
use crate::handlers::ObjectId;
use crate::policy::{Actor, Policy};
use crate::serializers::{JsonObject, MessageCreate, MessageRepresentation, MessageUpdate};
use crate::state::AppState;

async fn fetch_message(state: &AppState, id: i64) -> Result<Message, ApiError> {
    Message::find(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))
}

/// GET /messages/ - staff see every message, everybody else only what they wrote
pub async fn message_list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    mut page: Pagination,
) -> ApiResult<Paginated<MessageRepresentation>> {
    let scope = actor.list_scope();
    let count = Message::count(&state.pool, scope).await?;
    page.clamp_to(count)?;

    let rows = Message::page(&state.pool, scope, page.limit(), page.offset()).await?;
    let results = rows.into_iter().map(MessageRepresentation::from).collect();
    Ok(ApiResponse::success(page.paginate(count, results)))
}

/// POST /messages/create/ - post into a chat the actor owns (staff may post anywhere).
///
/// The stored author is always the actor; a `user` in the body is only
/// checked to reference an existing account.
pub async fn message_create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonObject(body): JsonObject,
) -> ApiResult<MessageRepresentation> {
    let create = MessageCreate::parse(body)?;

    let chat = Chat::find(&state.pool, create.chat)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    Policy::OwnerOrAdmin.enforce(&actor, &chat)?;

    if let Some(user) = create.user {
        if !User::exists(&state.pool, user).await? {
            return Err(ApiError::field_error(
                "user",
                format!("Invalid pk \"{}\" - object does not exist.", user),
            ));
        }
        if user != actor.id {
            tracing::debug!("Message body named user {}, storing actor {} as author", user, actor.id);
        }
    }

    let new_message = NewMessage {
        user_id: actor.id,
        chat_id: chat.id,
        content: create.content,
    };
    let message = Message::insert(&state.pool, &new_message).await?;
    tracing::info!("User {} posted message {} in chat {}", actor.id, message.id, chat.id);
    Ok(ApiResponse::created(message.into()))
}

/// GET /messages/{id}/ - any authenticated user
pub async fn message_retrieve(
    State(state): State<AppState>,
    Extension(_actor): Extension<Actor>,
    ObjectId(id): ObjectId,
) -> ApiResult<MessageRepresentation> {
    let message = fetch_message(&state, id).await?;
    Ok(ApiResponse::success(message.into()))
}

/// PATCH /messages/{id}/ - author only, no staff override
pub async fn message_update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ObjectId(id): ObjectId,
    body: Result<JsonObject, ApiError>,
) -> ApiResult<MessageRepresentation> {
    let message = fetch_message(&state, id).await?;
    Policy::Owner.enforce(&actor, &message)?;

    let JsonObject(body) = body?;
    let changes = MessageUpdate::parse(body)?.into_changes();
    let updated = Message::update(&state.pool, id, &changes).await?;
    Ok(ApiResponse::success(updated.into()))
}

/// DELETE /messages/{id}/ - author only, no staff override
pub async fn message_delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ObjectId(id): ObjectId,
) -> ApiResult<()> {
    let message = fetch_message(&state, id).await?;
    Policy::Owner.enforce(&actor, &message)?;

    Message::delete(&state.pool, id).await?;
    tracing::info!("User {} deleted message {}", actor.id, id);
    Ok(ApiResponse::no_content())
}
