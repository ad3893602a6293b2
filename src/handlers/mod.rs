// handlers/mod.rs - two security tiers
//
// Public (no auth): token issuance and sign-up
// Protected (bearer access token): users, chats, messages
pub mod public;
pub mod protected;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::ApiError;

/// Numeric `{id}` path segment. Anything else is an unknown resource, not a bad request.
#[derive(Debug, Clone, Copy)]
pub struct ObjectId(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ObjectId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found("Not found."))?;

        raw.parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(ObjectId)
            .ok_or_else(|| ApiError::not_found("Not found."))
    }
}
