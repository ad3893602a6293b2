use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, TokenType};
use crate::config;
use crate::database::models::User;
use crate::error::ApiError;
use crate::policy::Actor;
use crate::state::AppState;

/// JWT authentication middleware: validates the access token, loads the user
/// it names and injects it as the request's [`Actor`].
///
/// Runs before any handler, so unauthenticated requests never reach an
/// object lookup.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, TokenType::Access, &config::config().security).map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    let user = User::find(&state.pool, claims.user_id).await?.ok_or_else(|| {
        tracing::warn!("Token for unknown user {}", claims.user_id);
        ApiError::unauthorized("User not found")
    })?;

    let actor = Actor::from(user);
    tracing::debug!("Authenticated {} (id {}, staff: {})", actor.username, actor.id, actor.is_staff);
    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
pub fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Authentication credentials were not provided.".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
