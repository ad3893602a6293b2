// handlers/public/token.rs - POST /token/ and POST /token/refresh/

use axum::extract::State;
use serde::Serialize;

use crate::api::{ApiResponse, ApiResult};
use crate::auth::{self, issue_token_pair, validate_jwt, verify_password, Claims, TokenPair, TokenType};
use crate::config;
use crate::database::models::User;
use crate::error::ApiError;
use crate::serializers::{JsonObject, Payload};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// POST /token/ - exchange username and password for an access/refresh pair
pub async fn token_obtain(State(state): State<AppState>, JsonObject(body): JsonObject) -> ApiResult<TokenPair> {
    let mut p = Payload::new(body);
    let username = p.string("username", true);
    let password = p.string("password", true);
    p.finish()?;
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::bad_request("username and password are required"));
    };

    let user = match User::find_by_username(&state.pool, &username).await? {
        Some(user) if verify_password(&password, &user.password) => user,
        _ => {
            tracing::warn!("Failed token request for '{}'", username);
            return Err(ApiError::unauthorized(BAD_CREDENTIALS));
        }
    };

    tracing::info!("Issued token pair for '{}' (id {})", user.username, user.id);
    Ok(ApiResponse::success(issue_token_pair(user.id)?))
}

/// POST /token/refresh/ - trade a refresh token for a new access token
pub async fn token_refresh(State(state): State<AppState>, JsonObject(body): JsonObject) -> ApiResult<AccessToken> {
    let mut p = Payload::new(body);
    let refresh = p.string("refresh", true);
    p.finish()?;
    let Some(refresh) = refresh else {
        return Err(ApiError::bad_request("refresh is required"));
    };

    let security = &config::config().security;
    let claims = validate_jwt(&refresh, TokenType::Refresh, security)?;

    // A deleted account cannot keep minting access tokens
    if !User::exists(&state.pool, claims.user_id).await? {
        return Err(ApiError::unauthorized("User not found"));
    }

    let access = auth::generate_jwt(&Claims::new(claims.user_id, TokenType::Access, security), security)?;
    Ok(ApiResponse::success(AccessToken { access }))
}
