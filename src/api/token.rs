// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    auth::{parse_scopes, Auth, BearerToken, Claims, IssuedToken},
    error::ApiError,
    state::AppState,
};

/// Request to issue a token.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    /// Subject of the new token
    pub sub: String,
    /// Scopes to grant; each must be held by the caller
    #[serde(default)]
    pub scope: Vec<String>,
    /// Lifetime in seconds (server default when omitted)
    #[serde(default)]
    pub expires_in: Option<i64>,
}

fn lifetime(expires_in: Option<i64>) -> Result<Option<Duration>, ApiError> {
    match expires_in {
        Some(secs) if secs <= 0 => Err(ApiError::bad_request("expires_in must be positive")),
        Some(secs) => Duration::try_seconds(secs)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("expires_in is out of range")),
        None => Ok(None),
    }
}

/// Issue a token for another subject.
///
/// A caller can only delegate scopes it holds itself.
#[utoipa::path(
    post,
    path = "/v1/token",
    request_body = IssueTokenRequest,
    tag = "Token",
    responses(
        (status = 201, body = IssuedToken),
        (status = 400, description = "Unknown scope or invalid lifetime"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller lacks write:token or a delegated scope")
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Json(request): Json<IssueTokenRequest>,
) -> Result<(StatusCode, Json<IssuedToken>), ApiError> {
    if request.sub.trim().is_empty() {
        return Err(ApiError::bad_request("sub must not be empty"));
    }
    let scopes = parse_scopes(&request.scope).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let ttl = lifetime(request.expires_in)?;

    for scope in &scopes {
        caller.authorize(*scope)?;
    }

    let issued = state.codec.issue(Claims::new(request.sub, &scopes), ttl)?;
    tracing::info!(
        issuer = %caller.sub,
        sub = %issued.claims.sub,
        scope = ?issued.claims.scope,
        "Token issued"
    );
    Ok((StatusCode::CREATED, Json(issued)))
}

/// Exchange a valid or recently expired token for a fresh one.
#[utoipa::path(
    post,
    path = "/v1/token/refresh",
    tag = "Token",
    responses(
        (status = 200, body = IssuedToken),
        (status = 401, description = "Token invalid or past the refresh window")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<IssuedToken>, ApiError> {
    let issued = state.codec.refresh(&token, None)?;
    tracing::debug!(sub = %issued.claims.sub, "Token refreshed");
    Ok(Json(issued))
}

/// Claims of the presented token.
#[utoipa::path(
    get,
    path = "/v1/token/self",
    tag = "Token",
    responses(
        (status = 200, body = Claims),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn token_self(Auth(claims): Auth) -> Json<Claims> {
    Json(claims)
}
