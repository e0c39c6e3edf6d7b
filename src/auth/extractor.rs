// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for bearer tokens and verified claims.
//!
//! ```rust,ignore
//! async fn whoami(Auth(claims): Auth) -> impl IntoResponse {
//!     Json(claims)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::Claims;
use super::error::AuthError;
use super::middleware::bearer_token;
use crate::state::AppState;

/// Verified claims of the caller.
///
/// Uses the claims left by the scope middleware when it ran, otherwise
/// verifies the bearer token itself. No scope is checked here.
pub struct Auth(pub Claims);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>().cloned() {
            return Ok(Auth(claims));
        }

        let token = bearer_token(&parts.headers)?;
        Ok(Auth(state.codec.verify(token)?))
    }
}

/// The raw bearer token, unverified.
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers).map(|token| BearerToken(token.to_string()))
    }
}
