// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scope-enforcing authorization middleware for Axum.
//!
//! Each guarded route declares the scope it needs:
//!
//! ```rust,ignore
//! let items = Router::new()
//!     .route("/items", get(list_items))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         ScopeGuard::new(codec.clone(), Some(Scope::READ_ITEM)),
//!         require_scope,
//!     ));
//! ```
//!
//! Admitted requests carry the verified [`Claims`] in their extensions.
//! Denials are terminal and carry a `WWW-Authenticate` challenge.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::claims::Claims;
use super::codec::TokenCodec;
use super::error::AuthError;
use super::scope::Scope;

/// Middleware state: the codec and the scope a route requires.
///
/// With no required scope the guard only authenticates.
#[derive(Clone)]
pub struct ScopeGuard {
    codec: Arc<TokenCodec>,
    required: Option<Scope>,
}

impl ScopeGuard {
    pub fn new(codec: Arc<TokenCodec>, required: Option<Scope>) -> Self {
        Self { codec, required }
    }

    pub fn required(&self) -> Option<Scope> {
        self.required
    }

    /// Authenticate and authorize a request from its headers.
    pub fn check(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = bearer_token(headers)?;
        let claims = self.codec.verify(token)?;
        if let Some(required) = self.required {
            claims.authorize(required)?;
        }
        Ok(claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Authorization middleware function.
pub async fn require_scope(
    State(guard): State<ScopeGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    match guard.check(request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                path = %request.uri().path(),
                required = ?guard.required.map(|s| s.to_string()),
                error_code = e.error_code(),
                "Request denied"
            );
            e.into_response_for(guard.required)
        }
    }
}
