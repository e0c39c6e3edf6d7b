// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.
//!
//! Every failure in the token pipeline is classified into one [`AuthError`]
//! variant before it reaches the HTTP layer. Callers branch on the variant
//! (or on [`ErrorKind`]) rather than on error messages.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::certs::ChainError;
use super::claims::Claims;
use super::scope::{Scope, ScopeError};

/// Broad category of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Problem with the `Authorization` header itself.
    Transport,
    /// The token or its header could not be understood.
    Structural,
    /// Signature, key or certificate chain did not check out.
    Cryptographic,
    /// Time-based or identity claims were rejected.
    Claims,
    /// The bearer is authenticated but not allowed.
    Authorization,
}

/// Authentication error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Invalid authorization header format
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token is malformed
    #[error("Token is malformed")]
    MalformedToken,
    /// Token declares an algorithm that is not accepted
    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// The `x5c` header is missing or cannot be decoded
    #[error("Malformed certificate chain: {0}")]
    MalformedCertificateChain(String),
    /// Token signature is invalid
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// The certificate chain is not trusted
    #[error("Invalid certificate chain: {0}")]
    InvalidCertificateChain(String),
    /// The signing certificate may not be used for digital signatures
    #[error("Signing certificate lacks the digital signature key usage")]
    InvalidKeyUsage,
    /// Verification key material is missing or unusable
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    /// Token has expired.
    ///
    /// The signature and every other claim were valid, so the claims can
    /// still be used to identify the bearer (e.g. for a refresh).
    #[error("Token has expired")]
    TokenExpired { claims: Box<Claims> },
    /// Token is not yet valid
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    /// Token audience is invalid
    #[error("Token audience is invalid")]
    InvalidAudience,
    /// Token issuer is invalid
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    /// Token subject is missing or empty
    #[error("Token subject is invalid")]
    InvalidSubject,
    /// Token was rejected for any other reason
    #[error("Token is invalid: {0}")]
    InvalidToken(String),
    /// Claims do not grant the required scope
    #[error("Insufficient scope for this operation")]
    InsufficientScope,
    /// Claims carry a scope outside the vocabulary
    #[error("Unknown scope: {0}")]
    UnknownScope(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader => ErrorKind::Transport,
            AuthError::MalformedToken
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::MalformedCertificateChain(_) => ErrorKind::Structural,
            AuthError::InvalidSignature
            | AuthError::InvalidCertificateChain(_)
            | AuthError::InvalidKeyUsage
            | AuthError::InvalidKey(_) => ErrorKind::Cryptographic,
            AuthError::TokenExpired { .. }
            | AuthError::TokenNotYetValid
            | AuthError::InvalidAudience
            | AuthError::InvalidIssuer
            | AuthError::InvalidSubject
            | AuthError::InvalidToken(_) => ErrorKind::Claims,
            AuthError::InsufficientScope | AuthError::UnknownScope(_) => ErrorKind::Authorization,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            AuthError::MalformedCertificateChain(_) => "malformed_certificate_chain",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidCertificateChain(_) => "invalid_certificate_chain",
            AuthError::InvalidKeyUsage => "invalid_key_usage",
            AuthError::InvalidKey(_) => "invalid_key",
            AuthError::TokenExpired { .. } => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidSubject => "invalid_subject",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::InsufficientScope => "insufficient_scope",
            AuthError::UnknownScope(_) => "unknown_scope",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Transport
            | ErrorKind::Structural
            | ErrorKind::Cryptographic
            | ErrorKind::Claims => StatusCode::UNAUTHORIZED,
        }
    }

    /// The RFC 6750 `error` token, if the challenge should carry one.
    ///
    /// A request without credentials gets a bare challenge.
    pub fn challenge_error(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::Transport => match self {
                AuthError::MissingAuthHeader => None,
                _ => Some("invalid_token"),
            },
            ErrorKind::Structural | ErrorKind::Cryptographic | ErrorKind::Claims => {
                Some("invalid_token")
            }
            ErrorKind::Authorization => Some("insufficient_scope"),
        }
    }

    /// Build the `WWW-Authenticate` value for this error.
    pub fn challenge(&self, required: Option<Scope>) -> String {
        let mut params = Vec::new();
        if let Some(scope) = required {
            params.push(format!("scope=\"{scope}\""));
        }
        if let Some(error) = self.challenge_error() {
            params.push(format!("error=\"{error}\""));
            params.push(format!("error_description=\"{}\"", self.error_code()));
        }

        if params.is_empty() {
            "Bearer".to_string()
        } else {
            format!("Bearer {}", params.join(", "))
        }
    }

    /// Render the denial for a route that requires `required`.
    pub fn into_response_for(self, required: Option<Scope>) -> Response {
        let status = self.status_code();
        let challenge = self.challenge(required);
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });

        let mut response = (status, body).into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    }
}

impl From<ScopeError> for AuthError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::Unknown(scope) => AuthError::UnknownScope(scope),
        }
    }
}

impl From<ChainError> for AuthError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Missing | ChainError::Encoding(_) => {
                AuthError::MalformedCertificateChain(err.to_string())
            }
            ChainError::MissingDigitalSignature => AuthError::InvalidKeyUsage,
            ChainError::Empty
            | ChainError::LeafIsCa
            | ChainError::IntermediateNotCa(_)
            | ChainError::FingerprintMismatch
            | ChainError::OutsideValidity(_)
            | ChainError::Untrusted(_) => AuthError::InvalidCertificateChain(err.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.into_response_for(None)
    }
}
