// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims carried by API bearer tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::error::AuthError;
use super::scope::{parse_scopes, Scope, ScopeError};

/// Claims of an API token.
///
/// Standard registered claims plus the custom `scope` list. Timestamps are
/// Unix seconds. `iat`, `exp` and `aud` are stamped by the server when the
/// token is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject (user or service identity)
    pub sub: String,

    /// Audience; a single string is accepted on input
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub aud: Vec<String>,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,

    /// Not before timestamp (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Token identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Granted scopes, in issue order
    #[serde(default)]
    pub scope: Vec<String>,
}

impl Claims {
    /// Create claims for `sub` granting `scopes`.
    ///
    /// Taking typed [`Scope`]s keeps issued tokens inside the vocabulary.
    pub fn new(sub: impl Into<String>, scopes: &[Scope]) -> Self {
        Self {
            sub: sub.into(),
            aud: Vec::new(),
            iss: None,
            iat: 0,
            exp: 0,
            nbf: None,
            jti: None,
            scope: scopes.iter().map(Scope::to_string).collect(),
        }
    }

    /// Set the not-before timestamp.
    pub fn not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    /// Parse the scope list against the vocabulary.
    pub fn scopes(&self) -> Result<Vec<Scope>, ScopeError> {
        parse_scopes(&self.scope)
    }

    /// Check that the claims can be used for authorization at all.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.sub.trim().is_empty() {
            return Err(AuthError::InvalidSubject);
        }
        self.scopes()?;
        Ok(())
    }

    /// Require `required`, directly or through its `action:all` wildcard.
    ///
    /// Any unknown scope fails the check before matching is attempted.
    pub fn authorize(&self, required: Scope) -> Result<(), AuthError> {
        let granted = self.scopes()?;
        if granted.iter().any(|g| g.covers(required)) {
            Ok(())
        } else {
            Err(AuthError::InsufficientScope)
        }
    }

    /// Expiration as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(aud) => vec![aud],
        OneOrMany::Many(aud) => aud,
    })
}
