// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication and scope authorization for the Tarkov API.
//!
//! ## Auth Flow
//!
//! 1. A client presents `Authorization: Bearer <JWT>`
//! 2. The server:
//!    - Reads the token header (`alg`, `x5c`, `x5t#S256`)
//!    - Resolves the verification key: the shared secret for `HS*`, or the
//!      public key of a signing certificate whose chain verifies against the
//!      trusted roots
//!    - Verifies signature, `exp`, `nbf`, `aud`, `iss` and `sub`
//!    - Checks the route's required scope (`read:item`, `write:all`, ...)
//!
//! ## Security
//!
//! - Only supported JWS algorithms are accepted (`none` never is)
//! - A leaf certificate is cached only after its chain verified
//! - Cached chains are re-verified on every use
//! - Clock skew tolerance defaults to 60 seconds

pub mod certs;
pub mod chain;
pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod keys;
pub mod middleware;
pub mod scope;

#[cfg(test)]
pub(crate) mod testutil;

pub use certs::{CertStore, CertificateRecord, ChainError, RootPool};
pub use claims::Claims;
pub use codec::{IssuedToken, TokenCodec};
pub use error::{AuthError, ErrorKind};
pub use extractor::{Auth, BearerToken};
pub use middleware::{require_scope, ScopeGuard};
pub use scope::{parse_scopes, Scope, ScopeError};
