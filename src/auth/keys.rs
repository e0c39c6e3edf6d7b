// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification key resolution.
//!
//! HMAC tokens verify with the shared secret. Every asymmetric family
//! verifies with the public key of the signing certificate named by the
//! token header:
//!
//! 1. Take the fingerprint from `x5t#S256` (or hash the `x5c` leaf)
//! 2. Cache hit: re-verify the cached chain against the root pool
//! 3. Cache miss: resolve the `x5c` chain and cache the verified leaf

use std::str::FromStr;
use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;

use super::certs::{fingerprint, CertStore, CertificateRecord, ChainError};
use super::chain::{self, decode_x5c};
use super::error::AuthError;

/// Key family of a JWS algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Hmac,
    Rsa,
    RsaPss,
    Ecdsa,
    EdDsa,
}

impl KeyFamily {
    pub fn of(alg: Algorithm) -> Self {
        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => KeyFamily::Hmac,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => KeyFamily::Rsa,
            Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512 => KeyFamily::RsaPss,
            Algorithm::ES256 | Algorithm::ES384 => KeyFamily::Ecdsa,
            Algorithm::EdDSA => KeyFamily::EdDsa,
        }
    }

    pub fn is_symmetric(self) -> bool {
        self == KeyFamily::Hmac
    }

    /// Build a decoding key from a certificate's raw public key bits.
    fn decoding_key(self, public_key: &[u8]) -> DecodingKey {
        match self {
            KeyFamily::Hmac => DecodingKey::from_secret(public_key),
            KeyFamily::Rsa | KeyFamily::RsaPss => DecodingKey::from_rsa_der(public_key),
            KeyFamily::Ecdsa => DecodingKey::from_ec_der(public_key),
            KeyFamily::EdDsa => DecodingKey::from_ed_der(public_key),
        }
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    x5c: Option<Vec<String>>,
    #[serde(default, rename = "x5t#S256")]
    x5t_s256: Option<String>,
}

/// The header fields the verifier consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: Algorithm,
    pub x5c: Option<Vec<String>>,
    pub x5t_s256: Option<String>,
}

/// Read the unverified header of a compact token.
///
/// An `alg` that is not a supported JWS algorithm (including `none`) is
/// reported as [`AuthError::UnsupportedAlgorithm`].
pub fn read_header(token: &str) -> Result<TokenHeader, AuthError> {
    let mut parts = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::MalformedToken);
    };

    let bytes = Base64UrlUnpadded::decode_vec(header).map_err(|_| AuthError::MalformedToken)?;
    let raw: RawHeader = serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;
    let alg = Algorithm::from_str(&raw.alg)
        .map_err(|_| AuthError::UnsupportedAlgorithm(raw.alg.clone()))?;

    Ok(TokenHeader {
        alg,
        x5c: raw.x5c,
        x5t_s256: raw.x5t_s256,
    })
}

/// Resolves the key that verifies a token.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    secret: Option<Vec<u8>>,
    store: Arc<CertStore>,
}

impl KeyResolver {
    pub fn new(secret: Option<Vec<u8>>, store: Arc<CertStore>) -> Self {
        Self { secret, store }
    }

    pub fn store(&self) -> &Arc<CertStore> {
        &self.store
    }

    /// Get the decoding key for a token with this header.
    pub fn resolve(&self, header: &TokenHeader) -> Result<DecodingKey, AuthError> {
        let family = KeyFamily::of(header.alg);
        if family.is_symmetric() {
            return self
                .secret
                .as_deref()
                .map(DecodingKey::from_secret)
                .ok_or_else(|| AuthError::InvalidKey("no shared secret is configured".into()));
        }

        let record = self.signing_certificate(header)?;
        Ok(family.decoding_key(record.public_key()))
    }

    /// Find (or verify and cache) the certificate that signed the token.
    pub fn signing_certificate(
        &self,
        header: &TokenHeader,
    ) -> Result<Arc<CertificateRecord>, AuthError> {
        let claimed = match (&header.x5t_s256, &header.x5c) {
            (Some(fp), _) => fp.clone(),
            (None, Some(x5c)) => {
                let leaf = x5c.first().ok_or(ChainError::Empty)?;
                fingerprint(&decode_x5c(std::slice::from_ref(leaf))?[0])
            }
            (None, None) => return Err(ChainError::Missing.into()),
        };

        if let Some(record) = self.store.lookup(&claimed) {
            tracing::debug!(fingerprint = %claimed, "Signing certificate cache hit");
            if let Err(e) = self.store.verify(&record) {
                tracing::warn!(fingerprint = %claimed, error = %e, "Cached signing certificate no longer verifies");
                return Err(e.into());
            }
            return Ok(record);
        }

        tracing::debug!(fingerprint = %claimed, "Signing certificate cache miss");
        chain::resolve(&self.store, header.x5c.as_deref(), Some(&claimed)).map_err(|e| {
            tracing::warn!(fingerprint = %claimed, error = %e, "Rejected token certificate chain");
            AuthError::from(e)
        })
    }
}
