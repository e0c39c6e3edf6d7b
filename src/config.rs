// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are read from the environment once at startup, validated, and
//! then shared read-only.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_ALGORITHM` | Signing algorithm (`HS256`, `RS256`, `PS256`, `ES256`, `EdDSA`, ...) | `HS256` |
//! | `JWT_SECRET` | Shared secret for HMAC algorithms | Required for `HS*` |
//! | `JWT_AUDIENCE` | Comma-separated accepted audiences | `tarkov-api` |
//! | `JWT_ISSUER` | Issuer stamped on and required in tokens | Optional |
//! | `JWT_DEFAULT_EXPIRATION_SECS` | Lifetime of issued tokens | `86400` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance | `60` |
//! | `JWT_REFRESH_WINDOW_SECS` | How long after expiry a token may be refreshed | `604800` |
//! | `JWT_ROOT_CERTS` | PEM bundle of trusted root CAs | Optional |
//! | `JWT_SIGNING_KEY` | PEM private key for asymmetric signing | Required for asymmetric |
//! | `JWT_SIGNING_CHAIN` | PEM certificate chain (leaf first) for `x5c` | Required for asymmetric |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT` / `TLS_KEY` | PEM certificate chain and key for HTTPS | Optional (HTTP if unset) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::Algorithm;

use crate::auth::certs::{ChainError, RootPool};
use crate::auth::keys::KeyFamily;

pub const JWT_ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_DEFAULT_EXPIRATION_ENV: &str = "JWT_DEFAULT_EXPIRATION_SECS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const JWT_REFRESH_WINDOW_ENV: &str = "JWT_REFRESH_WINDOW_SECS";
pub const JWT_ROOT_CERTS_ENV: &str = "JWT_ROOT_CERTS";
pub const JWT_SIGNING_KEY_ENV: &str = "JWT_SIGNING_KEY";
pub const JWT_SIGNING_CHAIN_ENV: &str = "JWT_SIGNING_CHAIN";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_ENV: &str = "TLS_CERT";
pub const TLS_KEY_ENV: &str = "TLS_KEY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_AUDIENCE: &str = "tarkov-api";
pub const DEFAULT_EXPIRATION_SECS: i64 = 24 * 60 * 60;
/// Clock skew tolerance (60 seconds).
pub const DEFAULT_LEEWAY_SECS: u64 = 60;
pub const DEFAULT_REFRESH_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid root certificates: {0}")]
    RootCertificates(#[from] ChainError),

    #[error("{0}")]
    Missing(&'static str),

    #[error("invalid signing material: {0}")]
    SigningMaterial(String),
}

/// Token signing and verification settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Algorithm used to sign issued tokens
    pub algorithm: Algorithm,
    /// Shared secret for HMAC tokens
    pub secret: Option<Vec<u8>>,
    /// Audiences stamped on issued tokens and accepted on verification
    pub audience: Vec<String>,
    /// Issuer stamped on issued tokens and required on verification
    pub issuer: Option<String>,
    /// Lifetime of issued tokens when the caller does not pick one
    pub default_expiration: Duration,
    /// Clock skew tolerance in seconds
    pub leeway: u64,
    /// How long after expiry a token can still be refreshed
    pub refresh_window: Duration,
    /// Trusted roots for `x5c` chains
    pub roots: Arc<RootPool>,
    /// PEM private key for asymmetric signing
    pub signing_key_pem: Option<Vec<u8>>,
    /// PEM certificate chain (leaf first) advertised in `x5c`
    pub signing_chain_pem: Option<Vec<u8>>,
}

impl AuthConfig {
    /// HMAC configuration with defaults for everything else.
    pub fn hmac(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            secret: Some(secret.into()),
            audience: vec![DEFAULT_AUDIENCE.to_string()],
            issuer: None,
            default_expiration: Duration::seconds(DEFAULT_EXPIRATION_SECS),
            leeway: DEFAULT_LEEWAY_SECS,
            refresh_window: Duration::seconds(DEFAULT_REFRESH_WINDOW_SECS),
            roots: Arc::new(RootPool::empty()),
            signing_key_pem: None,
            signing_chain_pem: None,
        }
    }

    /// Certificate-backed configuration signing with `key_pem` and
    /// advertising `chain_pem`.
    pub fn certificate(
        algorithm: Algorithm,
        key_pem: impl Into<Vec<u8>>,
        chain_pem: impl Into<Vec<u8>>,
        roots: RootPool,
    ) -> Self {
        Self {
            algorithm,
            secret: None,
            signing_key_pem: Some(key_pem.into()),
            signing_chain_pem: Some(chain_pem.into()),
            roots: Arc::new(roots),
            ..Self::hmac(Vec::new())
        }
    }

    pub fn with_audience(mut self, audience: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn with_roots(mut self, roots: RootPool) -> Self {
        self.roots = Arc::new(roots);
        self
    }

    /// Check that the selected algorithm has the key material it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audience.is_empty() {
            return Err(ConfigError::Missing("at least one audience is required"));
        }
        if self.default_expiration <= Duration::zero() {
            return Err(ConfigError::InvalidValue {
                name: JWT_DEFAULT_EXPIRATION_ENV,
                value: self.default_expiration.num_seconds().to_string(),
            });
        }
        match KeyFamily::of(self.algorithm) {
            KeyFamily::Hmac => {
                if self.secret.as_ref().is_none_or(|s| s.is_empty()) {
                    return Err(ConfigError::Missing("HMAC algorithms require JWT_SECRET"));
                }
            }
            _ => {
                if self.signing_key_pem.is_none() {
                    return Err(ConfigError::Missing(
                        "asymmetric algorithms require JWT_SIGNING_KEY",
                    ));
                }
                if self.signing_chain_pem.is_none() {
                    return Err(ConfigError::Missing(
                        "asymmetric algorithms require JWT_SIGNING_CHAIN",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let algorithm = match lookup(JWT_ALGORITHM_ENV) {
            Some(value) => Algorithm::from_str(&value).map_err(|_| ConfigError::InvalidValue {
                name: JWT_ALGORITHM_ENV,
                value,
            })?,
            None => Algorithm::HS256,
        };

        let audience = lookup(JWT_AUDIENCE_ENV)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|aud| !aud.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|| vec![DEFAULT_AUDIENCE.to_string()]);

        let roots = match lookup(JWT_ROOT_CERTS_ENV) {
            Some(path) => RootPool::from_pem(&read_file(&path)?)?,
            None => RootPool::empty(),
        };

        let config = Self {
            algorithm,
            secret: lookup(JWT_SECRET_ENV).map(String::into_bytes),
            audience,
            issuer: lookup(JWT_ISSUER_ENV),
            default_expiration: seconds_or(
                &lookup,
                JWT_DEFAULT_EXPIRATION_ENV,
                DEFAULT_EXPIRATION_SECS,
            )?,
            leeway: parse_or(&lookup, JWT_LEEWAY_ENV, DEFAULT_LEEWAY_SECS)?,
            refresh_window: seconds_or(&lookup, JWT_REFRESH_WINDOW_ENV, DEFAULT_REFRESH_WINDOW_SECS)?,
            roots: Arc::new(roots),
            signing_key_pem: lookup(JWT_SIGNING_KEY_ENV)
                .map(|path| read_file(&path))
                .transpose()?,
            signing_chain_pem: lookup(JWT_SIGNING_CHAIN_ENV)
                .map(|path| read_file(&path))
                .transpose()?,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub json_logs: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let tls_cert = lookup(TLS_CERT_ENV).map(PathBuf::from);
        let tls_key = lookup(TLS_KEY_ENV).map(PathBuf::from);
        if tls_cert.is_some() != tls_key.is_some() {
            return Err(ConfigError::Missing("TLS_CERT and TLS_KEY must be set together"));
        }

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, PORT_ENV, 8080)?,
            tls_cert,
            tls_key,
            json_logs: lookup(LOG_FORMAT_ENV).is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

/// Parse a number of seconds that must fit a [`Duration`].
fn seconds_or(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: i64,
) -> Result<Duration, ConfigError> {
    let secs = parse_or(lookup, name, default)?;
    Duration::try_seconds(secs).ok_or_else(|| ConfigError::InvalidValue {
        name,
        value: secs.to_string(),
    })
}

fn read_file(path: &str) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(Path::new(path)).map_err(|source| ConfigError::Io {
        path: PathBuf::from(path),
        source,
    })
}
