// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted root pool and verified signing-certificate cache.
//!
//! ## Trust model
//!
//! - The [`RootPool`] is loaded once at startup and never changes
//! - A leaf is cached only after its chain verified against the pool
//! - Cached chains are re-verified on every use (see [`CertStore::verify`]),
//!   so a certificate that expires after caching stops being trusted
//! - Records leave the cache only through [`CertStore::remove`]

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;

/// Certificate chain errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("token header carries no x5c certificate chain")]
    Missing,

    #[error("certificate could not be decoded: {0}")]
    Encoding(String),

    #[error("certificate chain is empty")]
    Empty,

    #[error("leaf certificate must not be a CA")]
    LeafIsCa,

    #[error("chain certificate {0} is not a CA")]
    IntermediateNotCa(usize),

    #[error("x5t#S256 does not match the leaf certificate")]
    FingerprintMismatch,

    #[error("leaf certificate lacks the digitalSignature key usage")]
    MissingDigitalSignature,

    #[error("certificate '{0}' is outside its validity period")]
    OutsideValidity(String),

    #[error("certificate chain is not trusted: {0}")]
    Untrusted(String),
}

/// Compute the cache key of a certificate: base64url(SHA-256(DER)), unpadded.
///
/// This is the `x5t#S256` header value for the certificate.
pub fn fingerprint(der: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(&Sha256::digest(der))
}

pub(crate) fn parse_certificate(der: &[u8]) -> Result<X509Certificate<'_>, ChainError> {
    parse_x509_certificate(der)
        .map(|(_, cert)| cert)
        .map_err(|e| ChainError::Encoding(e.to_string()))
}

pub(crate) fn is_ca(cert: &X509Certificate<'_>) -> bool {
    matches!(cert.basic_constraints(), Ok(Some(bc)) if bc.value.ca)
}

/// Check chain ordering: a non-CA leaf followed only by CA certificates.
pub(crate) fn check_structure(chain: &[X509Certificate<'_>]) -> Result<(), ChainError> {
    let (leaf, rest) = chain.split_first().ok_or(ChainError::Empty)?;
    if is_ca(leaf) {
        return Err(ChainError::LeafIsCa);
    }
    if let Some(position) = rest.iter().position(|cert| !is_ca(cert)) {
        return Err(ChainError::IntermediateNotCa(position + 1));
    }
    Ok(())
}

fn check_validity(cert: &X509Certificate<'_>) -> Result<(), ChainError> {
    if cert.validity().is_valid() {
        Ok(())
    } else {
        Err(ChainError::OutsideValidity(cert.subject().to_string()))
    }
}

fn check_issued_by(child: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> Result<(), ChainError> {
    if child.issuer().as_raw() != issuer.subject().as_raw() {
        return Err(ChainError::Untrusted(format!(
            "'{}' was not issued by '{}'",
            child.subject(),
            issuer.subject()
        )));
    }
    child
        .verify_signature(Some(issuer.public_key()))
        .map_err(|e| ChainError::Untrusted(format!("bad signature on '{}': {e}", child.subject())))
}

/// Set of trusted CA certificates.
#[derive(Debug, Clone, Default)]
pub struct RootPool {
    roots: Vec<Vec<u8>>,
}

impl RootPool {
    /// Create an empty pool (trusts nothing).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a pool from DER certificates. Non-CA certificates are skipped.
    pub fn from_der(certs: impl IntoIterator<Item = Vec<u8>>) -> Result<Self, ChainError> {
        let mut roots = Vec::new();
        for der in certs {
            let cert = parse_certificate(&der)?;
            if !is_ca(&cert) {
                tracing::warn!(subject = %cert.subject(), "Skipping non-CA root certificate");
                continue;
            }
            drop(cert);
            roots.push(der);
        }
        Ok(Self { roots })
    }

    /// Build a pool from a PEM bundle. Non-certificate blocks are ignored.
    pub fn from_pem(pem_bundle: &[u8]) -> Result<Self, ChainError> {
        let blocks =
            ::pem::parse_many(pem_bundle).map_err(|e| ChainError::Encoding(e.to_string()))?;
        Self::from_der(
            blocks
                .into_iter()
                .filter(|block| block.tag() == "CERTIFICATE")
                .map(::pem::Pem::into_contents),
        )
    }

    /// Number of trusted roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find a valid root that issued `cert`.
    fn anchor(&self, cert: &X509Certificate<'_>) -> Result<(), ChainError> {
        for der in &self.roots {
            let Ok(root) = parse_certificate(der) else {
                continue;
            };
            if check_issued_by(cert, &root).is_ok() && check_validity(&root).is_ok() {
                return Ok(());
            }
        }
        Err(ChainError::Untrusted(format!(
            "no trusted root issued '{}'",
            cert.issuer()
        )))
    }
}

/// A verified signing certificate held by the [`CertStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    fingerprint: String,
    subject: String,
    not_after: i64,
    public_key: Vec<u8>,
    leaf: Vec<u8>,
    intermediates: Vec<Vec<u8>>,
}

impl CertificateRecord {
    /// The `x5t#S256` fingerprint of the leaf.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Leaf subject distinguished name.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Leaf expiry (Unix seconds).
    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    /// Raw `subjectPublicKey` bits of the leaf.
    ///
    /// For RSA this is the PKCS#1 `RSAPublicKey`, for EC the SEC1 point and
    /// for Ed25519 the 32 key bytes.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// DER of the leaf certificate.
    pub fn leaf_der(&self) -> &[u8] {
        &self.leaf
    }
}

/// Verify a full chain and build its record.
fn verify_chain(
    leaf_der: Vec<u8>,
    intermediates: Vec<Vec<u8>>,
    roots: &RootPool,
) -> Result<CertificateRecord, ChainError> {
    let mut chain = Vec::with_capacity(intermediates.len() + 1);
    chain.push(parse_certificate(&leaf_der)?);
    for der in &intermediates {
        chain.push(parse_certificate(der)?);
    }
    check_structure(&chain)?;

    let leaf = &chain[0];
    match leaf.key_usage() {
        Ok(Some(usage)) if usage.value.digital_signature() => {}
        _ => return Err(ChainError::MissingDigitalSignature),
    }

    for cert in &chain {
        check_validity(cert)?;
    }
    for pair in chain.windows(2) {
        check_issued_by(&pair[0], &pair[1])?;
    }
    let top = chain.last().ok_or(ChainError::Empty)?;
    roots.anchor(top)?;

    let subject = leaf.subject().to_string();
    let not_after = leaf.validity().not_after.timestamp();
    let public_key = leaf.public_key().subject_public_key.data.to_vec();
    drop(chain);

    Ok(CertificateRecord {
        fingerprint: fingerprint(&leaf_der),
        subject,
        not_after,
        public_key,
        leaf: leaf_der,
        intermediates,
    })
}

/// Cache of verified signing certificates keyed by fingerprint.
///
/// Many readers may look up records concurrently; inserts and removals take
/// the write lock. Records are immutable once built, so a reader sees either
/// no record or a complete one.
#[derive(Debug)]
pub struct CertStore {
    roots: Arc<RootPool>,
    cache: RwLock<HashMap<String, Arc<CertificateRecord>>>,
}

impl CertStore {
    pub fn new(roots: Arc<RootPool>) -> Self {
        Self {
            roots,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The trusted root pool.
    pub fn roots(&self) -> &RootPool {
        &self.roots
    }

    /// Get the cached record for `fingerprint`.
    pub fn lookup(&self, fingerprint: &str) -> Option<Arc<CertificateRecord>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(fingerprint).cloned()
    }

    /// Verify `leaf` + `intermediates` against the root pool and cache the leaf.
    ///
    /// The store is untouched on failure. If another caller cached the same
    /// leaf first, that record is returned.
    pub fn insert(
        &self,
        leaf: Vec<u8>,
        intermediates: Vec<Vec<u8>>,
    ) -> Result<Arc<CertificateRecord>, ChainError> {
        let record = verify_chain(leaf, intermediates, &self.roots)?;

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let record = cache
            .entry(record.fingerprint.clone())
            .or_insert_with(|| Arc::new(record))
            .clone();

        tracing::debug!(
            fingerprint = %record.fingerprint,
            subject = %record.subject,
            "Cached verified signing certificate"
        );
        Ok(record)
    }

    /// Re-verify a cached record's chain against the root pool.
    pub fn verify(&self, record: &CertificateRecord) -> Result<(), ChainError> {
        verify_chain(record.leaf.clone(), record.intermediates.clone(), &self.roots).map(|_| ())
    }

    /// Evict a record. Returns whether one was present.
    pub fn remove(&self, fingerprint: &str) -> bool {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let removed = cache.remove(fingerprint).is_some();
        if removed {
            tracing::info!(%fingerprint, "Evicted signing certificate");
        }
        removed
    }

    /// Fingerprints of all cached records.
    pub fn fingerprints(&self) -> Vec<String> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        let mut fingerprints: Vec<String> = cache.keys().cloned().collect();
        fingerprints.sort();
        fingerprints
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
