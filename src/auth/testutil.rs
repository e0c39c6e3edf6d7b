// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test PKI and token helpers.
//!
//! Certificates are generated with `rcgen` (ECDSA P-256), so tokens signed
//! by a [`TestLeaf`] use `ES256`.

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose,
};

use super::certs::CertStore;
use super::claims::Claims;
use super::codec::TokenCodec;
use super::scope::Scope;
use crate::config::{AuthConfig, DEFAULT_AUDIENCE};

/// Shared secret of [`hmac_codec`].
pub const TEST_SECRET: &[u8] = b"test-secret";

/// A certificate authority (root or intermediate) with its key.
pub struct TestCa {
    cert: Certificate,
    key: KeyPair,
}

/// An end-entity signing certificate with its key.
pub struct TestLeaf {
    cert: Certificate,
    key: KeyPair,
}

fn ca_params(name: &str) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    params
}

impl TestCa {
    /// Self-signed root CA.
    pub fn root(name: &str) -> Self {
        let key = KeyPair::generate().expect("root key");
        let cert = ca_params(name).self_signed(&key).expect("self-signed root");
        Self { cert, key }
    }

    /// Intermediate CA issued by this CA.
    pub fn intermediate(&self, name: &str) -> Self {
        let key = KeyPair::generate().expect("intermediate key");
        let cert = ca_params(name)
            .signed_by(&key, &self.cert, &self.key)
            .expect("intermediate");
        Self { cert, key }
    }

    /// Signing leaf issued by this CA.
    pub fn leaf(&self, name: &str) -> TestLeaf {
        self.leaf_with(name, |_| {})
    }

    /// Signing leaf with adjusted parameters.
    pub fn leaf_with(&self, name: &str, adjust: impl FnOnce(&mut CertificateParams)) -> TestLeaf {
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, name);
        params.is_ca = IsCa::ExplicitNoCa;
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        adjust(&mut params);

        let key = KeyPair::generate().expect("leaf key");
        let cert = params
            .signed_by(&key, &self.cert, &self.key)
            .expect("leaf");
        TestLeaf { cert, key }
    }

    pub fn der(&self) -> Vec<u8> {
        self.cert.der().to_vec()
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }
}

impl TestLeaf {
    pub fn der(&self) -> Vec<u8> {
        self.cert.der().to_vec()
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }

    /// PKCS#8 PEM private key.
    pub fn key_pem(&self) -> String {
        self.key.serialize_pem()
    }

    /// Sign `claims` as-is (no server stamping) with a caller-built header.
    pub fn sign(&self, header: &Header, claims: &Claims) -> String {
        let key = EncodingKey::from_ec_pem(self.key_pem().as_bytes()).expect("encoding key");
        jsonwebtoken::encode(header, claims, &key).expect("sign token")
    }
}

/// Assemble a token from raw header/claims JSON with a junk signature.
pub fn raw_token(header: &str, claims: &str) -> String {
    format!(
        "{}.{}.c2lnbmF0dXJl",
        Base64UrlUnpadded::encode_string(header.as_bytes()),
        Base64UrlUnpadded::encode_string(claims.as_bytes())
    )
}

/// HS256 codec with default settings and an empty root pool.
pub fn hmac_codec() -> Arc<TokenCodec> {
    let config = AuthConfig::hmac(TEST_SECRET);
    let store = Arc::new(CertStore::new(config.roots.clone()));
    Arc::new(TokenCodec::new(Arc::new(config), store).expect("hmac codec"))
}

/// Token signed by `codec` for `sub` granting `scopes`.
pub fn token_for(codec: &TokenCodec, sub: &str, scopes: &[Scope]) -> String {
    codec.sign(Claims::new(sub, scopes), None).expect("sign token")
}

/// HS256 token under [`TEST_SECRET`] that expired `ago` seconds ago.
pub fn expired_token(sub: &str, scopes: &[Scope], ago: i64) -> String {
    let mut claims = Claims::new(sub, scopes);
    claims.aud = vec![DEFAULT_AUDIENCE.to_string()];
    claims.exp = chrono::Utc::now().timestamp() - ago;
    claims.iat = claims.exp - 3600;
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("sign expired token")
}
