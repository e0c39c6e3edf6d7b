// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token signing and verification.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{EncodingKey, Header, Validation};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::certs::{fingerprint, CertStore};
use super::chain::encode_x5c;
use super::claims::Claims;
use super::error::AuthError;
use super::keys::{read_header, KeyFamily, KeyResolver};
use crate::config::{AuthConfig, ConfigError};

/// A freshly signed token and the claims it carries.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedToken {
    /// Compact JWS
    pub token: String,
    /// Claims as stamped at signing time
    pub claims: Claims,
}

/// Signs and verifies API tokens.
///
/// Built once at startup and shared behind an `Arc`.
pub struct TokenCodec {
    config: Arc<AuthConfig>,
    keys: KeyResolver,
    encoding_key: EncodingKey,
    header: Header,
}

impl TokenCodec {
    /// Build a codec from validated configuration.
    ///
    /// For asymmetric algorithms the configured signing chain is advertised
    /// in `x5c` and its leaf is cached in `store` so the server trusts its
    /// own tokens without re-verifying the chain on first use.
    pub fn new(config: Arc<AuthConfig>, store: Arc<CertStore>) -> Result<Self, ConfigError> {
        config.validate()?;

        let encoding_key = encoding_key(&config)?;
        let mut header = Header::new(config.algorithm);

        if !KeyFamily::of(config.algorithm).is_symmetric() {
            let pem = config
                .signing_chain_pem
                .as_deref()
                .ok_or(ConfigError::Missing("asymmetric algorithms require JWT_SIGNING_CHAIN"))?;
            let mut chain = signing_chain(pem)?;
            header.x5c = Some(encode_x5c(&chain));
            header.x5t_s256 = Some(fingerprint(&chain[0]));

            let intermediates = chain.split_off(1);
            if let Some(leaf) = chain.pop() {
                match store.insert(leaf, intermediates) {
                    Ok(record) => tracing::info!(
                        fingerprint = %record.fingerprint(),
                        subject = %record.subject(),
                        "Signing certificate trusted"
                    ),
                    Err(e) => tracing::warn!(
                        error = %e,
                        "Signing certificate does not verify against the root pool; issued tokens will be rejected"
                    ),
                }
            }
        }

        Ok(Self {
            keys: KeyResolver::new(config.secret.clone(), store),
            config,
            encoding_key,
            header,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// The certificate store backing asymmetric verification.
    pub fn store(&self) -> &Arc<CertStore> {
        self.keys.store()
    }

    /// Sign `claims`, returning only the token.
    pub fn sign(&self, claims: Claims, ttl: Option<Duration>) -> Result<String, AuthError> {
        self.issue(claims, ttl).map(|issued| issued.token)
    }

    /// Stamp and sign `claims`.
    ///
    /// Sets `iat` and `exp` (`ttl` or the configured default), appends the
    /// configured audiences, and fills `iss` and `jti` when absent.
    pub fn issue(&self, mut claims: Claims, ttl: Option<Duration>) -> Result<IssuedToken, AuthError> {
        claims.validate()?;

        let ttl = ttl.unwrap_or(self.config.default_expiration);
        if ttl <= Duration::zero() {
            return Err(AuthError::InvalidToken("token lifetime must be positive".into()));
        }
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::InvalidToken("token lifetime is out of range".into()))?;
        claims.iat = now.timestamp();
        claims.exp = exp.timestamp();

        for aud in &self.config.audience {
            if !claims.aud.contains(aud) {
                claims.aud.push(aud.clone());
            }
        }
        if claims.iss.is_none() {
            claims.iss = self.config.issuer.clone();
        }
        if claims.jti.is_none() {
            claims.jti = Some(Uuid::new_v4().to_string());
        }

        let token = jsonwebtoken::encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        tracing::debug!(sub = %claims.sub, jti = ?claims.jti, exp = claims.exp, "Issued token");
        Ok(IssuedToken { token, claims })
    }

    /// Verify a token and return its claims.
    ///
    /// The signature and every other claim are checked before expiry, so
    /// [`AuthError::TokenExpired`] always carries trustworthy claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = read_header(token)?;
        let key = self.keys.resolve(&header)?;

        let claims = jsonwebtoken::decode::<Claims>(token, &key, &self.validation(header.alg))
            .map_err(map_jwt_error)?
            .claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidSubject);
        }

        let leeway = i64::try_from(self.config.leeway).unwrap_or(i64::MAX);
        if Utc::now().timestamp() > claims.exp.saturating_add(leeway) {
            return Err(AuthError::TokenExpired {
                claims: Box::new(claims),
            });
        }

        Ok(claims)
    }

    /// Re-issue a valid or recently expired token for the same subject and
    /// scopes.
    pub fn refresh(&self, token: &str, ttl: Option<Duration>) -> Result<IssuedToken, AuthError> {
        let claims = match self.verify(token) {
            Ok(claims) => claims,
            Err(AuthError::TokenExpired { claims }) => {
                let expired_for = Utc::now().timestamp().saturating_sub(claims.exp);
                if expired_for > self.config.refresh_window.num_seconds() {
                    return Err(AuthError::TokenExpired { claims });
                }
                *claims
            }
            Err(e) => return Err(e),
        };

        let mut fresh = Claims::new(claims.sub, &[]);
        fresh.aud = claims.aud;
        fresh.scope = claims.scope;
        self.issue(fresh, ttl)
    }

    fn validation(&self, alg: jsonwebtoken::Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.config.leeway;
        // Expiry is checked after decoding so the claims survive.
        validation.validate_exp = false;
        validation.validate_nbf = true;
        validation.set_audience(self.config.audience.as_slice());
        match &self.config.issuer {
            Some(issuer) => {
                validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
                validation.set_issuer(&[issuer]);
            }
            None => validation.set_required_spec_claims(&["exp", "sub", "aud"]),
        }
        validation
    }
}

fn encoding_key(config: &AuthConfig) -> Result<EncodingKey, ConfigError> {
    let signing_key = || {
        config
            .signing_key_pem
            .as_deref()
            .ok_or(ConfigError::Missing("asymmetric algorithms require JWT_SIGNING_KEY"))
    };

    let key = match KeyFamily::of(config.algorithm) {
        KeyFamily::Hmac => {
            let secret = config
                .secret
                .as_deref()
                .ok_or(ConfigError::Missing("HMAC algorithms require JWT_SECRET"))?;
            Ok(EncodingKey::from_secret(secret))
        }
        KeyFamily::Rsa | KeyFamily::RsaPss => EncodingKey::from_rsa_pem(signing_key()?),
        KeyFamily::Ecdsa => EncodingKey::from_ec_pem(signing_key()?),
        KeyFamily::EdDsa => EncodingKey::from_ed_pem(signing_key()?),
    };
    key.map_err(|e| ConfigError::SigningMaterial(e.to_string()))
}

fn signing_chain(pem_chain: &[u8]) -> Result<Vec<Vec<u8>>, ConfigError> {
    let chain: Vec<Vec<u8>> = pem::parse_many(pem_chain)
        .map_err(|e| ConfigError::SigningMaterial(e.to_string()))?
        .into_iter()
        .filter(|block| block.tag() == "CERTIFICATE")
        .map(pem::Pem::into_contents)
        .collect();
    if chain.is_empty() {
        return Err(ConfigError::SigningMaterial(
            "signing chain contains no certificates".into(),
        ));
    }
    Ok(chain)
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        JwtErrorKind::InvalidToken
        | JwtErrorKind::Base64(_)
        | JwtErrorKind::Json(_)
        | JwtErrorKind::Utf8(_) => AuthError::MalformedToken,
        JwtErrorKind::InvalidSignature => AuthError::InvalidSignature,
        JwtErrorKind::InvalidAlgorithmName => AuthError::UnsupportedAlgorithm(e.to_string()),
        JwtErrorKind::InvalidAlgorithm
        | JwtErrorKind::InvalidEcdsaKey
        | JwtErrorKind::InvalidRsaKey(_)
        | JwtErrorKind::InvalidKeyFormat => AuthError::InvalidKey(e.to_string()),
        JwtErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        JwtErrorKind::InvalidAudience => AuthError::InvalidAudience,
        JwtErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        JwtErrorKind::InvalidSubject => AuthError::InvalidSubject,
        JwtErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "aud" => AuthError::InvalidAudience,
            "iss" => AuthError::InvalidIssuer,
            "sub" => AuthError::InvalidSubject,
            other => AuthError::InvalidToken(format!("missing required claim '{other}'")),
        },
        _ => AuthError::InvalidToken(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::Algorithm;

    use super::*;
    use crate::auth::certs::RootPool;
    use crate::auth::scope::Scope;
    use crate::auth::testutil::{raw_token, TestCa, TestLeaf};
    use crate::config::DEFAULT_AUDIENCE;

    const SECRET: &[u8] = b"test-secret";

    fn codec_for(config: AuthConfig) -> TokenCodec {
        let store = Arc::new(CertStore::new(config.roots.clone()));
        TokenCodec::new(Arc::new(config), store).unwrap()
    }

    /// Signs with a test leaf issued by an intermediate under `root`.
    struct Pki {
        root: TestCa,
        inter: TestCa,
        leaf: TestLeaf,
    }

    impl Pki {
        fn new() -> Self {
            let root = TestCa::root("Test Root");
            let inter = root.intermediate("Test Issuing CA");
            let leaf = inter.leaf("token signer");
            Self { root, inter, leaf }
        }

        fn pool(&self) -> RootPool {
            RootPool::from_der([self.root.der()]).unwrap()
        }

        fn signer(&self) -> TokenCodec {
            let chain = format!("{}{}", self.leaf.pem(), self.inter.pem());
            let config =
                AuthConfig::certificate(Algorithm::ES256, self.leaf.key_pem(), chain, self.pool());
            codec_for(config)
        }

        /// A verifier that trusts the root but has an empty cache.
        fn verifier(&self) -> TokenCodec {
            codec_for(AuthConfig::hmac(SECRET).with_roots(self.pool()))
        }
    }

    fn claims_expiring_at(exp: i64) -> Claims {
        let mut claims = Claims::new("user_1", &[Scope::READ_ITEM]);
        claims.aud = vec![DEFAULT_AUDIENCE.to_string()];
        claims.iat = exp - 3600;
        claims.exp = exp;
        claims
    }

    fn hmac_token(secret: &[u8], claims: &Claims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[test]
    fn hmac_round_trip() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let issued = codec
            .issue(Claims::new("user_1", &[Scope::READ_ITEM, Scope::WRITE_USER]), None)
            .unwrap();

        let claims = codec.verify(&issued.token).unwrap();
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.scope, vec!["read:item", "write:user"]);
        assert_eq!(claims.aud, vec![DEFAULT_AUDIENCE]);
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert!(claims.jti.is_some());
    }

    #[test]
    fn issue_does_not_duplicate_audiences() {
        let codec = codec_for(AuthConfig::hmac(SECRET).with_audience(["a", "b"]));
        let mut claims = Claims::new("user_1", &[]);
        claims.aud = vec!["b".to_string()];

        let issued = codec.issue(claims, None).unwrap();
        assert_eq!(issued.claims.aud, vec!["b", "a"]);
    }

    #[test]
    fn issue_stamps_configured_issuer() {
        let codec = codec_for(AuthConfig::hmac(SECRET).with_issuer("https://tarkov.example"));
        let issued = codec.issue(Claims::new("user_1", &[]), None).unwrap();
        assert_eq!(issued.claims.iss.as_deref(), Some("https://tarkov.example"));
        assert!(codec.verify(&issued.token).is_ok());
    }

    #[test]
    fn issue_honours_ttl() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let issued = codec
            .issue(Claims::new("user_1", &[]), Some(Duration::minutes(5)))
            .unwrap();
        assert_eq!(issued.claims.exp - issued.claims.iat, 300);

        assert!(matches!(
            codec.issue(Claims::new("user_1", &[]), Some(Duration::zero())),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn issue_rejects_unknown_scope() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let mut claims = Claims::new("user_1", &[]);
        claims.scope = vec!["read:item".into(), "admin".into()];

        assert!(matches!(
            codec.issue(claims, None),
            Err(AuthError::UnknownScope(ref s)) if s == "admin"
        ));
    }

    #[test]
    fn issue_rejects_empty_subject() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        assert!(matches!(
            codec.issue(Claims::new("  ", &[]), None),
            Err(AuthError::InvalidSubject)
        ));
    }

    #[test]
    fn expired_token_carries_claims() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let token = hmac_token(SECRET, &claims_expiring_at(now() - 3600));

        match codec.verify(&token) {
            Err(AuthError::TokenExpired { claims }) => assert_eq!(claims.sub, "user_1"),
            other => panic!("expected TokenExpired, got {other:?}"),
        }
    }

    #[test]
    fn leeway_tolerates_recent_expiry() {
        let codec = codec_for(AuthConfig::hmac(SECRET).with_leeway(60));
        let token = hmac_token(SECRET, &claims_expiring_at(now() - 10));
        assert!(codec.verify(&token).is_ok());
    }

    #[test]
    fn audience_mismatch_is_rejected() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let mut claims = claims_expiring_at(now() + 3600);
        claims.aud = vec!["someone-else".to_string()];

        assert!(matches!(
            codec.verify(&hmac_token(SECRET, &claims)),
            Err(AuthError::InvalidAudience)
        ));
    }

    #[test]
    fn missing_audience_is_rejected() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let mut claims = claims_expiring_at(now() + 3600);
        claims.aud.clear();

        assert!(matches!(
            codec.verify(&hmac_token(SECRET, &claims)),
            Err(AuthError::InvalidAudience)
        ));
    }

    #[test]
    fn future_nbf_is_rejected() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let claims = Claims::new("user_1", &[]).not_before(now() + 3600);
        let token = codec.sign(claims, None).unwrap();

        assert!(matches!(codec.verify(&token), Err(AuthError::TokenNotYetValid)));
    }

    #[test]
    fn issuer_is_enforced_when_configured() {
        let codec = codec_for(AuthConfig::hmac(SECRET).with_issuer("https://tarkov.example"));

        let unsigned_by_us = claims_expiring_at(now() + 3600);
        assert!(matches!(
            codec.verify(&hmac_token(SECRET, &unsigned_by_us)),
            Err(AuthError::InvalidIssuer)
        ));

        let mut wrong = claims_expiring_at(now() + 3600);
        wrong.iss = Some("https://elsewhere.example".into());
        assert!(matches!(
            codec.verify(&hmac_token(SECRET, &wrong)),
            Err(AuthError::InvalidIssuer)
        ));
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let token = hmac_token(b"another-secret", &claims_expiring_at(now() + 3600));
        assert!(matches!(codec.verify(&token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn alg_none_is_unsupported() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let token = raw_token(r#"{"alg":"none"}"#, r#"{"sub":"user_1"}"#);
        assert!(matches!(
            codec.verify(&token),
            Err(AuthError::UnsupportedAlgorithm(ref alg)) if alg == "none"
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        assert!(matches!(codec.verify("not-a-token"), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn unknown_scope_verifies_but_fails_authorization() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let mut claims = claims_expiring_at(now() + 3600);
        claims.scope = vec!["read:everything".into()];

        let verified = codec.verify(&hmac_token(SECRET, &claims)).unwrap();
        assert!(matches!(
            verified.authorize(Scope::READ_ITEM),
            Err(AuthError::UnknownScope(_))
        ));
    }

    #[test]
    fn certificate_round_trip_embeds_chain() {
        let pki = Pki::new();
        let signer = pki.signer();
        assert_eq!(signer.store().len(), 1);

        let token = signer.sign(Claims::new("svc", &[Scope::READ_ALL]), None).unwrap();
        let header = read_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::ES256);
        assert_eq!(header.x5c.as_ref().map(Vec::len), Some(2));
        assert_eq!(header.x5t_s256, Some(fingerprint(&pki.leaf.der())));

        let verifier = pki.verifier();
        assert!(verifier.store().is_empty());
        assert_eq!(verifier.verify(&token).unwrap().sub, "svc");
        assert_eq!(verifier.store().fingerprints(), vec![fingerprint(&pki.leaf.der())]);
    }

    #[test]
    fn untrusted_signer_is_rejected() {
        let pki = Pki::new();
        let token = pki.signer().sign(Claims::new("svc", &[]), None).unwrap();

        let other_roots = RootPool::from_der([TestCa::root("Other").der()]).unwrap();
        let stranger = codec_for(AuthConfig::hmac(SECRET).with_roots(other_roots));
        assert!(matches!(
            stranger.verify(&token),
            Err(AuthError::InvalidCertificateChain(_))
        ));
        assert!(stranger.store().is_empty());
    }

    #[test]
    fn ca_leaf_is_rejected_before_signature_check() {
        let pki = Pki::new();
        let verifier = pki.verifier();
        let x5c = encode_x5c(&[pki.inter.der()]);
        let token = raw_token(
            &format!(r#"{{"alg":"ES256","x5c":["{}"]}}"#, x5c[0]),
            r#"{"sub":"svc"}"#,
        );

        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidCertificateChain(_))
        ));
        assert!(verifier.store().is_empty());
    }

    #[test]
    fn mismatched_thumbprint_is_rejected() {
        let pki = Pki::new();
        let other = pki.inter.leaf("other signer");
        let verifier = pki.verifier();

        let mut header = Header::new(Algorithm::ES256);
        header.x5c = Some(encode_x5c(&[pki.leaf.der(), pki.inter.der()]));
        header.x5t_s256 = Some(fingerprint(&other.der()));
        let token = pki.leaf.sign(&header, &claims_expiring_at(now() + 3600));

        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidCertificateChain(_))
        ));
        assert!(verifier.store().is_empty());
    }

    #[test]
    fn concurrent_verification_caches_one_record() {
        let pki = Pki::new();
        let token = pki.signer().sign(Claims::new("svc", &[]), None).unwrap();
        let verifier = pki.verifier();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| verifier.verify(&token))).collect();
            for handle in handles {
                assert!(handle.join().unwrap().is_ok());
            }
        });
        assert_eq!(verifier.store().len(), 1);
    }

    #[test]
    fn removal_forces_chain_verification() {
        let pki = Pki::new();
        let verifier = pki.verifier();
        verifier
            .store()
            .insert(pki.leaf.der(), vec![pki.inter.der()])
            .unwrap();

        // Correct thumbprint, unusable chain: only the cache can satisfy it.
        let mut header = Header::new(Algorithm::ES256);
        header.x5t_s256 = Some(fingerprint(&pki.leaf.der()));
        header.x5c = Some(vec!["garbage".to_string()]);
        let token = pki.leaf.sign(&header, &claims_expiring_at(now() + 3600));

        assert!(verifier.verify(&token).is_ok());
        assert!(verifier.store().remove(&fingerprint(&pki.leaf.der())));
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::MalformedCertificateChain(_))
        ));

        // A token with the real chain re-runs verification and re-caches.
        let token = pki.signer().sign(Claims::new("svc", &[]), None).unwrap();
        assert!(verifier.verify(&token).is_ok());
        assert_eq!(verifier.store().len(), 1);
    }

    #[test]
    fn cached_certificate_that_stops_verifying_is_rejected() {
        use chrono::{Datelike, Timelike};

        let pki = Pki::new();
        let now = Utc::now();
        let leaf = pki.inter.leaf_with("short lived", |params| {
            let midnight =
                rcgen::date_time_ymd(now.year(), now.month() as u8, now.day() as u8);
            params.not_after = midnight
                + std::time::Duration::from_secs(u64::from(now.num_seconds_from_midnight()) + 2);
        });
        let verifier = pki.verifier();
        verifier
            .store()
            .insert(leaf.der(), vec![pki.inter.der()])
            .unwrap();

        let mut header = Header::new(Algorithm::ES256);
        header.x5t_s256 = Some(fingerprint(&leaf.der()));
        header.x5c = Some(encode_x5c(&[leaf.der(), pki.inter.der()]));
        let token = leaf.sign(&header, &claims_expiring_at(now.timestamp() + 3600));
        assert!(verifier.verify(&token).is_ok());

        std::thread::sleep(std::time::Duration::from_secs(4));
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidCertificateChain(_))
        ));
        // The record stays cached until it is removed explicitly.
        assert_eq!(verifier.store().len(), 1);
        assert!(verifier.store().lookup(&fingerprint(&leaf.der())).is_some());
    }

    #[test]
    fn refresh_reissues_recently_expired_token() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let expired = hmac_token(SECRET, &claims_expiring_at(now() - 3600));

        let issued = codec.refresh(&expired, None).unwrap();
        let claims = codec.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.scope, vec!["read:item"]);
        assert!(claims.exp > now());
    }

    #[test]
    fn refresh_accepts_valid_token() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let token = codec.sign(Claims::new("user_1", &[Scope::READ_USER]), None).unwrap();
        let issued = codec.refresh(&token, Some(Duration::hours(1))).unwrap();
        assert_eq!(issued.claims.scope, vec!["read:user"]);
        assert_eq!(issued.claims.exp - issued.claims.iat, 3600);
    }

    #[test]
    fn refresh_window_is_enforced() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let window = codec.config().refresh_window.num_seconds();
        let stale = hmac_token(SECRET, &claims_expiring_at(now() - window - 3600));

        assert!(matches!(
            codec.refresh(&stale, None),
            Err(AuthError::TokenExpired { .. })
        ));
    }

    #[test]
    fn refresh_rejects_forged_token() {
        let codec = codec_for(AuthConfig::hmac(SECRET));
        let forged = hmac_token(b"another-secret", &claims_expiring_at(now() - 60));
        assert!(matches!(
            codec.refresh(&forged, None),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn new_rejects_empty_signing_chain() {
        let pki = Pki::new();
        let config = AuthConfig::certificate(
            Algorithm::ES256,
            pki.leaf.key_pem(),
            "no certificates here",
            pki.pool(),
        );
        let store = Arc::new(CertStore::new(config.roots.clone()));
        assert!(matches!(
            TokenCodec::new(Arc::new(config), store),
            Err(ConfigError::SigningMaterial(_))
        ));
    }
}
