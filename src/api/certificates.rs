// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{auth::CertificateRecord, error::ApiError, state::AppState};

/// A cached signing certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CertificateSummary {
    /// `x5t#S256` fingerprint
    pub fingerprint: String,
    /// Leaf subject
    pub subject: String,
    /// Leaf expiry (Unix seconds)
    pub not_after: i64,
}

impl From<&CertificateRecord> for CertificateSummary {
    fn from(record: &CertificateRecord) -> Self {
        Self {
            fingerprint: record.fingerprint().to_string(),
            subject: record.subject().to_string(),
            not_after: record.not_after(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/certificates",
    tag = "Certificates",
    responses((status = 200, body = [CertificateSummary]))
)]
pub async fn list_certificates(State(state): State<AppState>) -> Json<Vec<CertificateSummary>> {
    let store = state.certificates();
    let summaries = store
        .fingerprints()
        .iter()
        .filter_map(|fp| store.lookup(fp))
        .map(|record| CertificateSummary::from(record.as_ref()))
        .collect();
    Json(summaries)
}

/// Revoke a cached signing certificate.
///
/// Tokens naming it must present a chain that verifies again.
#[utoipa::path(
    delete,
    path = "/v1/certificates/{fingerprint}",
    params(
        ("fingerprint" = String, Path, description = "x5t#S256 fingerprint of the certificate")
    ),
    tag = "Certificates",
    responses((status = 204), (status = 404, description = "Not cached"))
)]
pub async fn revoke_certificate(
    Path(fingerprint): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if state.certificates().remove(&fingerprint) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!(
            "no cached certificate with fingerprint {fingerprint}"
        )))
    }
}
