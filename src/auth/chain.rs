// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resolution of the `x5c` certificate chain carried in a token header.

use std::sync::Arc;

use base64ct::{Base64, Encoding};

use super::certs::{
    check_structure, fingerprint, parse_certificate, CertStore, CertificateRecord, ChainError,
};

/// Decode `x5c` entries (standard base64 DER, leaf first).
pub fn decode_x5c(x5c: &[String]) -> Result<Vec<Vec<u8>>, ChainError> {
    x5c.iter()
        .enumerate()
        .map(|(i, entry)| {
            Base64::decode_vec(entry)
                .map_err(|e| ChainError::Encoding(format!("x5c[{i}] is not base64: {e}")))
        })
        .collect()
}

/// Encode DER certificates as `x5c` entries.
pub fn encode_x5c(chain: &[Vec<u8>]) -> Vec<String> {
    chain.iter().map(|der| Base64::encode_string(der)).collect()
}

/// Verify a presented chain and cache its leaf.
///
/// Ordering and CA flags are checked before any signature work; the chain of
/// trust is then verified by [`CertStore::insert`]. When `claimed` is given it
/// must be the fingerprint of the presented leaf.
pub fn resolve(
    store: &CertStore,
    x5c: Option<&[String]>,
    claimed: Option<&str>,
) -> Result<Arc<CertificateRecord>, ChainError> {
    let mut chain = decode_x5c(x5c.ok_or(ChainError::Missing)?)?;

    {
        let parsed = chain
            .iter()
            .map(|der| parse_certificate(der))
            .collect::<Result<Vec<_>, _>>()?;
        check_structure(&parsed)?;
    }

    let intermediates = chain.split_off(1);
    let leaf = chain.pop().ok_or(ChainError::Empty)?;

    if let Some(claimed) = claimed {
        if fingerprint(&leaf) != claimed {
            return Err(ChainError::FingerprintMismatch);
        }
    }

    store.insert(leaf, intermediates)
}
