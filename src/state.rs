// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{CertStore, TokenCodec};

#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Signing-certificate cache shared with the codec.
    pub fn certificates(&self) -> &CertStore {
        self.codec.store()
    }
}
