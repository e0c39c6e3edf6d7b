// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tarkov API - Bearer Token Trust Pipeline
//!
//! Issues and verifies signed bearer tokens (shared-secret HMAC or
//! certificate-backed `x5c` chains) and enforces per-route scopes.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, certificate store and scope middleware
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
