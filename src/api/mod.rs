// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_scope, Claims, IssuedToken, Scope, ScopeGuard, TokenCodec},
    state::AppState,
};

pub mod certificates;
pub mod health;
pub mod token;

/// Put `routes` behind the scope middleware.
fn guarded(
    routes: Router<AppState>,
    codec: &Arc<TokenCodec>,
    required: Option<Scope>,
) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(
        ScopeGuard::new(codec.clone(), required),
        require_scope,
    ))
}

pub fn router(state: AppState) -> Router {
    let codec = &state.codec;

    let v1_routes = Router::new()
        .merge(guarded(
            Router::new().route("/token", post(token::issue_token)),
            codec,
            Some(Scope::WRITE_TOKEN),
        ))
        .merge(guarded(
            Router::new().route("/token/self", get(token::token_self)),
            codec,
            None,
        ))
        // The refresh bearer may already be expired; the handler verifies it.
        .route("/token/refresh", post(token::refresh_token))
        .merge(guarded(
            Router::new().route("/certificates", get(certificates::list_certificates)),
            codec,
            Some(Scope::READ_ALL),
        ))
        .merge(guarded(
            Router::new().route(
                "/certificates/{fingerprint}",
                delete(certificates::revoke_certificate),
            ),
            codec,
            Some(Scope::WRITE_ALL),
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        token::issue_token,
        token::refresh_token,
        token::token_self,
        certificates::list_certificates,
        certificates::revoke_certificate
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            token::IssueTokenRequest,
            IssuedToken,
            Claims,
            certificates::CertificateSummary
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Token", description = "Token issuance and introspection"),
        (name = "Certificates", description = "Signing certificate cache")
    )
)]
struct ApiDoc;
