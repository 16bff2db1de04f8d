//! HTTP surface for the relay.

use crate::relay::{error_response, Relay, RelayResponse};
use crate::Error;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use std::sync::Arc;

/// Path of the serverless function this relay replaces.
pub const FUNCTION_PATH: &str = "/.netlify/functions/gemini-proxy";
pub const API_PATH: &str = "/api/generate";

/// Largest request body the relay will buffer.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

pub fn build_router(relay: Relay) -> Router {
    let state = AppState {
        relay: Arc::new(relay),
    };

    // `any` so the relay, not the router, answers wrong methods.
    Router::new()
        .route("/healthz", get(healthz))
        .route(FUNCTION_PATH, any(relay_call))
        .route(API_PATH, any(relay_call))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "ok": true })))
}

async fn relay_call(State(state): State<AppState>, request: Request) -> Response {
    let method = request.method().clone();

    // Non-POST calls are answered without reading the body.
    if method != Method::POST {
        return state.relay.handle(&method, &[]).await.into_response();
    }

    match Bytes::from_request(request, &state).await {
        Ok(body) => state.relay.handle(&method, &body).await.into_response(),
        Err(rejection) => {
            let err = Error::BodyRejected {
                status: rejection.status().as_u16(),
                message: rejection.body_text(),
            };
            tracing::warn!("Rejected request body: {}", err);
            error_response(&err).into_response()
        }
    }
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response()
    }
}
