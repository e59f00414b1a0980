//! HTTP surface: the webhook callback plus static serving of stored media.
//!
//! The callback verifies the platform signature on the raw body before
//! anything is parsed. After verification, per-event failures are logged and
//! swallowed: the platform retries non-2xx deliveries, and an event that
//! already consumed its reply token must not be re-delivered.


use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::dispatcher::{Dispatcher, RequestContext};
use crate::webhook::{WebhookEnvelope, signature};

/// Max webhook payload size: 1 MB.
const WEBHOOK_MAX_BODY: usize = 1_048_576;

#[derive(Clone)]
pub struct AppState {
    channel_secret: Arc<str>,
    dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(channel_secret: impl Into<Arc<str>>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            channel_secret: channel_secret.into(),
            dispatcher,
        }
    }
}

pub fn build_router(state: AppState, static_root: &Path) -> Router {
    Router::new()
        .route("/callback", post(callback_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(state)
        .nest_service("/static", ServeDir::new(static_root))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState, static_root: PathBuf) -> Result<()> {
    let app = build_router(state, &static_root);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

async fn callback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    if body.len() > WEBHOOK_MAX_BODY {
        warn!("callback: payload too large ({} bytes)", body.len());
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    }

    let Some(sig) = headers
        .get("x-line-signature")
        .and_then(|v| v.to_str().ok())
    else {
        warn!("callback: missing x-line-signature header");
        return StatusCode::BAD_REQUEST.into_response();
    };
    if !signature::validate(&state.channel_secret, sig, &body) {
        warn!("callback: invalid signature");
        return StatusCode::BAD_REQUEST.into_response();
    }

    debug!("callback: signature valid, payload_len={}", body.len());

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("callback: unparseable webhook body: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let ctx = request_context(&headers);
    for event in envelope.events {
        let kind = event.kind();
        if let Err(e) = state.dispatcher.dispatch(event, &ctx).await {
            warn!("callback: {} handler failed: {:#}", kind, e);
        }
    }

    (StatusCode::OK, "OK").into_response()
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Derive the public base URL from forwarding headers, falling back to the
/// plain `Host` header. The server usually sits behind a TLS-terminating
/// proxy, so `x-forwarded-proto`/`x-forwarded-host` win when present.
fn request_context(headers: &HeaderMap) -> RequestContext {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    RequestContext::new(format!("{}://{}", proto, host))
}
