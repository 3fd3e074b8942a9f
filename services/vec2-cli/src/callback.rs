//! Local listener for the login redirect
//!
//! After sign-in the API redirects the browser to
//! `http://<callback_addr>/callback?token=...`. The first token that
//! verifies completes the login and stops the listener.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};
use vec2_client::Vec2Client;

#[derive(Clone)]
struct CallbackState {
    client: Arc<Vec2Client>,
    done: mpsc::Sender<()>,
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    token: Option<String>,
}

/// One callback at a time, so a second redirect cannot race the first.
fn build_router(client: Arc<Vec2Client>, done: mpsc::Sender<()>) -> Router {
    Router::new()
        .route("/callback", get(callback_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(1))
        .with_state(CallbackState { client, done })
}

async fn callback_handler(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    let Some(token) = params.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing token parameter\n");
    };

    match state.client.complete_login_callback(&token).await {
        Ok(true) => {
            info!("login completed");
            let _ = state.done.try_send(());
            (StatusCode::OK, "Signed in to vec2. You can close this window.\n")
        }
        Ok(false) => {
            warn!("login callback token rejected");
            (StatusCode::BAD_REQUEST, "login token rejected\n")
        }
        Err(e) => {
            warn!(error = %e, "failed to persist login tokens");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to store credentials\n")
        }
    }
}

/// Serve `/callback` on `listener` until a login completes or `timeout`
/// elapses. Returns whether the login completed.
pub async fn wait_for_login(
    listener: TcpListener,
    client: Arc<Vec2Client>,
    timeout: Duration,
) -> Result<bool> {
    let (done_tx, mut done_rx) = mpsc::channel(1);
    let app = build_router(client, done_tx);
    let addr = listener.local_addr().context("reading callback address")?;
    info!(addr = %addr, "waiting for login callback");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let completed = matches!(
        tokio::time::timeout(timeout, done_rx.recv()).await,
        Ok(Some(()))
    );
    if !completed {
        warn!(timeout_secs = timeout.as_secs(), "login callback timed out");
    }

    let _ = shutdown_tx.send(());
    server
        .await
        .context("callback server task panicked")?
        .context("callback server failed")?;
    Ok(completed)
}
