use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceExt;
use tower::service_fn;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::*;

/// Arguments for running the patchboard editor API server.
#[derive(Debug, Clone, Parser)]
#[command(name = "patchboard serve", about = "Start the patchboard editor API server.")]
pub struct ServeArgs {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 5151)]
    pub port: u16,
}

struct ServeState {
    session: RwLock<EditorSession>,
}

pub async fn run_serve(
    args: ServeArgs,
    session: EditorSession,
    ui_root: Option<PathBuf>,
) -> Result<()> {
    tracing::info!(session = %session.id, "editor session ready");

    let state = Arc::new(ServeState {
        session: RwLock::new(session),
    });

    let mut app = Router::new()
        .route("/api/board", get(get_board))
        .route("/api/events", post(post_event))
        .with_state(state);

    if let Some(root) = ui_root {
        let static_dir = ServeDir::new(root.clone())
            .append_index_html_on_directories(true)
            .fallback(ServeFile::new(root.join("index.html")));
        let dir_for_service = static_dir.clone();

        let static_service = service_fn(move |req| {
            let svc = dir_for_service.clone();
            async move {
                match svc.oneshot(req).await {
                    Ok(response) => Ok(response.map(axum::body::Body::new)),
                    Err(error) => {
                        let message = format!("Static file error: {error}");
                        Ok((StatusCode::INTERNAL_SERVER_ERROR, message).into_response())
                    }
                }
            }
        });

        app = app.fallback_service(static_service);
    }

    let app = app.layer(CorsLayer::permissive());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind HTTP server to {addr}"))?;

    println!("patchboard server listening on http://{addr}");
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn get_board(
    State(state): State<Arc<ServeState>>,
) -> Result<Json<BoardSnapshot>, (StatusCode, String)> {
    let session = state.session.read().await;
    let snapshot = session.snapshot().map_err(internal_error)?;
    Ok(Json(snapshot))
}

async fn post_event(
    State(state): State<Arc<ServeState>>,
    Json(event): Json<InputEvent>,
) -> Result<Json<Vec<RenderCommand>>, (StatusCode, String)> {
    tracing::debug!(?event, "applying input event");
    let mut session = state.session.write().await;
    match session.handle_event(event) {
        // Stale ids mean the caller is referencing state it no longer has.
        Err(err) => {
            tracing::debug!(%err, "rejecting event");
            Err((StatusCode::NOT_FOUND, err.to_string()))
        }
        Ok(commands) => Ok(Json(commands)),
    }
}

fn internal_error(err: EditorError) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
