use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use log::info;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::context::SessionContext;
use crate::stream::{mjpeg, StreamPipeline, StreamPublisher};

/// Shared handler state. One collaborator pipeline serves the whole process.
/// Invoking `/video_feed` while a stream is already live is undefined by
/// contract (single-active-session assumption) and is deliberately not
/// serialized here.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<SessionContext>,
    pub pipeline: StreamPipeline,
    pub report_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/video_feed", get(video_feed))
        .route("/start_session", get(start_session))
        .route("/stop_session", get(stop_session))
        .with_state(state)
}

pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("focuswatch listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("server error")
}

/// Starts the streaming loop and hands its bounded channel to the response
/// writer. When the client goes away the channel send fails, the producer
/// winds the session down and writes the report.
async fn video_feed(State(state): State<AppState>) -> Response {
    let publisher = StreamPublisher::new(
        Arc::clone(&state.ctx),
        state.pipeline.clone(),
        state.report_dir.clone(),
    );
    let rx = publisher.spawn();

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|part| (Ok::<Bytes, Infallible>(Bytes::from(part)), rx))
    });

    (
        [(header::CONTENT_TYPE, mjpeg::content_type())],
        Body::from_stream(stream),
    )
        .into_response()
}

async fn start_session(State(state): State<AppState>) -> &'static str {
    info!("session start requested");
    state.ctx.clear_stop();
    "Session Started"
}

async fn stop_session(State(state): State<AppState>) -> &'static str {
    info!("session stop requested");
    state.ctx.request_stop();
    "Session Stopped"
}
