use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use residua_api::{AllocationApi, AllocationSubmitRequest, ErrorCode};
use residua_config::{load_config, ObservabilityConfig};

#[derive(Debug, Parser)]
#[command(name = "residua-server")]
struct Args {
    #[arg(long, default_value = "config/residua.yaml")]
    config: PathBuf,
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

#[derive(Clone)]
struct AppState {
    api: Arc<AllocationApi>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    init_tracing(&config.observability);

    let api = Arc::new(
        AllocationApi::from_config(&config).context("failed to assemble allocation service")?,
    );
    let state = AppState { api };

    let app = Router::new()
        .route("/health", get(health))
        .route("/allocations", post(submit_allocation))
        .route("/api/crops", get(list_crops))
        .route("/api/soils", get(list_soils))
        .route("/api/regions", get(list_regions))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .context("bind server listener failed")?;
    info!(listen = %args.listen, "residua-server listening");
    axum::serve(listener, app)
        .await
        .context("server terminated with error")
}

fn init_tracing(observability: &ObservabilityConfig) {
    let fallback_level = match observability.log_level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status":"ok"}))
}

async fn submit_allocation(
    State(state): State<AppState>,
    Json(payload): Json<AllocationSubmitRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let view = state.api.allocate(payload).await.map_err(map_api_error)?;
    Ok(Json(view))
}

async fn list_crops(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({"crops": state.api.crop_options()}))
}

async fn list_soils(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({"soils": state.api.soil_options()}))
}

async fn list_regions(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({"regions": state.api.region_options()}))
}

fn map_api_error(err: residua_api::ApiError) -> (StatusCode, Json<ErrorBody>) {
    let (status, code) = match err.code() {
        ErrorCode::InvalidArgument => (StatusCode::BAD_REQUEST, "invalid_argument"),
        ErrorCode::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        ErrorCode::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    (
        status,
        Json(ErrorBody {
            code: code.to_string(),
            message: err.to_string(),
        }),
    )
}
