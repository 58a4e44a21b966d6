//! API Service - Order data for the sales dashboard
//!
//! Endpoints:
//! - GET /api/orders - Orders for a date range (remote, CSV fallback, or empty)
//! - GET /api/health - Health check and effective configuration
//! - GET /api/sample-data - Fixed records for front-end testing

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use order_pipeline::{OrderQuery, OrderRecord, Orchestrator, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Config and state
// ============================================================================

#[derive(Debug, Clone, Default)]
struct ApiConfig {
    bind: String,
    frontend_origin: Option<String>,
    api_token: Option<String>,
}

impl ApiConfig {
    fn from_env() -> Self {
        let var = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            bind: var("API_BIND").unwrap_or_else(|| "127.0.0.1:8000".to_string()),
            frontend_origin: var("FRONTEND_ORIGIN"),
            api_token: var("API_TOKEN"),
        }
    }
}

struct AppState {
    orchestrator: Orchestrator,
    pipeline: PipelineConfig,
    api: ApiConfig,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    remote_base: String,
    remote_orders_path: String,
    remote_url: String,
    csv_path: String,
    frontend_origin: String,
    auth_required: bool,
}

#[derive(Serialize)]
struct SampleResponse {
    success: bool,
    data: Vec<OrderRecord>,
    count: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    data: Vec<OrderRecord>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            data: Vec::new(),
        }
    }
}

#[derive(Serialize)]
struct UnauthorizedResponse {
    success: bool,
    error: &'static str,
}

// ============================================================================
// Query params
// ============================================================================

#[derive(Deserialize)]
struct OrdersParams {
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    api_token: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn orders_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<OrdersParams>,
) -> impl IntoResponse {
    if let Some(expected) = &state.api.api_token {
        let provided = headers
            .get("X-API-Token")
            .and_then(|v| v.to_str().ok())
            .or(params.api_token.as_deref());
        if provided != Some(expected.as_str()) {
            let body = UnauthorizedResponse {
                success: false,
                error: "Unauthorized",
            };
            return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        }
    }

    let query = OrderQuery::new(params.start_date, params.end_date, params.base_url);
    let response = state.orchestrator.run(&query).await;

    // The pipeline never fails; only rendering the result can
    match serde_json::to_value(&response) {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            error!("Error rendering orders: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let pipeline = &state.pipeline;
    Json(HealthResponse {
        status: "healthy",
        timestamp: Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        remote_base: pipeline.remote_base.clone(),
        remote_orders_path: pipeline.remote_orders_path.clone(),
        remote_url: pipeline.remote_url(),
        csv_path: pipeline.resolve_csv_path().display().to_string(),
        frontend_origin: state.api.frontend_origin.clone().unwrap_or_default(),
        auth_required: state.api.api_token.is_some(),
    })
}

async fn sample_data_handler() -> Json<SampleResponse> {
    let data = sample_records();
    Json(SampleResponse {
        success: true,
        count: data.len(),
        data,
    })
}

fn sample_records() -> Vec<OrderRecord> {
    [("18.08.2025", 18, "DFN MALATYA 1262", 45000), ("19.08.2025", 19, "DFN MALATYA 700", 23000)]
        .into_iter()
        .map(|(raw, day, name, amount)| OrderRecord {
            order_date_raw: raw.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, day),
            customer_name: name.to_string(),
            cost_center_name: name.to_string(),
            quantity: amount,
            remaining_quantity: amount,
            remaining_net_amount: amount as f64,
            currency: "TL".to_string(),
            ..Default::default()
        })
        .collect()
}

// ============================================================================
// Router
// ============================================================================

fn cors_layer(frontend_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    Ok(match frontend_origin {
        Some(origin) => {
            let origin: HeaderValue = origin.parse().context("Invalid FRONTEND_ORIGIN")?;
            info!("CORS origin set to {:?}", origin);
            cors.allow_origin(origin)
        }
        None => {
            warn!("FRONTEND_ORIGIN not set; allowing all origins for /api/*");
            cors.allow_origin(Any)
        }
    })
}

fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = cors_layer(state.api.frontend_origin.as_deref())?;

    let api = Router::new()
        .route("/orders", get(orders_handler))
        .route("/health", get(health_handler))
        .route("/sample-data", get(sample_data_handler))
        .layer(cors);

    Ok(Router::new().nest("/api", api).with_state(state))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pipeline = PipelineConfig::from_env();
    let api = ApiConfig::from_env();

    println!("=== Order Dashboard API ===");
    println!("Remote API: {}", pipeline.remote_url());
    println!("CSV fallback: {}", pipeline.resolve_csv_path().display());

    let orchestrator =
        Orchestrator::from_config(&pipeline).context("Failed to build upstream HTTP client")?;
    let bind = api.bind.clone();
    let state = Arc::new(AppState {
        orchestrator,
        pipeline,
        api,
    });

    let app = build_router(state)?;

    println!("API listening on http://{}", bind);
    println!("\nEndpoints:");
    println!("  GET /api/orders?startDate=&endDate=&baseUrl=");
    println!("  GET /api/health");
    println!("  GET /api/sample-data");

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    axum::serve(listener, app).await?;

    Ok(())
}
