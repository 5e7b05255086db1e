// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are public; the dashboard front end
// is the only intended client. Every lookup failure maps to a JSON body
// `{"error": "..."}` with a status that tells the user what to fix.
//
// CORS is configured permissively so the front end can be served from any
// origin during development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::dashboard::{submit_query, QueryRequest, QueryResult};
use crate::error::LookupError;
use crate::export::{export_filename, ExportTable};
use crate::indicators::MovingAverage;
use crate::runtime_config::DashboardConfig;
use crate::types::{DateRange, RangePreset};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/resolve", get(resolve))
        .route("/api/v1/quote", get(quote))
        .route("/api/v1/export", get(export_csv))
        .route("/api/v1/listing/refresh", post(refresh_listing))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

enum ApiError {
    Lookup(LookupError),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        Self::Lookup(err)
    }
}

fn status_for(err: &LookupError) -> StatusCode {
    match err {
        LookupError::SymbolNotFound { .. } => StatusCode::NOT_FOUND,
        LookupError::InvalidRange { .. } | LookupError::EmptyQuery => StatusCode::BAD_REQUEST,
        LookupError::EmptySeries => StatusCode::UNPROCESSABLE_ENTITY,
        LookupError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Lookup(err) => (status_for(&err), err.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}")),
        };
        if status.is_server_error() {
            warn!(status = %status, error = %message, "request failed");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    uptime_secs: u64,
    queries_served: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.uptime_secs(),
        queries_served: state.queries_served(),
    })
}

// =============================================================================
// Symbol resolution
// =============================================================================

#[derive(Deserialize)]
struct ResolveParams {
    query: String,
}

#[derive(Serialize)]
struct ResolveResponse {
    query: String,
    code: String,
}

async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let code = state.resolver.resolve(&params.query).await?;
    Ok(Json(ResolveResponse {
        query: params.query.trim().to_string(),
        code,
    }))
}

async fn refresh_listing(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.resolver.invalidate_listing();
    info!("listing cache invalidated via API");
    Json(serde_json::json!({ "status": "ok" }))
}

// =============================================================================
// Quote & export
// =============================================================================

#[derive(Debug, Deserialize)]
struct QuoteParams {
    query: String,
    #[serde(default)]
    preset: Option<RangePreset>,
    #[serde(default)]
    start: Option<NaiveDate>,
    #[serde(default)]
    end: Option<NaiveDate>,
    /// Comma-separated MA overlays, e.g. `MA20,MA60`. Empty selects none.
    #[serde(default)]
    ma: Option<String>,
}

fn build_request(params: QuoteParams, config: &DashboardConfig) -> Result<QueryRequest, ApiError> {
    let explicit = match (params.start, params.end) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)),
        (None, None) => None,
        _ => {
            return Err(ApiError::BadRequest(
                "both start and end are required for an explicit range".to_string(),
            ))
        }
    };

    let preset = params.preset.unwrap_or(if explicit.is_some() {
        RangePreset::Explicit
    } else {
        config.default_preset
    });

    let overlays = match params.ma.as_deref() {
        None => config.default_overlays.clone(),
        Some(list) => list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<MovingAverage>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::BadRequest)?,
    };

    Ok(QueryRequest {
        query: params.query,
        preset,
        explicit,
        overlays,
    })
}

async fn run_query(state: &AppState, params: QuoteParams) -> Result<QueryResult, ApiError> {
    let request = build_request(params, &state.config)?;
    let as_of = state.clock.today();
    let result = submit_query(
        &state.resolver,
        state.prices.as_ref(),
        &state.config,
        as_of,
        &request,
    )
    .await?;
    state.record_query();
    Ok(result)
}

async fn quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<QueryResult>, ApiError> {
    Ok(Json(run_query(&state, params).await?))
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> Result<Response, ApiError> {
    let result = run_query(&state, params).await?;
    if result.bars.is_empty() {
        info!(code = %result.code, range = %result.range, "export has no rows");
    }
    let csv = ExportTable::from_series(&result.bars)
        .to_csv()
        .map_err(ApiError::Internal)?;
    let disposition = format!("attachment; filename=\"{}\"", export_filename(&result.code));

    info!(code = %result.code, rows = result.bars.len(), "export generated");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
