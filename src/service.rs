//! HTTP surface over a loaded record set
//!
//! The record set lives behind an `ArcSwap`: an upload normalizes the new
//! payload off to the side and swaps it in whole, while view requests keep
//! reading whichever snapshot they loaded.

use crate::dashboard::{DashboardViews, ViewOptions};
use crate::error::FormatError;
use crate::filter::{FilterOptions, FilterSpec};
use crate::normalizer::{normalize, NormalizeReport, Normalized, PayloadShape, INSIGHTS_QUERY};
use crate::record::{CanonicalRecord, CategoryField};
use crate::record_table::{record_rows, write_csv, RecordDetails, RecordRow};
use crate::view_result::ViewResult;
use anyhow::Context;
use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes},
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// One normalized upload
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub shape: Option<PayloadShape>,
    pub records: Vec<CanonicalRecord>,
    pub report: NormalizeReport,
}

impl Dataset {
    /// Read and normalize an export file
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let payload: Value = serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        let normalized =
            normalize(&payload).with_context(|| format!("Failed to normalize {}", path.display()))?;
        Ok(normalized.into())
    }

    /// Default filter when a request names none
    fn filter_or_all_time(&self, filter: Option<FilterSpec>) -> FilterSpec {
        filter.unwrap_or_else(|| FilterSpec::all_time(&self.records))
    }

    /// `(index, record)` pairs passing the filter, indices into `records`
    fn matching<'a>(
        &'a self,
        spec: &'a FilterSpec,
    ) -> impl Iterator<Item = (usize, &'a CanonicalRecord)> + 'a {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, record)| spec.matches(record))
    }
}

impl From<Normalized> for Dataset {
    fn from(normalized: Normalized) -> Self {
        Dataset {
            shape: Some(normalized.shape),
            records: normalized.records,
            report: normalized.report,
        }
    }
}

// Application state shared across handlers
pub struct AppState {
    dataset: ArcSwap<Dataset>,
}

impl AppState {
    pub fn new(dataset: Dataset) -> Self {
        AppState {
            dataset: ArcSwap::from_pointee(dataset),
        }
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        self.dataset.load_full()
    }

    pub fn replace(&self, dataset: Dataset) {
        self.dataset.store(Arc::new(dataset));
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new(Dataset::default())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|err| {
        error!("Failed to parse JSON request: {}", err);
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid JSON request body: {}", err),
        )
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub shape: PayloadShape,
    pub report: NormalizeReport,
    pub filter_options: FilterOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewsRequest {
    #[serde(default)]
    pub filter: Option<FilterSpec>,
    #[serde(default)]
    pub error_field: Option<CategoryField>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsRequest {
    #[serde(default)]
    pub filter: Option<FilterSpec>,
}

/// Logs method, URI, status and latency of every request
async fn log_request_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started = Instant::now();

    info!("📥 {} {}", method, uri);
    let response = next.run(req).await;
    info!(
        "📤 {} {} -> {} in {:?}",
        method,
        uri,
        response.status(),
        started.elapsed()
    );

    response
}

pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(upload_handler))
        .route("/filter_options", get(filter_options_handler))
        .route("/views", post(views_handler))
        .route("/records", post(records_handler))
        .route("/records/export", post(export_handler))
        .route("/records/:index", get(record_details_handler))
        .route("/insights_query", get(insights_query_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(log_request_middleware))
}

async fn upload_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    let normalized = serde_json::from_slice::<Value>(&body)
        .map_err(FormatError::from)
        .and_then(|payload| normalize(&payload))
        .map_err(|err| {
            warn!("Rejected upload of {} bytes: {}", body.len(), err);
            api_error(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        })?;

    let response = UploadResponse {
        shape: normalized.shape,
        report: normalized.report.clone(),
        filter_options: FilterOptions::from_records(&normalized.records),
    };

    info!(
        "Loaded {} records from {} bytes",
        normalized.records.len(),
        body.len()
    );
    state.replace(normalized.into());

    Ok(Json(response))
}

async fn filter_options_handler(State(state): State<Arc<AppState>>) -> Json<FilterOptions> {
    let dataset = state.snapshot();
    Json(FilterOptions::from_records(&dataset.records))
}

async fn views_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ViewsRequest>, JsonRejection>,
) -> Result<Json<DashboardViews>, ApiError> {
    let request = json_body(payload)?;
    let dataset = state.snapshot();

    let spec = dataset.filter_or_all_time(request.filter);
    let options = ViewOptions {
        error_field: request.error_field.unwrap_or_default(),
    };

    Ok(Json(DashboardViews::compute(&dataset.records, &spec, options)))
}

async fn records_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecordsRequest>, JsonRejection>,
) -> Result<Json<ViewResult<Vec<RecordRow>>>, ApiError> {
    let request = json_body(payload)?;
    let dataset = state.snapshot();

    let spec = dataset.filter_or_all_time(request.filter);
    Ok(Json(record_rows(dataset.matching(&spec))))
}

async fn export_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecordsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let dataset = state.snapshot();

    let spec = dataset.filter_or_all_time(request.filter);
    let rows = record_rows(dataset.matching(&spec))
        .into_data()
        .unwrap_or_default();

    let mut csv = Vec::new();
    write_csv(&rows, &mut csv).map_err(|err| {
        error!("CSV export failed: {}", err);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "CSV export failed")
    })?;

    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv))
}

async fn record_details_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<RecordDetails>, ApiError> {
    let dataset = state.snapshot();
    let record = dataset.records.get(index).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("No record at index {}", index),
        )
    })?;

    Ok(Json(RecordDetails::from_record(index, record)))
}

async fn insights_query_handler() -> &'static str {
    INSIGHTS_QUERY
}
