//! Reporting API handlers.
//!
//! Every handler reads the cached record set, applies the requested filters
//! and threshold, and answers with JSON (or an xlsx download for the export).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use custodia_core::{Field, FieldValue, GroupKey, RecordSet, Threshold, VehicleRecord};
use custodia_ingest::DataLoadError;
use custodia_report::{
    build_single, project, ReportError, DASHBOARD_ALERT_COLUMNS, EXPORT_SHEET_NAME,
    XLSX_CONTENT_TYPE,
};
use custodia_rules::{classify, summarize, FilterOptions, RecordFilter, TrendReport, UnitSummary};

use crate::state::AppState;

const EXPORT_FILENAME: &str = "vehiculos_alerta.xlsx";

// ── Errors ────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Load(DataLoadError),
    Report(ReportError),
    Internal(String),
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("background task failed: {e}"))
    }
}

impl From<DataLoadError> for ApiError {
    fn from(e: DataLoadError) -> Self {
        ApiError::Load(e)
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        ApiError::Report(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Load(e) => {
                error!(error = %e, "failed to load custody records");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Report(e) => {
                error!(error = %e, "failed to build export");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ── Query parameters ──────────────────────────────────────────────

/// Filters shared by the alert table, export and charts.
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    pub unit: Option<String>,
    pub responsible: Option<String>,
    pub process: Option<String>,
    pub threshold: Option<String>,
}

impl ViewParams {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            unit: self.unit.clone(),
            responsible_party: self.responsible.clone(),
            process_number: self.process.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub by: Option<String>,
    pub threshold: Option<String>,
}

fn threshold_param(raw: Option<&str>, default: Threshold) -> Result<Threshold, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => {
            let days: u32 = s
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("threshold '{s}' is not a number of days")))?;
            Threshold::new(days).map_err(|e| ApiError::BadRequest(e.to_string()))
        }
    }
}

fn group_key_param(raw: Option<&str>) -> Result<GroupKey, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(GroupKey::default()),
        Some(s) => s.parse().map_err(ApiError::BadRequest),
    }
}

/// Cached record set, loaded on a blocking thread: a miss parses the CSV
/// while holding the cache's std mutex.
async fn load_records(state: &Arc<AppState>) -> Result<Arc<RecordSet>, ApiError> {
    let state = state.clone();
    Ok(tokio::task::spawn_blocking(move || state.records()).await??)
}

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Summary ───────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SummaryResponse {
    pub as_of: NaiveDate,
    pub threshold: u32,
    pub group_by: GroupKey,
    pub total_count: usize,
    pub alert_count: usize,
    pub unknown_count: usize,
    pub date_warnings: usize,
    pub units: Vec<UnitSummary>,
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let threshold = threshold_param(params.threshold.as_deref(), state.config.alert.threshold)?;
    let key = group_key_param(params.by.as_deref())?;
    let set = load_records(&state).await?;

    let units = summarize(set.records(), key, threshold);
    Ok(Json(SummaryResponse {
        as_of: set.as_of(),
        threshold: threshold.days(),
        group_by: key,
        total_count: set.len(),
        alert_count: units.iter().map(|u| u.alert_count).sum(),
        unknown_count: units.iter().map(|u| u.unknown_count).sum(),
        date_warnings: set.warnings().len(),
        units,
    }))
}

// ── Alerts ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ColumnInfo {
    pub field: Field,
    pub header: String,
}

#[derive(Serialize)]
pub struct AlertsResponse {
    pub as_of: NaiveDate,
    pub threshold: u32,
    pub count: usize,
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Map<String, Value>>,
}

fn json_value(value: FieldValue<'_>) -> Value {
    match value {
        FieldValue::Text(s) => Value::String(s.to_string()),
        FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        FieldValue::Integer(n) => Value::from(n),
        FieldValue::Null => Value::Null,
    }
}

fn json_row(record: &VehicleRecord, columns: &[Field]) -> Map<String, Value> {
    columns
        .iter()
        .map(|field| (field.as_str().to_string(), json_value(record.value(*field))))
        .collect()
}

pub async fn alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Json<AlertsResponse>, ApiError> {
    let threshold = threshold_param(params.threshold.as_deref(), state.config.alert.threshold)?;
    let set = load_records(&state).await?;

    let filtered = params.filter().apply(set.records());
    let alerts = classify(filtered, threshold);
    let columns = project(&DASHBOARD_ALERT_COLUMNS, &set);
    let schema = &state.config.source.schema;

    Ok(Json(AlertsResponse {
        as_of: set.as_of(),
        threshold: threshold.days(),
        count: alerts.len(),
        columns: columns
            .iter()
            .map(|f| ColumnInfo {
                field: *f,
                header: schema.header(*f).to_string(),
            })
            .collect(),
        rows: alerts.iter().map(|r| json_row(r, &columns)).collect(),
    }))
}

pub async fn export_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Response, ApiError> {
    let threshold = threshold_param(params.threshold.as_deref(), state.config.alert.threshold)?;
    let set = load_records(&state).await?;

    let filter = params.filter();
    let schema = state.config.source.schema.clone();
    let report = tokio::task::spawn_blocking(move || {
        let alerts = classify(filter.apply(set.records()), threshold);
        if alerts.is_empty() {
            return Ok(None);
        }
        let columns = project(&DASHBOARD_ALERT_COLUMNS, &set);
        build_single(EXPORT_SHEET_NAME, &alerts, &columns, &schema).map(Some)
    })
    .await??;

    let Some(report) = report else {
        return Err(ApiError::NotFound(
            "no vehicles in alert for the selected filters".to_string(),
        ));
    };
    info!(rows = report.row_count(), bytes = report.bytes.len(), "alert export built");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        report.bytes,
    )
        .into_response())
}

// ── Charts & filter choices ───────────────────────────────────────

#[derive(Serialize)]
pub struct TrendsResponse {
    pub threshold: u32,
    pub record_count: usize,
    #[serde(flatten)]
    pub trends: TrendReport,
}

pub async fn trends(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let threshold = threshold_param(params.threshold.as_deref(), state.config.alert.threshold)?;
    let set = load_records(&state).await?;

    let filtered = params.filter().apply(set.records());
    Ok(Json(TrendsResponse {
        threshold: threshold.days(),
        record_count: filtered.len(),
        trends: TrendReport::build(filtered, threshold),
    }))
}

pub async fn filters(State(state): State<Arc<AppState>>) -> Result<Json<FilterOptions>, ApiError> {
    let set = load_records(&state).await?;
    Ok(Json(FilterOptions::collect(set.records())))
}

#[derive(Serialize)]
pub struct InvalidateResponse {
    pub status: &'static str,
}

pub async fn invalidate_cache(State(state): State<Arc<AppState>>) -> Json<InvalidateResponse> {
    state.cache.invalidate();
    Json(InvalidateResponse {
        status: "invalidated",
    })
}
