//! HTTP tool server for bearing health analysis.
//!
//! This module provides an HTTP server that:
//! - Lists its tools via GET /tools
//! - Analyzes a recording by path or URI via POST /tools/analyze_bearing_health
//! - Analyzes inline samples via POST /analyze
//! - Reports served-analysis counters via GET /stats
//!
//! # Architecture
//!
//! ```text
//! client ──→ POST /tools/analyze_bearing_health ──→ source ──→ analyzer ──→ report
//!                                                     ↓
//!                                              [local | WebHDFS]
//! ```

use crate::config::Config;
use crate::core::{analyze_with, AnalysisParams, Verdict};
use crate::error::{Error, SourceError};
use crate::report::{AnalysisReport, Recording, ReportBuilder};
use crate::source::webhdfs::WebHdfsConfig;
use crate::source::{load_samples_async, SampleSource, WebHdfsClient, DEFAULT_COLUMN};
use crate::stats::{create_shared_log, AnalysisStats, SharedAnalysisLog};
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Name of the recording analysis tool.
pub const ANALYZE_TOOL: &str = "analyze_bearing_health";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Analysis parameters used when a request omits them
    pub defaults: AnalysisParams,
    /// Sample column used when a request omits it
    pub column: String,
    /// WebHDFS client settings
    pub webhdfs: WebHdfsConfig,
}

impl ServerConfig {
    /// Create a new server configuration with built-in defaults
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            defaults: AnalysisParams::default(),
            column: DEFAULT_COLUMN.to_string(),
            webhdfs: WebHdfsConfig::default(),
        }
    }

    /// Build the server configuration from the config file sections
    pub fn from_config(config: &Config) -> Self {
        let mut webhdfs = WebHdfsConfig::default();
        if let Some(user) = &config.source.webhdfs_user {
            webhdfs.user = Some(user.clone());
        }

        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            defaults: config.analysis,
            column: config.source.column.clone(),
            webhdfs,
        }
    }
}

/// Shared server state
pub struct ServerState {
    defaults: AnalysisParams,
    column: String,
    webhdfs: WebHdfsClient,
    reports: ReportBuilder,
    log: SharedAnalysisLog,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: &ServerConfig) -> Result<Self, SourceError> {
        Self::with_log(config, create_shared_log())
    }

    /// Create server state that counts into an existing log
    pub fn with_log(config: &ServerConfig, log: SharedAnalysisLog) -> Result<Self, SourceError> {
        Ok(Self {
            defaults: config.defaults,
            column: config.column.clone(),
            webhdfs: WebHdfsClient::new(config.webhdfs.clone())?,
            reports: ReportBuilder::new(),
            log,
        })
    }

    fn report(
        &self,
        verdict: &Verdict,
        params: &AnalysisParams,
        recording: &Recording,
        raw: bool,
    ) -> AnalysisReport {
        self.log.record_verdict(verdict);
        let mut report = self.reports.build(verdict, params, recording);
        if raw {
            report.raw_energy = Some(verdict.raw_energy());
        }
        report
    }

    fn fail(&self, err: ApiError) -> ApiError {
        self.log.record_failure(&err.body.code);
        tracing::warn!(code = %err.body.code, "analysis failed: {}", err.body.error);
        err
    }
}

/// Per-request overrides of the analysis parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamOverrides {
    pub fs: Option<f64>,
    pub target_freq: Option<f64>,
    pub bandwidth: Option<f64>,
    pub threshold: Option<f64>,
    pub order: Option<usize>,
}

impl ParamOverrides {
    /// Apply the overrides on top of `defaults`
    pub fn resolve(&self, defaults: &AnalysisParams) -> AnalysisParams {
        AnalysisParams {
            fs: self.fs.unwrap_or(defaults.fs),
            target_freq: self.target_freq.unwrap_or(defaults.target_freq),
            bandwidth: self.bandwidth.unwrap_or(defaults.bandwidth),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            order: self.order.unwrap_or(defaults.order),
        }
    }
}

/// POST /tools/analyze_bearing_health body
#[derive(Debug, Clone, Deserialize)]
pub struct ToolRequest {
    /// Local path, file:// or webhdfs:// URI of the recording
    pub path: String,
    pub column: Option<String>,
    #[serde(flatten)]
    pub params: ParamOverrides,
    /// Include the unrounded energy in the report
    #[serde(default)]
    pub raw: bool,
}

/// POST /analyze body
#[derive(Debug, Clone, Deserialize)]
pub struct SamplesRequest {
    pub samples: Vec<f64>,
    #[serde(flatten)]
    pub params: ParamOverrides,
    #[serde(default)]
    pub raw: bool,
}

/// A tool the server exposes
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// An error with its HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn internal(message: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse {
                error: message.to_string(),
                code: "INTERNAL".to_string(),
                details: None,
            },
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, details) = match &err {
            Error::Analysis(_) => (StatusCode::UNPROCESSABLE_ENTITY, None),
            Error::Source(source) => match source {
                SourceError::ColumnNotFound { column, available } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Some(json!({ "column": column, "available": available })),
                ),
                SourceError::NonNumericColumn { .. } | SourceError::NullValue { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, None)
                }
                SourceError::NotFound(_) => (StatusCode::NOT_FOUND, None),
                SourceError::Unsupported(_) | SourceError::Malformed { .. } => {
                    (StatusCode::BAD_REQUEST, None)
                }
                SourceError::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, None),
                SourceError::Network(_) | SourceError::Remote { .. } => {
                    (StatusCode::BAD_GATEWAY, None)
                }
            },
        };

        Self {
            status,
            body: ErrorResponse {
                error: err.to_string(),
                code: err.code().to_string(),
                details,
            },
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        Error::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /tools
async fn tools() -> Json<Vec<ToolDescriptor>> {
    let params = json!({
        "fs": { "type": "number", "description": "Sampling rate in Hz" },
        "target_freq": { "type": "number", "description": "Fault frequency in Hz" },
        "bandwidth": { "type": "number", "description": "Band width in Hz" },
        "threshold": { "type": "number", "description": "RMS threshold for ANOMALY" },
        "order": { "type": "integer", "minimum": 1, "maximum": 16, "description": "Butterworth prototype order" },
        "raw": { "type": "boolean", "description": "Include the unrounded energy" }
    });

    let mut path_props = params.clone();
    path_props["path"] = json!({
        "type": "string",
        "description": "Local path, file:// or webhdfs://host:port/path of a .parquet or .csv recording"
    });
    path_props["column"] = json!({
        "type": "string",
        "description": "Vibration column name"
    });

    let mut sample_props = params;
    sample_props["samples"] = json!({ "type": "array", "items": { "type": "number" } });

    Json(vec![
        ToolDescriptor {
            name: ANALYZE_TOOL.to_string(),
            description: "Band-pass a vibration recording around the fault frequency and \
                          classify its RMS energy as HEALTHY or ANOMALY"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": path_props,
                "required": ["path"]
            }),
        },
        ToolDescriptor {
            name: "analyze".to_string(),
            description: "Same analysis on samples given inline".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": sample_props,
                "required": ["samples"]
            }),
        },
    ])
}

/// POST /tools/analyze_bearing_health
///
/// Loads the column from the recording, then runs the analysis on the
/// blocking pool.
async fn analyze_recording(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ToolRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let params = request.params.resolve(&state.defaults);
    let column = request.column.clone().unwrap_or_else(|| state.column.clone());

    let source = SampleSource::parse(&request.path).map_err(|e| state.fail(e.into()))?;
    tracing::info!(source = %source, column = %column, "analyzing recording");

    let samples = load_samples_async(&source, &column, &state.webhdfs)
        .await
        .map_err(|e| state.fail(e.into()))?;

    let sample_count = samples.len();
    let verdict = run_analysis(samples, params)
        .await
        .map_err(|e| state.fail(e))?;

    let recording = Recording {
        sensor_path: Some(source.to_string()),
        column: Some(column),
        sample_count,
    };
    Ok(Json(state.report(&verdict, &params, &recording, request.raw)))
}

/// POST /analyze
async fn analyze_samples(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SamplesRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let params = request.params.resolve(&state.defaults);
    let sample_count = request.samples.len();

    let verdict = run_analysis(request.samples, params)
        .await
        .map_err(|e| state.fail(e))?;

    let recording = Recording {
        sample_count,
        ..Recording::default()
    };
    Ok(Json(state.report(&verdict, &params, &recording, request.raw)))
}

/// GET /stats
async fn stats(State(state): State<Arc<ServerState>>) -> Json<AnalysisStats> {
    Json(state.log.stats())
}

async fn run_analysis(samples: Vec<f64>, params: AnalysisParams) -> Result<Verdict, ApiError> {
    tokio::task::spawn_blocking(move || analyze_with(&samples, &params))
        .await
        .map_err(ApiError::internal)?
        .map_err(|e| Error::from(e).into())
}

/// Build the router over `state`
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(tools))
        .route(&format!("/tools/{ANALYZE_TOOL}"), post(analyze_recording))
        .route("/analyze", post(analyze_samples))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    run_with_log(config, create_shared_log()).await
}

/// Run the HTTP server, counting analyses into `log`
pub async fn run_with_log(
    config: ServerConfig,
    log: SharedAnalysisLog,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::with_log(&config, log)?);
    let app = router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Bearing health server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    #[test]
    fn test_overrides_resolve() {
        let overrides = ParamOverrides {
            target_freq: Some(87.0),
            threshold: Some(0.2),
            ..ParamOverrides::default()
        };
        let params = overrides.resolve(&AnalysisParams::default());
        assert_eq!(params.target_freq, 87.0);
        assert_eq!(params.threshold, 0.2);
        assert_eq!(params.fs, 2000.0);
        assert_eq!(params.order, 4);
    }

    #[test]
    fn test_tool_request_flattened() {
        let request: ToolRequest = serde_json::from_str(
            r#"{"path": "/data/run.parquet", "threshold": 0.7, "raw": true}"#,
        )
        .unwrap();
        assert_eq!(request.path, "/data/run.parquet");
        assert_eq!(request.params.threshold, Some(0.7));
        assert!(request.params.fs.is_none());
        assert!(request.raw);
    }

    #[test]
    fn test_error_status_mapping() {
        let cases: Vec<(Error, StatusCode)> = vec![
            (AnalysisError::EmptySequence.into(), StatusCode::UNPROCESSABLE_ENTITY),
            (
                SourceError::NotFound("/x.parquet".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                SourceError::Unsupported("s3://x".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                SourceError::Remote {
                    status: 403,
                    message: "denied".into(),
                }
                .into(),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, status) in cases {
            let code = err.code();
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.body.code, code);
        }
    }

    #[test]
    fn test_column_not_found_details() {
        let api = ApiError::from(SourceError::ColumnNotFound {
            column: "vibration".into(),
            available: vec!["time".into(), "accel".into()],
        });
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        let details = api.body.details.unwrap();
        assert_eq!(details["available"], json!(["time", "accel"]));
    }
}
