//! HTTP façade: diagnostic endpoints and the two check endpoints

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Multipart, Request, State},
    http::{header, HeaderValue},
    response::Json,
    routing::{get, post},
    Form, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};

use crate::adapter::{EngineAdapter, JAVA_SERVER_HINT};
use crate::checker::{self, CheckPayload, CheckRequest, CheckResult, SUPPORTED_LANGUAGES};
use crate::config::Config;
use crate::engine::ProbeOutcome;
use crate::error::{ProxyError, Result};

pub const SERVICE_NAME: &str = "languagetool";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared state handed to every handler
pub struct AppState {
    pub adapter: EngineAdapter,
}

impl AppState {
    pub fn new(adapter: EngineAdapter) -> Self {
        Self { adapter }
    }
}

/// Build the router with CORS and request tracing
pub fn router(state: Arc<AppState>, config: &Config) -> Router {
    routes()
        .with_state(state)
        .layer(cors_layer(&config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/test-connection", get(test_connection))
        .route("/reinit", post(reinit))
        .route("/v2/check", post(check_form))
        .route("/v2/check/json", post(check_json))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Liveness and availability summary
async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    let current = state.adapter.state().await;
    let error = if current.available { None } else { current.last_error };

    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": VERSION,
        "available": current.available,
        "server": current.server_url,
        "error": error,
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let available = state.adapter.state().await.available;
    let status = if available { "healthy" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": SERVICE_NAME,
        "version": VERSION,
        "available": available,
    }))
}

async fn info(State(state): State<Arc<AppState>>) -> Json<Value> {
    let current = state.adapter.state().await;
    let init_error = if current.available { None } else { current.last_error };
    let languages: Vec<&str> = SUPPORTED_LANGUAGES.iter().map(|(code, _)| *code).collect();

    Json(json!({
        "service": "LanguageTool Grammar Check Service",
        "version": VERSION,
        "description": "Grammar and spell checking using LanguageTool",
        "available": current.available,
        "server": current.server_url,
        "mode": "self_hosted_server",
        "initialization_error": init_error,
        "endpoints": {
            "health": "GET /health",
            "info": "GET /info",
            "test_connection": "GET /test-connection (test connection to Java server)",
            "check": "POST /v2/check (check grammar and spelling)",
            "check_json": "POST /v2/check/json (JSON body format)",
            "reinit": "POST /reinit (clear cache and reinitialize)",
        },
        "supported_languages": languages,
        "note": "Service requires a running LanguageTool Java server (default http://localhost:8011).",
        "configuration": {
            "LANGTOOL_SERVER": "URL of your LanguageTool Java server (e.g., http://localhost:8011). \
                This service runs on 8010, the Java server should use 8011 to avoid a port conflict.",
        },
        "troubleshooting": {
            "if_not_available": "Check logs for the initialization error. Common issues: Java server not running or incorrect LANGTOOL_SERVER value.",
            "check_java": "Run 'java -version' to verify Java is installed",
            "check_logs": "Look for 'Failed to connect to remote server' in service startup logs",
            "clear_cache": "If you see 'File is not a zip file' error, try POST /reinit to clear cache and reinitialize",
        },
    }))
}

async fn test_connection(State(state): State<Arc<AppState>>) -> Json<Value> {
    let server = state.adapter.server_url().await;

    let body = match state.adapter.probe().await {
        None => json!({
            "connected": false,
            "message": "LANGTOOL_SERVER environment variable is not set",
            "server": Value::Null,
            "suggestion": "Set LANGTOOL_SERVER=http://localhost:8011 and restart the service",
        }),
        Some(ProbeOutcome::Ok) => json!({
            "connected": true,
            "message": "Successfully connected to LanguageTool server",
            "server": server,
            "status": "ok",
        }),
        Some(ProbeOutcome::Status(status)) => json!({
            "connected": false,
            "message": format!("Server returned status code {}", status.as_u16()),
            "server": server,
            "status_code": status.as_u16(),
        }),
        Some(ProbeOutcome::Refused) => json!({
            "connected": false,
            "message": format!("Cannot connect to LanguageTool server at {}", server),
            "server": server,
            "error": "Connection refused",
            "suggestion": JAVA_SERVER_HINT,
        }),
        Some(ProbeOutcome::Timeout) => json!({
            "connected": false,
            "message": format!("Connection timeout to {}", server),
            "server": server,
            "error": "Timeout",
        }),
        Some(ProbeOutcome::Failed(e)) => json!({
            "connected": false,
            "message": format!("Error testing connection: {}", e),
            "server": server,
            "error": e,
        }),
    };

    Json(body)
}

async fn reinit(State(state): State<Arc<AppState>>) -> Json<Value> {
    let outcome = state.adapter.reinitialize().await;
    let current = outcome.state;
    let success = current.available;
    let error = if success { None } else { current.last_error.clone() };

    let message = if success {
        "LanguageTool reinitialized successfully".to_string()
    } else {
        format!(
            "Reinitialization failed: {}",
            current.last_error.as_deref().unwrap_or("unknown error")
        )
    };

    Json(json!({
        "success": success,
        "available": current.available,
        "cache_cleared": outcome.cache_cleared,
        "error": error,
        "message": message,
        "server": current.server_url,
        "suggestion": "Ensure Java server is running on port 8011",
    }))
}

/// Check fields from either a urlencoded or a multipart form body
pub struct FormPayload(pub CheckPayload);

#[async_trait]
impl<S> FromRequest<S> for FormPayload
where
    S: Send + Sync,
{
    type Rejection = ProxyError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(payload) = Form::<CheckPayload>::from_request(req, state)
                .await
                .map_err(|e| ProxyError::Validation(e.body_text()))?;
            return Ok(Self(payload));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ProxyError::Validation(e.body_text()))?;

        let mut payload = CheckPayload::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ProxyError::Validation(e.body_text()))?
        {
            let name = field.name().map(str::to_owned);
            let value = field
                .text()
                .await
                .map_err(|e| ProxyError::Validation(e.body_text()))?;

            match name.as_deref() {
                Some("text") => payload.text = Some(value),
                Some("language") => payload.language = Some(value),
                Some("questionText") => payload.question_text = Some(value),
                _ => {}
            }
        }

        Ok(Self(payload))
    }
}

async fn check_form(
    State(state): State<Arc<AppState>>,
    FormPayload(payload): FormPayload,
) -> Result<Json<CheckResult>> {
    run_check(&state, payload).await
}

async fn check_json(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<CheckPayload>, JsonRejection>,
) -> Result<Json<CheckResult>> {
    let Json(payload) = payload.map_err(|e| ProxyError::Validation(e.body_text()))?;
    run_check(&state, payload).await
}

async fn run_check(state: &AppState, payload: CheckPayload) -> Result<Json<CheckResult>> {
    let request = CheckRequest::try_from(payload)?;
    let result = checker::check(&state.adapter, request).await?;
    Ok(Json(result))
}
