use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::agent::connectivity::ApiKeys;
use crate::agent::core::{ResearchReport, ScriptOutcome};
use crate::agent::engine_router::BackendConnectivity;
use crate::agent::error::DispatchError;
use crate::agent::fact_check::FactCheckResult;
use crate::agent::prompt_builder::ScriptRequest;
use crate::agent::style_store::Style;
use crate::agent::training::TrainingProfile;
use crate::state::{AppState, DashboardStatus};

pub type SharedState = Arc<AppState>;

const DEFAULT_DURATION_MINUTES: u32 = 22;
const DEFAULT_LANGUAGE: &str = "ar";

/// JSON error body with a status code.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(msg: &str) -> Self {
        ApiError(StatusCode::BAD_REQUEST, msg.to_string())
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        let status = match &err {
            DispatchError::MalformedResponse(_) | DispatchError::Backend { .. } => {
                StatusCode::BAD_GATEWAY
            }
            DispatchError::StyleNotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::DuplicateStyle(_) => StatusCode::CONFLICT,
            DispatchError::InvalidStyleName => StatusCode::BAD_REQUEST,
            DispatchError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Deserialize)]
pub struct NewStyleRequest {
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Deserialize)]
pub struct ExampleRequest {
    pub before: String,
    pub after: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptJobRequest {
    #[serde(default)]
    pub style_id: String,
    #[serde(default)]
    pub title: String,
    pub duration: Option<u32>,
    pub language: Option<String>,
    #[serde(default)]
    pub source_text: String,
}

impl ScriptJobRequest {
    fn to_script_request(&self) -> ScriptRequest {
        ScriptRequest {
            title: self.title.trim().to_string(),
            duration_minutes: self.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
            language: self
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            source_text: self.source_text.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckRequest {
    pub script_content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeasRequest {
    pub style_id: String,
}

#[derive(Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
}

/// Rejects requests without the configured key, read from the `X-API-Key`
/// header or the `api_key` query parameter. Open when no key is configured.
async fn require_api_key(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.server_api_key() else {
        return next.run(req).await;
    };

    let header_key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());
    let query_key = req.uri().query().and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == "api_key")
            .map(|(_, v)| v.into_owned())
    });

    if header_key == Some(expected.as_str()) || query_key.as_deref() == Some(expected.as_str()) {
        next.run(req).await
    } else {
        warn!("[SERVER] Rejected unauthenticated request to {}", req.uri().path());
        StatusCode::UNAUTHORIZED.into_response()
    }
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/styles", get(list_styles).post(add_style))
        .route("/api/styles/:id/training", put(update_training))
        .route("/api/styles/:id/examples", post(add_example))
        .route("/api/scripts/transform", post(transform_script))
        .route("/api/scripts/generate", post(generate_script))
        .route("/api/fact-check", post(fact_check))
        .route("/api/ideas", post(generate_ideas))
        .route("/api/research", post(deep_research))
        .route("/api/connections/test", post(test_connections))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

pub async fn start_server(port: u16, state: SharedState) -> std::io::Result<()> {
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let display_addr = if addr.ip().is_unspecified() {
        format!("127.0.0.1:{}", port)
    } else {
        addr.to_string()
    };
    info!("🚀 ScriptForge API running on http://{}", display_addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn get_status(State(state): State<SharedState>) -> Json<DashboardStatus> {
    let core = state.core();
    let logs = core.get_logs();
    let tail_start = logs.len().saturating_sub(20);

    Json(DashboardStatus {
        status: core.get_status(),
        connectivity: state.connectivity.snapshot(),
        styles: state.styles.read().await.styles().len(),
        recent_logs: logs[tail_start..].to_vec(),
    })
}

async fn list_styles(State(state): State<SharedState>) -> Json<Vec<Style>> {
    Json(state.styles.read().await.styles().to_vec())
}

async fn add_style(
    State(state): State<SharedState>,
    Json(payload): Json<NewStyleRequest>,
) -> Result<(StatusCode, Json<Style>), ApiError> {
    let style = state
        .styles
        .write()
        .await
        .add_style(&payload.name, &payload.icon)?;
    Ok((StatusCode::CREATED, Json(style)))
}

async fn update_training(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(profile): Json<TrainingProfile>,
) -> ApiResult<Style> {
    let mut styles = state.styles.write().await;
    styles.update_training(&id, profile)?;
    let style = styles
        .get(&id)
        .cloned()
        .ok_or(DispatchError::StyleNotFound(id))?;
    Ok(Json(style))
}

async fn add_example(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<ExampleRequest>,
) -> ApiResult<Style> {
    if payload.before.trim() == payload.after.trim() {
        return Err(ApiError::bad_request("No changes to add to training"));
    }
    let mut styles = state.styles.write().await;
    styles.add_training_example(&id, &payload.before, &payload.after)?;
    let style = styles
        .get(&id)
        .cloned()
        .ok_or(DispatchError::StyleNotFound(id))?;
    Ok(Json(style))
}

async fn lookup_style(state: &AppState, id: &str) -> Result<Style, ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::bad_request("A style must be selected"));
    }
    state
        .styles
        .read()
        .await
        .get(id)
        .cloned()
        .ok_or_else(|| DispatchError::StyleNotFound(id.to_string()).into())
}

async fn transform_script(
    State(state): State<SharedState>,
    Json(job): Json<ScriptJobRequest>,
) -> ApiResult<ScriptOutcome> {
    if job.title.trim().is_empty() || job.source_text.trim().is_empty() {
        return Err(ApiError::bad_request(
            "A title and source text are required for transformation",
        ));
    }
    let style = lookup_style(&state, &job.style_id).await?;

    let outcome = state.core().transform(&style, &job.to_script_request()).await?;
    record_script(&state, &style.id).await;
    Ok(Json(outcome))
}

async fn generate_script(
    State(state): State<SharedState>,
    Json(job): Json<ScriptJobRequest>,
) -> ApiResult<ScriptOutcome> {
    if job.title.trim().is_empty() {
        return Err(ApiError::bad_request("An episode title is required"));
    }
    let style = lookup_style(&state, &job.style_id).await?;

    let outcome = state
        .core()
        .generate_from_title(&style, &job.to_script_request())
        .await?;
    record_script(&state, &style.id).await;
    Ok(Json(outcome))
}

async fn record_script(state: &AppState, style_id: &str) {
    if let Err(e) = state.styles.write().await.record_script(style_id) {
        error!("[SERVER] Failed to update script count for {}: {}", style_id, e);
    }
}

async fn fact_check(
    State(state): State<SharedState>,
    Json(payload): Json<FactCheckRequest>,
) -> ApiResult<FactCheckResult> {
    if payload.script_content.trim().is_empty() {
        return Err(ApiError::bad_request("There is no script content to check"));
    }
    Ok(Json(state.core().fact_check(&payload.script_content).await?))
}

async fn generate_ideas(
    State(state): State<SharedState>,
    Json(payload): Json<IdeasRequest>,
) -> ApiResult<Vec<String>> {
    let style = lookup_style(&state, &payload.style_id).await?;
    Ok(Json(state.core().generate_ideas(&style.name).await?))
}

async fn deep_research(
    State(state): State<SharedState>,
    Json(payload): Json<ResearchRequest>,
) -> ApiResult<ResearchReport> {
    if payload.topic.trim().is_empty() {
        return Err(ApiError::bad_request("A research topic is required"));
    }
    Ok(Json(state.core().deep_research(&payload.topic).await?))
}

async fn test_connections(
    State(state): State<SharedState>,
    Json(keys): Json<ApiKeys>,
) -> ApiResult<BackendConnectivity> {
    Ok(Json(state.apply_keys(keys)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = vec![
            (DispatchError::MalformedResponse("x".into()), StatusCode::BAD_GATEWAY),
            (DispatchError::StyleNotFound("x".into()), StatusCode::NOT_FOUND),
            (DispatchError::DuplicateStyle("x".into()), StatusCode::CONFLICT),
            (DispatchError::InvalidStyleName, StatusCode::BAD_REQUEST),
            (DispatchError::Persistence("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).0, expected);
        }
    }

    #[test]
    fn test_job_defaults() {
        let job: ScriptJobRequest =
            serde_json::from_str(r#"{"styleId":"s","title":" T ","sourceText":"x"}"#).unwrap();
        let request = job.to_script_request();
        assert_eq!(request.title, "T");
        assert_eq!(request.duration_minutes, 22);
        assert_eq!(request.language, "ar");
    }
}
