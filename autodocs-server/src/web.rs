//! HTTP API.
//!
//! - `GET  /health`
//! - `POST /agents/run`: start a run, inline or in the background
//! - `GET  /agents/task/{task_id}`: poll a task record
//! - `GET  /agents/task/{task_id}/markdown`: fetch the rendered document

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::orchestrator::Pipeline;
use crate::store::{TaskRecord, TaskStore};

/// State shared by all handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<dyn TaskStore>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn TaskStore>) -> Self {
        let pipeline = Arc::new(Pipeline::new(store.clone(), config.agent_settings()));
        Self {
            config,
            store,
            pipeline,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/agents/run", post(run_agents))
        .route("/agents/task/{task_id}", get(get_task))
        .route("/agents/task/{task_id}/markdown", get(get_task_markdown))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A parsed `POST /agents/run` body.
#[derive(Debug, Clone, PartialEq)]
struct RunRequest {
    repo_path: String,
    output_path: String,
    api_key: Option<String>,
    background: bool,
}

impl RunRequest {
    /// Pull fields out of the JSON body. Bodies that aren't JSON objects
    /// count as empty; `None` means `repo_path` is missing.
    fn from_body(body: &[u8], config: &ServerConfig) -> Option<Self> {
        let data: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let text = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let repo_path = text("repo_path").or_else(|| text("repo"))?;
        let output_path = text("output_path")
            .unwrap_or_else(|| config.default_output_path().display().to_string());
        let api_key = text("api_key").or_else(|| config.api_key.clone().filter(|k| !k.is_empty()));
        let background = data.get("background").is_some_and(truthy);

        Some(Self {
            repo_path,
            output_path,
            api_key,
            background,
        })
    }
}

/// Loose truthiness for the `background` flag.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn error_body(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn run_agents(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(request) = RunRequest::from_body(&body, &state.config) else {
        return error_body(
            StatusCode::BAD_REQUEST,
            json!({ "error": "provide 'repo_path' in JSON payload" }),
        );
    };

    let task_id = uuid::Uuid::new_v4().to_string();
    let record = TaskRecord::queued(&request.repo_path, &request.output_path);
    if let Err(e) = state.store.create(&task_id, record) {
        tracing::error!(task_id = %task_id, error = %e, "Failed to create task");
        return error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": e.to_string() }),
        );
    }

    tracing::info!(
        task_id = %task_id,
        repo = %request.repo_path,
        background = request.background,
        credential = request.api_key.is_some(),
        tasks = state.store.len(),
        "Run requested"
    );

    if request.background {
        let pipeline = Arc::clone(&state.pipeline);
        let id = task_id.clone();
        tokio::spawn(async move {
            pipeline
                .run(
                    &id,
                    &request.repo_path,
                    &request.output_path,
                    request.api_key.as_deref(),
                )
                .await;
        });
        return (StatusCode::ACCEPTED, Json(json!({ "task_id": task_id }))).into_response();
    }

    state
        .pipeline
        .run(
            &task_id,
            &request.repo_path,
            &request.output_path,
            request.api_key.as_deref(),
        )
        .await;

    match state.store.get(&task_id) {
        Some(record) => Json(record).into_response(),
        None => Json(json!({ "task_id": task_id })).into_response(),
    }
}

async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Response {
    match state.store.get(&task_id) {
        Some(record) => Json(record).into_response(),
        None => error_body(StatusCode::NOT_FOUND, json!({ "error": "task not found" })),
    }
}

async fn get_task_markdown(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Response {
    let Some(record) = state.store.get(&task_id) else {
        return error_body(StatusCode::NOT_FOUND, json!({ "error": "task not found" }));
    };

    let unavailable = || {
        error_body(
            StatusCode::NOT_FOUND,
            json!({ "error": "markdown not available", "status": record.status }),
        )
    };

    let Some(path) = record.markdown_path.as_deref() else {
        return unavailable();
    };
    match tokio::fs::read(path).await {
        Ok(markdown) => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            markdown,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(task_id = %task_id, path, "Markdown file missing");
            unavailable()
        }
        Err(e) => {
            tracing::error!(task_id = %task_id, path, error = %e, "Markdown file unreadable");
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("failed to read markdown: {e}") }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            default_output: Some("/srv/docs/auto_docs.md".into()),
            ..Default::default()
        }
    }

    #[test]
    fn request_requires_repo_path() {
        assert_eq!(RunRequest::from_body(b"{}", &config()), None);
        assert_eq!(RunRequest::from_body(b"not json", &config()), None);
        assert_eq!(RunRequest::from_body(br#"{"repo_path": ""}"#, &config()), None);
        assert_eq!(RunRequest::from_body(br#"{"repo_path": 7}"#, &config()), None);
    }

    #[test]
    fn request_defaults() {
        let req = RunRequest::from_body(br#"{"repo_path": "/tmp/repo"}"#, &config()).unwrap();
        assert_eq!(
            req,
            RunRequest {
                repo_path: "/tmp/repo".into(),
                output_path: "/srv/docs/auto_docs.md".into(),
                api_key: None,
                background: false,
            }
        );
    }

    #[test]
    fn request_accepts_repo_alias_and_overrides() {
        let mut cfg = config();
        cfg.api_key = Some("sk-env".into());
        let req = RunRequest::from_body(
            br#"{"repo": "/r", "output_path": "/o.md", "background": 1}"#,
            &cfg,
        )
        .unwrap();
        assert_eq!(req.repo_path, "/r");
        assert_eq!(req.output_path, "/o.md");
        assert_eq!(req.api_key.as_deref(), Some("sk-env"));
        assert!(req.background);

        let req = RunRequest::from_body(br#"{"repo_path": "/r", "api_key": "sk-body"}"#, &cfg)
            .unwrap();
        assert_eq!(req.api_key.as_deref(), Some("sk-body"));
    }

    #[test]
    fn truthiness() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("yes")));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&Value::Null));
    }
}
