//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for discovery, chat and session inspection.
//! The discovery pipeline is built on first use and shared by all requests.

use crate::cli::Output;
use crate::config::Settings;
use crate::discovery::{CuratedTool, DiscoveryOutcome, DiscoveryPipeline};
use crate::session::SessionStore;
use crate::ScoutError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    settings: Settings,
    sessions: SessionStore,
    pipeline: OnceCell<Arc<DiscoveryPipeline>>,
}

impl AppState {
    /// State whose pipeline is built from `settings` on first request.
    pub fn new(settings: Settings) -> Self {
        Self {
            sessions: session_store(&settings),
            settings,
            pipeline: OnceCell::new(),
        }
    }

    /// State with an already constructed pipeline.
    pub fn with_pipeline(settings: Settings, pipeline: DiscoveryPipeline) -> Self {
        Self {
            sessions: session_store(&settings),
            settings,
            pipeline: OnceCell::new_with(Some(Arc::new(pipeline))),
        }
    }

    /// Get the shared pipeline, initializing it exactly once.
    pub async fn pipeline(&self) -> crate::Result<Arc<DiscoveryPipeline>> {
        self.pipeline
            .get_or_try_init(|| async {
                info!("Initializing discovery pipeline");
                DiscoveryPipeline::from_settings(&self.settings).map(Arc::new)
            })
            .await
            .cloned()
    }
}

fn session_store(settings: &Settings) -> SessionStore {
    SessionStore::with_limits(
        settings.server.max_sessions,
        Duration::from_secs(settings.server.session_idle_secs),
    )
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/discover", post(discover))
        .route("/chat", post(chat))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/tools", get(list_tools))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let app = router(Arc::new(AppState::new(settings)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("ToolScout API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Discover", "POST   /discover");
    Output::kv("Chat", "POST   /chat");
    Output::kv("Session", "GET    /sessions/:id");
    Output::kv("Tools", "GET    /sessions/:id/tools");
    Output::kv("End session", "DELETE /sessions/:id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct DiscoverRequest {
    query: String,
    #[serde(default)]
    language: Option<String>,
    /// Continue an existing session; a new one is created when absent.
    #[serde(default)]
    session_id: Option<Uuid>,
}

#[derive(Serialize)]
struct DiscoverResponse {
    session_id: Uuid,
    /// "completed", or "superseded" when a newer search finished first.
    status: &'static str,
    applied: bool,
    generation: u64,
    keywords: Vec<String>,
    tools: Vec<CuratedTool>,
    candidate_count: usize,
}

#[derive(Deserialize)]
struct ChatRequest {
    session_id: Uuid,
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
    turns: usize,
}

#[derive(Deserialize)]
struct ToolsQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_per_page")]
    per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    10
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ScoutError {
    fn into_response(self) -> Response {
        let status = match &self {
            ScoutError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ScoutError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}

fn session_not_found(id: Uuid) -> Response {
    ScoutError::SessionNotFound(id.to_string()).into_response()
}

fn pipeline_unavailable(e: ScoutError) -> Response {
    warn!("Discovery pipeline unavailable: {}", e);
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        format!("Discovery pipeline unavailable: {}", e),
    )
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn discover(State(state): State<Arc<AppState>>, Json(req): Json<DiscoverRequest>) -> Response {
    if req.query.trim().is_empty() {
        return ScoutError::InvalidInput("query must not be empty".to_string()).into_response();
    }

    let pipeline = match state.pipeline().await {
        Ok(pipeline) => pipeline,
        Err(e) => return pipeline_unavailable(e),
    };

    let Some(session) = state.sessions.get_or_create(req.session_id).await else {
        return session_not_found(req.session_id.unwrap_or_default());
    };

    let ticket = session.begin_search();
    let outcome = pipeline.run(&req.query, req.language.as_deref()).await;
    let applied = session.apply(ticket, &req.query, &outcome).await;

    let (keywords, candidate_count, tools) = match outcome {
        DiscoveryOutcome::Completed {
            keywords,
            candidates,
            tools,
        } => (keywords, candidates.len(), tools),
        DiscoveryOutcome::Idle => (Vec::new(), 0, Vec::new()),
    };

    Json(DiscoverResponse {
        session_id: session.id(),
        status: if applied { "completed" } else { "superseded" },
        applied,
        generation: ticket.generation(),
        keywords,
        tools,
        candidate_count,
    })
    .into_response()
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    if req.message.trim().is_empty() {
        return ScoutError::InvalidInput("message must not be empty".to_string()).into_response();
    }

    let Some(session) = state.sessions.get(&req.session_id).await else {
        return session_not_found(req.session_id);
    };

    let pipeline = match state.pipeline().await {
        Ok(pipeline) => pipeline,
        Err(e) => return pipeline_unavailable(e),
    };

    let reply = session.chat(pipeline.conversation(), req.message.trim()).await;
    let turns = session.transcript().await.len();

    Json(ChatResponse { reply, turns }).into_response()
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.get(&id).await {
        Some(session) => Json(session.snapshot().await).into_response(),
        None => session_not_found(id),
    }
}

async fn list_tools(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ToolsQuery>,
) -> Response {
    match state.sessions.get(&id).await {
        Some(session) => Json(
            session
                .list_tools(query.q.as_deref(), query.page, query.per_page)
                .await,
        )
        .into_response(),
        None => session_not_found(id),
    }
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    if state.sessions.remove(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::llm::fakes::ScriptedModel;
    use crate::video::fakes::{video, FakePlatform};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SELECTION: &str = r#"{"tools": [{"title": "Remove.bg", "videoLink": "https://youtu.be/removebg001", "summary": "Removes image backgrounds", "toolLink": "https://www.remove.bg/"}]}"#;

    fn state(model: ScriptedModel) -> Arc<AppState> {
        let mut settings = Settings::default();
        settings.discovery.batch_delay_ms = 0;
        let platform = FakePlatform::new().with_results(
            "background remover ai tool",
            vec![video("removebg001", "Remove.bg AI demo", "", 12_000)],
        );
        let pipeline = DiscoveryPipeline::with_components(
            &settings,
            Prompts::default(),
            Arc::new(model),
            Arc::new(platform),
        );
        Arc::new(AppState::with_pipeline(settings, pipeline))
    }

    async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = state(ScriptedModel::new());
        let (status, body) = send(&state, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_without_session() {
        let state = state(ScriptedModel::new());
        let (status, body) = send(&state, post("/discover", json!({"query": "  "}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("query"));
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_discover_then_chat() {
        let model = ScriptedModel::new()
            .with_completion("background remover")
            .with_function(Some(SELECTION))
            .with_reply("Remove.bg does that in one click.");
        let state = state(model);

        let (status, body) = send(&state, post("/discover", json!({"query": "remove photo backgrounds"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["applied"], true);
        assert_eq!(body["candidate_count"], 1);
        assert_eq!(body["tools"][0]["toolLink"], "https://www.remove.bg/");
        assert_eq!(
            body["tools"][0]["videoLink"],
            "https://www.youtube.com/watch?v=removebg001"
        );
        let session_id = body["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &state,
            post("/chat", json!({"session_id": session_id, "message": "Which one removes backgrounds?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Remove.bg does that in one click.");
        assert_eq!(body["turns"], 2);

        let (status, body) = send(&state, get(&format!("/sessions/{}", session_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "remove photo backgrounds");
        assert_eq!(body["transcript"][1]["role"], "bot");

        let (status, body) = send(&state, get(&format!("/sessions/{}/tools?q=REMOVE&per_page=5", session_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["per_page"], 5);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let state = state(ScriptedModel::new());
        let id = Uuid::new_v4();

        let (status, body) = send(&state, post("/chat", json!({"session_id": id, "message": "hi"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], format!("Session not found: {}", id));

        let (status, _) = send(&state, post("/discover", json!({"query": "video editing", "session_id": id}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, get(&format!("/sessions/{}/tools", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_chat_message_is_rejected() {
        let state = state(ScriptedModel::new());
        let session = state.sessions.create().await;

        let (status, _) = send(&state, post("/chat", json!({"session_id": session.id(), "message": ""}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(session.transcript().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let state = state(ScriptedModel::new());
        let session = state.sessions.create().await;
        let uri = format!("/sessions/{}", session.id());

        let request = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&state, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_chat_message_reports_invalid_input() {
        let state = state(ScriptedModel::new());
        let session = state.sessions.create().await;

        let (status, body) = send(&state, post("/chat", json!({"session_id": session.id(), "message": " "}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid input: message must not be empty");
    }

    #[tokio::test]
    async fn test_unavailable_pipeline_leaves_no_session() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keywords.toml"), "system = [not toml").unwrap();
        let mut settings = Settings::default();
        settings.prompts.custom_dir = Some(dir.path().to_string_lossy().to_string());
        let state = Arc::new(AppState::new(settings));

        let (status, body) = send(&state, post("/discover", json!({"query": "video editing"}))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().starts_with("Discovery pipeline unavailable"));
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_huge_page_returns_empty_listing() {
        let state = state(ScriptedModel::new());
        let session = state.sessions.create().await;
        let uri = format!("/sessions/{}/tools?page={}&per_page=2", session.id(), usize::MAX);

        let (status, body) = send(&state, get(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools"], json!([]));
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_sessions_respect_configured_capacity() {
        let mut settings = Settings::default();
        settings.server.max_sessions = 2;
        let state = AppState::new(settings);

        for _ in 0..5 {
            state.sessions.create().await;
        }

        assert_eq!(state.sessions.len().await, 2);
    }

    #[tokio::test]
    async fn test_pipeline_is_shared() {
        let state = state(ScriptedModel::new());
        let first = state.pipeline().await.unwrap();
        let second = state.pipeline().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
