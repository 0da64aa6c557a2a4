//! HTTP Endpoints
//!
//! REST API for the coaching dialogue, the knowledge base and sentiment checks.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use sales_coach_agent::format;
use sales_coach_core::UserContext;
use sales_coach_knowledge::PlanContext;

use crate::metrics::{metrics_handler, track_requests};
use crate::state::AppState;
use crate::ServerError;

type ApiResult<T = Json<Value>> = Result<T, ServerError>;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let timeout = Duration::from_secs(config.server.timeout_seconds);
    drop(config); // Release lock before building router

    Router::new()
        // Dialogue
        .route("/api/dialogue/start", post(start_dialogue))
        .route("/api/dialogue/respond", post(respond))
        .route("/api/dialogue/sessions", get(list_sessions))
        .route("/api/dialogue/sessions/:id", delete(delete_session))
        .route("/api/dialogue/sessions/:id/progress", get(session_progress))
        .route("/api/dialogue/sessions/:id/history", get(session_history))
        .route("/api/dialogue/sessions/:id/completeness", get(session_completeness))
        // Knowledge base
        .route("/api/knowledge", post(add_knowledge))
        .route("/api/knowledge/search", get(search_knowledge))
        .route("/api/knowledge/templates/:name", get(knowledge_template))
        .route("/api/knowledge/best-practices/:topic", get(best_practices))
        .route("/api/knowledge/challenges/:challenge", get(challenge_solution))
        .route("/api/knowledge/company-values", get(company_values))
        .route("/api/knowledge/action-plan", post(action_plan))
        .route("/api/knowledge/action-templates", get(action_templates))
        .route(
            "/api/knowledge/action-templates/:category/:name",
            get(action_template),
        )
        .route("/api/one-on-one/analyze", post(analyze_one_on_one))
        .route("/api/sentiment", post(analyze_sentiment))
        // Health check
        .route("/health", get(health_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        // Admin endpoints
        .route("/admin/reload-config", post(reload_config))
        .route_layer(axum::middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, no cross-origin request is allowed
/// - If cors_origins is empty, any origin is allowed
/// - Otherwise, only the configured origins are allowed
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    const METHODS: [Method; 4] = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    if !enabled {
        tracing::info!("CORS disabled, cross-origin requests are rejected");
        return CorsLayer::new();
    }

    if origins.is_empty() {
        tracing::info!("No CORS origins configured, allowing any origin");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(METHODS)
            .allow_headers(Any);
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods(METHODS)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(METHODS)
        .allow_headers(Any)
}

/// Unwrap a JSON body, reporting malformed input as a 400 with an `error` field
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ServerError::InvalidRequest(e.body_text()))
}

fn to_json<T: serde::Serialize>(value: &T) -> ApiResult {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| ServerError::Internal(e.to_string()))
}

/// `?format=slack` switch shared by the rendering endpoints
#[derive(Debug, Default, Deserialize)]
struct FormatQuery {
    format: Option<String>,
}

impl FormatQuery {
    fn slack(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("slack"))
    }
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    #[serde(default)]
    session_id: Option<String>,
    abstract_instruction: String,
    #[serde(default)]
    user_context: Option<UserContext>,
}

/// POST /api/dialogue/start
async fn start_dialogue(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let reply = state
        .engine
        .start_session(
            request.session_id,
            &request.abstract_instruction,
            request.user_context,
        )
        .await?;

    if query.slack() {
        return Ok(Json(json!({ "text": format::reply_text(&reply) })));
    }
    to_json(&reply)
}

#[derive(Debug, Deserialize)]
struct RespondRequest {
    session_id: String,
    user_response: String,
}

/// POST /api/dialogue/respond
async fn respond(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
    payload: Result<Json<RespondRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let reply = state
        .engine
        .process_response(&request.session_id, &request.user_response)
        .await?;

    if query.slack() {
        return Ok(Json(json!({ "text": format::reply_text(&reply) })));
    }
    to_json(&reply)
}

async fn list_sessions(State(state): State<AppState>) -> ApiResult {
    let sessions = state.engine.list_sessions().await?;
    Ok(Json(json!({
        "sessions": sessions,
        "count": sessions.len(),
    })))
}

async fn session_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FormatQuery>,
) -> ApiResult {
    let session = state.engine.session_snapshot(&id).await?;
    let progress = session.progress();

    if query.slack() {
        return Ok(Json(json!({ "text": format::progress_text(&progress) })));
    }
    Ok(Json(json!({
        "session_id": session.id,
        "progress": progress,
        "abstract_instruction": session.abstract_instruction,
        "discovered_patterns": session.discovered_patterns,
    })))
}

async fn session_history(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let session = state.engine.session_snapshot(&id).await?;
    Ok(Json(json!({
        "session_id": session.id,
        "abstract_instruction": session.abstract_instruction,
        "user_context": session.user_context,
        "current_state": session.phase,
        "history": session.history,
        "created_at": session.created_at,
        "summary": session.summary,
    })))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.engine.delete_session(&id).await?;
    Ok(Json(json!({
        "message": "Session deleted",
        "session_id": id,
    })))
}

async fn session_completeness(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    let completeness = state.engine.evaluate_completeness(&id).await?;
    Ok(Json(json!({
        "session_id": id,
        "completeness": completeness,
    })))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
    category: Option<String>,
    format: Option<String>,
}

/// GET /api/knowledge/search
async fn search_knowledge(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ServerError::InvalidRequest("query parameter q is required".to_string()))?;

    let results = state.knowledge.search(q, query.category.as_deref());

    let slack = FormatQuery {
        format: query.format,
    }
    .slack();
    if slack {
        return Ok(Json(json!({ "text": format::knowledge_text(q, &results) })));
    }
    Ok(Json(json!({
        "query": q,
        "count": results.len(),
        "results": results,
    })))
}

async fn knowledge_template(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult {
    let template = state
        .knowledge
        .template(&name)
        .ok_or_else(|| ServerError::NotFound(format!("template {}", name)))?;
    Ok(Json(json!({ "name": name, "template": template })))
}

async fn best_practices(State(state): State<AppState>, Path(topic): Path<String>) -> ApiResult {
    let practices = state.knowledge.best_practices(&topic);
    if practices.is_empty() {
        return Err(ServerError::NotFound(format!("best practices for {}", topic)));
    }
    Ok(Json(json!({ "topic": topic, "practices": practices })))
}

async fn challenge_solution(
    State(state): State<AppState>,
    Path(challenge): Path<String>,
) -> ApiResult {
    let found = state
        .knowledge
        .solution_for_challenge(&challenge)
        .ok_or_else(|| ServerError::NotFound(format!("challenge {}", challenge)))?;
    to_json(&found)
}

async fn company_values(State(state): State<AppState>) -> ApiResult {
    let values = state.knowledge.company_values();
    if values.as_object().map_or(true, |m| m.is_empty()) {
        return Err(ServerError::NotFound("company values".to_string()));
    }
    Ok(Json(values))
}

#[derive(Debug, Deserialize)]
struct AddKnowledgeRequest {
    category: String,
    key: String,
    content: Value,
}

/// POST /api/knowledge
async fn add_knowledge(
    State(state): State<AppState>,
    payload: Result<Json<AddKnowledgeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let request = body(payload)?;
    let (category, key) = (request.category.trim(), request.key.trim());
    if category.is_empty() || key.is_empty() {
        return Err(ServerError::InvalidRequest(
            "category and key must not be empty".to_string(),
        ));
    }

    if !state.knowledge.add_knowledge(category, key, request.content) {
        return Err(ServerError::InvalidRequest(format!(
            "category {} does not hold keyed entries",
            category
        )));
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "added",
            "category": category,
            "key": key,
        })),
    ))
}

fn default_timeline() -> String {
    "1 month".to_string()
}

#[derive(Debug, Deserialize)]
struct ActionPlanRequest {
    challenge: String,
    #[serde(default)]
    context: PlanContext,
    #[serde(default = "default_timeline")]
    timeline: String,
}

/// POST /api/knowledge/action-plan
async fn action_plan(
    State(state): State<AppState>,
    payload: Result<Json<ActionPlanRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let challenge = request.challenge.trim();
    if challenge.is_empty() {
        return Err(ServerError::InvalidRequest(
            "challenge must not be empty".to_string(),
        ));
    }

    let plan = state
        .action_plans
        .generate(challenge, &request.context, &request.timeline);
    to_json(&plan)
}

async fn action_templates(State(state): State<AppState>) -> ApiResult {
    Ok(Json(json!({ "categories": state.action_plans.list_templates() })))
}

async fn action_template(
    State(state): State<AppState>,
    Path((category, name)): Path<(String, String)>,
) -> ApiResult {
    let template = state
        .action_plans
        .template(&category, &name)
        .ok_or_else(|| ServerError::NotFound(format!("action template {}/{}", category, name)))?;
    to_json(template)
}

#[derive(Debug, Deserialize)]
struct OneOnOneRequest {
    content: String,
}

/// POST /api/one-on-one/analyze
async fn analyze_one_on_one(
    State(state): State<AppState>,
    payload: Result<Json<OneOnOneRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    if request.content.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "content must not be empty".to_string(),
        ));
    }
    to_json(&state.one_on_one.analyze(&request.content))
}

#[derive(Debug, Deserialize)]
struct SentimentRequest {
    message: String,
}

async fn analyze_sentiment(
    State(state): State<AppState>,
    payload: Result<Json<SentimentRequest>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let analysis = state.engine.analyze_sentiment(&request.message).await?;
    to_json(&analysis)
}

/// Liveness plus a little context for dashboards
async fn health_check(State(state): State<AppState>) -> ApiResult {
    let active_sessions = state.engine.session_count().await?;
    let gateway_available = state.engine.gateway_available().await;
    Ok(Json(json!({
        // Fallbacks keep the dialogue running, so an unreachable model only degrades
        "status": if gateway_available { "healthy" } else { "degraded" },
        "service": "sales-coach",
        "version": env!("CARGO_PKG_VERSION"),
        "active_sessions": active_sessions,
        "gateway": state.engine.gateway_name(),
        "gateway_available": gateway_available,
    })))
}

/// Config reload endpoint
///
/// POST /admin/reload-config
async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_config() {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "Configuration reloaded successfully"
            })),
        ),
        Err(e) => {
            tracing::error!("Config reload failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": e
                })),
            )
        },
    }
}
