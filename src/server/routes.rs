//! REST endpoints — entry page, question feed, agent chat, registration.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tower_http::cors::CorsLayer;

use crate::agent::AgentRunner;
use crate::schema::Schema;
use crate::service::OnboardingService;
use crate::session::{SessionIdentity, SessionManager};

/// Cookie carrying the session identity token.
pub const SESSION_COOKIE: &str = "onboard_session";

/// Entry page served at `/`.
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OnboardingService>,
    pub sessions: Arc<SessionManager>,
    pub agent: Arc<AgentRunner>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/retrieve_all_questions",
            get(retrieve_all_questions).post(retrieve_all_questions),
        )
        .route("/api/agent_chat", post(agent_chat))
        .route("/api/register", post(register))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Cookie plumbing ─────────────────────────────────────────────────

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.to_string())
        })
}

fn session_cookie(identity: &SessionIdentity) -> String {
    format!("{SESSION_COOKIE}={identity}; Path=/; HttpOnly; SameSite=Lax")
}

// ── GET / ───────────────────────────────────────────────────────────

/// Entry page. Always mints a fresh session identity (a reload starts a new
/// conversation) and caches the freshly normalized schema for it. Schema
/// load failure degrades to an empty snapshot — the page still renders.
async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // A reload supersedes the previous visit's session.
    if let Some(old) = cookie_token(&headers).and_then(|t| SessionIdentity::parse(&t)) {
        state.agent.forget(&old).await;
        state.sessions.retire(&old).await;
    }

    let schema = match state.service.fetch_schema().await {
        Ok(schema) => schema,
        Err(e) => {
            tracing::warn!("Entry page rendering without a schema: {}", e);
            Schema::new()
        }
    };

    let identity = state.sessions.mint(schema).await;

    (
        [(header::SET_COOKIE, session_cookie(&identity))],
        Html(INDEX_HTML),
    )
        .into_response()
}

// ── GET|POST /retrieve_all_questions ────────────────────────────────

/// Question feed for the form front-end (and anything else that wants it).
async fn retrieve_all_questions(State(state): State<AppState>) -> Response {
    match state.service.fetch_schema().await {
        Ok(schema) => {
            let count = schema.len();
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": format!("Successfully loaded {count} questions"),
                    "questions": schema,
                    "questions_count": count,
                })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Question feed unavailable: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": format!("There's currently an issue loading questions: {e}"),
                })),
            )
                .into_response()
        }
    }
}

// ── POST /api/agent_chat ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

/// One turn of the conversational onboarding.
async fn agent_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Response {
    if body.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "message field required"})),
        )
            .into_response();
    }

    // Reuse the visit's identity; mint lazily if the cookie is gone so a
    // direct API caller still gets an isolated conversation.
    let token = cookie_token(&headers);
    let (identity, minted) = state.sessions.current_or_mint(token.as_deref()).await;

    match state.agent.ask(&identity, &body.message).await {
        Ok(reply) => {
            let payload = Json(json!({"success": true, "response": reply}));
            if minted {
                ([(header::SET_COOKIE, session_cookie(&identity))], payload).into_response()
            } else {
                payload.into_response()
            }
        }
        Err(e) => {
            tracing::error!(session = %identity, "Agent failure: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": e.to_string()})),
            )
                .into_response()
        }
    }
}

// ── POST /api/register ──────────────────────────────────────────────

/// Form-mode registration: validate the flat answer map against the
/// session's schema snapshot (fresh load fallback), then forward it.
async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> Response {
    tracing::debug!(fields = payload.len(), "Registration request received");

    let snapshot = match cookie_token(&headers).and_then(|t| SessionIdentity::parse(&t)) {
        Some(identity) => state.sessions.schema_snapshot(&identity).await,
        None => None,
    };
    let schema = match snapshot.filter(|s| !s.is_empty()) {
        Some(schema) => schema,
        // No session snapshot — fall back to a fresh load; a failed load
        // leaves the schema empty and validation fails open.
        None => state.service.fetch_schema().await.unwrap_or_default(),
    };

    match state.service.register(&payload, &schema).await {
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": e.to_string()})),
        )
            .into_response(),
        Ok(outcome) => {
            let status = StatusCode::from_u16(outcome.status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(outcome)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_token_parses_the_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; onboard_session=3fa85f64-5717-4562-b3fc-2c963f66afa6; other=1"
                .parse()
                .unwrap(),
        );
        assert_eq!(
            cookie_token(&headers).as_deref(),
            Some("3fa85f64-5717-4562-b3fc-2c963f66afa6")
        );
    }

    #[test]
    fn cookie_token_absent_when_not_set() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark".parse().unwrap());
        assert!(cookie_token(&headers).is_none());
        assert!(cookie_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn session_cookie_is_scoped_and_httponly() {
        let identity = SessionIdentity::new();
        let cookie = session_cookie(&identity);
        assert!(cookie.starts_with("onboard_session="));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
    }
}
