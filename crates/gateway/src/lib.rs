//! HTTP API for the RailSage agent.
//!
//! - `GET /`: liveness message
//! - `GET /health`: status and version
//! - `POST /chat`: `{"message": ...}` → `{"response": ...}`
//!
//! Built on Axum. Each `/chat` request runs its own agent session; a client
//! disconnect drops the in-flight session future.

pub mod runtime;

pub use runtime::AgentRuntime;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use railsage_agent::ReactAgent;
use railsage_core::error::AgentError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Request body limit for `/chat`.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state. The agent is immutable, so no lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<ReactAgent>,
}

/// Build the Axum router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the HTTP server.
pub async fn start(config: railsage_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let agent = AgentRuntime::init(&config).await?;
    let app = build_router(AppState { agent });

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Railway AI API is running!",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Error body: `{"error": <kind>, "detail": <text>}`.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

/// Failures returned from `/chat`.
pub enum ChatError {
    EmptyMessage,
    Agent(AgentError),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::EmptyMessage => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "empty_message".into(),
                    detail: "message must not be empty".into(),
                },
            ),
            Self::Agent(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: e.kind.as_str().into(),
                    detail: e.detail,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ChatError::EmptyMessage);
    }

    info!(message_len = message.len(), "Chat message received");

    match state.agent.run(message).await {
        Ok(outcome) => {
            info!(
                session_id = %outcome.session_id,
                steps = outcome.step_count,
                "Chat answered"
            );
            Ok(Json(ChatResponse {
                response: outcome.final_answer,
            }))
        }
        Err(e) => {
            error!(error = %e, "Agent session failed");
            Err(ChatError::Agent(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use railsage_core::error::{ProviderError, ToolError};
    use railsage_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use railsage_core::tool::{Tool, ToolRegistry};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct ScriptedProvider(Mutex<Vec<Result<String, ProviderError>>>);

    impl ScriptedProvider {
        fn new(replies: Vec<Result<&str, ProviderError>>) -> Arc<Self> {
            let mut replies: Vec<_> = replies.into_iter().map(|r| r.map(String::from)).collect();
            replies.reverse();
            Arc::new(Self(Mutex::new(replies)))
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let next = self.0.lock().unwrap().pop().expect("script exhausted");
            next.map(|content| ProviderResponse {
                content,
                usage: None,
                model: request.model,
            })
        }
    }

    struct Rules;

    #[async_trait]
    impl Tool for Rules {
        fn name(&self) -> &str {
            "Railway Rules"
        }
        fn description(&self) -> &str {
            "Use this to look up rules about refunds, luggage, and tatkal."
        }
        async fn execute(&self, _input: &str) -> Result<String, ToolError> {
            Ok("Tatkal tickets are not refundable.".into())
        }
    }

    fn app(replies: Vec<Result<&str, ProviderError>>) -> Router {
        let tools = ToolRegistry::from_tools(vec![Box::new(Rules)]).unwrap();
        let agent = ReactAgent::new(ScriptedProvider::new(replies), "mock-model", Arc::new(tools));
        build_router(AppState {
            agent: Arc::new(agent),
        })
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_endpoint() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app(vec![]).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"message": "Railway AI API is running!"})
        );
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(vec![]).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn chat_returns_final_answer() {
        let app = app(vec![
            Ok("Action: Railway Rules\nAction Input: tatkal refund"),
            Ok("Final Answer: Tatkal tickets are not refundable."),
        ]);
        let response = app
            .oneshot(chat(r#"{"message": "What is the refund policy for tatkal tickets?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"response": "Tatkal tickets are not refundable."})
        );
    }

    #[tokio::test]
    async fn chat_empty_message_rejected() {
        let response = app(vec![]).oneshot(chat(r#"{"message": "   "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "empty_message");
    }

    #[tokio::test]
    async fn chat_agent_failure_is_structured_500() {
        let app = app(vec![Err(ProviderError::Network("connection refused".into()))]);
        let response = app.oneshot(chat(r#"{"message": "12951"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "provider_error");
        assert!(body["detail"].as_str().unwrap().contains("connection refused"));
        assert!(body.get("response").is_none());
    }

    #[tokio::test]
    async fn chat_oversized_body_rejected() {
        let big = format!(r#"{{"message": "{}"}}"#, "a".repeat(MAX_BODY_BYTES + 1));
        let response = app(vec![]).oneshot(chat(&big)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn chat_malformed_json_rejected() {
        let response = app(vec![]).oneshot(chat("not json")).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
