//! Transports for the tool registry.
//!
//! * [`run_stdio`] speaks MCP over stdin/stdout. This is how desktop MCP
//!   clients usually launch the server.
//! * [`run_http`] serves a JSON API plus the MCP Streamable HTTP endpoint.
//!
//! # HTTP endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/tools/list` | List all tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool; body is the parameter object |
//! | `*`    | `/mcp` | MCP Streamable HTTP |
//!
//! # Error contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid parameters: ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `upstream_error`
//! (502), `tool_error` (500). Query problems such as an unknown metric are
//! not errors; they come back in a 200 `result` as `{ "message": ... }`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use rmcp::ServiceExt;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::ingest::IngestError;
use crate::mcp::McpBridge;
use crate::tools::{ToolContext, ToolRegistry};

/// Shared state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    ctx: ToolContext,
    tools: Arc<ToolRegistry>,
}

/// Serve MCP over stdin/stdout until the client disconnects.
///
/// Logging must not go to stdout while this runs.
pub async fn run_stdio(ctx: ToolContext, tools: Arc<ToolRegistry>) -> anyhow::Result<()> {
    tracing::info!(tools = tools.len(), "serving MCP over stdio");
    let service = McpBridge::new(ctx, tools)
        .serve(rmcp::transport::stdio())
        .await?;
    service.waiting().await?;
    Ok(())
}

/// Build the HTTP router: JSON tool API plus `/mcp`.
pub fn router(ctx: ToolContext, tools: Arc<ToolRegistry>) -> Router {
    let bridge = McpBridge::new(ctx.clone(), tools.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(AppState { ctx, tools })
}

/// Bind to `[server].bind` and serve until the process is terminated.
pub async fn run_http(ctx: ToolContext, tools: Arc<ToolRegistry>) -> anyhow::Result<()> {
    let bind_addr = ctx.config().server.bind.clone();
    let app = router(ctx, tools);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "HTTP server listening (MCP at /mcp)");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

/// Map a tool failure onto an HTTP status.
///
/// Ingestion errors are typed; anything else that mentions invalid
/// parameters is the caller's fault.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let message = format!("{}: {:#}", tool_name, err);

    let (status, code) = match err.downcast_ref::<IngestError>() {
        Some(IngestError::RemoteApi { .. }) | Some(IngestError::Transport(_)) => {
            (StatusCode::BAD_GATEWAY, "upstream_error")
        }
        Some(IngestError::Decode(_)) => (StatusCode::BAD_GATEWAY, "upstream_error"),
        Some(IngestError::EmptyUsername) | Some(IngestError::MissingApiKey(_)) => {
            (StatusCode::BAD_REQUEST, "bad_request")
        }
        Some(IngestError::Store(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "tool_error"),
        None if err.to_string().contains("invalid parameters") => {
            (StatusCode::BAD_REQUEST, "bad_request")
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "tool_error"),
    };

    AppError {
        status,
        code,
        message,
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    read_only: bool,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            read_only: t.read_only(),
            parameters: t.parameters_schema(),
        })
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// An empty body means no parameters; otherwise it must be a JSON object.
fn parse_body(body: &[u8]) -> Result<serde_json::Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(v) if v.is_object() => Ok(v),
        Ok(_) => Err(bad_request("request body must be a JSON object")),
        Err(e) => Err(bad_request(format!("invalid JSON body: {}", e))),
    }
}

/// Dispatch a tool call. Success is `{ "result": <tool output> }`.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let params = parse_body(&body)?;

    let result = tool
        .execute(params, &state.ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
