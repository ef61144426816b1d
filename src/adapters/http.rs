//! HTTP state server.
//!
//! Thin axum handlers over the rendezvous cache and the simulation. Every
//! cache read uses a bounded wait so a request never hangs on a value that
//! is still being produced; the client gets an explicit "pending" reply
//! and retries.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::models::{GameTime, ServerConfig};
use crate::services::poem::PoemService;
use crate::services::{keys, SharedCache, Simulation};

/// Configuration for the state HTTP server.
#[derive(Debug, Clone)]
pub struct StateHttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
    /// How long a handler waits for a value still being produced.
    pub wait_budget: Duration,
}

impl Default for StateHttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            wait_budget: Duration::from_secs(2),
        }
    }
}

impl From<&ServerConfig> for StateHttpConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            enable_cors: config.enable_cors,
            wait_budget: Duration::from_millis(config.wait_budget_ms),
        }
    }
}

/// Query parameters for slot lookups.
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Query parameters for the town state.
#[derive(Debug, Deserialize)]
pub struct GameStateQuery {
    #[serde(default)]
    pub time: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: message.into(), code: "missing_parameter".to_string() }),
    )
}

/// Shared state for the HTTP server.
pub struct AppState {
    cache: SharedCache,
    simulation: Mutex<Simulation>,
    poems: Arc<PoemService>,
    wait_budget: Duration,
}

/// State HTTP server.
pub struct StateHttpServer {
    config: StateHttpConfig,
    state: Arc<AppState>,
}

impl StateHttpServer {
    pub fn new(
        config: StateHttpConfig,
        cache: SharedCache,
        simulation: Simulation,
        poems: Arc<PoemService>,
    ) -> Self {
        let state = Arc::new(AppState {
            cache,
            simulation: Mutex::new(simulation),
            poems,
            wait_budget: config.wait_budget,
        });
        Self { config, state }
    }

    /// Build the router. Public so tests can drive it without a socket.
    pub fn into_router(self) -> Router {
        let app = Router::new()
            .route("/", get(home))
            .route("/health", get(health_check))
            .route("/api/status", get(get_status))
            .route("/api/check_poem", get(check_poem))
            .route("/api/poem", get(poem))
            .route("/api/game_state", get(game_state))
            .with_state(self.state);

        if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Start the server.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = self.into_router();

        tracing::info!("state HTTP server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(
        self,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = self.into_router();

        tracing::info!("state HTTP server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

// Handler functions

async fn home() -> &'static str {
    "雲夢城 AI 代理模擬 - 後端 API"
}

async fn health_check() -> &'static str {
    "OK"
}

/// The value published for a slot, or an explicit pending envelope.
fn ready_or_pending(value: Option<Value>) -> Json<Value> {
    match value {
        Some(value) => Json(value),
        None => Json(json!({ "status": "pending" })),
    }
}

async fn get_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SlotQuery>,
) -> Result<Json<Value>, HandlerError> {
    let (Some(time), Some(name)) = (params.time, params.name) else {
        return Err(bad_request("缺少必要的參數 (time 或 name)"));
    };
    let key = keys::quarter_entry(&name, &time);
    let value = state.cache.get(&key, state.wait_budget).await;
    Ok(ready_or_pending(value))
}

async fn check_poem(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SlotQuery>,
) -> Result<Json<Value>, HandlerError> {
    let (Some(time), Some(name)) = (params.time, params.name) else {
        return Err(bad_request("缺少必要的參數 (time 或 name)"));
    };
    let key = keys::trigger(&name, &time);
    let value = state.cache.get(&key, state.wait_budget).await;
    Ok(ready_or_pending(value))
}

async fn poem(State(state): State<Arc<AppState>>) -> Result<Json<Value>, HandlerError> {
    match state.poems.compose().await {
        Ok(poem) => Ok(Json(json!({ "poem": poem.traditional }))),
        Err(err) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse { error: err.to_string(), code: "generation_failed".to_string() }),
        )),
    }
}

async fn game_state(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GameStateQuery>,
) -> Result<Json<Value>, HandlerError> {
    let label = params.time.unwrap_or_else(|| GameTime::day_start().label());

    let mut simulation = state.simulation.lock().await;
    let internal = |err: anyhow::Error| -> HandlerError {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: err.to_string(), code: "simulation_failed".to_string() }),
        )
    };
    simulation.advance_to(&label).await.map_err(internal)?;
    let snapshot = simulation.snapshot(&label).map_err(internal)?;
    Ok(Json(snapshot))
}
