//! HTTP + WebSocket API for the rotary lock
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /api/status - Lock state and auth counters
//! - GET /api/logs - Authentication log
//! - POST /api/angle - Feed one angle reading
//! - GET|POST /api/settings - Read or replace the password
//! - POST /api/reset - Abort the current attempt
//! - WS /ws - Live events out, angle readings in

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex as StdMutex,
};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::config::LockConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::core::evaluator::RotaryLockEvaluator;
use crate::core::sensor::parse_angle_line;
use crate::core::sink::{AuthLog, AuthLogEntry, BroadcastSink, LiveEvent, StatusUpdate};
use crate::error::Result;
use crate::types::{Color, PasswordSequence, StateOutput};

/// Sensor counts as disconnected after this long without an angle
pub const SENSOR_TIMEOUT_MS: u64 = 5000;

const NO_ANGLE_YET: u64 = u64::MAX;

/// App state
pub struct AppState<C: Clock = SystemClock> {
    pub engine: Mutex<RotaryLockEvaluator<C>>,
    pub log: Arc<StdMutex<AuthLog>>,
    pub events: broadcast::Sender<LiveEvent>,
    clock: C,
    last_angle_ms: AtomicU64,
}

impl AppState<SystemClock> {
    /// Build the evaluator and its log. Fails on invalid configuration.
    pub fn new(config: &LockConfig) -> Result<Arc<Self>> {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock + Clone> AppState<C> {
    /// Same as [`AppState::new`] but driven by `clock`
    pub fn with_clock(config: &LockConfig, clock: C) -> Result<Arc<Self>> {
        config.validate()?;
        let (events, _) = broadcast::channel(100);
        let log = Arc::new(StdMutex::new(AuthLog::new(config.server.location.clone())));
        let sink = BroadcastSink::new(log.clone(), events.clone());
        let engine = RotaryLockEvaluator::from_config(config, clock.clone(), Box::new(sink))?;

        Ok(Arc::new(Self {
            engine: Mutex::new(engine),
            log,
            events,
            clock,
            last_angle_ms: AtomicU64::new(NO_ANGLE_YET),
        }))
    }
}

impl<C: Clock> AppState<C> {
    /// Feed an angle to the evaluator and note sensor activity
    pub async fn feed_angle(&self, angle: f64) -> StateOutput {
        self.last_angle_ms.store(self.clock.now_ms(), Ordering::Relaxed);
        let mut engine = self.engine.lock().await;
        engine.on_angle_update(angle);
        engine.current_output()
    }

    pub fn sensor_connected(&self) -> bool {
        match self.last_angle_ms.load(Ordering::Relaxed) {
            NO_ANGLE_YET => false,
            at => self.clock.now_ms().saturating_sub(at) <= SENSOR_TIMEOUT_MS,
        }
    }

    /// Fire due timers; returns the phase afterwards
    pub async fn tick(&self) -> String {
        let mut engine = self.engine.lock().await;
        engine.tick();
        engine.state().to_string()
    }

    pub async fn status(&self) -> StatusUpdate {
        let state = self.engine.lock().await.state().to_string();
        let (auth_success_count, auth_failure_count) = self
            .log
            .lock()
            .map(|log| (log.success_count(), log.failure_count()))
            .unwrap_or((0, 0));

        StatusUpdate {
            state,
            sensor_connected: self.sensor_connected(),
            auth_success_count,
            auth_failure_count,
        }
    }
}

/// Angle reading request
#[derive(Debug, Deserialize)]
pub struct AngleRequest {
    pub angle: f64,
}

/// Password update request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub color_sequence: Vec<Color>,
}

/// Settings response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub color_sequence: Vec<Color>,
    pub dwell_duration_ms: u64,
    pub sequence_length: usize,
    /// A new password is waiting for the current attempt to end
    pub pending: bool,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create the API router
pub fn create_router<C: Clock + 'static>(state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(get_status::<C>))
        .route("/api/logs", get(get_logs::<C>))
        .route("/api/angle", post(post_angle::<C>))
        .route("/api/settings", get(get_settings::<C>).post(post_settings::<C>))
        .route("/api/reset", post(post_reset::<C>))
        .route("/ws", get(websocket_handler::<C>))
        .with_state(state)
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

async fn get_status<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<StatusUpdate> {
    Json(state.status().await)
}

async fn get_logs<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<Vec<AuthLogEntry>> {
    let entries = state
        .log
        .lock()
        .map(|log| log.entries().to_vec())
        .unwrap_or_default();
    Json(entries)
}

/// Feed one angle; returns the UI hint
async fn post_angle<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Json(req): Json<AngleRequest>,
) -> Json<StateOutput> {
    Json(state.feed_angle(req.angle).await)
}

async fn get_settings<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<SettingsResponse> {
    let engine = state.engine.lock().await;
    Json(settings_response(&engine))
}

/// Replace the password
async fn post_settings<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Json(req): Json<SettingsRequest>,
) -> std::result::Result<Json<SettingsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut engine = state.engine.lock().await;
    let bad_request = |e: crate::LockError| {
        warn!(error = %e, "rejected settings update");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: e.to_string() }),
        )
    };

    let password = PasswordSequence::new(req.color_sequence, engine.sequence_length())
        .map_err(bad_request)?;
    engine.configure_password(password).map_err(bad_request)?;
    Ok(Json(settings_response(&engine)))
}

fn settings_response<C: Clock>(engine: &RotaryLockEvaluator<C>) -> SettingsResponse {
    SettingsResponse {
        color_sequence: engine.password().colors().to_vec(),
        dwell_duration_ms: engine.dwell_duration_ms(),
        sequence_length: engine.sequence_length(),
        pending: engine.staged_password().is_some(),
    }
}

async fn post_reset<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<StateOutput> {
    let mut engine = state.engine.lock().await;
    engine.reset();
    info!("attempt reset via API");
    Json(engine.current_output())
}

/// WebSocket handler for live updates
async fn websocket_handler<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Push live events out; feed incoming `{angle}` frames to the evaluator
async fn handle_websocket<C: Clock + 'static>(socket: WebSocket, state: Arc<AppState<C>>) {
    info!("client connected to WebSocket");
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.events.subscribe();

    let hello = LiveEvent::StatusUpdate(state.status().await);
    if let Ok(json) = serde_json::to_string(&hello) {
        if sender.send(Message::Text(json)).await.is_err() {
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "WebSocket client lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match parse_angle_line(&text) {
                    Some(angle) => {
                        recv_state.feed_angle(angle).await;
                    }
                    None => debug!(%text, "ignoring WebSocket frame"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    info!("client disconnected from WebSocket");
}

/// Periodically fire due timers and publish state changes
pub fn spawn_ticker<C: Clock + 'static>(
    state: Arc<AppState<C>>,
    interval_ms: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        let mut last_phase = String::new();
        loop {
            interval.tick().await;
            let phase = state.tick().await;
            if phase != last_phase {
                last_phase = phase;
                let update = LiveEvent::StatusUpdate(state.status().await);
                let _ = state.events.send(update);
            }
        }
    })
}

/// Run the API server
pub async fn run_server(config: &LockConfig) -> Result<()> {
    let state = AppState::new(config)?;
    let ticker = spawn_ticker(state.clone(), config.server.tick_interval_ms);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    info!(addr = %config.server.addr, "rotary lock API running");
    info!("  GET  /health        - Health check");
    info!("  GET  /api/status    - Lock state and counters");
    info!("  GET  /api/logs      - Authentication log");
    info!("  POST /api/angle     - Feed angle");
    info!("  GET  /api/settings  - Read password settings");
    info!("  POST /api/settings  - Replace password");
    info!("  POST /api/reset     - Reset attempt");
    info!("  WS   /ws            - Live events");

    let served = axum::serve(listener, router).await;
    ticker.abort();
    served?;
    Ok(())
}
