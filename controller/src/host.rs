use std::{
    io::ErrorKind,
    net::SocketAddr,
    path::{Path as FsPath, PathBuf},
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{info, warn};

use oven_common::{
    ApplianceEngine, ApplianceError, KeepWarmOutcome, MediaOutcome, RuntimeConfig, SetOutcome,
};

use crate::cook::{CookRunner, StatusStore};

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<ApplianceEngine>>,
    cook: Arc<Mutex<CookRunner>>,
    store: StatusStore,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct CommandReply {
    message: String,
}

#[derive(Debug, Serialize)]
struct ValueReply {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct CookReply {
    food: &'static str,
    #[serde(rename = "durationSecs")]
    duration_secs: u64,
    #[serde(rename = "keepFoodWarm")]
    keep_food_warm: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct MediaReply {
    playing: bool,
    message: String,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let data_dir = std::env::var("OVEN_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./.oven"));

    let mut runtime = load_runtime_config(&data_dir.join("runtime.json"))
        .await
        .unwrap_or_else(|err| {
            warn!("failed to load runtime config: {err:#}");
            RuntimeConfig::default()
        });
    runtime.settings.sanitize(&runtime.oven);

    let oven = runtime.oven.clone();
    let store = StatusStore::new(data_dir.join("status"));
    let runner = CookRunner::new(
        store.clone(),
        Duration::from_millis(oven.cook_tick_ms),
        Duration::from_millis(oven.supersede_grace_ms),
    );
    let engine = ApplianceEngine::new(runtime.oven, runtime.settings);

    let app_state = AppState {
        engine: Arc::new(Mutex::new(engine)),
        cook: Arc::new(Mutex::new(runner)),
        store,
    };

    spawn_smoke_watch_loop(
        app_state.clone(),
        Duration::from_millis(oven.smoke_poll_interval_ms),
    );

    let app = Router::new()
        .route("/ready", get(handle_ready))
        .route("/api/auth", get(handle_auth))
        .route("/api/status", get(handle_get_status))
        .route("/api/settings/{name}", get(handle_get_setting))
        .route("/api/settings/{name}/{value}", post(handle_set_setting))
        .route("/api/sensors/{name}", get(handle_get_sensor))
        .route("/api/cook/status", get(handle_cook_status))
        .route("/api/cook/{food}", post(handle_start_cook))
        .route("/api/cook/{food}/keepwarm/{value}", post(handle_keep_warm))
        .route("/api/media/song", post(handle_play_song))
        .route("/api/media/{command}", post(handle_media_command))
        .with_state(app_state);

    let port = std::env::var("OVEN_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(9080);
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse().unwrap();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind oven controller at {addr}"))?;

    info!("oven controller listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn load_runtime_config(path: &FsPath) -> anyhow::Result<RuntimeConfig> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(serde_json::from_slice::<RuntimeConfig>(&raw)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
        Err(err) => Err(err.into()),
    }
}

fn spawn_smoke_watch_loop(app_state: AppState, poll: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll);
        loop {
            interval.tick().await;

            let alarming = {
                let mut engine = app_state.engine.lock().await;
                engine.smoke_alarm()
            };

            if alarming {
                warn!("smoke detected, raising fire alarm");
                if let Err(err) = app_state.store.write_fire_alarm().await {
                    warn!("fire alarm write failed: {err:#}");
                }
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("ctrl-c handler failed: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("sigterm handler failed: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}

async fn handle_ready() -> &'static str {
    "1"
}

async fn handle_auth(headers: HeaderMap) -> impl IntoResponse {
    if let Some(cookies) = headers.get(header::COOKIE).and_then(|value| value.to_str().ok()) {
        info!("auth request cookies: {cookies}");
    }
    ([(header::SET_COOKIE, "lang=en-US")], "language negotiated")
}

async fn handle_get_status(State(state): State<AppState>) -> Response {
    let status = {
        let engine = state.engine.lock().await;
        engine.status(monotonic_ms())
    };
    Json(status).into_response()
}

async fn handle_set_setting(
    State(state): State<AppState>,
    Path((name, value)): Path<(String, String)>,
) -> Response {
    let outcome = {
        let mut engine = state.engine.lock().await;
        engine.set_setting(&name, &value, monotonic_ms())
    };

    match outcome {
        Ok(SetOutcome::Applied) => reply(format!("{name} was set to {value}")),
        Ok(SetOutcome::SilentModeEnabled) => reply(
            "Silent mode is activated. Ambient light is turned off and ventilation is capped at 2.",
        ),
        Ok(SetOutcome::SilentModeDisabled) => reply(
            "Silent mode is deactivated. Ambient light is turned on and ventilation is unchanged.",
        ),
        Err(err) => appliance_error(&err),
    }
}

async fn handle_get_setting(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    let value = {
        let engine = state.engine.lock().await;
        engine.setting_value(&name)
    };

    match value {
        Ok(value) => Json(ValueReply { name, value }).into_response(),
        Err(err) => appliance_error(&err),
    }
}

async fn handle_get_sensor(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    let value = {
        let mut engine = state.engine.lock().await;
        engine.sensor_value(&name, monotonic_ms())
    };

    match value {
        Ok(value) => Json(ValueReply { name, value }).into_response(),
        Err(err) => appliance_error(&err),
    }
}

async fn handle_start_cook(
    State(state): State<AppState>,
    Path(food): Path<String>,
) -> Response {
    let plan = {
        let mut engine = state.engine.lock().await;
        engine.start_cook(&food, monotonic_ms())
    };
    let plan = match plan {
        Ok(plan) => plan,
        Err(err) => return appliance_error(&err),
    };

    if let Err(err) = state.cook.lock().await.arm(plan.clone()).await {
        warn!("failed to arm cook countdown: {err:#}");
        return countdown_unavailable();
    }

    Json(CookReply {
        food: plan.food.as_str(),
        duration_secs: plan.duration_secs,
        keep_food_warm: false,
        message: format!(
            "{} is cooking for {} seconds",
            plan.food.as_str(),
            plan.duration_secs
        ),
    })
    .into_response()
}

async fn handle_keep_warm(
    State(state): State<AppState>,
    Path((food, value)): Path<(String, String)>,
) -> Response {
    let outcome = {
        let mut engine = state.engine.lock().await;
        engine.set_keep_warm(&food, &value, monotonic_ms())
    };

    match outcome {
        Ok(KeepWarmOutcome::Started {
            plan,
            keep_food_warm,
        }) => {
            if let Err(err) = state.cook.lock().await.arm(plan.clone()).await {
                warn!("failed to arm cook countdown: {err:#}");
                return countdown_unavailable();
            }
            Json(CookReply {
                food: plan.food.as_str(),
                duration_secs: plan.duration_secs,
                keep_food_warm,
                message: format!(
                    "{} is cooking for {} seconds, keep warm is {}",
                    plan.food.as_str(),
                    plan.duration_secs,
                    keep_food_warm
                ),
            })
            .into_response()
        }
        Ok(KeepWarmOutcome::Toggled(on)) => reply(format!("keep warm for {food} was set to {on}")),
        Err(err) => appliance_error(&err),
    }
}

async fn handle_cook_status(State(state): State<AppState>) -> Response {
    let payload = {
        let engine = state.engine.lock().await;
        engine.cook_status()
    };
    Json(payload).into_response()
}

async fn handle_media_command(
    State(state): State<AppState>,
    Path(command): Path<String>,
) -> Response {
    let outcome = {
        let mut engine = state.engine.lock().await;
        engine.media_command(&command)
    };
    media_response(outcome)
}

async fn handle_play_song(State(state): State<AppState>, payload: String) -> Response {
    let outcome = {
        let mut engine = state.engine.lock().await;
        engine.play_song(&payload)
    };
    media_response(outcome)
}

fn media_response(outcome: Result<MediaOutcome, ApplianceError>) -> Response {
    match outcome {
        Ok(MediaOutcome::Playing) => Json(MediaReply {
            playing: true,
            message: "media playback started".to_string(),
        })
        .into_response(),
        Ok(MediaOutcome::Stopped) => Json(MediaReply {
            playing: false,
            message: "media playback stopped".to_string(),
        })
        .into_response(),
        Err(err) => appliance_error(&err),
    }
}

fn reply(message: impl Into<String>) -> Response {
    Json(CommandReply {
        message: message.into(),
    })
    .into_response()
}

fn countdown_unavailable() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "failed to start cook countdown".to_string(),
        }),
    )
        .into_response()
}

fn appliance_error(err: &ApplianceError) -> Response {
    (
        error_status(err),
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn error_status(err: &ApplianceError) -> StatusCode {
    match err {
        ApplianceError::UnknownSetting(_)
        | ApplianceError::UnknownSensor(_)
        | ApplianceError::UnknownFood(_)
        | ApplianceError::UnknownMediaCommand(_) => StatusCode::NOT_FOUND,
        ApplianceError::InvalidValue { .. } | ApplianceError::InvalidSongPayload => {
            StatusCode::BAD_REQUEST
        }
        ApplianceError::SilentModeActive | ApplianceError::NoFoodDetected => StatusCode::CONFLICT,
        ApplianceError::SensorReadOnly(_) => StatusCode::METHOD_NOT_ALLOWED,
    }
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
