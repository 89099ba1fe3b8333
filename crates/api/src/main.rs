use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkforge_core::abi::to_hex;
use linkforge_core::domain::profile::{Address, RiskLevel, UserRiskProfile};
use linkforge_core::domain::report::RecommendationReport;
use linkforge_core::engine::{CycleOutcome, Engine};
use linkforge_core::error::CycleError;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = linkforge_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let engine = match Engine::from_settings(&settings) {
        Ok(engine) => engine,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "engine configuration failed");
            return Err(e);
        }
    };
    let default_user = settings.user_address()?;

    let state = AppState {
        engine: Arc::new(engine),
        default_user,
    };

    let app = router(state).layer(cors_layer()?);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/health", get(health))
        .route("/api/recommendation", get(get_recommendation))
        .route("/api/recommendation/encoded", get(get_encoded_recommendation))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> anyhow::Result<CorsLayer> {
    let origin = std::env::var("CORS_ORIGIN").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());
    let origin = HeaderValue::from_str(&origin)?;
    Ok(CorsLayer::new().allow_origin(origin).allow_headers(Any))
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        timestamp: Utc::now(),
    })
}

#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    default_user: Address,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationQuery {
    user: Option<String>,
    risk_level: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<&'static str>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn bad_request(err: anyhow::Error) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: format!("{err:#}"),
            stage: None,
        }),
    )
}

fn cycle_failed(err: anyhow::Error) -> (StatusCode, Json<ApiError>) {
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "recommendation cycle failed");
    let stage = err.downcast_ref::<CycleError>().map(|e| e.stage);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: "Failed to compute recommendation".to_string(),
            stage,
        }),
    )
}

async fn run_query(
    state: &AppState,
    query: RecommendationQuery,
) -> Result<CycleOutcome, (StatusCode, Json<ApiError>)> {
    let user = match query.user.as_deref() {
        Some(s) => s
            .parse::<Address>()
            .map_err(|e| bad_request(anyhow::Error::new(e).context("invalid user address")))?,
        None => state.default_user,
    };

    match query.risk_level.as_deref() {
        Some(level) => {
            let level = level.parse::<RiskLevel>().map_err(bad_request)?;
            let profile = UserRiskProfile::with_risk_level(level);
            Ok(state.engine.run_cycle_with_profile(&user, profile).await)
        }
        None => state.engine.run_cycle(&user).await.map_err(cycle_failed),
    }
}

async fn get_recommendation(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> ApiResult<RecommendationReport> {
    let outcome = run_query(&state, query).await?;
    Ok(Json(outcome.report()))
}

#[derive(Debug, Serialize)]
struct EncodedRecommendation {
    encoded: String,
}

async fn get_encoded_recommendation(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> ApiResult<EncodedRecommendation> {
    let outcome = run_query(&state, query).await?;
    Ok(Json(EncodedRecommendation {
        encoded: to_hex(&outcome.encoded),
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &linkforge_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
