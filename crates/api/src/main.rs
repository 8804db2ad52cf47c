use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moatwatch_core::domain::EnrichedCompany;
use moatwatch_core::earnings::FinnhubClient;
use moatwatch_core::market::YahooChartClient;
use moatwatch_core::pipeline::Aggregator;
use moatwatch_core::sheet::SheetLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = moatwatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let aggregator = Arc::new(Aggregator::new(
        Arc::new(SheetLoader::from_settings(&settings)?),
        Arc::new(YahooChartClient::from_settings(&settings)?),
        Arc::new(FinnhubClient::from_settings(&settings)?),
        &settings,
    ));

    let state = AppState { aggregator };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/stocks", get(get_stocks))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    aggregator: Arc<Aggregator>,
}

async fn get_stocks(
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrichedCompany>>, (StatusCode, Json<serde_json::Value>)> {
    let companies = state.aggregator.latest().await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "aggregation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Error fetching stock data"})),
        )
    })?;

    Ok(Json((*companies).clone()))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(
    settings: &moatwatch_core::config::Settings,
) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
