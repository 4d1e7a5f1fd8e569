use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tickerlens_core::domain::report::AnalysisReport;
use tickerlens_core::provider::{MarketDataProvider, YahooProvider};
use tickerlens_core::report::ReportOptions;
use tickerlens_core::AnalysisError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tickerlens_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let provider = YahooProvider::from_settings(&settings)?;
    tracing::info!(
        provider = provider.provider_name(),
        base_url = %settings.data_provider_base_url,
        "market data provider configured"
    );

    let state = AppState {
        provider: Arc::new(provider),
        options: Arc::new(settings.report_options()),
    };

    let app = router(state);

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

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/analysis/:symbol", get(get_analysis))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn MarketDataProvider>,
    options: Arc<ReportOptions>,
}

struct ApiError(AnalysisError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AnalysisError::EmptySymbol => StatusCode::BAD_REQUEST,
            AnalysisError::DegenerateInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalysisError::ProviderUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AnalysisError::MissingField(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.0.user_message() });
        (status, Json(body)).into_response()
    }
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let now = chrono::Utc::now();
    match tickerlens_core::report::analyze(state.provider.as_ref(), &symbol, now, &state.options)
        .await
    {
        Ok(report) => Ok(Json(report)),
        Err(err) => {
            match &err {
                AnalysisError::ProviderUnavailable { symbol, source } => {
                    tracing::error!(%symbol, error = %format!("{source:#}"), "provider lookup failed");
                    sentry::capture_error(&err);
                }
                other => tracing::warn!(%symbol, error = %other, "analysis rejected"),
            }
            Err(ApiError(err))
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &tickerlens_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
