use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter, prelude::*};
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::{trace::{SdkTracerProvider, Sampler}, Resource};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use tracing_opentelemetry::OpenTelemetryLayer;

use crate::api::ceramic_cache::{
    ceramic_cache_add_stamps, ceramic_cache_delete_stamps, ceramic_cache_get_stamps,
};
use crate::config::{AppConfig, OtelConfig};
use crate::db::{create_pool, MemoryStampStore, PgStampStore, StampStore};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StampStore>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn StampStore>, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
        }
    }
}

pub fn init_tracing(otel: &OtelConfig) {
    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(false)
                .with_span_events(fmt::format::FmtSpan::CLOSE),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=info,hyper=warn,tower=warn,h2=error"))
        );

    if !otel.enabled {
        subscriber.init();
        return;
    }

    match init_opentelemetry(otel) {
        Ok(provider) => {
            opentelemetry::global::set_tracer_provider(provider.clone());

            // global::tracer returns a BoxedTracer, which OpenTelemetryLayer can't use
            let tracer = provider.tracer(otel.service_name.clone());

            subscriber
                .with(OpenTelemetryLayer::new(tracer))
                .init();

            info!("OpenTelemetry enabled: {}", otel.endpoint);
        }
        Err(e) => {
            subscriber.init();
            tracing::error!("Failed to initialize OpenTelemetry: {}. Continuing with logs only.", e);
        }
    }
}

fn init_opentelemetry(otel: &OtelConfig) -> Result<SdkTracerProvider, Box<dyn std::error::Error>> {
    let resource = Resource::builder()
        .with_attribute(KeyValue::new("service.name", otel.service_name.clone()))
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .with_attribute(KeyValue::new("deployment.environment", otel.environment.clone()))
        .build();

    let exporter = if otel.endpoint.starts_with("http://") || otel.endpoint.starts_with("https://") {
        SpanExporter::builder()
            .with_http()
            .with_endpoint(otel.endpoint.clone())
            .build()?
    } else {
        SpanExporter::builder()
            .with_tonic()
            .with_endpoint(otel.endpoint.clone())
            .build()?
    };

    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(Sampler::TraceIdRatioBased(otel.sampling_rate))
        .with_batch_exporter(exporter)
        .build();

    info!("OpenTelemetry sampling rate: {}%", otel.sampling_rate * 100.0);

    Ok(provider)
}

/// Pick the stamp store: Postgres when a database URL is configured,
/// otherwise an in-process store
pub async fn create_store(config: &AppConfig) -> Result<Arc<dyn StampStore>, Box<dyn std::error::Error>> {
    match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            let store = PgStampStore::new(pool);
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory stamp store");
            Ok(Arc::new(MemoryStampStore::new()))
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let ceramic_cache = Router::new()
        .route(
            "/stamps/bulk",
            post(ceramic_cache_add_stamps).delete(ceramic_cache_delete_stamps),
        )
        .route("/stamp", get(ceramic_cache_get_stamps));

    Router::new()
        .nest("/ceramic-cache", ceramic_cache)
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

pub async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    init_tracing(&config.otel);

    info!("Starting ceramic cache server");

    let store = create_store(&config).await?;
    let app = create_app(AppState::new(store, config.jwt_secret.as_str()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down gracefully...");
}
