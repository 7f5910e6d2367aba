//! billing-bridge server entry point.

use std::sync::Arc;

use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use billing_bridge::adapters::http::{billing_router, BillingAppState};
use billing_bridge::adapters::memory::InMemoryUserRecordRepository;
use billing_bridge::adapters::postgres::PostgresUserRecordRepository;
use billing_bridge::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use billing_bridge::config::{AppConfig, ServerConfig};
use billing_bridge::domain::billing::StripeWebhookVerifier;
use billing_bridge::ports::UserRecordRepository;
use secrecy::ExposeSecret;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let user_repository: Arc<dyn UserRecordRepository> = match &config.database {
        Some(database) => {
            let pool = database.pool_options().connect(&database.url).await?;
            tracing::info!("Database connection pool created");
            if database.run_migrations {
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Database migrations completed");
            }
            Arc::new(PostgresUserRecordRepository::new(pool))
        }
        None => {
            tracing::warn!("No database configured; user records are kept in memory");
            Arc::new(InMemoryUserRecordRepository::new())
        }
    };

    let payment = &config.payment;
    let mut stripe_config = StripeConfig::new(payment.stripe_api_key.clone());
    if let Some(base_url) = &payment.stripe_api_base_url {
        stripe_config = stripe_config.with_base_url(base_url.clone());
    }

    let state = BillingAppState {
        user_repository,
        payment_provider: Arc::new(StripePaymentAdapter::new(stripe_config)),
        webhook_verifier: StripeWebhookVerifier::new(
            payment.stripe_webhook_secret.expose_secret().clone(),
            payment.webhook_tolerance_secs,
        ),
        checkout_settings: payment.checkout_settings(),
        acknowledge_policy: payment.acknowledge_policy(),
        stripe_public_key: payment.stripe_publishable_key.clone(),
    };

    let app = billing_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        stripe_test_mode = payment.is_test_mode(),
        redeliver_on_failure = payment.redeliver_on_failure,
        "billing-bridge listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
