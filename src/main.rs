use std::sync::Arc;
use storefront::catalog::InMemoryCatalog;
use storefront::router::create_app_router;
use storefront::store::{spawn_session_sweeper, AppState};
use storefront::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), storefront::StorefrontError> {
    init_tracing();

    let config = AppConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
    })?;
    let addr = config.socket_addr()?;

    tracing::info!(
        exchange_rate = %config.exchange_rate,
        express_fee = %config.express_shipping_fee,
        "Configuration loaded"
    );

    // Initialize application state
    let state = Arc::new(AppState::new(Arc::new(InMemoryCatalog::demo()), config));
    spawn_session_sweeper(
        Arc::clone(&state),
        state.config.session_sweep_interval(),
        state.config.session_idle_timeout(),
    );

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    tracing::info!("Storefront listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
