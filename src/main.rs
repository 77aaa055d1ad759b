use city_dashboard::fetch::HttpBackend;
use city_dashboard::{resolve_config, router, AppState, Event, Outcome};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = resolve_config()?;
    info!(api = %config.api_base_url, "using statistics backend");

    let backend = HttpBackend::new(&config)?;
    let state = AppState::new(backend);

    let startup = state.clone();
    tokio::spawn(async move {
        let outcome = startup.dashboard.handle(Event::AppStarted).await;
        match outcome {
            Outcome::Failed => warn!("dashboard started without data"),
            _ => info!(?outcome, "dashboard ready"),
        }
    });

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
