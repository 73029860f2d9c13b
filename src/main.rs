use anyhow::Context;
use rsa_jwks::{config, router, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = config::load_config("config").context("failed to load configuration")?;
    let _guard = telemetry::init(&settings.telemetry).context("failed to initialise telemetry")?;

    // generating a large key blocks for a while, keep it off the runtime workers
    let builder = settings.key.to_builder();
    let jwks_config = tokio::task::spawn_blocking(move || builder.build())
        .await
        .context("key provisioning task panicked")?
        .context("failed to provision signing key")?;

    let app = router(jwks_config, &settings.jwks_path);

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        "serving jwks on http://{}{}",
        listener.local_addr()?,
        settings.jwks_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
