use menu_qr::{AppState, app, config::Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    // rustls needs a process-wide crypto provider before the first TLS connection.
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("TLS crypto provider already installed");
    }

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr;
    tracing::info!(
        backend = %config.backend_url,
        bucket = %config.menu_bucket,
        site_origin = config.site_origin.as_ref().map(|o| o.as_str()).unwrap_or("<from request>"),
        "configuration loaded"
    );

    let state = AppState::new(config)?;
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on http://{bind_addr}");
    axum::serve(listener, router).await?;

    Ok(())
}
