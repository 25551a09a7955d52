use qa_config::load_settings;
use qa_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config_path = std::env::var("QA_CONFIG_PATH").ok();
    let settings = load_settings(config_path.as_deref())?;

    let metrics_handle = init_metrics();
    let state = AppState::build(settings.clone(), metrics_handle).await?;

    let app = create_router(state, &settings.server.cors_origins, settings.server.cors_enabled);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!(%addr, "starting the document QA server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
