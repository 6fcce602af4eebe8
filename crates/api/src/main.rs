use std::sync::Arc;

use anyhow::Context;

use stockpact_infra::ScmConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockpact_observability::init();

    let config = ScmConfig::load()?;
    let bind_addr = config.api.bind_addr.clone();
    let services = Arc::new(stockpact_api::app::services::build_services(config)?);
    let app = stockpact_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
