use super::types::ProxyState;
use anyhow::Result;
use tokio::net::TcpListener;

pub async fn serve(port: u16, state: ProxyState) -> Result<()> {
    match &state.upstream {
        Some(upstream) => log::info!("Forwarding /proxy/* to {}/api", upstream),
        None => log::warn!("No upstream configured; every /proxy request will fail with 500"),
    }

    let app = super::routes::create_router(state);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
