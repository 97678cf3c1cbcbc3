use std::sync::Arc;

use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = pix_axum::build_from_env()?;

    // The transform pipeline rides the finalize-notification bus for
    // as long as the process lives.
    tokio::spawn(pix_pipeline::run(
        Arc::clone(&app.worker),
        app.bus.subscribe(),
    ));

    let host = app
        .config
        .get_string("http.host")
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = app
        .config
        .get_string("http.port")
        .unwrap_or_else(|| "3030".to_string());
    let addr = format!("{host}:{port}");

    info!(%addr, "pixgate listening");
    app.listen(addr).await
}
