use anyhow::Result;
use tracing_subscriber::EnvFilter;

use pdf_chat::api;
use pdf_chat::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    api::serve(settings).await?;
    Ok(())
}
