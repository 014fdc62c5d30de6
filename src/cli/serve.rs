use anyhow::Result;

use crate::api;
use crate::core::AppConfig;

pub async fn run(host: String, port: Option<String>) -> Result<()> {
    let config = AppConfig::default();
    let port = port.unwrap_or_else(|| config.port.clone());
    api::serve(host, port, config).await
}
