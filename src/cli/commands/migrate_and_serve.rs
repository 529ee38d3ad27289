use anyhow::Result;
use tracing::{debug, info};

use super::{init_database, serve};
use crate::config::AppConfig;

pub async fn migrate_and_serve(config: AppConfig) -> Result<()> {
    info!("Applying database migrations and starting server");
    debug!("Bind address: {}", config.bind_address());

    init_database(&config.database.url).await?;
    serve(config).await
}
