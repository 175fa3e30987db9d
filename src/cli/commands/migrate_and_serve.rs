use anyhow::Result;
use tracing::{debug, info, trace};

use super::initdb::migrate;
use super::serve::serve;
use crate::config::Settings;

pub async fn migrate_and_serve(settings: Settings) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", settings.database_url);

    let db = migrate(&settings.database_url).await?;
    db.close().await?;

    serve(settings).await
}
