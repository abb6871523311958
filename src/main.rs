use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keyheat::core::paths;
use keyheat::{CounterStore, KeyTracker, TrackerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keyheat=info")),
        )
        .init();

    let data_dir = paths::app_data_dir()?;
    let config = TrackerConfig::load_or_default(&data_dir.join("config.json"))
        .context("load tracker config")?;
    let db_path = match &config.db_path {
        Some(path) => path.clone(),
        None => data_dir.join(paths::DB_FILE_NAME),
    };

    let store = Arc::new(CounterStore::open(&db_path).context("open keystroke store")?);
    let tracker = KeyTracker::new(Arc::clone(&store), &config);
    tracker.start();
    info!(db = %db_path.display(), "tracking keystrokes; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("wait for Ctrl-C")?;
    tracker.stop();

    let snapshot = store.snapshot().context("read statistics snapshot")?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
