use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use tracing::{error, info, instrument, warn};

use crate::utils::clock::Clock;

use super::entry_store::JsonEntryStore;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub dir: PathBuf,
    /// Total number of attempts made before giving up. 0 behaves like 1.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl StoreConfig {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Acquires the store, retrying with a fixed delay. The returned store is owned by the caller and
/// released with [JsonEntryStore::close].
#[instrument(skip(clock))]
pub async fn open_store(config: &StoreConfig, clock: &dyn Clock) -> Result<JsonEntryStore> {
    let mut attempt = 1;
    loop {
        match JsonEntryStore::open(config.dir.clone()).await {
            Ok(store) => {
                info!("Store opened at {:?}", config.dir);
                return Ok(store);
            }
            Err(e) if attempt < config.max_retries => {
                warn!(
                    "Attempt {attempt}/{} to open store failed: {e:?}. Retrying in {:?}",
                    config.max_retries, config.retry_delay
                );
                clock.sleep(config.retry_delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!("Giving up on opening store after {attempt} attempts");
                return Err(e.context(format!(
                    "Couldn't open store at {:?} after {attempt} attempts",
                    config.dir
                )));
            }
        }
    }
}
