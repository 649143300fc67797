use std::sync::Arc;

use log::Logger;

use crate::db::Db;
use crate::store::Store;
use crate::urls::Urls;

/// Tunable settings that do not warrant their own subsystem.
#[derive(Clone, Debug)]
pub struct Config {
    /// The largest media upload to accept, in bytes.
    pub max_upload_bytes: u64,
}

impl Config {
    pub fn new(max_upload_bytes: u64) -> Self {
        Config { max_upload_bytes }
    }
}

/// The shared state handed to every route handler.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<dyn Db + Send + Sync>,
    pub urls: Arc<Urls>,
    pub store: Arc<dyn Store>,
    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn Db + Send + Sync>,
        urls: Arc<Urls>,
        store: Arc<dyn Store>,
        config: Config,
    ) -> Self {
        Environment {
            logger,
            db,
            urls,
            store,
            config,
        }
    }
}
