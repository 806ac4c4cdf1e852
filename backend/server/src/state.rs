use std::sync::Arc;

use anyhow::Error;

use super::{
    config::Config,
    database::{RedisStore, init_redis},
    store::VouchStore,
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn VouchStore>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, Error> {
        let config = Config::load()?;

        let redis_connection = init_redis(&config.redis_url).await?;

        Ok(Self::with_store(config, Arc::new(RedisStore::new(redis_connection))))
    }

    pub fn with_store(config: Config, store: Arc<dyn VouchStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
