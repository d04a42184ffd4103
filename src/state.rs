use crate::badge::Badge;
use crate::config::Config;
use crate::errors::AppError;
use crate::source::LiveBrowser;
use crate::storage::{persist_store, KvStore};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct Background {
    pub store: KvStore,
    pub browser: LiveBrowser,
    pub badge: Badge,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub background: Arc<Mutex<Background>>,
}

impl AppState {
    pub fn new(config: Config, store: KvStore) -> Self {
        Self {
            config: Arc::new(config),
            background: Arc::new(Mutex::new(Background {
                store,
                ..Background::default()
            })),
        }
    }

    pub async fn persist(&self, background: &Background) -> Result<(), AppError> {
        persist_store(&self.config.data_path, &background.store).await
    }
}
