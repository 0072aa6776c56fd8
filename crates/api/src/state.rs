//! Shared handler state

use std::sync::{Arc, Mutex};

use handyhub_core::{Config, Database, EventDispatcher, Marketplace, Notifier};

use crate::error::{ApiError, Result};

/// State shared by every request handler
#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<Mutex<Database>>,
    pub dispatcher: Arc<EventDispatcher>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<Config>,
}

impl ApiState {
    pub fn new(db: Database, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        let dispatcher = EventDispatcher::standard(config.bookings.open_conversation_on_accept);
        Self {
            db: Arc::new(Mutex::new(db)),
            dispatcher: Arc::new(dispatcher),
            notifier,
            config: Arc::new(config),
        }
    }

    /// Run a core operation on the blocking pool.
    ///
    /// SQLite calls block, so they never run on the async workers.
    pub async fn run_blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Marketplace<'_>) -> handyhub_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || {
            let db = state
                .db
                .lock()
                .map_err(|_| ApiError::Internal("database lock poisoned".into()))?;
            let market = Marketplace::new(
                &*db,
                &state.dispatcher,
                state.notifier.as_ref(),
                &state.config.server.public_base_url,
            )
            .with_policy(state.config.token_policy());
            op(&market).map_err(ApiError::from)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {}", e)))?
    }
}
