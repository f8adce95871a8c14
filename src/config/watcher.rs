//! Configuration file watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify event (modify/create)
//!     → load_config (parse + validate)
//!         invalid   → logged, current configuration kept
//!         unchanged → dropped
//!         changed   → sent on the update channel
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::OperationConfig;

/// Monitors the configuration file and streams every valid revision.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<OperationConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<OperationConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    ///
    /// The file as it is now counts as the current revision; only later
    /// changes are sent.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let mut forwarder = Forwarder::new(self.update_tx, load_config(&path).ok());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::debug!(path = ?path, "Config file change detected");
                    forwarder.offer(load_config(&path));
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Decides which reload results reach the update channel.
struct Forwarder {
    tx: mpsc::UnboundedSender<OperationConfig>,
    last: Option<OperationConfig>,
}

impl Forwarder {
    fn new(tx: mpsc::UnboundedSender<OperationConfig>, last: Option<OperationConfig>) -> Self {
        Self { tx, last }
    }

    /// Returns whether a configuration was sent.
    fn offer(&mut self, loaded: Result<OperationConfig, ConfigError>) -> bool {
        let config = match loaded {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                return false;
            }
        };
        if self.last.as_ref() == Some(&config) {
            return false;
        }

        self.last = Some(config.clone());
        if self.tx.send(config).is_err() {
            tracing::warn!("Config update receiver dropped, reload discarded");
            return false;
        }
        tracing::info!("Configuration reloaded");
        true
    }
}
