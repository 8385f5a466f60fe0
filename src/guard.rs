//! Plugin facade wiring config, rule store, processor and load lifecycle.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info};

use crate::config::{ConfigSource, DelayConfig, GuardConfig};
use crate::delay::DelayController;
use crate::error::Result;
use crate::lifecycle::LifecycleManager;
use crate::message::ResponseEvent;
use crate::processor::{ProcessOutcome, ResponseProcessor};
use crate::rules::{LoadStatus, RuleRole, RuleStore};

/// Replaces error-looking responses before they reach the user.
///
/// Construction starts the background rule load; hosts call
/// [`on_decorating_result`](Self::on_decorating_result) for every outgoing
/// message and [`terminate`](Self::terminate) on unload.
pub struct ImmersiveErrorGuard {
    store: Arc<RuleStore>,
    processor: ResponseProcessor,
    lifecycle: LifecycleManager,
}

impl ImmersiveErrorGuard {
    /// Build from a plugin config and start loading rules.
    pub fn new(config: GuardConfig) -> Self {
        let delay = config.delay();
        Self::with_source(delay, Arc::new(config))
    }

    /// Build from a plugin config file and start loading rules.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let config = GuardConfig::from_file(path)?;
        Ok(Self::new(config))
    }

    /// Build with rule text coming from a host-provided source.
    pub fn with_source(delay: DelayConfig, source: Arc<dyn ConfigSource>) -> Self {
        let store = RuleStore::new();
        let processor = ResponseProcessor::new(Arc::clone(&store), DelayController::new(delay));
        let lifecycle = LifecycleManager::new(Arc::clone(&store), source);
        lifecycle.start();

        Self {
            store,
            processor,
            lifecycle,
        }
    }

    /// Host hook, called once per outgoing message before delivery.
    ///
    /// Never panics outward; a fault inside processing leaves the message
    /// as it was at that point and reports `Skipped`.
    pub async fn on_decorating_result<E>(&self, event: &mut E) -> ProcessOutcome
    where
        E: ResponseEvent + ?Sized,
    {
        match AssertUnwindSafe(self.processor.process(event))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Response processing panicked, message left unmodified");
                ProcessOutcome::Skipped
            }
        }
    }

    /// Wait until the background load has finished.
    pub async fn wait_loaded(&self) {
        self.lifecycle.join().await;
    }

    /// Host teardown hook. Requests cancellation and returns immediately.
    pub fn terminate(&self) {
        self.lifecycle.cancel();
        info!("Immersive error guard unloaded");
    }

    /// Cancel the load and wait for its task to end.
    pub async fn shutdown(&self) {
        self.lifecycle.shutdown().await;
        info!("Immersive error guard unloaded");
    }

    pub fn load_status(&self, role: RuleRole) -> LoadStatus {
        self.store.status(role)
    }

    /// Rule counts in evaluation order (silent, reported, fallback).
    pub fn rule_counts(&self) -> [usize; 3] {
        self.store.counts()
    }
}
