//! Background rule loading.
//!
//! One load per process: each rule set is parsed on the blocking pool and
//! published as soon as it is ready. Messages never wait for it; until a set
//! is published they simply see no rules for that role.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ConfigSource;
use crate::rules::loader;
use crate::rules::{RuleRole, RuleStore};

/// Owns the load task and its cancellation token.
pub struct LifecycleManager {
    store: Arc<RuleStore>,
    source: Arc<dyn ConfigSource>,
    cancel: CancellationToken,
    started: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl LifecycleManager {
    pub fn new(store: Arc<RuleStore>, source: Arc<dyn ConfigSource>) -> Self {
        Self {
            store,
            source,
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the load task. Only the first call does anything.
    ///
    /// Returns `false` if a load was already started or there is no Tokio
    /// runtime to spawn on.
    pub fn start(&self) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Rule load already started, ignoring second start");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "No async runtime available, rules will stay empty");
                return false;
            }
        };

        let task = runtime.spawn(load_all(
            Arc::clone(&self.store),
            Arc::clone(&self.source),
            self.cancel.clone(),
        ));
        *self.lock_handle() = Some(task);
        true
    }

    /// Ask a running load to stop. Safe to call any number of times.
    pub fn cancel(&self) {
        let running = self
            .lock_handle()
            .as_ref()
            .is_some_and(|task| !task.is_finished());

        self.cancel.cancel();

        if running {
            info!("Cancelled in-flight rule load");
        }
    }

    /// Whether the load task has run to completion (or was never started).
    pub fn is_finished(&self) -> bool {
        self.lock_handle()
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the load task to end, without cancelling it.
    pub async fn join(&self) {
        let task = self.lock_handle().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "Rule load task ended abnormally");
            }
        }
    }

    /// Cancel, then wait for the task to wind down.
    pub async fn shutdown(&self) {
        self.cancel();
        self.join().await;
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Load silent, reported and fallback rules in that order.
async fn load_all(store: Arc<RuleStore>, source: Arc<dyn ConfigSource>, cancel: CancellationToken) {
    info!("Loading response rules in the background");

    for role in RuleRole::ALL {
        if cancel.is_cancelled() {
            abandon(&store);
            return;
        }

        let key = role.config_key();
        let raw = source.rules_json(role);
        let result = loader::parse_rules_offloaded(key.to_string(), raw).await;

        // A parse that was already running is allowed to finish, but its
        // result is dropped once cancellation has been requested.
        if cancel.is_cancelled() {
            abandon(&store);
            return;
        }

        match result {
            Ok(rules) => store.publish(role, rules),
            Err(e) => {
                loader::log_load_error(&e);
                store.mark_failed(role, e.to_string());
            }
        }
    }

    let [silent, reported, fallback] = store.counts();
    info!(silent, reported, fallback, "Response rules loaded");
}

fn abandon(store: &RuleStore) {
    for role in RuleRole::ALL {
        store.mark_cancelled(role);
    }
    info!("Rule load cancelled before completion");
}
