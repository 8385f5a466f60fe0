//! Published rule sets, one slot per role.
//!
//! Each slot is written once by the load task with a single pointer swap and
//! read lock-free on every message. An empty slot means "not loaded yet" as
//! far as matching is concerned.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::rules::model::{Rule, RuleRole};

/// Load progress for a single rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    Unloaded,
    Loaded { count: usize },
    /// Source was unusable; the set is empty.
    Failed { reason: String },
    Cancelled,
}

struct Slot {
    rules: ArcSwap<Vec<Rule>>,
    status: ArcSwap<LoadStatus>,
}

impl Slot {
    fn empty() -> Self {
        Self {
            rules: ArcSwap::from_pointee(Vec::new()),
            status: ArcSwap::from_pointee(LoadStatus::Unloaded),
        }
    }
}

/// The three rule sets, shared between the load task and the processor.
pub struct RuleStore {
    silent: Slot,
    reported: Slot,
    fallback: Slot,
}

impl RuleStore {
    /// Create a store with every set empty and unloaded.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            silent: Slot::empty(),
            reported: Slot::empty(),
            fallback: Slot::empty(),
        })
    }

    fn slot(&self, role: RuleRole) -> &Slot {
        match role {
            RuleRole::Silent => &self.silent,
            RuleRole::Reported => &self.reported,
            RuleRole::Fallback => &self.fallback,
        }
    }

    /// Current rules for a role. Cheap; never blocks.
    pub fn rules(&self, role: RuleRole) -> Arc<Vec<Rule>> {
        self.slot(role).rules.load_full()
    }

    /// Replace a role's rules wholesale.
    pub fn publish(&self, role: RuleRole, rules: Vec<Rule>) {
        let slot = self.slot(role);
        let count = rules.len();
        slot.rules.store(Arc::new(rules));
        slot.status.store(Arc::new(LoadStatus::Loaded { count }));
    }

    /// Record that a role's source could not be used. Its rules stay empty.
    pub fn mark_failed(&self, role: RuleRole, reason: impl Into<String>) {
        let slot = self.slot(role);
        slot.rules.store(Arc::new(Vec::new()));
        slot.status.store(Arc::new(LoadStatus::Failed {
            reason: reason.into(),
        }));
    }

    /// Mark a role as abandoned by a cancelled load, unless it already loaded.
    pub fn mark_cancelled(&self, role: RuleRole) {
        let status = &self.slot(role).status;
        if matches!(**status.load(), LoadStatus::Unloaded) {
            status.store(Arc::new(LoadStatus::Cancelled));
        }
    }

    /// Load status for a role.
    pub fn status(&self, role: RuleRole) -> LoadStatus {
        (*self.slot(role).status.load_full()).clone()
    }

    /// Rule counts in evaluation order.
    pub fn counts(&self) -> [usize; 3] {
        RuleRole::ALL.map(|role| self.slot(role).rules.load().len())
    }
}
