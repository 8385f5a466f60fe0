//! Response processor — runs an outgoing message through the rule sets.
//!
//! Flow per message:
//! 1. Concatenate the plain-text segments; nothing to do if empty
//! 2. Silent → Reported → Fallback, stop at the first set that matches
//! 3. Swap the content chain for one plain segment with the replacement
//! 4. Reported/Fallback: attach the original text as an annotation
//! 5. Reported only: wait the random delivery delay

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::delay::DelayController;
use crate::message::{ResponseEvent, Segment, plain_text};
use crate::rules::{RuleMatch, RuleRole, RuleStore, find_match};

/// What happened to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// No result container or no plain text; untouched.
    Skipped,
    /// No rule matched; untouched.
    Passthrough,
    /// Content was replaced.
    Replaced {
        role: RuleRole,
        rule_index: usize,
        keyword: String,
        /// Whether the original text was attached.
        annotated: bool,
        /// Delay waited before returning, if any.
        delayed: Option<Duration>,
    },
}

impl ProcessOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, Self::Replaced { .. })
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Passthrough => "passthrough",
            Self::Replaced { .. } => "replaced",
        }
    }
}

/// Applies the three rule sets to outgoing messages.
pub struct ResponseProcessor {
    store: Arc<RuleStore>,
    delay: DelayController,
}

impl ResponseProcessor {
    pub fn new(store: Arc<RuleStore>, delay: DelayController) -> Self {
        Self { store, delay }
    }

    /// Find the first matching rule across all sets, in priority order.
    pub fn evaluate(&self, text: &str) -> Option<RuleMatch> {
        RuleRole::ALL.into_iter().find_map(|role| {
            let rules = self.store.rules(role);
            find_match(role, text, &rules)
        })
    }

    /// Process one outgoing message in place.
    pub async fn process<E>(&self, event: &mut E) -> ProcessOutcome
    where
        E: ResponseEvent + ?Sized,
    {
        let original = match event.chain_mut() {
            Some(chain) => plain_text(chain),
            None => return ProcessOutcome::Skipped,
        };
        if original.is_empty() {
            return ProcessOutcome::Skipped;
        }

        let Some(matched) = self.evaluate(&original) else {
            return ProcessOutcome::Passthrough;
        };

        let RuleMatch {
            role,
            rule_index,
            keyword,
            replacement,
        } = matched;

        if let Some(chain) = event.chain_mut() {
            *chain = vec![Segment::plain(replacement)];
        }

        let annotated = role.annotates() && annotate(event, &original);

        info!(
            role = %role,
            index = rule_index,
            keyword = %keyword,
            annotated,
            "Rule matched, response replaced"
        );

        let delayed = if role.delays() {
            self.delay.maybe_delay().await
        } else {
            None
        };

        ProcessOutcome::Replaced {
            role,
            rule_index,
            keyword,
            annotated,
            delayed,
        }
    }
}

/// Attach the original text; failures are logged and swallowed.
fn annotate<E: ResponseEvent + ?Sized>(event: &mut E, original: &str) -> bool {
    match event.attach_annotation(original) {
        Ok(()) => {
            debug!(
                preview = %original.chars().take(100).collect::<String>(),
                "Attached original response for monitoring"
            );
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to attach original response to message");
            false
        }
    }
}
