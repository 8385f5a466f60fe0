//! Immersive error guard — swaps error-looking LLM responses for in-character
//! replies before delivery.

pub mod config;
pub mod delay;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod message;
pub mod processor;
pub mod rules;

pub use config::{ConfigSource, DelayConfig, GuardConfig};
pub use guard::ImmersiveErrorGuard;
pub use message::{OutgoingMessage, ResponseEvent, Segment};
pub use processor::{ProcessOutcome, ResponseProcessor};
pub use rules::{LoadStatus, Rule, RuleRole};
