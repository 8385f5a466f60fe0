//! Keyword rules: data model, loading, matching, and the published store.
//!
//! Three rule sets are evaluated in order: silent → reported → fallback.
//! The first rule whose keyword occurs in the response text decides the
//! replacement; later rules and sets are never consulted.

pub mod loader;
pub mod matcher;
pub mod model;
pub mod store;

pub use matcher::{RuleMatch, find_match};
pub use model::{Rule, RuleField, RuleRole};
pub use store::{LoadStatus, RuleStore};
