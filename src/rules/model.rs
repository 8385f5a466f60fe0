//! Rule data model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which rule set a rule belongs to. Declaration order is evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleRole {
    /// Replace the response and leave no trace.
    Silent,
    /// Replace the response, annotate it with the original, then delay.
    Reported,
    /// Replace the response and annotate it, without delay.
    Fallback,
}

impl RuleRole {
    /// All roles in evaluation order.
    pub const ALL: [RuleRole; 3] = [RuleRole::Silent, RuleRole::Reported, RuleRole::Fallback];

    /// Plugin config key holding this role's raw rules.
    pub fn config_key(self) -> &'static str {
        match self {
            Self::Silent => "silent_replacement_mappings_json",
            Self::Reported => "error_mappings_json",
            Self::Fallback => "fallback_mappings_json",
        }
    }

    /// Short label for logging.
    pub fn label(self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Reported => "reported",
            Self::Fallback => "fallback",
        }
    }

    /// Whether a match attaches the original text to the message.
    pub fn annotates(self) -> bool {
        !matches!(self, Self::Silent)
    }

    /// Whether a match triggers the post-match delay.
    pub fn delays(self) -> bool {
        matches!(self, Self::Reported)
    }
}

impl fmt::Display for RuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One rule field as it arrived in the config.
///
/// Anything other than a list of strings is kept verbatim as `Malformed` so
/// the matcher can skip it with a warning instead of failing the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleField {
    List(Vec<String>),
    Malformed(serde_json::Value),
}

impl RuleField {
    /// The string list, if well-formed.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Malformed(_) => None,
        }
    }
}

impl Default for RuleField {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl From<Vec<String>> for RuleField {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// A keyword-to-replacement mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rule {
    /// Substrings scanned for, in order.
    #[serde(default)]
    pub keywords: RuleField,
    /// Candidate replacements; one is picked at random on match.
    #[serde(default)]
    pub replacement_texts: RuleField,
}

impl Rule {
    /// Build a well-formed rule.
    pub fn new<K, R>(keywords: K, replacement_texts: R) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            keywords: RuleField::List(keywords.into_iter().map(Into::into).collect()),
            replacement_texts: RuleField::List(
                replacement_texts.into_iter().map(Into::into).collect(),
            ),
        }
    }

    /// Wrap an array element that is not a rule object at all.
    pub(crate) fn from_raw(value: serde_json::Value) -> Self {
        // serde would also accept a positional array for a struct; only
        // objects count as rules.
        let parsed = if value.is_object() {
            serde_json::from_value::<Rule>(value.clone()).ok()
        } else {
            None
        };

        parsed.unwrap_or_else(|| Self {
            keywords: RuleField::Malformed(value.clone()),
            replacement_texts: RuleField::Malformed(value),
        })
    }
}
