//! Rule loader — raw config text to rule lists.
//!
//! Only the outer shape is checked here (a JSON array). Each element is kept
//! even if it is not a usable rule; the matcher warns about those by index
//! when it reaches them.

use tracing::{error, warn};

use crate::error::RuleLoadError;
use crate::rules::model::Rule;

/// Parse raw rule text, reporting why it could not be used.
pub fn parse_rules(key: &str, raw: &str) -> Result<Vec<Rule>, RuleLoadError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|source| RuleLoadError::Parse {
            key: key.to_string(),
            source,
        })?;

    match value {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(Rule::from_raw).collect()),
        other => Err(RuleLoadError::NotArray {
            key: key.to_string(),
            found: json_kind(&other),
        }),
    }
}

/// Parse raw rule text, degrading to an empty list on any failure.
pub fn load(key: &str, raw: &str) -> Vec<Rule> {
    match parse_rules(key, raw) {
        Ok(rules) => rules,
        Err(e) => {
            log_load_error(&e);
            Vec::new()
        }
    }
}

/// Parse on the blocking pool so large rule documents never stall the
/// runtime threads handling messages.
pub async fn parse_rules_offloaded(key: String, raw: String) -> Result<Vec<Rule>, RuleLoadError> {
    let worker_key = key.clone();
    match tokio::task::spawn_blocking(move || parse_rules(&worker_key, &raw)).await {
        Ok(result) => result,
        Err(e) => Err(RuleLoadError::Worker {
            key,
            reason: e.to_string(),
        }),
    }
}

/// Log a load failure at the level its variant deserves.
pub fn log_load_error(err: &RuleLoadError) {
    match err {
        RuleLoadError::NotArray { key, found } => {
            warn!(key = %key, found = %found, "Rule collection is not a list, using no rules");
        }
        RuleLoadError::Parse { key, source } => {
            error!(key = %key, error = %source, "Rule collection is malformed JSON, using no rules");
        }
        RuleLoadError::Worker { key, reason } => {
            error!(key = %key, reason = %reason, "Rule parse worker failed, using no rules");
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::model::RuleField;

    #[test]
    fn loads_well_formed_rules_in_order() {
        let rules = load(
            "error_mappings_json",
            r#"[
                {"keywords": ["timeout", "504"], "replacement_texts": ["Let me think..."]},
                {"keywords": ["quota"], "replacement_texts": ["Busy", "Later"]}
            ]"#,
        );

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], Rule::new(["timeout", "504"], ["Let me think..."]));
        assert_eq!(rules[1], Rule::new(["quota"], ["Busy", "Later"]));
    }

    #[test]
    fn round_trips_serialized_rules() {
        let rules = vec![
            Rule::new(["a", "b"], ["X"]),
            Rule::new(Vec::<String>::new(), ["unused"]),
            Rule::new(["日本語"], ["一", "二"]),
        ];
        let raw = serde_json::to_string(&rules).unwrap();
        assert_eq!(parse_rules("k", &raw).unwrap(), rules);
    }

    #[test]
    fn malformed_json_degrades_to_empty() {
        assert!(matches!(
            parse_rules("k", "[{not json"),
            Err(RuleLoadError::Parse { .. })
        ));
        assert!(load("k", "[{not json").is_empty());
    }

    #[test]
    fn non_array_degrades_to_empty() {
        let err = parse_rules("k", r#"{"keywords": ["a"]}"#).unwrap_err();
        assert!(matches!(err, RuleLoadError::NotArray { found: "object", .. }));
        assert!(load("k", "\"text\"").is_empty());
    }

    #[test]
    fn keeps_malformed_elements_for_matcher() {
        let rules = load("k", r#"[{"keywords": "oops", "replacement_texts": ["Y"]}, 7]"#);
        assert_eq!(rules.len(), 2);
        assert!(matches!(rules[0].keywords, RuleField::Malformed(_)));
        assert!(matches!(rules[1].replacement_texts, RuleField::Malformed(_)));
    }

    #[tokio::test]
    async fn offloaded_parse_matches_inline_parse() {
        let raw = r#"[{"keywords": ["x"], "replacement_texts": ["y"]}]"#;
        let rules = parse_rules_offloaded("k".into(), raw.into()).await.unwrap();
        assert_eq!(rules, parse_rules("k", raw).unwrap());
    }
}
