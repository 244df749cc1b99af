//! Task configuration options
//!
//! The `options` binding in a config file is a statically-evaluable object
//! literal. It is evaluated into a [`serde_json::Value`] by the extractor
//! and deserialized here; anything that does not fit the expected shape
//! silently falls back to the defaults.

use serde::{Deserialize, Serialize};

/// Which run category a task should skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exclude {
    Live,
    Sync,
    None,
}

/// Top-level options extracted from the config file, shared by every task
/// in one invocation. Immutable once extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Exclude>,
}

impl TaskOptions {
    /// Build options from an evaluated literal. A value that does not
    /// deserialize (wrong types, not an object) yields the defaults rather
    /// than an error.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Serialize back to object-literal text for the synthesized program.
    pub fn to_literal(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_both_fields() {
        let options = TaskOptions::from_value(json!({ "silent": true, "exclude": "sync" }));
        assert_eq!(options.silent, Some(true));
        assert_eq!(options.exclude, Some(Exclude::Sync));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let options = TaskOptions::from_value(json!({ "silent": false, "verbose": 3 }));
        assert_eq!(options.silent, Some(false));
        assert_eq!(options.exclude, None);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        assert_eq!(TaskOptions::from_value(json!("nope")), TaskOptions::default());
        assert_eq!(
            TaskOptions::from_value(json!({ "exclude": "sometimes" })),
            TaskOptions::default()
        );
    }

    #[test]
    fn literal_serialization_skips_unset_fields() {
        let options = TaskOptions {
            silent: Some(true),
            exclude: None,
        };
        let literal = options.to_literal();
        assert!(literal.contains("\"silent\": true"));
        assert!(!literal.contains("exclude"));
        assert_eq!(TaskOptions::default().to_literal(), "{}");
    }
}
