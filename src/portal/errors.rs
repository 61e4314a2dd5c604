//! Deployment errors reported by the Central Portal
//!
//! The status endpoint reports failures as a JSON object keyed by the package
//! url of each component. Values are usually lists of messages, sometimes a
//! single message. [`Errors`] normalizes that payload into a sorted
//! `key -> messages` mapping and keeps every other shape aside as malformed,
//! so policy decisions never act on guessed data.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Normalized deployment errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    entries: BTreeMap<String, Vec<String>>,
    malformed: BTreeMap<String, Value>,
}

impl Errors {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalize the raw `errors` value of a status response
    pub fn from_raw(raw: Option<&Value>) -> Self {
        let mut errors = Self::default();

        match raw {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (key, value) in map {
                    match normalize_messages(value) {
                        Some(messages) => {
                            errors.entries.insert(key.clone(), messages);
                        }
                        None => {
                            errors.malformed.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
            Some(other) => {
                errors.malformed.insert(String::new(), other.clone());
            }
        }

        errors
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.malformed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.malformed.len()
    }

    /// Messages reported for `key`
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Whether some entries could not be normalized
    pub fn has_malformed_entries(&self) -> bool {
        !self.malformed.is_empty()
    }

    /// Whether the deployment failed only because every component was
    /// published before
    ///
    /// Every entry must hold exactly one message, and that message must be
    /// the already-exists text for the entry's own key. An empty error set
    /// is never classified this way.
    pub fn has_only_already_exists_error(&self) -> bool {
        if self.entries.is_empty() || !self.malformed.is_empty() {
            return false;
        }
        self.entries.iter().all(|(key, messages)| match messages.as_slice() {
            [message] => *message == already_exists_message(key),
            _ => false,
        })
    }
}

/// Text the portal reports for a component published before
pub fn already_exists_message(key: &str) -> String {
    format!("Component with package url: '{}' already exists", key)
}

fn normalize_messages(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(message) => Some(vec![message.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(no errors reported)");
        }

        let mut first = true;
        for (key, messages) in &self.entries {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{}:", key)?;
            for message in messages {
                write!(f, "\n  - {}", message)?;
            }
        }
        for (key, value) in &self.malformed {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{}:\n  ! unexpected value {}", key, value)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PURL_A: &str = "pkg:maven/com.example/a@1.0.0?type=jar";
    const PURL_B: &str = "pkg:maven/com.example/b@1.0.0?type=jar";

    #[test]
    fn test_empty_errors_are_not_already_exists() {
        assert!(!Errors::from_raw(None).has_only_already_exists_error());
        assert!(!Errors::from_raw(Some(&Value::Null)).has_only_already_exists_error());
        assert!(!Errors::from_raw(Some(&json!({}))).has_only_already_exists_error());
        assert!(Errors::empty().is_empty());
    }

    #[test]
    fn test_only_already_exists_errors() {
        let raw = json!({
            PURL_A: [already_exists_message(PURL_A)],
            PURL_B: [already_exists_message(PURL_B)],
        });

        assert!(Errors::from_raw(Some(&raw)).has_only_already_exists_error());
    }

    #[test]
    fn test_single_string_value_is_normalized() {
        let raw = json!({ PURL_A: already_exists_message(PURL_A) });

        let errors = Errors::from_raw(Some(&raw));

        assert_eq!(errors.get(PURL_A).unwrap().len(), 1);
        assert!(errors.has_only_already_exists_error());
    }

    #[test]
    fn test_any_other_error_breaks_classification() {
        let raw = json!({
            PURL_A: [already_exists_message(PURL_A)],
            PURL_B: ["Missing signature for file: b-1.0.0.jar"],
        });

        assert!(!Errors::from_raw(Some(&raw)).has_only_already_exists_error());
    }

    #[test]
    fn test_multiple_messages_break_classification() {
        let raw = json!({
            PURL_A: [already_exists_message(PURL_A), "Invalid POM"],
        });

        assert!(!Errors::from_raw(Some(&raw)).has_only_already_exists_error());
    }

    #[test]
    fn test_message_for_another_key_breaks_classification() {
        let raw = json!({ PURL_A: [already_exists_message(PURL_B)] });

        assert!(!Errors::from_raw(Some(&raw)).has_only_already_exists_error());
    }

    #[test]
    fn test_malformed_entries_break_classification() {
        let raw = json!({
            PURL_A: [already_exists_message(PURL_A)],
            PURL_B: 42,
        });

        let errors = Errors::from_raw(Some(&raw));

        assert!(errors.has_malformed_entries());
        assert_eq!(errors.len(), 2);
        assert!(!errors.has_only_already_exists_error());
    }

    #[test]
    fn test_non_string_list_item_is_malformed() {
        let raw = json!({ PURL_A: [already_exists_message(PURL_A), null] });

        let errors = Errors::from_raw(Some(&raw));

        assert!(errors.has_malformed_entries());
        assert!(errors.get(PURL_A).is_none());
    }

    #[test]
    fn test_non_object_payload_is_malformed() {
        let errors = Errors::from_raw(Some(&json!(["oops"])));

        assert!(!errors.is_empty());
        assert!(!errors.has_only_already_exists_error());
    }

    #[test]
    fn test_display_is_sorted_and_indented() {
        let raw = json!({
            "pkg:maven/z@1": ["last"],
            "pkg:maven/a@1": ["first", "second"],
        });

        let rendered = Errors::from_raw(Some(&raw)).to_string();

        assert_eq!(
            rendered,
            "pkg:maven/a@1:\n  - first\n  - second\npkg:maven/z@1:\n  - last"
        );
    }
}
