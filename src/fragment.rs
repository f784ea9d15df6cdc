//! Spec fragments and the one merge rule used to combine them.
//!
//! Every builder in the compiler returns a [`Fragment`]. Fragments are combined
//! only through [`Fragment::merge`] or [`compose`]: fragments apply in the order
//! given, a later fragment's key replaces an earlier one's, and nested objects
//! are replaced whole rather than deep-merged.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment(Map<String, Value>);

impl Fragment {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON object. Anything else yields an empty fragment.
    pub fn from_object(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Like [`Fragment::with`], skipping `None`.
    pub fn with_opt<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.set(key, v);
        }
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `over` applied on top of `self`.
    pub fn merge(mut self, over: Fragment) -> Fragment {
        for (k, v) in over.0 {
            self.0.insert(k, v);
        }
        self
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Fragment> for Value {
    fn from(fragment: Fragment) -> Self {
        fragment.into_value()
    }
}

impl From<Map<String, Value>> for Fragment {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Merge `fragments` left to right under the rule in the module docs.
pub fn compose<I>(fragments: I) -> Fragment
where
    I: IntoIterator<Item = Fragment>,
{
    fragments
        .into_iter()
        .fold(Fragment::new(), |acc, next| acc.merge(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_later_fragment_wins() {
        let merged = compose([
            Fragment::new().with("mark", "bar").with("width", "container"),
            Fragment::new().with("mark", "line"),
        ]);
        assert_eq!(merged.get("mark"), Some(&json!("line")));
        assert_eq!(merged.get("width"), Some(&json!("container")));
    }

    #[test]
    fn test_nested_objects_are_replaced() {
        let merged = Fragment::from_object(json!({"encoding": {"x": 1, "y": 2}}))
            .merge(Fragment::from_object(json!({"encoding": {"x": 3}})));
        assert_eq!(merged.into_value(), json!({"encoding": {"x": 3}}));
    }

    #[test]
    fn test_key_order_follows_first_insertion() {
        let merged = compose([
            Fragment::new().with("a", 1).with("b", 2),
            Fragment::new().with("c", 3).with("a", 4),
        ]);
        assert_eq!(merged.into_value().to_string(), r#"{"a":4,"b":2,"c":3}"#);
    }

    #[test]
    fn test_with_opt_skips_none() {
        let f = Fragment::new().with_opt::<Value>("legend", None).with_opt("title", Some("T"));
        assert!(!f.contains_key("legend"));
        assert_eq!(f.get("title"), Some(&json!("T")));
    }

    #[test]
    fn test_non_object_is_empty() {
        assert!(Fragment::from_object(json!([1, 2])).is_empty());
    }
}
