// ── Flat attribute model ──
//
// The reconciliation caller speaks in flat attribute sets: scalar
// values, string lists, and one level of string-keyed maps. Everything
// this crate computes -- site configurations, endpoint records, health
// reports -- is projected into this shape before it crosses the crate
// boundary. Insertion order is preserved so attribute sets diff stably.

use indexmap::IndexMap;
use serde::Serialize;

/// One computed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StrList(Vec<String>),
    IntMap(IndexMap<String, i64>),
    StrMap(IndexMap<String, String>),
}

/// An ordered set of computed attributes.
pub type Attributes = IndexMap<String, AttrValue>;

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Self::StrList(list) => Some(list),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        Self::StrList(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert_eq!(AttrValue::from("x").as_str(), Some("x"));
        assert_eq!(AttrValue::from(42i64).as_int(), Some(42));
        assert_eq!(AttrValue::from(true).as_bool(), Some(true));
        assert_eq!(AttrValue::from("x").as_int(), None);
    }

    #[test]
    fn attributes_preserve_insertion_order() {
        let mut attrs = Attributes::new();
        attrs.insert("zulu".into(), AttrValue::from(1i64));
        attrs.insert("alpha".into(), AttrValue::from(2i64));
        attrs.insert("mike".into(), AttrValue::from(3i64));

        let keys: Vec<_> = attrs.keys().cloned().collect();
        assert_eq!(keys, vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn values_serialize_untagged() {
        let value = serde_json::to_value(AttrValue::StrList(vec!["a".into(), "b".into()]))
            .expect("serializes");
        assert_eq!(value, serde_json::json!(["a", "b"]));
    }
}
