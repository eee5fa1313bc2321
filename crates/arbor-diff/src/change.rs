//! Field-level change records.

use std::fmt;

use arbor_value::Value;
use serde::{Deserialize, Serialize};

/// What happened to a field between the old and new struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffChangeType {
    /// Present only in the new struct.
    Added,
    /// Present only in the old struct.
    Removed,
    /// Present in both with different values.
    Modified,
}

impl fmt::Display for DiffChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// One field-level change.
///
/// `key` is the field name as a string value. The absent side of an
/// addition or removal is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueChanged {
    pub change_type: DiffChangeType,
    pub key: Value,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

impl ValueChanged {
    pub fn added(field: String, value: Value) -> Self {
        Self {
            change_type: DiffChangeType::Added,
            key: Value::String(field),
            old_value: None,
            new_value: Some(value),
        }
    }

    pub fn removed(field: String, value: Value) -> Self {
        Self {
            change_type: DiffChangeType::Removed,
            key: Value::String(field),
            old_value: Some(value),
            new_value: None,
        }
    }

    pub fn modified(field: String, old: Value, new: Value) -> Self {
        Self {
            change_type: DiffChangeType::Modified,
            key: Value::String(field),
            old_value: Some(old),
            new_value: Some(new),
        }
    }

    /// The field name carried in `key`.
    pub fn field_name(&self) -> Option<&str> {
        self.key.as_str()
    }
}

impl fmt::Display for ValueChanged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.change_type,
            self.field_name().unwrap_or("<non-string key>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_fill_the_right_side() {
        let a = ValueChanged::added("x".into(), Value::Number(1.0));
        assert_eq!(a.change_type, DiffChangeType::Added);
        assert!(a.old_value.is_none());
        assert_eq!(a.new_value, Some(Value::Number(1.0)));

        let r = ValueChanged::removed("x".into(), Value::Number(1.0));
        assert!(r.new_value.is_none());

        let m = ValueChanged::modified("x".into(), Value::Number(1.0), Value::Number(2.0));
        assert_eq!(m.field_name(), Some("x"));
        assert_eq!(m.to_string(), "modified x");
    }

    #[test]
    fn change_type_serde() {
        let json = serde_json::to_string(&DiffChangeType::Removed).unwrap();
        assert_eq!(json, "\"Removed\"");
        let back: DiffChangeType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DiffChangeType::Removed);
    }
}
