//! oVirt engine checks. The agent plugin writes every section as a version marker row followed
//! by JSON documents taken from the engine's REST API.

use serde::Deserialize;
use serde_json::Value;

pub mod compatibility;
pub mod hosts;
pub mod overview;
pub mod snapshots;
pub mod storage_domains;
pub mod vmstats;

pub const SECTION_PREFIX: &str = "ovirt";
pub const VERSION_MARKER: &str = "@ovirt_version_info";

/// A version as the engine API reports it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Version {
    #[serde(default)]
    pub major: Option<Value>,
    #[serde(default)]
    pub minor: Option<Value>,
    #[serde(default)]
    pub full_version: Option<String>,
}

impl Version {
    fn parts(&self) -> Option<(i64, i64)> {
        Some((as_f64(self.major.as_ref()?)? as i64, as_f64(self.minor.as_ref()?)? as i64))
    }

    pub fn is_empty(&self) -> bool {
        self.major.is_none() && self.minor.is_none() && self.full_version.is_none()
    }

    pub fn same_as(&self, other: &Version) -> bool {
        matches!((self.parts(), other.parts()), (Some(a), Some(b)) if a == b)
    }

    /// `None` if either side lacks a major or minor number.
    pub fn at_least(&self, other: &Version) -> Option<bool> {
        Some(self.parts()? >= other.parts()?)
    }

    pub fn short(&self) -> String {
        match self.parts() {
            Some((major, minor)) => format!("{}.{}", major, minor),
            None => "Unknown".to_owned(),
        }
    }
}

/// The engine serializes most numbers as strings.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Renders a scalar without JSON quoting.
pub(crate) fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a flag is set, be it `true` or `"true"`.
pub(crate) fn is_true(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn version(v: Value) -> Version {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_version() {
        let v44 = version(json!({"major": 4, "minor": 4}));
        let v43 = version(json!({"major": "4", "minor": "3"}));
        let v51 = version(json!({"major": 5, "minor": 1}));
        let empty = version(json!({}));

        assert_eq!(v44.short(), "4.4");
        assert_eq!(empty.short(), "Unknown");
        assert!(empty.is_empty());

        assert_eq!(v44.at_least(&v43), Some(true));
        assert_eq!(v43.at_least(&v44), Some(false));
        assert_eq!(v51.at_least(&v44), Some(true));
        assert_eq!(v44.at_least(&empty), None);

        assert!(v44.same_as(&version(json!({"major": "4", "minor": 4}))));
        assert!(!v44.same_as(&v43));
        assert!(!empty.same_as(&empty));
    }

    #[test]
    fn test_json_helpers() {
        assert_eq!(as_f64(&json!("1024")), Some(1024.0));
        assert_eq!(as_f64(&json!(2.5)), Some(2.5));
        assert_eq!(as_f64(&json!(null)), None);
        assert_eq!(as_text(&json!("up")), "up");
        assert_eq!(as_text(&json!(3)), "3");
        assert!(is_true(&json!("true")));
        assert!(is_true(&json!(true)));
        assert!(!is_true(&json!("false")));
    }
}
