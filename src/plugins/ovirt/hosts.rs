//! Hypervisor hosts, reported piggyback for each host.

use serde::Deserialize;
use serde_json::Value;

use super::{as_text, is_true, VERSION_MARKER};
use crate::error::Result;
use crate::section::parse_json;
use crate::{CheckResult, State};

pub const SECTION_NAME: &str = "ovirt_hosts";
pub const SERVICE_NAME: &str = "Ovirt Host";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(rename = "type", default)]
    pub host_type: Option<Value>,
    #[serde(default)]
    pub version: Option<HostVersion>,
    #[serde(default)]
    pub hosted_engine: Option<HostedEngine>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HostVersion {
    #[serde(default)]
    pub full_version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HostedEngine {
    #[serde(default)]
    pub local_maintenance: Option<Value>,
}

pub fn parse(table: &[Vec<String>]) -> Result<Section> {
    parse_json(table, VERSION_MARKER)
}

pub fn check(section: &Section) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if let Some(status) = &section.status {
        results.push(CheckResult::new(State::Ok, format!("Status: {}", as_text(status))));
    }
    if let Some(host_type) = &section.host_type {
        results.push(CheckResult::new(State::Ok, format!("Type: {}", as_text(host_type))));
    }
    if let Some(full_version) = section.version.as_ref().and_then(|v| v.full_version.as_ref()) {
        results.push(CheckResult::new(State::Ok, format!("Version: {}", full_version)));
    }
    if let Some(local_maintenance) = section
        .hosted_engine
        .as_ref()
        .and_then(|h| h.local_maintenance.as_ref())
    {
        results.push(if is_true(local_maintenance) {
            CheckResult::new(State::Warning, "Local maintenance active")
        } else {
            CheckResult::new(State::Ok, "Local maintenance off")
        });
    }

    results.push(CheckResult::notice(State::Ok, "Ovirt Host"));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::string_table;

    #[test]
    fn test_check() {
        let host = r#"{"name": "hv01", "status": "up", "type": "rhel",
            "version": {"full_version": "vdsm-4.40.100.2-1.el8"},
            "hosted_engine": {"local_maintenance": "true"}}"#;
        let section = parse(&string_table(&[&[VERSION_MARKER], &[host]])).unwrap();
        let results = check(&section);

        let lines: Vec<(State, &str)> = results.iter().map(|r| (r.state(), r.text())).collect();
        assert_eq!(
            lines,
            vec![
                (State::Ok, "Status: up"),
                (State::Ok, "Type: rhel"),
                (State::Ok, "Version: vdsm-4.40.100.2-1.el8"),
                (State::Warning, "Local maintenance active"),
                (State::Ok, "Ovirt Host"),
            ]
        );
    }

    #[test]
    fn test_check_partial() {
        let host = r#"{"status": "maintenance", "hosted_engine": {"local_maintenance": "false"}}"#;
        let section = parse(&string_table(&[&[VERSION_MARKER], &[host]])).unwrap();
        let results = check(&section);
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].text(), "Local maintenance off");
    }

    #[test]
    fn test_parse_requires_header() {
        let table = string_table(&[&["{}"]]);
        assert!(parse(&table).is_err());
    }
}
