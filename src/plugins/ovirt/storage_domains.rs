//! Capacity of storage domains.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{as_f64, VERSION_MARKER};
use crate::error::Result;
use crate::levels::{Levels, TriggerIfValue};
use crate::render::{bytes, percent};
use crate::section::parse_json;
use crate::{CheckResult, Metric, State};

pub const SECTION_NAME: &str = "ovirt_storage_domains";

const MIB: f64 = 1024.0 * 1024.0;

pub fn service_name(item: &str) -> String {
    format!("oVirt Storage Domain {}", item)
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
struct Document {
    #[serde(default)]
    storage_domains: Vec<RawDomain>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
struct RawDomain {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    committed: Option<Value>,
    #[serde(default)]
    available: Option<Value>,
    #[serde(default)]
    used: Option<Value>,
}

impl RawDomain {
    /// Without name and id a domain has no item.
    fn complete(self) -> Option<StorageDomain> {
        let (Some(name), Some(id)) = (self.name, self.id) else {
            debug!("skipping storage domain without name or id");
            return None;
        };
        Some(StorageDomain {
            name,
            id,
            status: self.status,
            committed: self.committed,
            available: self.available,
            used: self.used,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StorageDomain {
    pub name: String,
    pub id: String,
    pub status: Option<String>,
    pub committed: Option<Value>,
    pub available: Option<Value>,
    pub used: Option<Value>,
}

impl StorageDomain {
    pub fn item(&self) -> String {
        format!("{} id {}", self.name, self.id)
    }

    pub fn is_inactive(&self) -> bool {
        self.status.as_deref() == Some("inactive")
    }

    fn bytes(value: &Option<Value>) -> f64 {
        value.as_ref().and_then(as_f64).unwrap_or(0.0)
    }
}

pub type Section = Vec<StorageDomain>;

/// Filesystem style levels on the used space of a domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemParams {
    /// Warning and critical level in percent of used space. Negative levels are percent of
    /// free space instead.
    pub levels: (f64, f64),
}

impl Default for FilesystemParams {
    fn default() -> Self {
        FilesystemParams {
            levels: (80.0, 90.0),
        }
    }
}

impl FilesystemParams {
    /// The levels as percent of used space.
    pub fn used_levels(&self) -> Levels {
        let used = |level: f64| if level < 0.0 { 100.0 + level } else { level };
        Levels::fixed(used(self.levels.0), used(self.levels.1))
    }
}

pub fn parse(table: &[Vec<String>]) -> Result<Section> {
    let document: Document = parse_json(table, VERSION_MARKER)?;
    Ok(document
        .storage_domains
        .into_iter()
        .filter_map(RawDomain::complete)
        .collect())
}

pub fn discover(section: &Section) -> Vec<String> {
    section
        .iter()
        .filter(|d| !d.is_inactive())
        .map(StorageDomain::item)
        .collect()
}

pub fn check(item: &str, params: &FilesystemParams, section: &Section) -> Vec<CheckResult> {
    let Some(domain) = section.iter().find(|d| d.item() == item) else {
        return vec![CheckResult::new(
            State::Unknown,
            format!("Storage domain {} not found in agent output", item),
        )];
    };

    if domain.is_inactive() {
        return vec![CheckResult::new(State::Unknown, "Storage Domain inactive")];
    }

    let available = StorageDomain::bytes(&domain.available);
    let used = StorageDomain::bytes(&domain.used);
    let size = available + used;
    if size == 0.0 {
        return vec![CheckResult::new(
            State::Unknown,
            "Size of Storage Domain not available",
        )];
    }

    let used_percent = used / size * 100.0;
    let levels = params.used_levels();
    let state = levels.state(used_percent, TriggerIfValue::Greater);

    let mut text = format!(
        "Used: {} - {} of {}",
        percent(used_percent),
        bytes(used),
        bytes(size)
    );
    if state != State::Ok {
        text.push(' ');
        text.push_str(&levels.describe(TriggerIfValue::Greater, percent));
    }

    let size_mib = size / MIB;
    let to_mib = |level: Option<f64>| level.map(|l| l * size_mib / 100.0);
    let mut results = vec![
        CheckResult::new(state, text).with_metric(
            Metric::new("fs_used", used / MIB)
                .with_levels(to_mib(levels.warn), to_mib(levels.crit))
                .with_boundaries(Some(0.0), Some(size_mib)),
        ),
        CheckResult::notice(State::Ok, format!("Size: {}", bytes(size)))
            .with_metric(Metric::new("fs_size", size_mib)),
        CheckResult::notice(State::Ok, format!("Usage: {}", percent(used_percent))).with_metric(
            Metric::new("fs_used_percent", used_percent)
                .with_levels(levels.warn, levels.crit)
                .with_boundaries(Some(0.0), Some(100.0)),
        ),
    ];

    if let Some(committed) = domain.committed.as_ref().and_then(as_f64) {
        results.push(CheckResult::notice(
            State::Ok,
            format!("Committed: {}", bytes(committed)),
        ));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::string_table;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn section() -> Section {
        let document = format!(
            r#"{{"storage_domains": [
                {{"name": "data", "id": "a1", "status": "active",
                  "available": "{}", "used": "{}", "committed": "{}"}},
                {{"name": "iso", "id": "b2", "status": "inactive"}},
                {{"name": "export", "id": "c3", "available": 0, "used": 0}},
                {{"name": "full", "id": "d4", "available": {}, "used": {}}}
            ]}}"#,
            6 * GIB,
            4 * GIB,
            2 * GIB,
            GIB / 2,
            19 * GIB / 2
        );
        parse(&string_table(&[&[VERSION_MARKER], &[document.as_str()]])).unwrap()
    }

    #[test]
    fn test_discover() {
        assert_eq!(discover(&section()), vec!["data id a1", "export id c3", "full id d4"]);
    }

    #[test]
    fn test_check_ok() {
        let results = check("data id a1", &FilesystemParams::default(), &section());
        assert_eq!(results[0].state(), State::Ok);
        assert_eq!(results[0].text(), "Used: 40.00% - 4.00 GiB of 10.00 GiB");

        let fs_used = results[0].metric().unwrap();
        assert_eq!(fs_used.value(), 4096.0);
        assert_eq!(fs_used.warning(), Some(8192.0));
        assert_eq!(fs_used.max(), Some(10240.0));
        assert_eq!(results[1].metric().unwrap().value(), 10240.0);
        assert_eq!(results[3].text(), "Committed: 2.00 GiB");
    }

    #[test]
    fn test_check_levels() {
        let results = check("full id d4", &FilesystemParams::default(), &section());
        assert_eq!(results[0].state(), State::Critical);
        assert_eq!(
            results[0].text(),
            "Used: 95.00% - 9.50 GiB of 10.00 GiB (warn/crit at 80.00%/90.00%)"
        );

        let params = FilesystemParams {
            levels: (-2.0, -1.0),
        };
        assert_eq!(params.used_levels(), Levels::fixed(98.0, 99.0));
        assert_eq!(check("full id d4", &params, &section())[0].state(), State::Ok);
    }

    #[test]
    fn test_check_unavailable() {
        let section = section();
        let params = FilesystemParams::default();

        let results = check("iso id b2", &params, &section);
        assert_eq!(results[0].state(), State::Unknown);
        assert_eq!(results[0].text(), "Storage Domain inactive");

        let results = check("export id c3", &params, &section);
        assert_eq!(results[0].text(), "Size of Storage Domain not available");

        assert_eq!(check("nope id 0", &params, &section)[0].state(), State::Unknown);
    }

    #[test]
    fn test_incomplete_domains() {
        let document = r#"{"storage_domains": [
            {"name": "data", "id": "a1", "available": 3, "used": 1},
            {"name": "orphan", "available": 3, "used": 1},
            {"id": "e5", "status": "active"}
        ]}"#;
        let section = parse(&string_table(&[&[VERSION_MARKER], &[document]])).unwrap();
        assert_eq!(section.len(), 1);
        assert_eq!(discover(&section), vec!["data id a1"]);
        let results = check("data id a1", &FilesystemParams::default(), &section);
        assert_eq!(results[0].state(), State::Ok);
    }
}
