//! Current statistics of a virtual machine, one service per statistic.

use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use super::{as_f64, as_text, VERSION_MARKER};
use crate::error::Result;
use crate::section::parse_json;
use crate::{CheckResult, Metric, State};

pub const SECTION_NAME: &str = "ovirt_vmstats";

pub fn service_name(item: &str) -> String {
    format!("Ovirt {}", item)
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
struct Vm {
    #[serde(default)]
    statistics: Vec<RawStatistic>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
struct RawStatistic {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistic {
    pub name: String,
    pub description: String,
    pub value: Option<Value>,
    pub unit: Option<String>,
}

impl RawStatistic {
    /// Statistics without a name or description can neither be discovered nor graphed.
    fn complete(self) -> Option<Statistic> {
        match (self.name, self.description) {
            (Some(name), Some(description)) => Some(Statistic {
                name,
                description,
                value: self.value,
                unit: self.unit,
            }),
            (name, description) => {
                debug!("skipping statistic {:?} / {:?}", name, description);
                None
            }
        }
    }
}

/// Statistics keyed by their description.
pub type Section = BTreeMap<String, Statistic>;

pub fn parse(table: &[Vec<String>]) -> Result<Section> {
    let vm: Vm = parse_json(table, VERSION_MARKER)?;
    Ok(vm
        .statistics
        .into_iter()
        .filter_map(RawStatistic::complete)
        .map(|s| (s.description.clone(), s))
        .collect())
}

pub fn discover(section: &Section) -> Vec<String> {
    section.keys().cloned().collect()
}

pub fn check(item: &str, section: &Section) -> Vec<CheckResult> {
    let Some(stat) = section.get(item) else {
        return vec![CheckResult::new(
            State::Unknown,
            "Item not found in agent output",
        )];
    };

    let value = stat.value.as_ref().map(as_text).unwrap_or_default();
    let text = format!("{} {}", value, stat.unit.as_deref().unwrap_or_default());
    let result = CheckResult::new(State::Ok, text.trim_end());

    match stat.value.as_ref().and_then(as_f64) {
        Some(v) => vec![result.with_metric(Metric::new(&stat.name, v))],
        None => vec![result],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::string_table;

    const VM: &str = r#"{"name": "web01", "type": "server", "statistics": [
        {"name": "cpu.current.total", "type": "decimal", "unit": "percent",
         "description": "Total CPU used", "value": "12.5"},
        {"name": "memory.installed", "type": "integer", "unit": "bytes",
         "description": "Total memory configured", "value": "4294967296"}
    ]}"#;

    fn section() -> Section {
        parse(&string_table(&[&[VERSION_MARKER], &[VM]])).unwrap()
    }

    #[test]
    fn test_discover() {
        assert_eq!(
            discover(&section()),
            vec!["Total CPU used", "Total memory configured"]
        );
        assert_eq!(service_name("Total CPU used"), "Ovirt Total CPU used");
    }

    #[test]
    fn test_check() {
        let results = check("Total CPU used", &section());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].state(), State::Ok);
        assert_eq!(results[0].text(), "12.5 percent");

        let metric = results[0].metric().unwrap();
        assert_eq!(metric.name(), "cpu.current.total");
        assert_eq!(metric.value(), 12.5);
    }

    #[test]
    fn test_missing() {
        assert_eq!(check("Disk", &section())[0].state(), State::Unknown);

        let table = string_table(&[&[VERSION_MARKER], &[r#"{"name": "idle"}"#]]);
        assert!(parse(&table).unwrap().is_empty());
    }

    #[test]
    fn test_incomplete_statistics() {
        let vm = r#"{"name": "web02", "statistics": [
            {"name": "memory.installed", "description": "Total memory", "value": "1024"},
            {"description": "CPU", "value": "3"},
            {"name": "network.current.rx", "value": "7"}
        ]}"#;
        let section = parse(&string_table(&[&[VERSION_MARKER], &[vm]])).unwrap();
        assert_eq!(discover(&section), vec!["Total memory"]);
        assert_eq!(check("Total memory", &section)[0].text(), "1024");
        assert_eq!(check("CPU", &section)[0].state(), State::Unknown);
    }
}
