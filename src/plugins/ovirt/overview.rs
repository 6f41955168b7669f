//! Engine overview: product version, object counts and global maintenance.

use serde::Deserialize;
use serde_json::Value;

use super::{as_text, Version, VERSION_MARKER};
use crate::error::Result;
use crate::section::parse_json;
use crate::{CheckResult, State};

pub const SECTION_NAME: &str = "ovirt_overview";
pub const SERVICE_NAME: &str = "Ovirt Engine";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub global_maintenance: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Api {
    #[serde(default)]
    pub product_info: Option<ProductInfo>,
    #[serde(default)]
    pub summary: Option<Summary>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub version: Option<Version>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub hosts: Option<Counts>,
    #[serde(default)]
    pub storage_domains: Option<Counts>,
    #[serde(default)]
    pub vms: Option<Counts>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Counts {
    #[serde(default)]
    pub active: Option<Value>,
    #[serde(default)]
    pub total: Option<Value>,
}

impl Counts {
    fn describe(&self, what: &str) -> String {
        let count = |v: &Option<Value>| v.as_ref().map(as_text).unwrap_or_else(|| "0".to_owned());
        format!("{} of {} {} active", count(&self.active), count(&self.total), what)
    }
}

pub fn parse(table: &[Vec<String>]) -> Result<Section> {
    parse_json(table, VERSION_MARKER)
}

pub fn check(section: &Section) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if let Some(full_version) = section
        .api
        .product_info
        .as_ref()
        .and_then(|p| p.version.as_ref())
        .and_then(|v| v.full_version.as_ref())
    {
        results.push(CheckResult::new(
            State::Ok,
            format!("Ovirt Engine {}", full_version),
        ));
    }

    if let Some(summary) = &section.api.summary {
        let counts = [
            (&summary.hosts, "hosts"),
            (&summary.storage_domains, "storage domains"),
            (&summary.vms, "vms"),
        ];
        for (count, what) in counts {
            if let Some(count) = count {
                results.push(CheckResult::new(State::Ok, count.describe(what)));
            }
        }
    }

    match section.global_maintenance {
        Some(true) => results.push(CheckResult::new(
            State::Critical,
            "Global maintenance active",
        )),
        Some(false) => results.push(CheckResult::new(State::Ok, "Global maintenance off")),
        None => {}
    }

    results.push(CheckResult::notice(State::Ok, "Ovirt Engine"));
    results
}
