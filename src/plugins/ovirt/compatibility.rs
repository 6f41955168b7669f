//! Version compatibility of clusters with the engine and their data centers.

use std::collections::HashMap;

use serde::Deserialize;

use super::{Version, VERSION_MARKER};
use crate::error::Result;
use crate::section::parse_json;
use crate::{CheckResult, State};

pub const SECTION_NAME: &str = "ovirt_compatibility";
pub const SERVICE_NAME: &str = "oVirt Storage Compatibility";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub datacenters: Vec<DataCenter>,
    #[serde(default)]
    pub cluster: Vec<Cluster>,
    #[serde(default)]
    pub engine: Option<Engine>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DataCenter {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub supported_versions: Option<SupportedVersions>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SupportedVersions {
    #[serde(default)]
    pub version: Vec<Version>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub data_center: Option<DataCenterRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DataCenterRef {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Engine {
    #[serde(default)]
    pub version: Option<Version>,
}

pub fn parse(table: &[Vec<String>]) -> Result<Section> {
    parse_json(table, VERSION_MARKER)
}

pub fn check(section: &Section) -> Vec<CheckResult> {
    let data_centers: HashMap<&str, &DataCenter> = section
        .datacenters
        .iter()
        .map(|dc| (dc.id.as_str(), dc))
        .collect();
    let engine_version = section
        .engine
        .as_ref()
        .and_then(|e| e.version.as_ref())
        .filter(|v| !v.is_empty());

    let mut results = vec![CheckResult::new(
        State::Ok,
        format!(
            "Checked {} datacenters and {} clusters",
            data_centers.len(),
            section.cluster.len()
        ),
    )];

    for cluster in &section.cluster {
        let Some(dc_id) = cluster.data_center.as_ref().and_then(|dc| dc.id.as_deref()) else {
            continue;
        };
        let Some(dc) = data_centers.get(dc_id) else {
            results.push(CheckResult::new(
                State::Unknown,
                format!("Could not find data center {} in plugin output", dc_id),
            ));
            continue;
        };

        let cluster_version = cluster.version.clone().unwrap_or_default();

        if let Some(engine_version) = engine_version {
            let outdated = cluster_version.at_least(engine_version) == Some(false);
            if !cluster_version.is_empty() && outdated {
                results.push(CheckResult::new(
                    State::Warning,
                    format!(
                        "Cluster {} version ({}) is lower than engine ({})!",
                        cluster.name,
                        cluster_version.short(),
                        engine_version.short()
                    ),
                ));
            }
        }

        let supported = dc
            .supported_versions
            .as_ref()
            .map(|s| s.version.as_slice())
            .unwrap_or_default();
        if !supported.iter().any(|v| cluster_version.same_as(v)) {
            results.push(CheckResult::new(
                State::Warning,
                format!(
                    "Cluster {} version ({}) not compatible to DataCenter!",
                    cluster.name,
                    cluster_version.short()
                ),
            ));
        }
    }

    results.push(CheckResult::notice(State::Ok, "Ovirt Engine"));
    results
}
