//! Snapshots of virtual machines, either per VM (piggyback section `ovirt_snapshots`) or for all
//! VMs of the engine at once (`ovirt_snapshots_engine`).

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::VERSION_MARKER;
use crate::error::Result;
use crate::section::{parse_json, parse_json_rows};
use crate::{CheckResult, State};

pub const SECTION_NAME: &str = "ovirt_snapshots";
pub const ENGINE_SECTION_NAME: &str = "ovirt_snapshots_engine";
pub const SERVICE_NAME: &str = "Ovirt Snapshots";

const NONE_FOUND: &str = "No Snapshots found";
const SECTION_EMPTY: &str = "No Snapshots found.";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub snapshot_type: Option<String>,
    #[serde(default)]
    pub snapshot_status: Option<String>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub id: Option<String>,
}

impl Snapshot {
    /// The active snapshot is the running state of a VM, not a snapshot anybody took.
    pub fn is_active(&self) -> bool {
        self.snapshot_type.as_deref() == Some("active")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
struct Vm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    snapshots: Vec<Snapshot>,
}

/// Snapshots of a single VM.
pub type Section = Vec<Snapshot>;

/// Snapshots keyed by VM name.
pub type EngineSection = BTreeMap<String, Vec<Snapshot>>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotParams {
    /// State reported when snapshots are found.
    pub state: State,
    /// Patterns of descriptions to report even if ignored.
    pub allow: Vec<String>,
    /// Patterns of descriptions to ignore.
    pub ignore: Vec<String>,
}

impl Default for SnapshotParams {
    fn default() -> Self {
        SnapshotParams {
            state: State::Warning,
            allow: Vec::new(),
            ignore: Vec::new(),
        }
    }
}

/// Decides which snapshots are reported.
///
/// A snapshot is left out if its description matches an ignore pattern and no allow pattern.
/// With allow patterns but no ignore patterns everything else is ignored, which turns the allow
/// patterns into a whitelist. Patterns match at the start of the description.
#[derive(Clone, Debug)]
pub struct SnapshotFilter {
    ignore: Vec<Regex>,
    allow: Vec<Regex>,
}

impl SnapshotFilter {
    pub fn new(params: &SnapshotParams) -> Result<Self> {
        let mut ignore = compile(&params.ignore)?;
        let allow = compile(&params.allow)?;

        if ignore.is_empty() && !allow.is_empty() {
            ignore.push(Regex::new(".*")?);
        }

        Ok(SnapshotFilter { ignore, allow })
    }

    /// Whether the snapshot is reported. Active snapshots and snapshots without a description
    /// never are.
    pub fn admits(&self, snapshot: &Snapshot) -> bool {
        if snapshot.is_active() {
            return false;
        }
        let Some(description) = snapshot.description.as_deref() else {
            return false;
        };

        let ignored = self.ignore.iter().any(|r| r.is_match(description));
        let allowed = self.allow.iter().any(|r| r.is_match(description));
        !ignored || allowed
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Ok(Regex::new(&format!("^(?:{})", p))?))
        .collect()
}

pub fn parse(table: &[Vec<String>]) -> Result<Section> {
    let vm: Vm = parse_json(table, VERSION_MARKER)?;
    Ok(vm.snapshots)
}

/// Every row after the marker holds one VM.
pub fn parse_engine(table: &[Vec<String>]) -> Result<EngineSection> {
    let vms: Vec<Vm> = parse_json_rows(table, VERSION_MARKER)?;
    Ok(vms.into_iter().map(|vm| (vm.name, vm.snapshots)).collect())
}

/// An empty section reads "No Snapshots found." while snapshots that are all filtered out read
/// "No Snapshots found".
pub fn check(params: &SnapshotParams, section: &Section) -> Vec<CheckResult> {
    if section.is_empty() {
        return vec![CheckResult::new(State::Ok, SECTION_EMPTY)];
    }
    report(params, |filter| {
        section
            .iter()
            .filter(|s| filter.admits(s))
            .filter_map(|s| s.description.clone())
            .collect()
    })
}

/// Like [check], the empty variant only applies to a section without any VM.
pub fn check_engine(params: &SnapshotParams, section: &EngineSection) -> Vec<CheckResult> {
    if section.is_empty() {
        return vec![CheckResult::new(State::Ok, SECTION_EMPTY)];
    }
    report(params, |filter| {
        section
            .iter()
            .flat_map(move |(vm, snapshots)| {
                snapshots
                    .iter()
                    .filter(move |s| filter.admits(s))
                    .filter_map(move |s| {
                        Some(format!("{} (on vm {})", s.description.as_ref()?, vm))
                    })
            })
            .collect()
    })
}

fn report(
    params: &SnapshotParams,
    found: impl FnOnce(&SnapshotFilter) -> Vec<String>,
) -> Vec<CheckResult> {
    let filter = match SnapshotFilter::new(params) {
        Ok(filter) => filter,
        Err(err) => return vec![CheckResult::new(State::Unknown, err.to_string())],
    };

    let found = found(&filter);
    if found.is_empty() {
        vec![CheckResult::new(State::Ok, NONE_FOUND)]
    } else {
        vec![CheckResult::new(
            params.state,
            format!("Found Snapshots: {}", found.join(", ")),
        )]
    }
}
