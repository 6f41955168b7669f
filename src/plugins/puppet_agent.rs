//! Puppet agent run summaries.
//!
//! ```text
//! <<<puppet_agent>>>
//! last_run: 1439475966
//! resources_changed: 3
//! resources_failed: 0
//! resources_total: 77
//! events_failure: 0
//! events_success: 3
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::levels::{check_levels, Levels};
use crate::render::timespan;
use crate::{CheckResult, State};

pub const SECTION_NAME: &str = "puppet_agent";
pub const EVENTS_SERVICE_NAME: &str = "Puppet Agent Events Failure";
pub const LASTRUN_SERVICE_NAME: &str = "Puppet Agent Last Run";

pub fn resource_service_name(item: &str) -> String {
    format!("Puppet Agent {}", item)
}

/// Resource counters and the titles their services are named after.
pub const RESOURCES: [(&str, &str); 8] = [
    ("resources_changed", "Resource Changed"),
    ("resources_failed", "Resource Failed"),
    ("resources_failed_to_restart", "Resource Failed to Restart"),
    ("resources_out_of_sync", "Resources Out Of Sync"),
    ("resources_restarted", "Resources Restarted"),
    ("resources_scheduled", "Resources Scheduled"),
    ("resources_skipped", "Resources Skipped"),
    ("resources_total", "Resources Total"),
];

const NOT_FOUND: &str = "Item not found in agent output";

/// Values keyed by name, without the trailing colon.
pub type Section = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsParams {
    pub levels: (f64, f64),
}

impl Default for EventsParams {
    fn default() -> Self {
        EventsParams { levels: (2.0, 5.0) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastRunParams {
    /// Age of the last run in seconds.
    pub levels: (f64, f64),
}

impl Default for LastRunParams {
    fn default() -> Self {
        LastRunParams {
            levels: (86400.0, 604800.0),
        }
    }
}

pub fn parse(table: &[Vec<String>]) -> Section {
    table
        .iter()
        .filter_map(|row| {
            let key = row.first()?;
            let key = key.strip_suffix(':').unwrap_or(key);
            let value = row.get(1).cloned().unwrap_or_default();
            Some((key.to_owned(), value))
        })
        .collect()
}

pub fn discover_events(section: &Section) -> bool {
    section.contains_key("events_failure")
}

pub fn check_events(params: &EventsParams, section: &Section) -> Vec<CheckResult> {
    let Some(raw) = section.get("events_failure") else {
        return vec![CheckResult::new(State::Unknown, NOT_FOUND)];
    };
    let Some(failures) = parse_count(raw) else {
        return vec![invalid_value("events_failure", raw)];
    };

    let (warn, crit) = params.levels;
    vec![check_levels(failures, "Events Failure")
        .with_upper(Levels::from(params.levels))
        .with_metric("puppet_agent_failure")
        .with_boundaries(Some(warn), Some(crit))
        .with_render(|v| format!("{}", v as i64))
        .evaluate()]
}

pub fn discover_lastrun(section: &Section) -> bool {
    section.contains_key("last_run")
}

/// Checks the age of the last run relative to `now`, both in seconds since the epoch.
pub fn check_lastrun(params: &LastRunParams, section: &Section, now: u64) -> Vec<CheckResult> {
    let Some(raw) = section.get("last_run") else {
        return vec![CheckResult::new(State::Unknown, NOT_FOUND)];
    };
    let Some(last_run) = parse_count(raw) else {
        return vec![invalid_value("last_run", raw)];
    };

    let (warn, crit) = params.levels;
    vec![check_levels(now as f64 - last_run, "Last Execution")
        .with_upper(Levels::from(params.levels))
        .with_metric("puppet_agent_lastrun")
        .with_boundaries(Some(warn), Some(crit))
        .with_render(|seconds| format!("{} ago", timespan(seconds)))
        .evaluate()]
}

/// One service per resource counter present in the section, named by its title.
pub fn discover_resources(section: &Section) -> Vec<String> {
    RESOURCES
        .iter()
        .filter(|(key, _)| section.contains_key(*key))
        .map(|(_, title)| title.to_string())
        .collect()
}

pub fn check_resources(item: &str, section: &Section) -> Vec<CheckResult> {
    let value = RESOURCES
        .iter()
        .find(|(_, title)| *title == item)
        .and_then(|(key, _)| section.get(*key));

    match value {
        Some(value) => vec![CheckResult::new(State::Ok, format!("{}: {}", item, value))],
        None => vec![CheckResult::new(State::Unknown, NOT_FOUND)],
    }
}

fn parse_count(raw: &str) -> Option<f64> {
    raw.trim().parse::<i64>().ok().map(|v| v as f64)
}

fn invalid_value(key: &str, raw: &str) -> CheckResult {
    CheckResult::new(State::Unknown, format!("Invalid value for {}: {:?}", key, raw))
}
