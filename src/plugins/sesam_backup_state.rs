//! State of SEP sesam backup groups and their tasks.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::section::parse_json;
use crate::{CheckResult, State};

pub const SECTION_NAME: &str = "sesam_backup_state";
pub const VERSION_MARKER: &str = "@sesam_version_info";

pub fn service_name(item: &str) -> String {
    format!("Sesam Backup Group {}", item)
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BackupGroup {
    pub name: String,
    #[serde(rename = "resultsSts", default)]
    pub results_sts: Option<Value>,
    #[serde(default)]
    pub tasks: Option<Vec<BackupTask>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BackupTask {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "resultsSts", default)]
    pub results_sts: Option<Value>,
}

/// Backup groups keyed by name.
pub type Section = BTreeMap<String, BackupGroup>;

pub fn parse(table: &[Vec<String>]) -> Result<Section> {
    let groups: Vec<BackupGroup> = parse_json(table, VERSION_MARKER)?;
    Ok(groups.into_iter().map(|g| (g.name.clone(), g)).collect())
}

pub fn discover(section: &Section) -> Vec<String> {
    section.keys().cloned().collect()
}

/// Reports the overall state of the group followed by one line per task, sorted by task name.
pub fn check(item: &str, section: &Section) -> Vec<CheckResult> {
    let Some(group) = section.get(item) else {
        return vec![CheckResult::new(
            State::Unknown,
            format!("Backup group {} not found in agent output", item),
        )];
    };

    let mut results = vec![status_result("Total State", group.results_sts.as_ref(), false)];

    // later tasks with the same name replace earlier ones
    let tasks: BTreeMap<&str, &BackupTask> = group
        .tasks
        .iter()
        .flatten()
        .filter_map(|t| Some((t.name.as_deref()?, t)))
        .collect();
    for (name, task) in tasks {
        results.push(status_result(name, task.results_sts.as_ref(), true));
    }

    results
}

/// Maps a raw result status to a state: `ERROR` and `2` are critical, `INFO` is a warning,
/// anything else is fine and a missing status is unknown. A numeric `2` counts like `"2"`.
pub fn status_state(status: Option<&Value>) -> State {
    match status.map(status_text).as_deref() {
        None => State::Unknown,
        Some("ERROR") | Some("2") => State::Critical,
        Some("INFO") => State::Warning,
        Some(_) => State::Ok,
    }
}

fn status_text(status: &Value) -> String {
    match status {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn status_result(key: &str, status: Option<&Value>, notice: bool) -> CheckResult {
    let text = match status {
        Some(sts) => format!("{}: {}", key, status_text(sts)),
        None => format!("{}: Unknown last Execution Result", key),
    };
    let state = status_state(status);
    if notice {
        CheckResult::notice(state, text)
    } else {
        CheckResult::new(state, text)
    }
}
