//! The mk_plugins crate provides parse, discovery and check functions for a monitoring host:
//! optical transceiver diagnostics, backup group states, puppet agent runs and oVirt engines.
//!
//! Every plugin is a set of plain functions. Nothing is registered globally, callers wire the
//! plugins they need explicitly:
//!
//! ```rust
//! # use mk_plugins::plugins::sesam_backup_state;
//! # use mk_plugins::section::string_table;
//! # use mk_plugins::State;
//! let table = string_table(&[
//!     &["@sesam_version_info"],
//!     &[r#"[{"name": "daily", "resultsSts": "SUCCESSFUL", "tasks": []}]"#],
//! ]);
//! let section = sesam_backup_state::parse(&table).unwrap();
//! assert_eq!(sesam_backup_state::discover(&section), vec!["daily".to_string()]);
//!
//! let results = sesam_backup_state::check("daily", &section);
//! assert_eq!(results[0].state(), State::Ok);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::process;

use serde::{Deserialize, Serialize};

#[macro_use]
mod macros;

pub mod bakery;
pub mod error;
pub mod interfaces;
pub mod levels;
pub mod plugins;
pub mod render;
mod runner;
pub mod section;
pub mod units;

pub use crate::error::{Error, Result};
pub use crate::levels::{check_levels, Levels, TriggerIfValue};
pub use crate::runner::{safe_run, Runner, RunnerResult};
pub use crate::section::StringTable;

/// A Service is the unit the monitoring host shows to its users: a name and the ordered
/// results of one check invocation.
///
/// The state of a service is the worst state of its results. A service without any result
/// is unknown.
///
/// ```rust
/// # #[macro_use]
/// # extern crate mk_plugins;
/// # use mk_plugins::{CheckResult, Metric, State};
/// # fn main() {
/// let r1 = CheckResult::new(State::Ok, "Status: up").with_metric(Metric::new("test", 12.0));
/// let r2 = CheckResult::notice(State::Ok, "details only");
/// let service = service![r1, r2];
/// assert_eq!(&service.to_nagios_string(), "OK: Status: up | test=12");
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Service {
    name: Option<String>,
    results: Vec<CheckResult>,
}

impl Service {
    pub fn new(name: &str) -> Service {
        Service {
            name: Some(name.to_owned()),
            results: Vec::new(),
        }
    }

    pub fn unnamed() -> Service {
        Service::default()
    }

    /// Pushes a single result into the service.
    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result)
    }

    pub fn with_result(mut self, result: CheckResult) -> Self {
        self.push(result);
        self
    }

    pub fn with_results(mut self, results: impl IntoIterator<Item = CheckResult>) -> Self {
        self.results.extend(results);
        self
    }

    /// Returns a slice of the pushed results.
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The worst state of all results, [State::Unknown] if there are none.
    pub fn state(&self) -> State {
        self.results
            .iter()
            .map(CheckResult::state)
            .reduce(State::worst)
            .unwrap_or(State::Unknown)
    }

    /// Returns a line the monitoring host understands: the name, the state, every summary
    /// text and every notice which is not OK, followed by the performance data.
    pub fn to_nagios_string(&self) -> String {
        let mut s = String::new();

        if let Some(ref name) = self.name {
            s.push_str(&format!("{} ", name))
        }

        s.push_str(&self.state().to_string());

        let texts: Vec<String> = self
            .results
            .iter()
            .filter(|r| !r.is_notice() || r.state() != State::Ok)
            .filter(|r| !r.text().is_empty())
            .map(|r| format!("{}{}", r.text(), r.state().marker()))
            .collect();
        if !texts.is_empty() {
            s.push_str(&format!(": {}", texts.join(", ")));
        }

        let metrics: Vec<String> = self
            .results
            .iter()
            .filter_map(CheckResult::metric)
            .map(ToPerfString::to_perf_string)
            .collect();
        if !metrics.is_empty() {
            s.push_str(" |");
            for metric in metrics {
                s.push_str(&format!(" {}", metric));
            }
        }

        s
    }

    /// Every text including notices, one per line, the way a details view shows them.
    pub fn details(&self) -> String {
        self.results
            .iter()
            .map(|r| format!("{}{}", r.text(), r.state().marker()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Will return the exit code of the determined state via Self::state.
    pub fn exit_code(&self) -> i32 {
        self.state().exit_code()
    }

    /// Will print Self::to_nagios_string and exit with the exit code from Self::exit_code
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}

/// Represents a service state of the monitoring host.
///
/// Parameters encode states the way the host does, as the integers 0 to 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum State {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl State {
    /// Returns the corresponding exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            State::Ok => 0,
            State::Warning => 1,
            State::Critical => 2,
            State::Unknown => 3,
        }
    }

    /// Returns the more severe of both states. Critical beats unknown, unknown beats warning.
    pub fn worst(self, other: State) -> State {
        if other > self {
            other
        } else {
            self
        }
    }

    /// Suffix appended to texts of results in this state.
    pub fn marker(&self) -> &'static str {
        match self {
            State::Ok => "",
            State::Warning => "(!)",
            State::Critical => "(!!)",
            State::Unknown => "(?)",
        }
    }

    fn severity(&self) -> u8 {
        match self {
            State::Ok => 0,
            State::Warning => 1,
            State::Unknown => 2,
            State::Critical => 3,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Ok => "OK",
            State::Warning => "WARNING",
            State::Critical => "CRITICAL",
            State::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &State) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &State) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl TryFrom<u8> for State {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(State::Ok),
            1 => Ok(State::Warning),
            2 => Ok(State::Critical),
            3 => Ok(State::Unknown),
            other => Err(format!("invalid state {other}, expected 0 to 3")),
        }
    }
}

impl From<State> for u8 {
    fn from(state: State) -> u8 {
        state.exit_code() as u8
    }
}

/// A single line of check output: a state, a text and an optional metric.
///
/// Notices only show up in the details of a service unless their state is not OK.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckResult {
    state: State,
    text: String,
    notice: bool,
    metric: Option<Metric>,
}

impl CheckResult {
    pub fn new(state: State, summary: impl Into<String>) -> Self {
        CheckResult {
            state,
            text: summary.into(),
            notice: false,
            metric: None,
        }
    }

    pub fn notice(state: State, text: impl Into<String>) -> Self {
        CheckResult {
            notice: true,
            ..CheckResult::new(state, text)
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_notice(&self) -> bool {
        self.notice
    }

    pub fn metric(&self) -> Option<&Metric> {
        self.metric.as_ref()
    }
}

/// Returns the worst state of the given results, [State::Unknown] for no results.
pub fn worst_state<'a>(results: impl IntoIterator<Item = &'a CheckResult>) -> State {
    results
        .into_iter()
        .map(CheckResult::state)
        .reduce(State::worst)
        .unwrap_or(State::Unknown)
}

/// The purpose of ToPerfString is only so one can define custom representations of custom types
/// without using the ToString trait so we don't interfere with that.
///
/// Also used internally for generation of the final output.
pub trait ToPerfString {
    fn to_perf_string(&self) -> String;
}

impl_to_perf_string_on_to_string!(f64);

impl<T> ToPerfString for Option<T>
where
    T: ToPerfString,
{
    fn to_perf_string(&self) -> String {
        match self {
            Some(ref s) => s.to_perf_string(),
            None => String::new(),
        }
    }
}

/// A numeric measurement attached to a check result, rendered as performance data.
///
/// ```rust
/// # use mk_plugins::{Metric, ToPerfString};
/// let metric = Metric::new("fs_used", 512.0)
///     .with_levels(Some(800.0), Some(900.0))
///     .with_boundaries(Some(0.0), Some(1024.0));
/// assert_eq!(&metric.to_perf_string(), "fs_used=512;800;900;0;1024");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    name: String,
    value: f64,
    warning: Option<f64>,
    critical: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

impl Metric {
    pub fn new(name: &str, value: f64) -> Self {
        Metric {
            name: name.to_owned(),
            value,
            warning: None,
            critical: None,
            min: None,
            max: None,
        }
    }

    pub fn with_levels(mut self, warning: Option<f64>, critical: Option<f64>) -> Self {
        self.warning = warning;
        self.critical = critical;
        self
    }

    pub fn with_boundaries(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn warning(&self) -> Option<f64> {
        self.warning
    }

    pub fn critical(&self) -> Option<f64> {
        self.critical
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }
}

impl ToPerfString for Metric {
    fn to_perf_string(&self) -> String {
        // replace `=`
        let name = self.name.replace('=', "_");

        // quote `'`
        let name = name.replace('\'', "''");

        // quote if contains spaces
        let name = if name.contains(' ') {
            format!("'{}'", name)
        } else {
            name
        };

        perf_string!(
            name,
            self.value,
            self.warning,
            self.critical,
            self.min,
            self.max
        )
    }
}
