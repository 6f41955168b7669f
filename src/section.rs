//! Agent sections: the raw row tables handed to parse functions, embedded JSON documents
//! guarded by a version marker row, and the framing agents write sections in.

use std::collections::BTreeMap;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Rows of string fields, as split by the collector.
pub type StringTable = Vec<Vec<String>>;

/// Builds a [StringTable] from string slices.
pub fn string_table(rows: &[&[&str]]) -> StringTable {
    rows.iter()
        .map(|row| row.iter().map(|f| f.to_string()).collect())
        .collect()
}

/// Fails unless the first field of the first row is `marker`.
pub fn expect_marker(table: &[Vec<String>], marker: &str) -> Result<()> {
    match table.first().and_then(|row| row.first()) {
        Some(first) if first == marker => Ok(()),
        Some(first) => Err(Error::format(format!(
            "expected version header {marker:?}, got {first:?}"
        ))),
        None => Err(Error::format(format!(
            "expected version header {marker:?}, got an empty section"
        ))),
    }
}

/// Decodes the JSON document in the row following the marker row.
pub fn parse_json<T: DeserializeOwned>(table: &[Vec<String>], marker: &str) -> Result<T> {
    expect_marker(table, marker)?;
    let document = table
        .get(1)
        .and_then(|row| row.first())
        .ok_or_else(|| Error::format("missing JSON document after version header"))?;
    Ok(serde_json::from_str(document)?)
}

/// Decodes one JSON document per row after the marker row.
pub fn parse_json_rows<T: DeserializeOwned>(
    table: &[Vec<String>],
    marker: &str,
) -> Result<Vec<T>> {
    expect_marker(table, marker)?;
    table[1..]
        .iter()
        .filter_map(|row| row.first())
        .map(|document| serde_json::from_str(document).map_err(Error::from))
        .collect()
}

/// Writes one agent section. Sections carry a version marker row and, when written for
/// another host, are wrapped in piggyback markers.
///
/// ```rust
/// # use mk_plugins::section::SectionWriter;
/// let mut section = SectionWriter::new("ovirt", "overview", "1.0.6", None);
/// section.push_line("{}");
/// assert_eq!(
///     section.finish(),
///     "<<<ovirt_overview:sep(0)>>>\n@ovirt_version_info\u{0}{\"PluginVersion\":\"1.0.6\"}\n{}\n"
/// );
/// ```
pub struct SectionWriter {
    lines: Vec<String>,
    piggybacked: bool,
}

impl SectionWriter {
    pub fn new(prefix: &str, name: &str, version: &str, piggy_target: Option<&str>) -> Self {
        let separator = '\0';
        let mut lines = Vec::new();
        if let Some(target) = piggy_target {
            lines.push(format!("<<<<{}>>>>", target));
        }
        lines.push(format!(
            "<<<{}_{}:sep({})>>>",
            prefix, name, separator as u32
        ));
        let version_info = serde_json::json!({ "PluginVersion": version });
        lines.push(format!(
            "@{}_version_info{}{}",
            prefix, separator, version_info
        ));

        SectionWriter {
            lines,
            piggybacked: piggy_target.is_some(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }

    pub fn push_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.lines.push(serde_json::to_string(value)?);
        Ok(())
    }

    /// Renders the section, closing the piggyback block if one was opened.
    pub fn finish(mut self) -> String {
        if self.piggybacked {
            self.lines.push("<<<<>>>>".to_owned());
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Agent output split into sections, grouped by the host the data belongs to. Data for the
/// monitored host itself is stored under the empty host name.
#[derive(Debug, Default)]
pub struct AgentOutput {
    hosts: BTreeMap<String, BTreeMap<String, StringTable>>,
}

impl AgentOutput {
    /// Splits raw agent output at `<<<name>>>` and `<<<name:sep(N)>>>` headers. Rows are split at
    /// the separator character, or at whitespace without one. `<<<<host>>>>` switches the target
    /// host, `<<<<>>>>` switches back.
    pub fn parse(text: &str) -> Self {
        let mut output = AgentOutput::default();
        let mut host = String::new();
        let mut current: Option<(String, Option<char>)> = None;

        for line in text.lines() {
            if let Some(target) = line
                .strip_prefix("<<<<")
                .and_then(|l| l.strip_suffix(">>>>"))
            {
                host = target.to_owned();
                current = None;
                continue;
            }

            if let Some(header) = line.strip_prefix("<<<").and_then(|l| l.strip_suffix(">>>")) {
                let (name, separator) = parse_header(header);
                debug!("section {:?} for host {:?}", name, host);
                output
                    .hosts
                    .entry(host.clone())
                    .or_default()
                    .entry(name.clone())
                    .or_default();
                current = Some((name, separator));
                continue;
            }

            let Some((ref name, separator)) = current else {
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            let row: Vec<String> = match separator {
                Some(sep) => line.split(sep).map(str::to_owned).collect(),
                None => line.split_whitespace().map(str::to_owned).collect(),
            };
            if row.is_empty() {
                continue;
            }
            output
                .hosts
                .entry(host.clone())
                .or_default()
                .entry(name.clone())
                .or_default()
                .push(row);
        }

        output
    }

    /// The rows of a section, `host` being empty for the monitored host itself.
    pub fn section(&self, host: &str, name: &str) -> Option<&StringTable> {
        self.hosts.get(host).and_then(|sections| sections.get(name))
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }
}

fn parse_header(header: &str) -> (String, Option<char>) {
    let mut parts = header.split(':');
    let name = parts.next().unwrap_or_default().to_owned();
    let separator = parts
        .filter_map(|option| option.strip_prefix("sep(")?.strip_suffix(')'))
        .filter_map(|code| code.parse::<u32>().ok())
        .find_map(char::from_u32);
    (name, separator)
}
