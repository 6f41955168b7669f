//! Network interface discovery and item matching, shared by interface based checks.

use serde::{Deserialize, Serialize};

/// An interface row of the standard interface table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Interface {
    pub index: String,
    pub descr: String,
    pub alias: String,
    pub if_type: String,
    pub oper_status: String,
}

/// What a discovered item is named after.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemAppearance {
    #[default]
    Index,
    Descr,
    Alias,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceDiscoveryParams {
    pub item_appearance: ItemAppearance,
    /// Pads indices with zeros to the width of the longest index.
    pub pad_portnumbers: bool,
    /// Operational states an interface must be in to be discovered.
    pub match_oper_states: Vec<String>,
}

impl Default for InterfaceDiscoveryParams {
    fn default() -> Self {
        InterfaceDiscoveryParams {
            item_appearance: ItemAppearance::Index,
            pad_portnumbers: true,
            match_oper_states: vec!["1".to_owned()],
        }
    }
}

/// Returns the items of all interfaces admitted by `params`.
pub fn discover_interfaces(
    params: &InterfaceDiscoveryParams,
    interfaces: &[Interface],
) -> Vec<String> {
    let width = interfaces.iter().map(|i| i.index.len()).max().unwrap_or(0);

    interfaces
        .iter()
        .filter(|i| {
            params.match_oper_states.is_empty() || params.match_oper_states.contains(&i.oper_status)
        })
        .map(|i| match params.item_appearance {
            ItemAppearance::Index if params.pad_portnumbers => {
                format!("{:0>width$}", i.index, width = width)
            }
            ItemAppearance::Index => i.index.clone(),
            ItemAppearance::Descr => i.descr.clone(),
            ItemAppearance::Alias => i.alias.clone(),
        })
        .collect()
}

/// Whether `item` names the interface. Service names changed between releases, so every form an
/// item may have been discovered with is accepted: the zero padded index, the description, the
/// alias and description or alias followed by the index.
pub fn item_matches(item: &str, index: &str, alias: &str, descr: &str) -> bool {
    item.trim_start_matches('0') == index
        || (!item.is_empty() && item.chars().all(|c| c == '0') && parse_int(index) == 0)
        || item == alias
        || item == descr
        || item == format!("{} {}", alias, index)
        || item == format!("{} {}", descr, index)
}

fn parse_int(s: &str) -> i64 {
    s.trim().parse().unwrap_or(0)
}
