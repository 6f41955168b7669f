//! Digital optical monitoring of HP transceivers (HP-ICF-TRANSCEIVER-MIB).
//!
//! Two SNMP tables are fetched:
//!
//! * `.1.3.6.1.2.1.2.2.1`: `OIDEnd, ifIndex, ifDescr, ifType, ifOperStatus`
//! * `.1.3.6.1.4.1.11.2.14.11.5.1.82.1.1.1.1`: `PortIndex, Model, Diagnostics, Temp, Voltage,
//!   Bias, TxPower, RxPower` followed by `HiAlarm, LoAlarm, HiWarn, LoWarn` for each of the five
//!   readings in that order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::interfaces::{discover_interfaces, item_matches, Interface, InterfaceDiscoveryParams};
use crate::levels::{check_levels, Levels, TriggerIfValue};
use crate::units::{parse_alarm_level, parse_power, parse_power_level, parse_value, uw_to_dbm};
use crate::{CheckResult, State};

pub const SECTION_NAME: &str = "hp_icf_xcvr_table";
pub const INTERFACES_SECTION_NAME: &str = "hp_icf_xcvr_interfaces";

const COLUMNS: usize = 28;
const FIRST_READING: usize = 3;
const FIRST_ALARM: usize = 8;

pub fn service_name(item: &str) -> String {
    format!("SFP {}", item)
}

/// The five readings of a transceiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quantity {
    Temperature,
    SupplyVoltage,
    TxBiasCurrent,
    TxOutputPower,
    RxOpticalPower,
}

impl Quantity {
    /// All quantities in column order.
    pub const ALL: [Quantity; 5] = [
        Quantity::Temperature,
        Quantity::SupplyVoltage,
        Quantity::TxBiasCurrent,
        Quantity::TxOutputPower,
        Quantity::RxOpticalPower,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Quantity::Temperature => "Temperature",
            Quantity::SupplyVoltage => "SupplyVoltage",
            Quantity::TxBiasCurrent => "TxBiasCurrent",
            Quantity::TxOutputPower => "TxOutputPower",
            Quantity::RxOpticalPower => "RxOpticalPower",
        }
    }

    /// Converts a raw reading into °C, V, mA or µW.
    pub fn convert(&self, raw: &str) -> Result<f64> {
        match self {
            Quantity::Temperature | Quantity::TxBiasCurrent => parse_value(raw, 1000.0),
            Quantity::SupplyVoltage => parse_value(raw, 10000.0),
            Quantity::TxOutputPower | Quantity::RxOpticalPower => parse_power(raw),
        }
    }

    /// Converts a raw alarm level into the unit of [Self::convert].
    pub fn convert_level(&self, raw: &str) -> Result<Option<f64>> {
        match self {
            Quantity::Temperature | Quantity::TxBiasCurrent => parse_alarm_level(raw, 1000.0),
            Quantity::SupplyVoltage => parse_alarm_level(raw, 10000.0),
            Quantity::TxOutputPower | Quantity::RxOpticalPower => parse_power_level(raw),
        }
    }

    pub fn render(&self, value: f64) -> String {
        self.renderer()(value)
    }

    fn renderer(&self) -> fn(f64) -> String {
        match self {
            Quantity::Temperature => render_celsius,
            Quantity::SupplyVoltage => render_volts,
            Quantity::TxBiasCurrent => render_milliamps,
            Quantity::TxOutputPower | Quantity::RxOpticalPower => render_power,
        }
    }

    fn position(&self) -> usize {
        Quantity::ALL
            .iter()
            .position(|q| q == self)
            .unwrap_or_default()
    }
}

fn render_celsius(value: f64) -> String {
    format!("{:.2} °C", value)
}

fn render_volts(value: f64) -> String {
    format!("{:.3} V", value)
}

fn render_milliamps(value: f64) -> String {
    format!("{:.3} mA", value)
}

fn render_power(uw: f64) -> String {
    format!("{:.3} µW ({:.3} dBm)", uw, uw_to_dbm(uw))
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A converted reading with the alarm levels the transceiver reports for it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub lower: Levels,
    pub upper: Levels,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transceiver {
    pub supports_dom: bool,
    pub model: String,
    pub interface: Interface,
    pub measurements: BTreeMap<Quantity, Measurement>,
}

impl Transceiver {
    /// Whether the transceiver reports any telemetry at all.
    pub fn has_readings(&self) -> bool {
        self.measurements.values().any(|m| m.value != 0.0)
    }
}

/// Transceivers keyed by port index.
pub type Section = BTreeMap<String, Transceiver>;

/// Parses the interface table and the transceiver table. Transceivers without diagnostics
/// support are left out.
pub fn parse(interfaces: &[Vec<String>], transceivers: &[Vec<String>]) -> Result<Section> {
    let interface_map: HashMap<&str, &[String]> = interfaces
        .iter()
        .filter_map(|row| row.split_first())
        .map(|(oid_end, rest)| (oid_end.as_str(), rest))
        .collect();

    let mut section = Section::new();
    for row in transceivers {
        if row.len() < COLUMNS {
            return Err(Error::format(format!(
                "transceiver row has {} columns, expected {}",
                row.len(),
                COLUMNS
            )));
        }

        // readings are only valid if diagnostics is dom(1)
        if row[2] != "1" {
            debug!("port {} does not support diagnostics", row[0]);
            continue;
        }

        let Some(interface) = interface_map.get(row[0].as_str()) else {
            warn!("no interface found for transceiver on port {}", row[0]);
            continue;
        };
        let field = |i: usize| interface.get(i).cloned().unwrap_or_default();
        let descr = field(1);

        let mut measurements = BTreeMap::new();
        for quantity in Quantity::ALL {
            let alarm = FIRST_ALARM + 4 * quantity.position();
            let (hi_alarm, lo_alarm, hi_warn, lo_warn) =
                (&row[alarm], &row[alarm + 1], &row[alarm + 2], &row[alarm + 3]);

            measurements.insert(
                quantity,
                Measurement {
                    value: quantity.convert(&row[FIRST_READING + quantity.position()])?,
                    lower: Levels::new(
                        quantity.convert_level(lo_warn)?,
                        quantity.convert_level(lo_alarm)?,
                    ),
                    upper: Levels::new(
                        quantity.convert_level(hi_warn)?,
                        quantity.convert_level(hi_alarm)?,
                    ),
                },
            );
        }

        section.insert(
            row[0].clone(),
            Transceiver {
                supports_dom: true,
                model: row[1].clone(),
                interface: Interface {
                    index: field(0),
                    alias: descr.clone(),
                    descr,
                    if_type: field(2),
                    oper_status: field(3),
                },
                measurements,
            },
        );
    }

    Ok(section)
}

/// Discovers transceivers supporting diagnostics which report at least one non zero reading.
pub fn discover(params: &InterfaceDiscoveryParams, section: &Section) -> Vec<String> {
    let interfaces: Vec<Interface> = section
        .values()
        .filter(|t| t.supports_dom && t.has_readings())
        .map(|t| t.interface.clone())
        .collect();
    discover_interfaces(params, &interfaces)
}

/// Checks every reading against the alarm levels the transceiver reports, in alphabetical
/// order of the reading names.
pub fn check(item: &str, section: &Section) -> Vec<CheckResult> {
    let Some(transceiver) = section.values().find(|t| {
        let i = &t.interface;
        item_matches(item, &i.index, &i.alias, &i.descr)
    }) else {
        return vec![CheckResult::new(
            State::Unknown,
            format!("Transceiver {} not found in SNMP data", item),
        )];
    };

    let mut quantities: Vec<&Quantity> = transceiver.measurements.keys().collect();
    quantities.sort_by_key(|q| q.name());

    let mut results = Vec::new();
    for quantity in quantities {
        let measurement = &transceiver.measurements[quantity];
        let label = quantity.name();
        let render = quantity.renderer();

        results.push(
            check_levels(measurement.value, label)
                .with_upper(measurement.upper)
                .with_lower(measurement.lower)
                .with_metric(label)
                .with_render(render)
                .evaluate(),
        );
        results.push(CheckResult::notice(
            State::Ok,
            format!(
                "{}: {}",
                label,
                measurement.lower.describe(TriggerIfValue::Less, render)
            ),
        ));
        results.push(CheckResult::notice(
            State::Ok,
            format!(
                "{}: {}",
                label,
                measurement.upper.describe(TriggerIfValue::Greater, render)
            ),
        ));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::string_table;
    use crate::units::{dbm_to_uw, NO_SIGNAL};
    use crate::worst_state;

    fn interfaces() -> Vec<Vec<String>> {
        string_table(&[
            &["25", "25", "A1", "6", "1"],
            &["26", "26", "A2", "6", "1"],
            &["27", "27", "A3", "6", "2"],
        ])
    }

    fn xcvr_row(port: &str, diagnostics: &str, readings: [&str; 5]) -> Vec<String> {
        let mut row = vec![port, "J9150A", diagnostics];
        row.extend(readings);
        row.extend([
            // temperature: hi alarm, lo alarm, hi warn, lo warn
            "90000", "-45000", "85000", "-40000",
            // voltage
            "36000", "30000", "35000", "31000",
            // bias
            "15000", "1000", "12000", "2000",
            // tx power
            "20", "-110", "0", "-100",
            // rx power
            "", "0", "", "-200",
        ]);
        row.into_iter().map(str::to_owned).collect()
    }

    fn section() -> Section {
        let transceivers = vec![
            xcvr_row("25", "1", ["35250", "33000", "6500", "-25", "-35"]),
            xcvr_row("26", "1", ["0", "0", "0", NO_SIGNAL, NO_SIGNAL]),
            xcvr_row("27", "2", ["35250", "33000", "6500", "-25", "-35"]),
        ];
        parse(&interfaces(), &transceivers).unwrap()
    }

    #[test]
    fn test_parse() {
        let section = section();
        assert_eq!(section.len(), 2);

        let t = &section["25"];
        assert_eq!(t.interface.descr, "A1");
        assert_eq!(t.model, "J9150A");

        let temp = t.measurements[&Quantity::Temperature];
        assert!((temp.value - 35.25).abs() < 1e-9);
        assert_eq!(temp.upper, Levels::fixed(85.0, 90.0));
        assert_eq!(temp.lower, Levels::fixed(-40.0, -45.0));

        let voltage = t.measurements[&Quantity::SupplyVoltage];
        assert!((voltage.value - 3.3).abs() < 1e-9);

        let tx = t.measurements[&Quantity::TxOutputPower];
        assert!((tx.value - dbm_to_uw(-2.5)).abs() < 1e-9);
        // a 0 alarm level is not configured, not 0 dBm
        assert_eq!(tx.upper.warn, None);
        assert!((tx.upper.crit.unwrap() - dbm_to_uw(2.0)).abs() < 1e-9);

        let rx = t.measurements[&Quantity::RxOpticalPower];
        assert_eq!(rx.upper, Levels::NEVER);
        assert_eq!(rx.lower.crit, None);
        assert!((rx.lower.warn.unwrap() - dbm_to_uw(-20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_errors() {
        let short = vec![vec!["25".to_owned(), "x".to_owned(), "1".to_owned()]];
        assert!(matches!(parse(&interfaces(), &short), Err(Error::Format(_))));

        let garbage = vec![xcvr_row("25", "1", ["hot", "33000", "6500", "-25", "-35"])];
        assert!(matches!(parse(&interfaces(), &garbage), Err(Error::Format(_))));
    }

    #[test]
    fn test_parse_unknown_interface() {
        let transceivers = vec![xcvr_row("99", "1", ["35250", "33000", "6500", "-25", "-35"])];
        assert!(parse(&interfaces(), &transceivers).unwrap().is_empty());
    }

    #[test]
    fn test_no_signal() {
        let readings = ["35250", "33000", "6500", "-25", "-99999999"];
        let transceivers = vec![xcvr_row("25", "1", readings)];
        let section = parse(&interfaces(), &transceivers).unwrap();
        let rx = section["25"].measurements[&Quantity::RxOpticalPower];
        assert_eq!(rx.value, 0.0);
        assert_eq!(Quantity::RxOpticalPower.render(rx.value), "0.000 µW (-inf dBm)");
    }

    #[test]
    fn test_discover() {
        let section = section();
        // 26 supports diagnostics but every reading converts to zero
        assert_eq!(discover(&InterfaceDiscoveryParams::default(), &section), vec!["25"]);
    }

    #[test]
    fn test_check() {
        let section = section();
        let results = check("25", &section);
        assert_eq!(results.len(), 15);

        let texts: Vec<&str> = results.iter().map(|r| r.text()).collect();
        assert!(texts[0].starts_with("RxOpticalPower: "));
        assert!(texts[3].starts_with("SupplyVoltage: 3.300 V"));
        assert_eq!(texts[6], "Temperature: 35.25 °C");
        assert_eq!(texts[7], "Temperature: (warn/crit below -40.00 °C/-45.00 °C)");
        assert_eq!(texts[8], "Temperature: (warn/crit at 85.00 °C/90.00 °C)");
        assert_eq!(texts[9], "TxBiasCurrent: 6.500 mA");
        assert!(texts[13].starts_with("TxOutputPower: (warn/crit below "));

        assert_eq!(texts[1], "RxOpticalPower: (warn/crit below 10.000 µW (-20.000 dBm)/never)");
        assert_eq!(texts[2], "RxOpticalPower: (warn/crit at never/never)");

        assert_eq!(worst_state(&results), State::Ok);
        assert_eq!(results[6].metric().unwrap().name(), "Temperature");
    }

    #[test]
    fn test_check_levels_breached() {
        let transceivers = vec![xcvr_row("25", "1", ["87000", "29000", "6500", "-25", "-210"])];
        let section = parse(&interfaces(), &transceivers).unwrap();
        let results = check("A1", &section);

        let state_of = |label: &str| {
            results
                .iter()
                .find(|r| !r.is_notice() && r.text().starts_with(label))
                .map(|r| r.state())
        };
        assert_eq!(state_of("Temperature"), Some(State::Warning));
        assert_eq!(state_of("SupplyVoltage"), Some(State::Critical));
        assert_eq!(state_of("RxOpticalPower"), Some(State::Warning));
        assert_eq!(state_of("TxOutputPower"), Some(State::Ok));
        assert_eq!(worst_state(&results), State::Critical);

        let temp = results
            .iter()
            .find(|r| r.text().starts_with("Temperature: 87"))
            .unwrap();
        assert_eq!(
            temp.text(),
            "Temperature: 87.00 °C (warn/crit at 85.00 °C/90.00 °C)"
        );
    }

    #[test]
    fn test_check_item_forms() {
        let section = section();
        for item in ["25", "0025", "A1", "A1 25"] {
            assert_eq!(check(item, &section).len(), 15, "{item}");
        }
    }

    #[test]
    fn test_check_missing_item() {
        let results = check("42", &section());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].state(), State::Unknown);
    }
}
