//! Threshold evaluation.
//!
//! A value is classified against two independent pairs of levels, one for the upper and one for
//! the lower direction. Every single bound may be absent and an absent bound never trips.

use serde::{Deserialize, Serialize};

use crate::{CheckResult, Metric, State};

/// Direction in which a pair of levels trips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerIfValue {
    /// Trips when the value is greater than or equal to the bound.
    Greater,
    /// Trips when the value is strictly less than the bound.
    Less,
}

/// A warning and a critical bound, both optional.
///
/// ```rust
/// # use mk_plugins::{Levels, State, TriggerIfValue};
/// let levels = Levels::new(Some(15.0), Some(30.0));
/// assert_eq!(levels.state(15.0, TriggerIfValue::Greater), State::Warning);
/// assert_eq!(levels.state(30.0, TriggerIfValue::Greater), State::Critical);
/// assert_eq!(levels.state(10.0, TriggerIfValue::Less), State::Critical);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub warn: Option<f64>,
    pub crit: Option<f64>,
}

impl Levels {
    /// Levels that never trip.
    pub const NEVER: Levels = Levels {
        warn: None,
        crit: None,
    };

    pub fn new(warn: Option<f64>, crit: Option<f64>) -> Self {
        Levels { warn, crit }
    }

    pub fn fixed(warn: f64, crit: f64) -> Self {
        Levels::new(Some(warn), Some(crit))
    }

    /// Classifies the value. Critical wins over warning.
    pub fn state(&self, value: f64, trigger: TriggerIfValue) -> State {
        let trips = |bound: Option<f64>| match (bound, trigger) {
            (Some(b), TriggerIfValue::Greater) => value >= b,
            (Some(b), TriggerIfValue::Less) => value < b,
            (None, _) => false,
        };

        if trips(self.crit) {
            State::Critical
        } else if trips(self.warn) {
            State::Warning
        } else {
            State::Ok
        }
    }

    /// Renders the bounds as `(warn/crit at W/C)` or `(warn/crit below W/C)`.
    pub fn describe(&self, trigger: TriggerIfValue, render: fn(f64) -> String) -> String {
        let bound = |b: Option<f64>| b.map(render).unwrap_or_else(|| "never".to_owned());
        let preposition = match trigger {
            TriggerIfValue::Greater => "at",
            TriggerIfValue::Less => "below",
        };
        format!(
            "(warn/crit {} {}/{})",
            preposition,
            bound(self.warn),
            bound(self.crit)
        )
    }
}

impl From<(f64, f64)> for Levels {
    fn from((warn, crit): (f64, f64)) -> Self {
        Levels::fixed(warn, crit)
    }
}

/// Starts the evaluation of a value. See [LevelsCheck].
///
/// ```rust
/// # use mk_plugins::{check_levels, Levels, State};
/// let result = check_levels(7.0, "Events Failure")
///     .with_upper(Levels::fixed(2.0, 5.0))
///     .with_metric("puppet_agent_failure")
///     .with_render(|v| format!("{}", v as i64))
///     .evaluate();
/// assert_eq!(result.state(), State::Critical);
/// assert_eq!(result.text(), "Events Failure: 7 (warn/crit at 2/5)");
/// ```
pub fn check_levels(value: f64, label: &str) -> LevelsCheck {
    LevelsCheck {
        value,
        label: label.to_owned(),
        upper: Levels::NEVER,
        lower: Levels::NEVER,
        metric_name: None,
        boundaries: (None, None),
        render: default_render,
    }
}

fn default_render(value: f64) -> String {
    format!("{:.2}", value)
}

/// Builder for a single levels evaluation producing one [CheckResult].
pub struct LevelsCheck {
    value: f64,
    label: String,
    upper: Levels,
    lower: Levels,
    metric_name: Option<String>,
    boundaries: (Option<f64>, Option<f64>),
    render: fn(f64) -> String,
}

impl LevelsCheck {
    pub fn with_upper(mut self, levels: Levels) -> Self {
        self.upper = levels;
        self
    }

    pub fn with_lower(mut self, levels: Levels) -> Self {
        self.lower = levels;
        self
    }

    /// Attaches a metric with this name, carrying the upper levels.
    pub fn with_metric(mut self, name: &str) -> Self {
        self.metric_name = Some(name.to_owned());
        self
    }

    pub fn with_boundaries(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.boundaries = (min, max);
        self
    }

    pub fn with_render(mut self, render: fn(f64) -> String) -> Self {
        self.render = render;
        self
    }

    pub fn evaluate(self) -> CheckResult {
        let upper = self.upper.state(self.value, TriggerIfValue::Greater);
        let lower = self.lower.state(self.value, TriggerIfValue::Less);

        let mut text = format!("{}: {}", self.label, (self.render)(self.value));
        if upper != State::Ok {
            text.push(' ');
            text.push_str(&self.upper.describe(TriggerIfValue::Greater, self.render));
        } else if lower != State::Ok {
            text.push(' ');
            text.push_str(&self.lower.describe(TriggerIfValue::Less, self.render));
        }

        let mut result = CheckResult::new(upper.worst(lower), text);
        if let Some(name) = self.metric_name {
            let metric = Metric::new(&name, self.value)
                .with_levels(self.upper.warn, self.upper.crit)
                .with_boundaries(self.boundaries.0, self.boundaries.1);
            result = result.with_metric(metric);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_levels() {
        let levels = Levels::fixed(15.0, 30.0);
        assert_eq!(levels.state(12.0, TriggerIfValue::Greater), State::Ok);
        assert_eq!(levels.state(15.0, TriggerIfValue::Greater), State::Warning);
        assert_eq!(levels.state(18.0, TriggerIfValue::Greater), State::Warning);
        assert_eq!(levels.state(30.0, TriggerIfValue::Greater), State::Critical);
        assert_eq!(levels.state(35.0, TriggerIfValue::Greater), State::Critical);
    }

    #[test]
    fn test_lower_levels() {
        let levels = Levels::fixed(30.0, 15.0);
        assert_eq!(levels.state(35.0, TriggerIfValue::Less), State::Ok);
        assert_eq!(levels.state(30.0, TriggerIfValue::Less), State::Ok);
        assert_eq!(levels.state(20.0, TriggerIfValue::Less), State::Warning);
        assert_eq!(levels.state(15.0, TriggerIfValue::Less), State::Warning);
        assert_eq!(levels.state(10.0, TriggerIfValue::Less), State::Critical);
    }

    #[test]
    fn test_absent_bounds_never_trip() {
        assert_eq!(
            Levels::NEVER.state(f64::MAX, TriggerIfValue::Greater),
            State::Ok
        );
        assert_eq!(Levels::NEVER.state(f64::MIN, TriggerIfValue::Less), State::Ok);

        let only_crit = Levels::new(None, Some(10.0));
        assert_eq!(only_crit.state(9.0, TriggerIfValue::Greater), State::Ok);
        assert_eq!(only_crit.state(10.0, TriggerIfValue::Greater), State::Critical);
    }

    #[test]
    fn test_describe() {
        let render: fn(f64) -> String = |v| format!("{:.1} V", v);
        assert_eq!(
            Levels::new(Some(3.5), None).describe(TriggerIfValue::Greater, render),
            "(warn/crit at 3.5 V/never)"
        );
        assert_eq!(
            Levels::NEVER.describe(TriggerIfValue::Less, render),
            "(warn/crit below never/never)"
        );
    }

    #[test]
    fn test_check_levels() {
        let result = check_levels(1.0, "Value").evaluate();
        assert_eq!(result.state(), State::Ok);
        assert_eq!(result.text(), "Value: 1.00");
        assert!(result.metric().is_none());

        let result = check_levels(1.0, "Value")
            .with_upper(Levels::fixed(5.0, 10.0))
            .with_lower(Levels::fixed(2.0, 0.5))
            .with_metric("value")
            .evaluate();
        assert_eq!(result.state(), State::Warning);
        assert_eq!(result.text(), "Value: 1.00 (warn/crit below 2.00/0.50)");
        let metric = result.metric().unwrap();
        assert_eq!(metric.warning(), Some(5.0));
        assert_eq!(metric.critical(), Some(10.0));

        let result = check_levels(12.0, "Value")
            .with_upper(Levels::fixed(5.0, 10.0))
            .evaluate();
        assert_eq!(result.state(), State::Critical);
        assert_eq!(result.text(), "Value: 12.00 (warn/crit at 5.00/10.00)");
    }
}
