//! Named parameter scenarios for sweeps.
//!
//! ```ini
//! [scenarios]
//! names = base, aggressive, tight_sl
//!
//! [scenario.aggressive]
//! rsi_long_threshold = 60
//! rsi_short_threshold = 40
//! ```
//!
//! A scenario without a section runs the base parameters unchanged. Risk
//! overrides apply to both instrument roles.

use chrono::NaiveTime;

use crate::domain::backtest::SimulationParams;
use crate::domain::config_validation::{
    check_stop_loss, check_thresholds, parse_entry_time, parse_flag, parse_value,
};
use crate::domain::error::SwitchbackError;
use crate::domain::instrument::InstrumentRole;
use crate::ports::config_port::ConfigPort;

pub const BASE_SCENARIO: &str = "base";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioOverrides {
    pub rsi_long_threshold: Option<f64>,
    pub rsi_short_threshold: Option<f64>,
    pub use_macd_filter: Option<bool>,
    pub entry_time: Option<NaiveTime>,
    pub stop_loss_pct: Option<f64>,
    pub max_hold_days: Option<u32>,
    pub cooldown_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub overrides: ScenarioOverrides,
}

impl Scenario {
    pub fn base() -> Self {
        Scenario {
            name: BASE_SCENARIO.to_string(),
            overrides: ScenarioOverrides::default(),
        }
    }

    pub fn section(name: &str) -> String {
        format!("scenario.{}", name.to_lowercase())
    }

    /// Reads and checks `[scenario.<name>]`.
    pub fn from_config(config: &dyn ConfigPort, name: &str) -> Result<Self, SwitchbackError> {
        let section = Self::section(name);
        let s = section.as_str();

        let entry_time = config
            .get_string(s, "entry_time")
            .map(|raw| parse_entry_time(s, "entry_time", &raw))
            .transpose()?;
        let use_macd_filter = config
            .get_string(s, "use_macd_filter")
            .map(|raw| parse_flag(s, "use_macd_filter", &raw))
            .transpose()?;
        let stop_loss_pct = parse_value::<f64>(config, s, "stop_loss_pct")?;
        if let Some(sl) = stop_loss_pct {
            check_stop_loss(s, sl)?;
        }

        Ok(Scenario {
            name: name.to_string(),
            overrides: ScenarioOverrides {
                rsi_long_threshold: parse_value(config, s, "rsi_long_threshold")?,
                rsi_short_threshold: parse_value(config, s, "rsi_short_threshold")?,
                use_macd_filter,
                entry_time,
                stop_loss_pct,
                max_hold_days: parse_value(config, s, "max_hold_days")?,
                cooldown_days: parse_value(config, s, "cooldown_days")?,
            },
        })
    }

    /// `base` with this scenario's overrides applied. Fails when the merged
    /// thresholds are out of range or inverted.
    pub fn apply(&self, base: &SimulationParams) -> Result<SimulationParams, SwitchbackError> {
        let o = &self.overrides;
        let mut params = base.clone();

        if let Some(v) = o.rsi_long_threshold {
            params.policy.rsi_long_threshold = v;
        }
        if let Some(v) = o.rsi_short_threshold {
            params.policy.rsi_short_threshold = v;
        }
        if let Some(v) = o.use_macd_filter {
            params.policy.use_macd_filter = v;
        }
        if let Some(v) = o.entry_time {
            params.entry_time = v;
        }

        for role in InstrumentRole::ALL {
            let risk = params.risk.get_mut(role);
            if let Some(v) = o.stop_loss_pct {
                risk.stop_loss_pct = v;
            }
            if let Some(v) = o.max_hold_days {
                risk.max_hold_days = v;
            }
            if let Some(v) = o.cooldown_days {
                risk.cooldown_days = v;
            }
        }

        check_thresholds(
            &Self::section(&self.name),
            params.policy.rsi_long_threshold,
            params.policy.rsi_short_threshold,
        )?;
        Ok(params)
    }
}

/// Scenario names listed in `[scenarios] names`, in order.
pub fn scenario_names(config: &dyn ConfigPort) -> Vec<String> {
    config
        .get_string("scenarios", "names")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Every configured scenario, or just the base scenario when none are listed.
pub fn load_scenarios(config: &dyn ConfigPort) -> Result<Vec<Scenario>, SwitchbackError> {
    let names = scenario_names(config);
    if names.is_empty() {
        return Ok(vec![Scenario::base()]);
    }

    let mut seen = std::collections::HashSet::new();
    let mut scenarios = Vec::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.to_lowercase()) {
            return Err(SwitchbackError::invalid(
                "scenarios",
                "names",
                format!("duplicate scenario {:?}", name),
            ));
        }
        scenarios.push(Scenario::from_config(config, &name)?);
    }
    Ok(scenarios)
}

/// Case-insensitive lookup. The base scenario is always available.
pub fn select_scenario(scenarios: &[Scenario], name: &str) -> Option<Scenario> {
    scenarios
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .cloned()
        .or_else(|| name.eq_ignore_ascii_case(BASE_SCENARIO).then(Scenario::base))
}
