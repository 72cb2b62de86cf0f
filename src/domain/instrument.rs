//! Tradeable instrument roles and role-keyed parameters.

use std::fmt;

/// Which of the two tradeable instruments a position or parameter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstrumentRole {
    Leveraged,
    Inverse,
}

impl InstrumentRole {
    pub const ALL: [InstrumentRole; 2] = [InstrumentRole::Leveraged, InstrumentRole::Inverse];

    /// Short tag used in trade logs and reports.
    pub fn tag(&self) -> &'static str {
        match self {
            InstrumentRole::Leveraged => "LEV",
            InstrumentRole::Inverse => "INV",
        }
    }

    /// Config section holding per-role overrides.
    pub fn config_section(&self) -> &'static str {
        match self {
            InstrumentRole::Leveraged => "leverage",
            InstrumentRole::Inverse => "inverse",
        }
    }
}

impl fmt::Display for InstrumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One value per instrument role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleMap<T> {
    pub leveraged: T,
    pub inverse: T,
}

impl<T> RoleMap<T> {
    pub fn new(leveraged: T, inverse: T) -> Self {
        RoleMap {
            leveraged,
            inverse,
        }
    }

    pub fn get(&self, role: InstrumentRole) -> &T {
        match role {
            InstrumentRole::Leveraged => &self.leveraged,
            InstrumentRole::Inverse => &self.inverse,
        }
    }

    pub fn get_mut(&mut self, role: InstrumentRole) -> &mut T {
        match role {
            InstrumentRole::Leveraged => &mut self.leveraged,
            InstrumentRole::Inverse => &mut self.inverse,
        }
    }
}

impl<T: Clone> RoleMap<T> {
    pub fn uniform(value: T) -> Self {
        RoleMap {
            leveraged: value.clone(),
            inverse: value,
        }
    }
}

/// Exit and cooldown parameters for positions in one instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    /// Fractional loss that triggers a stop-loss exit (0.03 = 3%).
    pub stop_loss_pct: f64,
    pub max_hold_days: u32,
    /// Calendar days blocked for new entries after a stop-loss exit.
    pub cooldown_days: u32,
}

impl Default for RiskParams {
    fn default() -> Self {
        RiskParams {
            stop_loss_pct: 0.03,
            max_hold_days: 5,
            cooldown_days: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_map_lookup_by_role() {
        let map = RoleMap::new(
            RiskParams {
                stop_loss_pct: 0.05,
                ..RiskParams::default()
            },
            RiskParams {
                stop_loss_pct: 0.02,
                ..RiskParams::default()
            },
        );
        assert_eq!(map.get(InstrumentRole::Leveraged).stop_loss_pct, 0.05);
        assert_eq!(map.get(InstrumentRole::Inverse).stop_loss_pct, 0.02);
    }

    #[test]
    fn role_map_uniform_and_get_mut() {
        let mut map = RoleMap::uniform(RiskParams::default());
        assert_eq!(map.leveraged, map.inverse);

        map.get_mut(InstrumentRole::Inverse).cooldown_days = 3;
        assert_eq!(map.inverse.cooldown_days, 3);
        assert_eq!(map.leveraged.cooldown_days, 0);
    }

    #[test]
    fn default_risk_params() {
        let p = RiskParams::default();
        assert_eq!(p.stop_loss_pct, 0.03);
        assert_eq!(p.max_hold_days, 5);
        assert_eq!(p.cooldown_days, 0);
    }

    #[test]
    fn role_tags_and_sections() {
        assert_eq!(InstrumentRole::Leveraged.to_string(), "LEV");
        assert_eq!(InstrumentRole::Inverse.to_string(), "INV");
        assert_eq!(InstrumentRole::Leveraged.config_section(), "leverage");
        assert_eq!(InstrumentRole::Inverse.config_section(), "inverse");
    }
}
