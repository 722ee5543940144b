use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound of the first consumption band, in kWh.
pub const TIER1_LIMIT_KWH: f64 = 30.0;
/// Upper bound of the second consumption band, in kWh.
pub const TIER2_LIMIT_KWH: f64 = 60.0;

/// Per-kWh rates for the three progressive consumption bands, plus the
/// per-kW charge applied to peak demand. Rates are independent; no
/// ordering between the tiers is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSchedule {
    #[serde(default = "default_tier1")]
    pub tier1: f64,
    #[serde(default = "default_tier2")]
    pub tier2: f64,
    #[serde(default = "default_tier3")]
    pub tier3: f64,
    /// Charge per kW of peak demand observed over the session.
    #[serde(default = "default_demand")]
    pub demand: f64,
}

fn default_tier1() -> f64 {
    32.0
}
fn default_tier2() -> f64 {
    42.0
}
fn default_tier3() -> f64 {
    50.0
}
fn default_demand() -> f64 {
    1000.0
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self {
            tier1: default_tier1(),
            tier2: default_tier2(),
            tier3: default_tier3(),
            demand: default_demand(),
        }
    }
}

impl RateSchedule {
    /// All rates must be non-negative. Non-monotonic schedules
    /// (e.g. tier1 > tier2) are allowed.
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("tier1", self.tier1),
            ("tier2", self.tier2),
            ("tier3", self.tier3),
            ("demand", self.demand),
        ] {
            if rate < 0.0 {
                return Err(AppError::Config(format!(
                    "rate '{}' must be non-negative, got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

/// Consumption band a given cumulative energy falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Tier1 => "Tier 1",
            Tier::Tier2 => "Tier 2",
            Tier::Tier3 => "Tier 3",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Bill a cumulative energy reading under the progressive schedule.
///
/// Consumption up to 30 kWh is billed entirely at the tier-1 rate, the
/// next 30 kWh at the tier-2 rate, and everything beyond 60 kWh at the
/// tier-3 rate. Boundaries are inclusive on the lower tier: exactly
/// 30 kWh is all tier 1. No rounding is applied; formatting is the
/// caller's concern.
pub fn calculate_bill(energy_kwh: f64, rates: &RateSchedule) -> Result<f64> {
    if energy_kwh < 0.0 {
        return Err(AppError::InvalidEnergy(energy_kwh));
    }

    let bill = if energy_kwh <= TIER1_LIMIT_KWH {
        energy_kwh * rates.tier1
    } else if energy_kwh <= TIER2_LIMIT_KWH {
        TIER1_LIMIT_KWH * rates.tier1 + (energy_kwh - TIER1_LIMIT_KWH) * rates.tier2
    } else {
        TIER1_LIMIT_KWH * rates.tier1
            + (TIER2_LIMIT_KWH - TIER1_LIMIT_KWH) * rates.tier2
            + (energy_kwh - TIER2_LIMIT_KWH) * rates.tier3
    };

    Ok(bill)
}

/// Band selection for display; branch boundaries match `calculate_bill`.
pub fn current_tier(energy_kwh: f64) -> Tier {
    if energy_kwh <= TIER1_LIMIT_KWH {
        Tier::Tier1
    } else if energy_kwh <= TIER2_LIMIT_KWH {
        Tier::Tier2
    } else {
        Tier::Tier3
    }
}
