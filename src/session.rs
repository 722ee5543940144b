use crate::billing::{calculate_bill, current_tier, RateSchedule, Tier};
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Running energy total for one monitoring session, integrated from power
/// samples over wall-clock time, plus the peak power seen so far.
///
/// The first sample only sets the baseline timestamp; energy accrues
/// between consecutive samples as `power * elapsed_hours / 1000` kWh.
#[derive(Debug, Default)]
pub struct EnergySession {
    energy_kwh: f64,
    peak_w: f64,
    last_sample: Option<DateTime<Utc>>,
}

impl EnergySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, power_w: f64, at: DateTime<Utc>) {
        if let Some(prev) = self.last_sample {
            let elapsed_hours = (at - prev).num_milliseconds() as f64 / 3_600_000.0;
            if elapsed_hours > 0.0 {
                self.energy_kwh += power_w * elapsed_hours / 1000.0;
            }
        }
        self.last_sample = Some(at);
        if power_w > self.peak_w {
            self.peak_w = power_w;
        }
    }

    pub fn energy_kwh(&self) -> f64 {
        self.energy_kwh
    }

    pub fn peak_kw(&self) -> f64 {
        self.peak_w / 1000.0
    }

    pub fn tier(&self) -> Tier {
        current_tier(self.energy_kwh)
    }

    /// Tiered bill of the accumulated energy plus the peak-demand charge.
    pub fn cost(&self, rates: &RateSchedule) -> Result<f64> {
        let bill = calculate_bill(self.energy_kwh, rates)?;
        Ok(bill + self.peak_kw() * rates.demand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::Tier;
    use chrono::Duration;

    fn rates() -> RateSchedule {
        RateSchedule {
            tier1: 32.0,
            tier2: 42.0,
            tier3: 50.0,
            demand: 1000.0,
        }
    }

    #[test]
    fn test_first_sample_sets_baseline_only() {
        let mut session = EnergySession::new();
        session.record(500.0, Utc::now());
        assert_eq!(session.energy_kwh(), 0.0);
        assert_eq!(session.peak_kw(), 0.5);
    }

    #[test]
    fn test_accumulates_power_over_time() {
        let mut session = EnergySession::new();
        let t0 = Utc::now();
        session.record(1000.0, t0);
        session.record(1000.0, t0 + Duration::hours(1));
        assert!((session.energy_kwh() - 1.0).abs() < 1e-9);
        session.record(2000.0, t0 + Duration::hours(1) + Duration::minutes(30));
        // Half an hour at 2 kW adds another 1 kWh.
        assert!((session.energy_kwh() - 2.0).abs() < 1e-9);
        assert_eq!(session.peak_kw(), 2.0);
    }

    #[test]
    fn test_non_forward_timestamp_accrues_nothing() {
        let mut session = EnergySession::new();
        let t0 = Utc::now();
        session.record(1000.0, t0);
        session.record(1000.0, t0 - Duration::seconds(5));
        assert_eq!(session.energy_kwh(), 0.0);
    }

    #[test]
    fn test_cost_includes_demand_charge() {
        let mut session = EnergySession::new();
        let t0 = Utc::now();
        session.record(1000.0, t0);
        session.record(1000.0, t0 + Duration::hours(1));
        // 1 kWh at tier 1 plus 1 kW of peak demand.
        let cost = session.cost(&rates()).unwrap();
        assert!((cost - (32.0 + 1000.0)).abs() < 1e-9);
        assert_eq!(session.tier(), Tier::Tier1);
    }
}
