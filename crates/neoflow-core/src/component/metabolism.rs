//! ATP-demand-driven O2 consumption / CO2 production (spec §4.9 [Metabolism
//! row of §2]), grounded on
//! `original_source/explain_core/core_models/Metabolism.py`.

use super::capacitive::BloodComposition;

/// One metabolically active compartment's fractional share of total ATP
/// demand.
#[derive(Debug, Clone, Copy)]
pub struct ActiveCompartment {
    pub target: usize,
    pub fvatp: f64,
}

#[derive(Debug, Clone)]
pub struct Metabolism {
    pub name: String,
    pub enabled: bool,

    pub atp_need: f64,
    pub resp_q: f64,
    pub active_compartments: Vec<ActiveCompartment>,
}

impl Metabolism {
    pub fn new(name: impl Into<String>, active_compartments: Vec<ActiveCompartment>) -> Self {
        Metabolism {
            name: name.into(),
            enabled: true,
            atp_need: 0.00014,
            resp_q: 0.8,
            active_compartments,
        }
    }

    /// spec: burns available O2 aerobically up to what the compartment
    /// holds, covers any shortfall anaerobically (silently, no O2 debt
    /// tracked beyond this tick), and adds the CO2 the aerobic burn
    /// produced.
    pub fn burn(&self, fvatp: f64, dt: f64, blood: &mut BloodComposition, vol: f64) {
        if !self.enabled || vol <= 0.0 {
            return;
        }

        let atp_need_step = fvatp * self.atp_need * dt;
        let o2_available = blood.to2 * vol;
        let o2_available_for_use = 0.8 * o2_available;

        let o2_to_burn = atp_need_step / 5.0;
        let o2_burned = o2_to_burn.min(o2_available_for_use);

        let o2_remaining = (o2_available - o2_burned).max(0.0);
        blood.to2 = o2_remaining / vol;

        let co2_produced = o2_burned * self.resp_q;
        blood.tco2 = ((blood.tco2 * vol) + co2_produced) / vol;
        if blood.tco2 < 0.0 {
            blood.tco2 = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burns_oxygen_and_produces_co2() {
        let met = Metabolism::new("met", vec![]);
        let mut blood = BloodComposition { to2: 8.0, tco2: 20.0, ..Default::default() };
        met.burn(0.185, 5e-4, &mut blood, 0.5);
        assert!(blood.to2 < 8.0, "to2: {}", blood.to2);
        assert!(blood.tco2 > 20.0, "tco2: {}", blood.tco2);
    }

    #[test]
    fn depleted_oxygen_clamps_at_zero_rather_than_going_negative() {
        let met = Metabolism::new("met", vec![]);
        let mut blood = BloodComposition { to2: 1e-9, tco2: 20.0, ..Default::default() };
        met.burn(1.0, 5e-4, &mut blood, 0.01);
        assert!(blood.to2 >= 0.0);
    }
}
