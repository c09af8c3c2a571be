//! Couples one blood compartment and one gas compartment (spec §4.6),
//! grounded on `original_source/explain_core/core_models/Gasexchanger.py`.

use super::capacitive::{BloodComposition, GasComposition};

#[derive(Debug, Clone)]
pub struct GasExchanger {
    pub name: String,
    pub enabled: bool,

    pub blood: usize,
    pub gas: usize,

    pub diff_o2: f64,
    pub diff_o2_fac: f64,
    pub diff_co2: f64,
    pub diff_co2_fac: f64,

    pub flux_o2: f64,
    pub flux_co2: f64,
}

impl GasExchanger {
    pub fn new(name: impl Into<String>, blood: usize, gas: usize) -> Self {
        GasExchanger {
            name: name.into(),
            enabled: true,
            blood,
            gas,
            diff_o2: 0.01,
            diff_o2_fac: 1.0,
            diff_co2: 0.01,
            diff_co2_fac: 1.0,
            flux_o2: 0.0,
            flux_co2: 0.0,
        }
    }

    /// Transports O2/CO2 down their partial-pressure gradients. Mutates
    /// both compartments directly; the caller resolves `blood`/`gas` into
    /// these references via the engine's name index.
    pub fn exchange(&mut self, dt: f64, blood: &mut BloodComposition, blood_vol: f64, gas: &mut GasComposition, gas_vol: f64, blood_pres: f64) {
        if !self.enabled {
            return;
        }

        blood.oxy_enabled = true;
        blood.acidbase_enabled = true;

        let gas_po2 = gas.partial_pressures[super::capacitive::GasSpecies::O2 as usize];
        let gas_pco2 = gas.partial_pressures[super::capacitive::GasSpecies::CO2 as usize];

        self.flux_o2 = (blood.po2 - gas_po2) * self.diff_o2 * self.diff_o2_fac * dt;
        self.flux_co2 = (blood.pco2 - gas_pco2) * self.diff_co2 * self.diff_co2_fac * dt;

        let new_to2 = (blood.to2 * blood_vol - self.flux_o2) / blood_vol;
        blood.to2 = new_to2.max(0.0);

        let new_tco2 = (blood.tco2 * blood_vol - self.flux_co2) / blood_vol;
        blood.tco2 = new_tco2.max(0.0);

        gas.exchange_gas(blood_pres, gas_vol, self.flux_o2, self.flux_co2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::capacitive::GasSpecies;

    #[test]
    fn positive_gradient_moves_o2_from_blood_to_gas() {
        let mut exch = GasExchanger::new("gx", 0, 1);
        let mut blood = BloodComposition { po2: 100.0, pco2: 40.0, to2: 8.0, tco2: 20.0, ..Default::default() };
        let mut gas = GasComposition::default();
        gas.partial_pressures[GasSpecies::O2 as usize] = 40.0;
        gas.partial_pressures[GasSpecies::CO2 as usize] = 45.0;
        gas.c_total = 40.0;
        gas.wet_fractions[GasSpecies::O2 as usize] = 0.1;
        gas.wet_fractions[GasSpecies::CO2 as usize] = 0.05;
        gas.ph2o = 47.0;

        exch.exchange(5e-4, &mut blood, 0.02, &mut gas, 0.02, 760.0);

        assert!(exch.flux_o2 > 0.0, "o2 should flow blood -> gas");
        assert!(blood.to2 < 8.0);
        assert!(blood.acidbase_enabled);
        assert!(blood.oxy_enabled);
    }

    #[test]
    fn exchange_never_drives_content_negative() {
        let mut exch = GasExchanger::new("gx", 0, 1);
        exch.diff_o2 = 1000.0;
        let mut blood = BloodComposition { po2: 100.0, pco2: 40.0, to2: 0.01, tco2: 20.0, ..Default::default() };
        let mut gas = GasComposition::default();
        gas.ph2o = 47.0;

        exch.exchange(5e-4, &mut blood, 0.02, &mut gas, 0.02, 760.0);
        assert!(blood.to2 >= 0.0);
    }
}
