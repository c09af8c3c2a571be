//! Capacitive elements: compliances and time-varying elastances.
//!
//! `BloodCompliance`, `GasCompliance` and `TimeVaryingElastance` share one
//! pressure-volume relationship (spec §3 describes them as a single data
//! shape); they differ only in how elastance is computed and in which
//! substance payload they carry, so this module models them as one
//! `CapacitiveElement` struct parameterised by an `Elastance` mode and a
//! `Content` payload, rather than three near-duplicate structs.

use crate::math::water_vapour_pressure_mmhg;
use std::collections::HashMap;

/// How a capacitive element's elastance is computed each tick.
#[derive(Debug, Clone)]
pub enum Elastance {
    /// A fixed compliance: `el_base·el_base_fac + el_k·el_k_fac·v_excess^2`.
    Fixed { el_base: f64, el_base_fac: f64 },
    /// An actively driven chamber: elastance interpolates between
    /// `el_min` and `el_max` by `varying_elastance_factor`, then adds the
    /// same quadratic term.
    TimeVarying {
        el_min: f64,
        el_min_fac: f64,
        el_max: f64,
        el_max_fac: f64,
        varying_elastance_factor: f64,
    },
}

impl Elastance {
    fn linear_component(&self) -> f64 {
        match self {
            Elastance::Fixed { el_base, el_base_fac } => el_base * el_base_fac,
            Elastance::TimeVarying {
                el_min,
                el_min_fac,
                el_max,
                el_max_fac,
                varying_elastance_factor,
            } => {
                let min = el_min * el_min_fac;
                let max = el_max * el_max_fac;
                min + (max - min) * varying_elastance_factor
            }
        }
    }
}

/// One tracked, optionally-fixed compound concentration (spec §3's
/// "named compounds each carrying `{concentration, fixed}`").
#[derive(Debug, Clone, Copy)]
pub struct Compound {
    pub concentration: f64,
    pub fixed: bool,
}

/// Blood-specific substance payload.
#[derive(Debug, Clone, Default)]
pub struct BloodComposition {
    pub to2: f64,
    pub tco2: f64,
    pub sodium: f64,
    pub potassium: f64,
    pub calcium: f64,
    pub magnesium: f64,
    pub chloride: f64,
    pub lactate: f64,
    pub urate: f64,
    pub albumin: f64,
    pub phosphates: f64,
    pub hemoglobin: f64,
    pub uma: f64,
    pub compounds: HashMap<String, Compound>,

    // acid-base / oxygenation outputs, written by the chemistry component
    pub ph: f64,
    pub pco2: f64,
    pub hco3: f64,
    pub cco3: f64,
    pub be: f64,
    pub po2: f64,
    pub so2: f64,
    pub dpg: f64,

    pub acidbase_enabled: bool,
    pub oxy_enabled: bool,
}

/// The four gas species this model tracks: oxygen, carbon dioxide,
/// nitrogen, argon (matches the original reference model's gas mixture).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasSpecies {
    O2,
    CO2,
    N2,
    Argon,
}

pub const GAS_SPECIES: [GasSpecies; 4] =
    [GasSpecies::O2, GasSpecies::CO2, GasSpecies::N2, GasSpecies::Argon];

/// Gas-specific substance payload.
#[derive(Debug, Clone)]
pub struct GasComposition {
    pub temp_c: f64,
    pub gas_constant: f64,
    /// Dry mole fractions, indexed by `GasSpecies`.
    pub dry_fractions: [f64; 4],
    /// Wet mole fractions, derived each tick from the dry fractions.
    pub wet_fractions: [f64; 4],
    pub partial_pressures: [f64; 4],
    pub concentrations: [f64; 4],
    pub ph2o: f64,
    pub c_total: f64,
    pub fixed_composition: bool,
}

impl Default for GasComposition {
    fn default() -> Self {
        GasComposition {
            temp_c: 37.0,
            gas_constant: 62.36367,
            dry_fractions: [0.0; 4],
            wet_fractions: [0.0; 4],
            partial_pressures: [0.0; 4],
            concentrations: [0.0; 4],
            ph2o: 0.0,
            c_total: 0.0,
            fixed_composition: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Content {
    Blood(BloodComposition),
    Gas(GasComposition),
}

/// A pressure-volume compliance, optionally actively driven.
#[derive(Debug, Clone)]
pub struct CapacitiveElement {
    pub name: String,
    pub enabled: bool,

    pub vol: f64,
    pub u_vol: f64,
    pub u_vol_fac: f64,
    pub el_k: f64,
    pub el_k_fac: f64,
    pub elastance: Elastance,

    pub pres: f64,
    pub pres_transmural: f64,
    pub pres_outside: f64,
    pub pres_itp: f64,
    pub p_atm: f64,
    pub recoil_pressure: f64,

    pub content: Content,

    // systole/diastole/mean tracking (1-second analysis window)
    pub analysis_window_s: f64,
    analysis_counter_s: f64,
    min_pres_temp: f64,
    max_pres_temp: f64,
    pub systole: f64,
    pub diastole: f64,
    pub mean: f64,
}

impl CapacitiveElement {
    pub fn new(name: impl Into<String>, content: Content, elastance: Elastance) -> Self {
        CapacitiveElement {
            name: name.into(),
            enabled: true,
            vol: 0.0,
            u_vol: 0.0,
            u_vol_fac: 1.0,
            el_k: 0.0,
            el_k_fac: 1.0,
            elastance,
            pres: 0.0,
            pres_transmural: 0.0,
            pres_outside: 0.0,
            pres_itp: 0.0,
            p_atm: 760.0,
            recoil_pressure: 0.0,
            content,
            analysis_window_s: 1.0,
            analysis_counter_s: 0.0,
            min_pres_temp: 1000.0,
            max_pres_temp: -1000.0,
            systole: 0.0,
            diastole: 0.0,
            mean: 0.0,
        }
    }

    pub fn is_blood(&self) -> bool {
        matches!(self.content, Content::Blood(_))
    }

    pub fn blood(&self) -> Option<&BloodComposition> {
        match &self.content {
            Content::Blood(b) => Some(b),
            _ => None,
        }
    }

    pub fn blood_mut(&mut self) -> Option<&mut BloodComposition> {
        match &mut self.content {
            Content::Blood(b) => Some(b),
            _ => None,
        }
    }

    pub fn gas_mut(&mut self) -> Option<&mut GasComposition> {
        match &mut self.content {
            Content::Gas(g) => Some(g),
            _ => None,
        }
    }

    /// spec §4.2 `calculate_pressure`.
    pub fn calculate_pressure(&mut self, dt: f64) {
        if !self.enabled {
            return;
        }

        let mut v_excess = self.vol - self.u_vol * self.u_vol_fac;
        if v_excess < 0.0 {
            v_excess = 0.0;
            self.vol = self.u_vol;
        }

        let elastance = self.elastance.linear_component() + self.el_k * self.el_k_fac * v_excess * v_excess;
        self.recoil_pressure = v_excess * elastance;

        self.pres = self.recoil_pressure + self.pres_outside + self.pres_itp + self.p_atm;
        self.pres_transmural = self.recoil_pressure + self.pres_outside - self.pres_itp + self.p_atm;

        self.pres_outside = 0.0;
        self.pres_itp = 0.0;

        if self.pres > self.max_pres_temp {
            self.max_pres_temp = self.pres;
        }
        if self.pres < self.min_pres_temp {
            self.min_pres_temp = self.pres;
        }
        self.analysis_counter_s += dt;
        if self.analysis_counter_s > self.analysis_window_s {
            self.systole = self.max_pres_temp;
            self.diastole = self.min_pres_temp;
            self.max_pres_temp = -1000.0;
            self.min_pres_temp = 1000.0;
            self.analysis_counter_s = 0.0;
            self.mean = (2.0 * self.diastole + self.systole) / 3.0;
        }

        if let Content::Gas(gas) = &mut self.content {
            recalculate_gas_properties(gas, self.pres);
        }
    }

    /// spec §4.2 `volume_in`: adds volume and mixes non-fixed substances
    /// with the source's composition.
    pub fn volume_in(&mut self, dvol: f64, source: &CapacitiveElement) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        match &self.content {
            Content::Gas(g) if g.fixed_composition => return self.protect_mass_balance(),
            _ => {}
        }
        self.vol += dvol;

        if self.vol > 0.0 {
            match (&mut self.content, &source.content) {
                (Content::Blood(dst), Content::Blood(src)) => {
                    mix_blood(dst, src, dvol, self.vol);
                }
                (Content::Gas(dst), Content::Gas(src)) => {
                    mix_gas(dst, src, dvol, self.vol);
                }
                _ => {}
            }
        }
        self.protect_mass_balance()
    }

    /// spec §4.2 `volume_out`.
    pub fn volume_out(&mut self, dvol: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        if let Content::Gas(g) = &self.content {
            if g.fixed_composition {
                return self.protect_mass_balance();
            }
        }
        self.vol -= dvol;
        self.protect_mass_balance()
    }

    /// Clamp `vol` at zero and return the magnitude of any overdraft so the
    /// caller (a resistor) can re-credit it to the peer compartment.
    fn protect_mass_balance(&mut self) -> f64 {
        if self.vol < 0.0 {
            let overdraft = -self.vol;
            self.vol = 0.0;
            overdraft
        } else {
            0.0
        }
    }
}

fn mix_blood(dst: &mut BloodComposition, src: &BloodComposition, dvol: f64, vol: f64) {
    for (name, compound) in dst.compounds.iter_mut() {
        if compound.fixed {
            continue;
        }
        if let Some(src_compound) = src.compounds.get(name) {
            let d = (src_compound.concentration - compound.concentration) * dvol;
            compound.concentration = (compound.concentration * vol + d) / vol;
        }
    }
    let d_o2 = (src.to2 - dst.to2) * dvol;
    dst.to2 = (dst.to2 * vol + d_o2) / vol;
    let d_co2 = (src.tco2 - dst.tco2) * dvol;
    dst.tco2 = (dst.tco2 * vol + d_co2) / vol;
}

fn mix_gas(dst: &mut GasComposition, src: &GasComposition, dvol: f64, vol: f64) {
    if dst.fixed_composition {
        return;
    }
    for i in 0..4 {
        let d = (src.dry_fractions[i] - dst.dry_fractions[i]) * dvol;
        dst.dry_fractions[i] = (dst.dry_fractions[i] * vol + d) / vol;
    }
}

/// Ideal-gas-law derived quantities plus humidified wet fractions, partial
/// pressures and concentrations (spec §3's gas invariants).
fn recalculate_gas_properties(gas: &mut GasComposition, pres: f64) {
    gas.c_total = (pres / (gas.gas_constant * (273.15 + gas.temp_c))) * 1000.0;
    gas.ph2o = water_vapour_pressure_mmhg(gas.temp_c);
    let fh2o = gas.ph2o / pres;

    for i in 0..4 {
        gas.wet_fractions[i] = gas.dry_fractions[i] * (1.0 - fh2o);
        gas.partial_pressures[i] = gas.wet_fractions[i] * pres;
        gas.concentrations[i] = gas.wet_fractions[i] * gas.c_total;
    }
}

impl GasComposition {
    /// spec §4.6 `exchange_gas`: adjusts O2/CO2 wet content by the given
    /// flux (mmol) and re-derives the dry fractions.
    pub fn exchange_gas(&mut self, pres: f64, vol: f64, flux_o2: f64, flux_co2: f64) {
        let fh2o = (self.ph2o / pres).clamp(0.0, 0.99);
        let o2_idx = GasSpecies::O2 as usize;
        let co2_idx = GasSpecies::CO2 as usize;

        let new_fo2 = ((self.wet_fractions[o2_idx] * self.c_total * vol) + flux_o2) / vol / self.c_total;
        let new_fco2 = ((self.wet_fractions[co2_idx] * self.c_total * vol) + flux_co2) / vol / self.c_total;

        self.dry_fractions[o2_idx] = new_fo2 / (1.0 - fh2o);
        self.dry_fractions[co2_idx] = new_fco2 / (1.0 - fh2o);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blood_element(vol: f64, u_vol: f64, el_base: f64) -> CapacitiveElement {
        let mut c = CapacitiveElement::new(
            "TEST",
            Content::Blood(BloodComposition::default()),
            Elastance::Fixed { el_base, el_base_fac: 1.0 },
        );
        c.vol = vol;
        c.u_vol = u_vol;
        c
    }

    #[test]
    fn single_compliance_matches_spec_scenario_1() {
        // spec §8 scenario 1: el_base=20, u_vol=0.05, vol=0.10 -> pres = 761
        let mut c = blood_element(0.10, 0.05, 20.0);
        c.calculate_pressure(5e-4);
        assert!((c.pres - 761.0).abs() < 1e-9, "pres: {}", c.pres);
        assert!((c.pres_transmural - 761.0).abs() < 1e-9);
    }

    #[test]
    fn collapsed_compliance_has_zero_recoil() {
        let mut c = blood_element(0.01, 0.05, 20.0);
        c.calculate_pressure(5e-4);
        assert_eq!(c.recoil_pressure, 0.0);
        assert_eq!(c.vol, c.u_vol);
    }

    #[test]
    fn single_tick_inputs_are_zeroed_after_pressure_calc() {
        let mut c = blood_element(0.1, 0.05, 20.0);
        c.pres_outside = 5.0;
        c.pres_itp = 2.0;
        c.calculate_pressure(5e-4);
        assert_eq!(c.pres_outside, 0.0);
        assert_eq!(c.pres_itp, 0.0);
    }

    #[test]
    fn volume_out_reports_overdraft() {
        let mut c = blood_element(0.05, 0.0, 1.0);
        let overdraft = c.volume_out(0.2);
        assert_eq!(c.vol, 0.0);
        assert!((overdraft - 0.15).abs() < 1e-9);
    }

    #[test]
    fn mixing_moves_concentration_toward_source() {
        let mut dst = blood_element(1.0, 0.0, 1.0);
        let mut src = blood_element(1.0, 0.0, 1.0);
        if let Content::Blood(b) = &mut dst.content {
            b.to2 = 5.0;
        }
        if let Content::Blood(b) = &mut src.content {
            b.to2 = 9.0;
        }
        dst.volume_in(0.1, &src);
        let to2 = dst.blood().unwrap().to2;
        assert!(to2 > 5.0 && to2 < 9.0, "to2: {}", to2);
    }

    #[test]
    fn time_varying_elastance_interpolates() {
        let mut c = CapacitiveElement::new(
            "LV",
            Content::Blood(BloodComposition::default()),
            Elastance::TimeVarying {
                el_min: 1.0,
                el_min_fac: 1.0,
                el_max: 10.0,
                el_max_fac: 1.0,
                varying_elastance_factor: 0.0,
            },
        );
        c.vol = 1.0;
        c.calculate_pressure(5e-4);
        let diastolic_recoil = c.recoil_pressure;

        if let Elastance::TimeVarying { varying_elastance_factor, .. } = &mut c.elastance {
            *varying_elastance_factor = 1.0;
        }
        c.calculate_pressure(5e-4);
        assert!(c.recoil_pressure > diastolic_recoil);
    }
}
