//! Supplemented mechanical actuators absent from spec.md's distillation but
//! present in the reference source (SPEC_FULL.md §5.2): the patent ductus
//! arteriosus shunt, veno-arterial ECLS, and a deliberately inert lymphatic
//! return stub. Grounded on `original_source/explain_core/core_models/Pda.py`,
//! `Ecls.py` and `Lymphatics.py`.

use super::resistor::Resistor;

/// Patent ductus arteriosus: a vessel segment whose resistance follows
/// Poiseuille's law from its own diameter and length rather than a
/// configured `r_for`/`r_back` pair.
#[derive(Debug, Clone)]
pub struct Pda {
    pub name: String,
    pub enabled: bool,

    pub resistor: usize,

    pub diameter_mm: f64,
    pub length_mm: f64,
    pub viscosity_cp: f64,

    pub resistance: f64,
}

impl Pda {
    pub fn new(name: impl Into<String>, resistor: usize) -> Self {
        Pda {
            name: name.into(),
            enabled: true,
            resistor,
            diameter_mm: 0.0,
            length_mm: 4.0,
            viscosity_cp: 6.0,
            resistance: 1000.0,
        }
    }

    /// Poiseuille's law: `R = 8·μ·L / (π·r^4)`, converted from
    /// centipoise/millimetres to mmHg·s/L so it can drive a `Resistor`
    /// directly.
    pub fn calculate_resistance(&mut self) -> f64 {
        if !self.enabled || self.diameter_mm <= 0.0 {
            self.resistance = f64::MAX;
            return self.resistance;
        }

        let radius_m = (self.diameter_mm / 2.0) / 1000.0;
        let length_m = self.length_mm / 1000.0;
        let viscosity_pa_s = self.viscosity_cp * 1e-3;

        let r_si = (8.0 * viscosity_pa_s * length_m) / (std::f64::consts::PI * radius_m.powi(4));
        // Pa·s/m^3 -> mmHg·s/L
        self.resistance = r_si * 0.00750062 / 1000.0;
        self.resistance
    }

    /// Applies the computed resistance to the connecting resistor.
    pub fn apply(&mut self, resistor: &mut Resistor) {
        let r = self.calculate_resistance();
        resistor.r_for = r;
        resistor.r_back = r;
    }
}

/// Veno-arterial extracorporeal life support: a sweep-gas-exchanging
/// circuit that adds its own resistance to the drainage/return cannulae and
/// injects a fixed pump pressure between them.
#[derive(Debug, Clone)]
pub struct Ecls {
    pub name: String,
    pub enabled: bool,

    pub drainage: usize,
    pub return_site: usize,
    pub resistor: usize,

    pub cannula_resistance: f64,
    pub pump_pressure: f64,
    pub sweep_gas_flow: f64,
    pub fio2: f64,

    pub running: bool,
}

impl Ecls {
    pub fn new(name: impl Into<String>, drainage: usize, return_site: usize, resistor: usize) -> Self {
        Ecls {
            name: name.into(),
            enabled: true,
            drainage,
            return_site,
            resistor,
            cannula_resistance: 500.0,
            pump_pressure: 100.0,
            sweep_gas_flow: 0.5,
            fio2: 1.0,
            running: false,
        }
    }

    /// Returns the pressure the pump adds between drainage and return, or
    /// `0.0` when stopped or disabled.
    pub fn pump_pressure(&self) -> f64 {
        if self.enabled && self.running {
            self.pump_pressure
        } else {
            0.0
        }
    }

    /// Sets the circuit resistor to the configured cannula resistance.
    /// Running/stopped state still gates flow via `resistor.no_flow`.
    pub fn apply(&self, resistor: &mut Resistor) {
        resistor.r_for = self.cannula_resistance;
        resistor.r_back = self.cannula_resistance;
        resistor.no_flow = !(self.enabled && self.running);
    }
}

/// Lymphatic return from the interstitium. The reference source declares
/// this model and never implements any flow through it; this stub preserves
/// that shape (registrable, a no-op `step`) rather than inventing a
/// mechanism the original itself leaves disabled.
#[derive(Debug, Clone)]
pub struct Lymphatics {
    pub name: String,
    pub enabled: bool,
}

impl Lymphatics {
    pub fn new(name: impl Into<String>) -> Self {
        Lymphatics { name: name.into(), enabled: false }
    }

    pub fn step(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wider_duct_gives_lower_resistance() {
        let mut narrow = Pda::new("pda", 0);
        narrow.diameter_mm = 1.5;
        let mut wide = Pda::new("pda", 0);
        wide.diameter_mm = 3.0;

        let r_narrow = narrow.calculate_resistance();
        let r_wide = wide.calculate_resistance();
        assert!(r_wide < r_narrow, "r_wide: {}, r_narrow: {}", r_wide, r_narrow);
    }

    #[test]
    fn closed_duct_has_effectively_infinite_resistance() {
        let mut pda = Pda::new("pda", 0);
        pda.diameter_mm = 0.0;
        assert_eq!(pda.calculate_resistance(), f64::MAX);
    }

    #[test]
    fn stopped_ecls_contributes_no_pump_pressure() {
        let ecls = Ecls::new("ecls", 0, 1, 2);
        assert_eq!(ecls.pump_pressure(), 0.0);
    }

    #[test]
    fn running_ecls_reports_configured_pump_pressure() {
        let mut ecls = Ecls::new("ecls", 0, 1, 2);
        ecls.running = true;
        assert_eq!(ecls.pump_pressure(), 100.0);
    }

    #[test]
    fn lymphatics_disabled_by_default_and_step_is_inert() {
        let mut lymph = Lymphatics::new("lymph");
        assert!(!lymph.enabled);
        lymph.step();
    }
}
