//! Directed hydraulic resistor connecting two capacitive elements (spec §4.3).

use super::capacitive::CapacitiveElement;

#[derive(Debug, Clone)]
pub struct Resistor {
    pub name: String,
    pub enabled: bool,

    pub from: usize,
    pub to: usize,

    pub r_for: f64,
    pub r_for_fac: f64,
    pub r_back: f64,
    pub r_back_fac: f64,
    pub k: f64,
    pub k_fac: f64,

    pub no_flow: bool,
    pub no_backflow: bool,

    pub flow: f64,
    pub resistance: f64,
}

impl Resistor {
    pub fn new(name: impl Into<String>, from: usize, to: usize) -> Self {
        Resistor {
            name: name.into(),
            enabled: true,
            from,
            to,
            r_for: 1.0,
            r_for_fac: 1.0,
            r_back: 1.0,
            r_back_fac: 1.0,
            k: 0.0,
            k_fac: 1.0,
            no_flow: false,
            no_backflow: false,
            flow: 0.0,
            resistance: 0.0,
        }
    }

    fn resistance_for(&self, p1: f64, p2: f64) -> f64 {
        let nonlin = self.k * self.k_fac * self.flow.abs();
        if p1 > p2 {
            self.r_for * self.r_for_fac + nonlin
        } else {
            self.r_back * self.r_back_fac + nonlin
        }
    }

    /// Computes this tick's flow from the endpoints' current pressures.
    /// The Forchheimer term (`k·k_fac·|flow|`) deliberately uses *last*
    /// tick's flow rather than solving implicitly (spec §9).
    pub fn step(&mut self, p1: f64, p2: f64, dt: f64) -> f64 {
        if !self.enabled {
            self.flow = 0.0;
            return 0.0;
        }

        self.resistance = self.resistance_for(p1, p2);

        if self.no_flow {
            self.flow = 0.0;
        } else {
            self.flow = (p1 - p2) / self.resistance;
            if self.flow < 0.0 && self.no_backflow {
                self.flow = 0.0;
            }
        }

        self.flow * dt
    }
}

/// Moves `dvol` (signed, litres) from `from` to `to`, mixing tracked
/// substances, and re-credits any mass-protection overdraft to the source
/// so total volume is conserved (spec §4.2/§4.3).
pub fn transfer(from: &mut CapacitiveElement, to: &mut CapacitiveElement, dvol: f64) {
    if dvol > 0.0 {
        let overdraft = from.volume_out(dvol);
        let delivered = dvol - overdraft;
        let refund = to.volume_in(delivered, from);
        if refund > 0.0 {
            from.vol += refund;
        }
    } else if dvol < 0.0 {
        let overdraft = to.volume_out(-dvol);
        let delivered = -dvol - overdraft;
        let refund = from.volume_in(delivered, to);
        if refund > 0.0 {
            to.vol += refund;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::capacitive::{BloodComposition, Content, Elastance};

    fn element(vol: f64, u_vol: f64, el_base: f64) -> CapacitiveElement {
        let mut c = CapacitiveElement::new(
            "c",
            Content::Blood(BloodComposition::default()),
            Elastance::Fixed { el_base, el_base_fac: 1.0 },
        );
        c.vol = vol;
        c.u_vol = u_vol;
        c
    }

    #[test]
    fn flow_follows_pressure_gradient() {
        let mut r = Resistor::new("r", 0, 1);
        r.r_for = 100.0;
        r.r_back = 100.0;
        let dvol = r.step(10.0, 5.0, 5e-4);
        assert!(r.flow > 0.0);
        assert!(dvol > 0.0);
    }

    #[test]
    fn no_flow_flag_forces_zero_flow() {
        let mut r = Resistor::new("r", 0, 1);
        r.no_flow = true;
        r.step(10.0, 5.0, 5e-4);
        assert_eq!(r.flow, 0.0);
    }

    #[test]
    fn no_backflow_clamps_negative_flow() {
        let mut r = Resistor::new("r", 0, 1);
        r.no_backflow = true;
        r.step(5.0, 10.0, 5e-4);
        assert_eq!(r.flow, 0.0);
    }

    #[test]
    fn two_compliances_equilibrate_within_one_percent() {
        // spec §8 scenario 2
        let mut c1 = element(0.2, 0.1, 10.0);
        let mut c2 = element(0.1, 0.1, 10.0);
        let mut r = Resistor::new("r", 0, 1);
        r.r_for = 100.0;
        r.r_back = 100.0;

        let dt = 5e-4;
        let ticks = (1.0 / dt) as u32;

        c1.calculate_pressure(dt);
        c2.calculate_pressure(dt);

        for _ in 0..ticks {
            let dvol = r.step(c1.pres, c2.pres, dt);
            transfer(&mut c1, &mut c2, dvol);
            c1.calculate_pressure(dt);
            c2.calculate_pressure(dt);
        }

        let mean = (c1.pres + c2.pres) / 2.0;
        assert!((c1.pres - mean).abs() / mean < 0.01, "c1.pres: {}", c1.pres);
        assert!((c2.pres - mean).abs() / mean < 0.01, "c2.pres: {}", c2.pres);
    }
}
