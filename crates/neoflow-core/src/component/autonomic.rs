//! Sensor → integrator → effector autonomic control pipeline (spec §4.7),
//! grounded on `original_source/explain_core/core_models/Sensor.py`,
//! `SensorIntegrator.py` and `Effector.py`. Per spec.md §9's open question,
//! this is the only autonomic-control variant implemented; the pathway/
//! effector-site and hard-coded-pathway variants visible in
//! `original_source/` are not ported.

/// A compartment property an autonomic sensor can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensedProperty {
    Pres,
    Vol,
    Ph,
    Pco2,
    Po2,
    Hco3,
    Be,
}

impl SensedProperty {
    /// Whether reading this property requires the source compartment's
    /// acid-base/oxygenation solvers to be active.
    pub fn needs_chemistry(&self) -> bool {
        matches!(self, SensedProperty::Ph | SensedProperty::Pco2 | SensedProperty::Po2)
    }
}

/// Sigmoid transform of a sensed compartment property plus first-order
/// smoothing. The sigmoid's output is re-centred on zero (rather than the
/// original's 0-100 scale centred on 50) so `Effector` can apply
/// `reference + gain * integrator_output` directly, per spec §4.7 — the
/// recentring is linear and so leaves `Integrator`'s weighted average
/// unaffected.
#[derive(Debug, Clone)]
pub struct Sensor {
    pub name: String,
    pub enabled: bool,

    pub source: usize,
    pub property: SensedProperty,

    pub setpoint: f64,
    pub sensitivity: f64,
    pub time_constant: f64,
    pub update_interval: f64,

    pub sensor_output: f64,
    counter: f64,
}

impl Sensor {
    pub fn new(name: impl Into<String>, source: usize, property: SensedProperty) -> Self {
        Sensor {
            name: name.into(),
            enabled: true,
            source,
            property,
            setpoint: 53.0,
            sensitivity: 0.1,
            time_constant: 1.0,
            update_interval: 0.05,
            sensor_output: 0.0,
            counter: 0.0,
        }
    }

    /// Advances the sensor's accumulator and, when it fires, updates
    /// `sensor_output` from `value` (the caller-read compartment property).
    pub fn step(&mut self, dt: f64, value: f64) -> bool {
        if !self.enabled {
            return false;
        }
        self.counter += dt;
        if self.counter > self.update_interval {
            let activity = 100.0 / (1.0 + (-(value - self.setpoint) * self.sensitivity).exp()) - 50.0;
            self.sensor_output =
                self.update_interval * ((1.0 / self.time_constant) * (-self.sensor_output + activity)) + self.sensor_output;
            self.counter = 0.0;
            true
        } else {
            false
        }
    }
}

/// Linear combiner over a weighted set of sensors.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub name: String,
    pub enabled: bool,

    pub sensors: Vec<(usize, f64)>,
    pub update_interval: f64,
    pub output: f64,
    counter: f64,
}

impl Integrator {
    pub fn new(name: impl Into<String>, sensors: Vec<(usize, f64)>) -> Self {
        Integrator {
            name: name.into(),
            enabled: true,
            sensors,
            update_interval: 0.05,
            output: 0.0,
            counter: 0.0,
        }
    }

    /// `sensor_outputs` are the current `sensor_output` values of
    /// `self.sensors`, in the same order, gathered by the caller.
    pub fn step(&mut self, dt: f64, sensor_outputs: &[f64]) -> bool {
        if !self.enabled {
            return false;
        }
        self.counter += dt;
        if self.counter > self.update_interval {
            let total_magnitude: f64 = self.sensors.iter().map(|(_, m)| m).sum();
            let total_output: f64 = self
                .sensors
                .iter()
                .zip(sensor_outputs)
                .map(|((_, m), out)| out * m)
                .sum();
            self.output = if total_magnitude != 0.0 { total_output / total_magnitude } else { 0.0 };
            self.counter = 0.0;
            true
        } else {
            false
        }
    }
}

/// Compartment property an effector can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectorTarget {
    UVol,
    ElBase,
    RFor,
    HeartRate,
}

/// Applies `new = reference + gain * integrator_output` to a target
/// property, with mass-conservation coupling when the target is `u_vol`.
#[derive(Debug, Clone)]
pub struct Effector {
    pub name: String,
    pub enabled: bool,

    pub integrator: usize,
    pub target: EffectorTarget,
    pub target_idx: usize,

    pub gain: f64,
    pub reference: f64,

    prev_prop_change: f64,
}

impl Effector {
    pub fn new(name: impl Into<String>, integrator: usize, target: EffectorTarget, target_idx: usize) -> Self {
        Effector {
            name: name.into(),
            enabled: true,
            integrator,
            target,
            target_idx,
            gain: 1.0,
            reference: 0.0,
            prev_prop_change: 0.0,
        }
    }

    /// Returns the new target value and, when the target is `u_vol`, the
    /// `vol` delta (always the negative of the new value) the caller must
    /// also apply to the same compartment to preserve total volume.
    pub fn apply(&mut self, integrator_output: f64) -> (f64, Option<f64>) {
        let prop_change = integrator_output * self.gain;
        let new_value = self.reference + prop_change;

        let vol_delta = if self.target == EffectorTarget::UVol {
            let delta = -(prop_change - self.prev_prop_change);
            self.prev_prop_change = prop_change;
            Some(delta)
        } else {
            None
        };

        (new_value, vol_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_at_setpoint_settles_near_zero() {
        let mut s = Sensor::new("s", 0, SensedProperty::Pres);
        for _ in 0..1000 {
            s.step(0.05, s.setpoint);
        }
        assert!(s.sensor_output.abs() < 1.0, "sensor_output: {}", s.sensor_output);
    }

    #[test]
    fn integrator_averages_weighted_sensors() {
        let mut integ = Integrator::new("i", vec![(0, 1.0), (1, 1.0)]);
        let fired = integ.step(0.1, &[10.0, 20.0]);
        assert!(fired);
        assert!((integ.output - 15.0).abs() < 1e-9);
    }

    #[test]
    fn uvol_effector_reports_conserving_vol_delta() {
        let mut eff = Effector::new("e", 0, EffectorTarget::UVol, 1);
        eff.gain = 2.0;
        eff.reference = 0.1;

        let (new_uvol, delta) = eff.apply(5.0);
        assert!((new_uvol - 10.1).abs() < 1e-9, "new_uvol: {}", new_uvol);
        assert_eq!(delta, Some(-10.0));

        let (_, delta2) = eff.apply(5.0);
        assert_eq!(delta2, Some(0.0), "no further vol change once prop_change is stable");
    }

    #[test]
    fn non_uvol_effector_reports_no_mass_coupling() {
        let mut eff = Effector::new("e", 0, EffectorTarget::HeartRate, 1);
        let (_, delta) = eff.apply(3.0);
        assert_eq!(delta, None);
    }
}
