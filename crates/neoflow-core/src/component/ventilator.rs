//! Mechanical ventilator state machine (spec §4.9), grounded on
//! `original_source/explain_core/core_models/MechanicalVentilator.py`.
//! Adds the `set_settings`/`settings`/`output` command surface from
//! SPEC_FULL.md §5.3 so callers can drive the ventilator the way the
//! external interfaces section of spec.md §6 implies a caller would.

use super::capacitive::{CapacitiveElement, Elastance};
use super::resistor::Resistor;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum VentilatorMode {
    Pc,
    Vc,
    Prvc,
    Hfov,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Inspiration,
    Expiration,
}

/// Caller-facing settings, mirroring `set_ventilator_settings`/
/// `get_ventilator_settings` (SPEC_FULL.md §5.3).
#[derive(Debug, Clone, Copy)]
pub struct VentilatorSettings {
    pub mode: VentilatorMode,
    pub freq: f64,
    pub target_tidal_volume_ml: f64,
    pub insp_time: f64,
    pub inspiratory_flow: f64,
    pub max_pip: f64,
    pub peep: f64,
    pub fio2: f64,
}

/// Per-breath measured output, mirroring `get_ventilator_output`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VentilatorOutput {
    pub exhaled_minute_volume_ml: f64,
    pub expiratory_tidal_volume_ml: f64,
    pub measured_freq: f64,
    pub pip: f64,
    pub peep: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct PidLimiter {
    kp: f64,
    ki: f64,
    kd: f64,
    error_int: f64,
    prev_sensor_value: f64,
}

impl PidLimiter {
    fn reset(&mut self, sensor_value: f64) {
        self.prev_sensor_value = sensor_value;
        self.error_int = 0.0;
    }

    /// Adjusts `resistance` to drive `sensor_value` toward `target`,
    /// clamped at `lower_limit`.
    fn regulate(&mut self, dt: f64, sensor_value: f64, target: f64, resistance: &mut f64, lower_limit: f64) {
        let error = sensor_value - target;
        self.error_int += error * dt;
        let error_dif = (self.prev_sensor_value - sensor_value) / dt;
        self.prev_sensor_value = sensor_value;

        let output = error * self.kp + self.error_int * self.ki - error_dif * self.kd;
        *resistance += output;
        if *resistance < lower_limit {
            *resistance = lower_limit;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ventilator {
    pub name: String,
    pub enabled: bool,

    pub insp_valve: usize,
    pub exp_valve: usize,
    pub ventin: usize,
    pub ventout: usize,
    pub ypiece: usize,

    pub mode: VentilatorMode,
    pub freq: f64,
    pub t_in: f64,
    pub inspiratory_flow: f64,
    pub max_pip: f64,
    pub pip: f64,
    pub peep: f64,
    pub target_tidal_volume: f64,
    pub fio2: f64,

    phase: Phase,
    inspiration_counter: f64,
    expiration_counter: f64,
    inspiratory_tidal_volume_counter: f64,
    expiratory_tidal_volume_counter: f64,
    expiratory_tidal_volume: f64,
    measured_freq_counter: f64,
    measured_freq: f64,
    exhaled_minute_volume: f64,
    peak_pressure_temp: f64,
    peak_pressure: f64,

    pc_pip_reached: bool,
    pc_peep_reached: bool,
    prvc_pres_adjusted: bool,
    prvc_tv_range_pct: f64,

    pid: PidLimiter,

    hfov_counter: f64,
}

impl Ventilator {
    pub fn new(name: impl Into<String>, insp_valve: usize, exp_valve: usize, ventin: usize, ventout: usize, ypiece: usize) -> Self {
        Ventilator {
            name: name.into(),
            enabled: true,
            insp_valve,
            exp_valve,
            ventin,
            ventout,
            ypiece,
            mode: VentilatorMode::Pc,
            freq: 42.0,
            t_in: 0.4,
            inspiratory_flow: 8.0,
            max_pip: 20.0,
            pip: 20.0,
            peep: 5.0,
            target_tidal_volume: 0.0165,
            fio2: 0.21,
            phase: Phase::Inspiration,
            inspiration_counter: 0.0,
            expiration_counter: 0.0,
            inspiratory_tidal_volume_counter: 0.0,
            expiratory_tidal_volume_counter: 0.0,
            expiratory_tidal_volume: 0.0,
            measured_freq_counter: 0.0,
            measured_freq: 0.0,
            exhaled_minute_volume: 0.0,
            peak_pressure_temp: -1000.0,
            peak_pressure: 0.0,
            pc_pip_reached: false,
            pc_peep_reached: false,
            prvc_pres_adjusted: false,
            prvc_tv_range_pct: 5.0,
            pid: PidLimiter { kp: 500.0, ki: 0.0, kd: 5.0, ..Default::default() },
            hfov_counter: 0.0,
        }
    }

    pub fn settings(&self) -> VentilatorSettings {
        VentilatorSettings {
            mode: self.mode,
            freq: self.freq,
            target_tidal_volume_ml: self.target_tidal_volume * 1000.0,
            insp_time: self.t_in,
            inspiratory_flow: self.inspiratory_flow,
            max_pip: self.max_pip,
            peep: self.peep,
            fio2: self.fio2,
        }
    }

    pub fn set_settings(&mut self, settings: &VentilatorSettings) {
        self.mode = settings.mode;
        self.freq = settings.freq;
        self.target_tidal_volume = settings.target_tidal_volume_ml / 1000.0;
        self.max_pip = settings.max_pip;
        self.pip = settings.max_pip;
        self.t_in = settings.insp_time;
        self.peep = settings.peep;
        self.inspiratory_flow = settings.inspiratory_flow;
        self.fio2 = settings.fio2.clamp(0.21, 1.0);
        self.enabled = true;
    }

    pub fn output(&self) -> VentilatorOutput {
        VentilatorOutput {
            exhaled_minute_volume_ml: self.exhaled_minute_volume * 1000.0,
            expiratory_tidal_volume_ml: self.expiratory_tidal_volume * 1000.0,
            measured_freq: self.measured_freq,
            pip: self.pip,
            peep: self.peep,
        }
    }

    /// Runs one tick of the ventilator state machine. `sensor_pco2` is the
    /// end-tidal CO2 source compartment's `pco2`; it is only sampled at
    /// the start of inspiration.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        dt: f64,
        insp_valve: &mut Resistor,
        exp_valve: &mut Resistor,
        ventin: &mut CapacitiveElement,
        ventout: &mut CapacitiveElement,
        ypiece: &mut CapacitiveElement,
    ) {
        if !self.enabled {
            return;
        }

        let sensor_pressure = ypiece.pres - ypiece.p_atm;

        match self.mode {
            VentilatorMode::Pc => self.pressure_control(dt, sensor_pressure, insp_valve, exp_valve, ventin, ventout),
            VentilatorMode::Vc => self.volume_control(dt, sensor_pressure, insp_valve, exp_valve),
            VentilatorMode::Prvc => {
                if self.phase == Phase::Inspiration && !self.prvc_pres_adjusted {
                    self.prvc_pres_adjusted = true;
                    let low = self.target_tidal_volume * (1.0 - self.prvc_tv_range_pct / 100.0);
                    let high = self.target_tidal_volume * (1.0 + self.prvc_tv_range_pct / 100.0);
                    if self.expiratory_tidal_volume < low {
                        self.pip = (self.pip + 1.0).min(self.max_pip);
                    } else if self.expiratory_tidal_volume > high {
                        self.pip = (self.pip - 1.0).max(self.peep + 2.0);
                    }
                }
                if self.phase == Phase::Expiration {
                    self.prvc_pres_adjusted = false;
                }
                self.pressure_control(dt, sensor_pressure, insp_valve, exp_valve, ventin, ventout);
            }
            VentilatorMode::Hfov => self.hfov(dt, insp_valve, exp_valve, ventin, ventout, ypiece),
        }

        if self.phase == Phase::Inspiration {
            self.inspiratory_tidal_volume_counter += insp_valve.flow * dt;
            if sensor_pressure > self.peak_pressure_temp {
                self.peak_pressure_temp = sensor_pressure;
            }
            self.inspiration_counter += dt;
        }
        if self.phase == Phase::Expiration {
            self.expiratory_tidal_volume_counter += exp_valve.flow * dt;
            self.expiration_counter += dt;
        }

        self.measured_freq_counter += dt;
        self.cycle(dt);
    }

    fn pressure_control(
        &mut self,
        dt: f64,
        sensor_pressure: f64,
        insp_valve: &mut Resistor,
        exp_valve: &mut Resistor,
        ventin: &mut CapacitiveElement,
        ventout: &mut CapacitiveElement,
    ) {
        if self.phase == Phase::Inspiration {
            self.pc_peep_reached = false;
            exp_valve.no_flow = true;
            insp_valve.no_flow = false;

            if let Elastance::Fixed { el_base, .. } = &ventin.elastance {
                ventin.vol = 2500.0 / el_base + ventin.u_vol;
            }

            if sensor_pressure >= self.pip && !self.pc_pip_reached {
                self.pc_pip_reached = true;
                self.pid.reset(sensor_pressure);
            }

            if self.pc_pip_reached {
                self.pid.regulate(dt, sensor_pressure, self.pip, &mut insp_valve.r_for, 5.0);
            } else {
                insp_valve.r_for = (ventin.pres - ventout.pres) / (self.inspiratory_flow / 60.0);
            }
        }

        if self.phase == Phase::Expiration {
            self.pc_pip_reached = false;
            insp_valve.no_flow = true;
            exp_valve.no_flow = false;
            exp_valve.r_for = 10.0;

            if let Elastance::Fixed { el_base, .. } = &ventout.elastance {
                ventout.vol = self.peep / el_base + ventout.u_vol;
            }
        }
    }

    fn volume_control(&mut self, dt: f64, sensor_pressure: f64, insp_valve: &mut Resistor, exp_valve: &mut Resistor) {
        if self.phase == Phase::Inspiration {
            self.pc_peep_reached = false;
            exp_valve.no_flow = true;
            insp_valve.no_flow = false;

            if self.inspiratory_tidal_volume_counter > self.target_tidal_volume {
                insp_valve.no_flow = true;
            }
            if sensor_pressure > self.max_pip {
                insp_valve.no_flow = true;
            }
        }

        if self.phase == Phase::Expiration {
            insp_valve.no_flow = true;
            exp_valve.no_flow = false;

            if sensor_pressure <= self.peep && !self.pc_peep_reached {
                self.pc_peep_reached = true;
                self.pid.reset(sensor_pressure);
            }

            if self.pc_peep_reached {
                insp_valve.no_flow = true;
                self.pid.regulate(dt, sensor_pressure, self.peep, &mut exp_valve.r_for, 5.0);
            } else {
                exp_valve.r_for = 20.0;
            }
        }
    }

    fn hfov(
        &mut self,
        dt: f64,
        insp_valve: &mut Resistor,
        exp_valve: &mut Resistor,
        ventin: &mut CapacitiveElement,
        ventout: &mut CapacitiveElement,
        ypiece: &mut CapacitiveElement,
    ) {
        exp_valve.no_flow = false;
        exp_valve.r_for = 10.0;
        if let Elastance::Fixed { el_base, .. } = &ventout.elastance {
            ventout.vol = self.peep / el_base + ventout.u_vol;
        }

        insp_valve.no_flow = false;
        insp_valve.r_for = (ventin.pres - ventout.pres) / (self.inspiratory_flow / 60.0);

        let signal = self.hfov_counter.sin() * 25.0;
        let stepsize = 10.0 * (2.0 * std::f64::consts::PI) * dt;
        self.hfov_counter += stepsize;
        if self.hfov_counter > 2.0 * std::f64::consts::PI {
            self.hfov_counter = 0.0;
        }
        ypiece.pres_outside = signal;
    }

    fn cycle(&mut self, dt: f64) {
        let t_ex = 60.0 / self.freq - self.t_in;
        if self.phase == Phase::Inspiration && self.inspiration_counter > self.t_in {
            self.begin_expiration();
        }
        if self.phase == Phase::Expiration && self.expiration_counter > t_ex {
            self.begin_inspiration();
        }
        let _ = dt;
    }

    fn begin_inspiration(&mut self) {
        self.measured_freq = 60.0 / self.measured_freq_counter.max(1e-9);
        self.expiratory_tidal_volume = self.expiratory_tidal_volume_counter;
        self.exhaled_minute_volume = self.measured_freq * self.expiratory_tidal_volume;

        self.expiration_counter = 0.0;
        self.measured_freq_counter = 0.0;
        self.expiratory_tidal_volume_counter = 0.0;

        self.phase = Phase::Inspiration;
    }

    fn begin_expiration(&mut self) {
        self.peak_pressure = self.peak_pressure_temp;
        self.peak_pressure_temp = -1000.0;
        self.inspiratory_tidal_volume_counter = 0.0;
        self.inspiration_counter = 0.0;

        self.phase = Phase::Expiration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::capacitive::{BloodComposition, Content};

    fn capacitive(el_base: f64, vol: f64, u_vol: f64) -> CapacitiveElement {
        let mut c = CapacitiveElement::new("c", Content::Blood(BloodComposition::default()), Elastance::Fixed { el_base, el_base_fac: 1.0 });
        c.vol = vol;
        c.u_vol = u_vol;
        c
    }

    #[test]
    fn prvc_increases_pip_by_one_when_tidal_volume_undershoots() {
        // spec §8 scenario 6
        let mut vent = Ventilator::new("vent", 0, 1, 2, 3, 4);
        vent.mode = VentilatorMode::Prvc;
        vent.target_tidal_volume = 0.016;
        vent.expiratory_tidal_volume = 0.016 * 0.9; // 10% below target, outside the 5% deadband
        vent.pip = 20.0;
        vent.phase = Phase::Inspiration;
        vent.prvc_pres_adjusted = false;

        let mut insp_valve = Resistor::new("insp", 0, 1);
        let mut exp_valve = Resistor::new("exp", 1, 2);
        let mut ventin = capacitive(10.0, 0.2, 0.1);
        let mut ventout = capacitive(10.0, 0.2, 0.1);
        let mut ypiece = capacitive(10.0, 0.1, 0.1);

        vent.step(5e-4, &mut insp_valve, &mut exp_valve, &mut ventin, &mut ventout, &mut ypiece);

        assert!((vent.pip - 21.0).abs() < 1e-9, "pip: {}", vent.pip);
    }

    #[test]
    fn prvc_clamps_pip_at_max() {
        let mut vent = Ventilator::new("vent", 0, 1, 2, 3, 4);
        vent.mode = VentilatorMode::Prvc;
        vent.max_pip = 20.0;
        vent.pip = 20.0;
        vent.target_tidal_volume = 0.016;
        vent.expiratory_tidal_volume = 0.0;
        vent.phase = Phase::Inspiration;

        let mut insp_valve = Resistor::new("insp", 0, 1);
        let mut exp_valve = Resistor::new("exp", 1, 2);
        let mut ventin = capacitive(10.0, 0.2, 0.1);
        let mut ventout = capacitive(10.0, 0.2, 0.1);
        let mut ypiece = capacitive(10.0, 0.1, 0.1);

        vent.step(5e-4, &mut insp_valve, &mut exp_valve, &mut ventin, &mut ventout, &mut ypiece);
        assert!(vent.pip <= 20.0);
    }

    #[test]
    fn set_settings_round_trips_through_settings() {
        let mut vent = Ventilator::new("vent", 0, 1, 2, 3, 4);
        let settings = VentilatorSettings {
            mode: VentilatorMode::Vc,
            freq: 35.0,
            target_tidal_volume_ml: 18.0,
            insp_time: 0.35,
            inspiratory_flow: 9.0,
            max_pip: 22.0,
            peep: 6.0,
            fio2: 0.4,
        };
        vent.set_settings(&settings);
        let read_back = vent.settings();
        assert_eq!(read_back.mode, VentilatorMode::Vc);
        assert!((read_back.target_tidal_volume_ml - 18.0).abs() < 1e-9);
        assert!((read_back.freq - 35.0).abs() < 1e-9);
    }
}
