//! The fixed-timestep engine: a name-indexed registry of components, stepped
//! once per tick in strict registration order (spec §2/§9).
//!
//! Components live behind `RefCell` rather than a single `&mut self` borrow
//! per component, because resistors, the heart driver, the gas exchanger and
//! the ventilator all need to read or write a *different* component's state
//! mid-tick. Each slot's own `RefCell` borrow-checks independently, so two
//! distinct indices can be borrowed simultaneously without `unsafe` — this
//! is the concrete Rust realization of spec §9's cross-reference mutation
//! discipline.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{trace, warn};

use crate::component::autonomic::{EffectorTarget, SensedProperty};
use crate::component::capacitive::Elastance;
use crate::component::resistor::transfer;
use crate::component::ComponentKind;
use crate::error::Result;
use crate::quantity::{SimTime, SimTimeSpan};
use crate::telemetry::{NullTelemetry, Telemetry};

/// The simulation registry and clock.
pub struct Engine {
    pub dt: f64,
    clock: SimTime,
    components: Vec<RefCell<ComponentKind>>,
    index: HashMap<String, usize>,
    telemetry: Box<dyn Telemetry>,
}

impl Engine {
    pub fn new(dt: f64) -> Self {
        Engine {
            dt,
            clock: SimTime::from_s(0.0),
            components: Vec::new(),
            index: HashMap::new(),
            telemetry: Box::new(NullTelemetry),
        }
    }

    pub fn set_telemetry(&mut self, telemetry: Box<dyn Telemetry>) {
        self.telemetry = telemetry;
    }

    pub fn clock(&self) -> SimTime {
        self.clock
    }

    /// Registers a component under its own name, returning the index other
    /// components should reference it by.
    pub fn register(&mut self, component: ComponentKind) -> Result<usize> {
        let name = component.name().to_string();
        if self.index.contains_key(&name) {
            return Err(crate::error::ConfigError::DuplicateComponent { name }.into());
        }
        let idx = self.components.len();
        self.index.insert(name, idx);
        self.components.push(RefCell::new(component));
        Ok(idx)
    }

    /// Resolves a registered name to its index (spec §7's named
    /// cross-reference resolution).
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, idx: usize) -> std::cell::Ref<'_, ComponentKind> {
        self.components[idx].borrow()
    }

    pub fn get_mut(&self, idx: usize) -> std::cell::RefMut<'_, ComponentKind> {
        self.components[idx].borrow_mut()
    }

    pub fn get_by_name(&self, name: &str) -> Option<std::cell::Ref<'_, ComponentKind>> {
        self.resolve(name).map(|idx| self.get(idx))
    }

    /// Alias matching the reference interface's `get_model(name)` (spec §6).
    pub fn get_component(&self, name: &str) -> Option<std::cell::Ref<'_, ComponentKind>> {
        self.get_by_name(name)
    }

    /// Reads a JSON model description from `path` and builds a fully
    /// registered `Engine` from it.
    pub fn load_file(path: &str) -> Result<Engine> {
        let json = std::fs::read_to_string(path)?;
        crate::config::load(&json)
    }

    /// Sets a single named property, addressed as `"component.property"`
    /// (spec §6's external `set` interface). Unknown components or
    /// properties are logged and ignored rather than treated as fatal,
    /// matching spec §7's error-handling split (only config loading is
    /// fatal).
    pub fn set(&self, path: &str, value: f64) {
        let Some((name, property)) = path.split_once('.') else {
            warn!("set(): '{path}' is not a 'component.property' path");
            return;
        };
        let Some(idx) = self.resolve(name) else {
            warn!("set(): no component named '{name}'");
            return;
        };
        let mut slot = self.get_mut(idx);
        let applied = match (&mut *slot, property) {
            (ComponentKind::Capacitive(c), "vol") => {
                c.vol = value;
                true
            }
            (ComponentKind::Capacitive(c), "u_vol") => {
                c.u_vol = value;
                true
            }
            (ComponentKind::Capacitive(c), "pres_outside") => {
                c.pres_outside = value;
                true
            }
            (ComponentKind::Capacitive(c), "el_base") => match &mut c.elastance {
                Elastance::Fixed { el_base, .. } => {
                    *el_base = value;
                    true
                }
                Elastance::TimeVarying { .. } => false,
            },
            (ComponentKind::Resistor(r), "r_for") => {
                r.r_for = value;
                true
            }
            (ComponentKind::Resistor(r), "r_back") => {
                r.r_back = value;
                true
            }
            (ComponentKind::Resistor(r), "no_flow") => {
                r.no_flow = value != 0.0;
                true
            }
            (ComponentKind::Ecg(ecg), "heart_rate") => {
                ecg.heart_rate = value;
                true
            }
            (ComponentKind::Effector(eff), "reference") => {
                eff.reference = value;
                true
            }
            (ComponentKind::Effector(eff), "gain") => {
                eff.gain = value;
                true
            }
            _ => false,
        };
        if !applied {
            warn!("set(): '{name}' has no settable property '{property}'");
        }
    }

    /// Advances the simulation by `n` ticks of `self.dt`.
    pub fn step(&mut self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Advances the simulation by `seconds`, rounding down to a whole
    /// number of ticks (spec §2's `calculate(seconds)`).
    pub fn calculate(&mut self, seconds: f64) {
        let n = (seconds / self.dt).round() as u32;
        self.step(n);
    }

    fn tick(&mut self) {
        let dt = self.dt;

        for idx in 0..self.components.len() {
            self.step_component(idx, dt);
        }

        self.clock += SimTimeSpan::from_s(dt);
        self.telemetry.on_step(self.clock.to_s());
    }

    fn step_component(&self, idx: usize, dt: f64) {
        let mut slot = self.components[idx].borrow_mut();
        if !slot.enabled() {
            return;
        }

        match &mut *slot {
            ComponentKind::Capacitive(c) => c.calculate_pressure(dt),

            ComponentKind::Resistor(r) => {
                let (p1, p2) = {
                    let from = self.get(r.from);
                    let to = self.get(r.to);
                    let p1 = from.as_capacitive().map(|c| c.pres).unwrap_or(0.0);
                    let p2 = to.as_capacitive().map(|c| c.pres).unwrap_or(0.0);
                    (p1, p2)
                };
                let dvol = r.step(p1, p2, dt);
                let (from_idx, to_idx) = (r.from, r.to);
                drop(slot);
                if from_idx != to_idx {
                    self.move_volume(from_idx, to_idx, dvol);
                }
            }

            ComponentKind::Chemistry(chem) => {
                if chem.due() {
                    for &target in &chem.targets {
                        let mut c = self.get_mut(target);
                        if let Some(blood) = c.as_capacitive_mut().and_then(|c| c.blood_mut()) {
                            if blood.acidbase_enabled {
                                if !crate::component::chemistry::solve_acidbase(blood) {
                                    warn!("acid-base solve did not converge for a chemistry target");
                                }
                            }
                            if blood.oxy_enabled {
                                crate::component::chemistry::solve_oxygenation(blood);
                            }
                        }
                    }
                }
            }

            ComponentKind::Ecg(ecg) => ecg.step(dt),

            ComponentKind::Heart(heart) => {
                let ecg_idx = heart.ecg;
                let (ncc_atrial, ncc_ventricular, pq_time, ventricular_duration) = {
                    let ecg_slot = self.get(ecg_idx);
                    if let ComponentKind::Ecg(ecg) = &*ecg_slot {
                        (ecg.ncc_atrial, ecg.ncc_ventricular, ecg.pq_time, ecg.ventricular_duration())
                    } else {
                        return;
                    }
                };
                heart.activate(dt, ncc_atrial, ncc_ventricular, pq_time, ventricular_duration);
                let (aaf, vaf) = (heart.aaf, heart.vaf);
                for &target in &[heart.ra, heart.la] {
                    self.set_varying_elastance_factor(target, aaf);
                }
                for &target in &[heart.rv, heart.lv, heart.cor] {
                    self.set_varying_elastance_factor(target, vaf);
                }
            }

            ComponentKind::Intrathoracic(itp) => {
                let pressures: Vec<f64> =
                    itp.sources.iter().filter_map(|&i| self.get(i).as_capacitive().map(|c| c.pres)).collect();
                let outputs = itp.calculate(&pressures);
                for (target_idx, pres_itp) in outputs {
                    if let Some(c) = self.get_mut(target_idx).as_capacitive_mut() {
                        c.pres_itp += pres_itp;
                    }
                }
            }

            ComponentKind::GasExchanger(gx) => {
                let (blood_idx, gas_idx) = (gx.blood, gx.gas);
                if blood_idx == gas_idx {
                    return;
                }
                let (blood_vol, blood_pres) = {
                    let b = self.get(blood_idx);
                    let c = b.as_capacitive().expect("gas exchanger blood target must be capacitive");
                    (c.vol, c.pres)
                };
                let gas_vol = {
                    let g = self.get(gas_idx);
                    g.as_capacitive().expect("gas exchanger gas target must be capacitive").vol
                };
                if blood_vol <= 0.0 || gas_vol <= 0.0 {
                    return;
                }
                let mut blood_slot = self.get_mut(blood_idx);
                let mut gas_slot = self.get_mut(gas_idx);
                if let (Some(blood), Some(gas)) = (
                    blood_slot.as_capacitive_mut().and_then(|c| c.blood_mut()),
                    gas_slot.as_capacitive_mut().and_then(|c| c.gas_mut()),
                ) {
                    gx.exchange(dt, blood, blood_vol, gas, gas_vol, blood_pres);
                }
            }

            ComponentKind::Metabolism(met) => {
                for active in &met.active_compartments {
                    let vol = {
                        let c = self.get(active.target);
                        c.as_capacitive().map(|c| c.vol).unwrap_or(0.0)
                    };
                    if let Some(blood) = self.get_mut(active.target).as_capacitive_mut().and_then(|c| c.blood_mut()) {
                        met.burn(active.fvatp, dt, blood, vol);
                    }
                }
            }

            ComponentKind::Sensor(sensor) => {
                let source = self.get(sensor.source);
                let value = read_sensed_property(&source, sensor.property);
                drop(source);
                sensor.step(dt, value);
            }

            ComponentKind::Integrator(integrator) => {
                let outputs: Vec<f64> = integrator
                    .sensors
                    .iter()
                    .map(|&(idx, _)| match &*self.get(idx) {
                        ComponentKind::Sensor(s) => s.sensor_output,
                        _ => 0.0,
                    })
                    .collect();
                integrator.step(dt, &outputs);
            }

            ComponentKind::Effector(effector) => {
                let integrator_output = match &*self.get(effector.integrator) {
                    ComponentKind::Integrator(i) => i.output,
                    _ => return,
                };
                let (new_value, vol_delta) = effector.apply(integrator_output);
                self.apply_effector_output(effector.target, effector.target_idx, new_value, vol_delta);
            }

            ComponentKind::Ventilator(vent) => {
                let (insp_idx, exp_idx, ventin_idx, ventout_idx, ypiece_idx) =
                    (vent.insp_valve, vent.exp_valve, vent.ventin, vent.ventout, vent.ypiece);
                let mut insp = self.get_mut(insp_idx);
                let mut exp = self.get_mut(exp_idx);
                let mut ventin = self.get_mut(ventin_idx);
                let mut ventout = self.get_mut(ventout_idx);
                let mut ypiece = self.get_mut(ypiece_idx);
                if let (Some(insp), Some(exp), Some(ventin), Some(ventout), Some(ypiece)) = (
                    insp.as_resistor_mut(),
                    exp.as_resistor_mut(),
                    ventin.as_capacitive_mut(),
                    ventout.as_capacitive_mut(),
                    ypiece.as_capacitive_mut(),
                ) {
                    vent.step(dt, insp, exp, ventin, ventout, ypiece);
                }
            }

            ComponentKind::Pda(pda) => {
                let resistor_idx = pda.resistor;
                if let Some(r) = self.get_mut(resistor_idx).as_resistor_mut() {
                    pda.apply(r);
                }
            }

            ComponentKind::Ecls(ecls) => {
                let resistor_idx = ecls.resistor;
                if let Some(r) = self.get_mut(resistor_idx).as_resistor_mut() {
                    ecls.apply(r);
                }
            }

            ComponentKind::Lymphatics(lymph) => lymph.step(),
        }

        trace!("stepped component {idx}");
    }

    fn set_varying_elastance_factor(&self, idx: usize, factor: f64) {
        if let Some(c) = self.get_mut(idx).as_capacitive_mut() {
            if let Elastance::TimeVarying { varying_elastance_factor, .. } = &mut c.elastance {
                *varying_elastance_factor = factor;
            }
        }
    }

    fn move_volume(&self, from_idx: usize, to_idx: usize, dvol: f64) {
        let mut from = self.get_mut(from_idx);
        let mut to = self.get_mut(to_idx);
        if let (Some(from), Some(to)) = (from.as_capacitive_mut(), to.as_capacitive_mut()) {
            transfer(from, to, dvol);
        }
    }

    fn apply_effector_output(&self, target: EffectorTarget, idx: usize, new_value: f64, vol_delta: Option<f64>) {
        let mut slot = self.get_mut(idx);
        match target {
            EffectorTarget::UVol => {
                if let Some(c) = slot.as_capacitive_mut() {
                    c.u_vol = new_value;
                    if let Some(delta) = vol_delta {
                        c.vol += delta;
                    }
                }
            }
            EffectorTarget::ElBase => {
                if let Some(c) = slot.as_capacitive_mut() {
                    if let Elastance::Fixed { el_base, .. } = &mut c.elastance {
                        *el_base = new_value;
                    }
                }
            }
            EffectorTarget::RFor => {
                if let Some(r) = slot.as_resistor_mut() {
                    r.r_for = new_value;
                }
            }
            EffectorTarget::HeartRate => {
                if let ComponentKind::Ecg(ecg) = &mut *slot {
                    ecg.heart_rate = new_value;
                }
            }
        }
    }
}

fn read_sensed_property(component: &ComponentKind, property: SensedProperty) -> f64 {
    let Some(c) = component.as_capacitive() else { return 0.0 };
    match property {
        SensedProperty::Pres => c.pres,
        SensedProperty::Vol => c.vol,
        SensedProperty::Ph => c.blood().map(|b| b.ph).unwrap_or(0.0),
        SensedProperty::Pco2 => c.blood().map(|b| b.pco2).unwrap_or(0.0),
        SensedProperty::Po2 => c.blood().map(|b| b.po2).unwrap_or(0.0),
        SensedProperty::Hco3 => c.blood().map(|b| b.hco3).unwrap_or(0.0),
        SensedProperty::Be => c.blood().map(|b| b.be).unwrap_or(0.0),
    }
}
