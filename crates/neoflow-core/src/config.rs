//! Typed configuration tree and loader (spec §2.3/§7): deserializes a JSON
//! model description into registered `Engine` components, resolving named
//! cross-references as it goes.

use serde::Deserialize;
use std::collections::HashMap;

use crate::component::actuators::{Ecls, Lymphatics, Pda};
use crate::component::autonomic::{Effector, EffectorTarget, Integrator, Sensor, SensedProperty};
use crate::component::capacitive::{BloodComposition, CapacitiveElement, Content, Elastance, GasComposition};
use crate::component::chemistry::BloodChemistry;
use crate::component::gas_exchanger::GasExchanger;
use crate::component::heart::{Ecg, HeartDriver};
use crate::component::intrathoracic::IntrathoracicPressure;
use crate::component::metabolism::{ActiveCompartment, Metabolism};
use crate::component::resistor::Resistor;
use crate::component::ventilator::Ventilator;
use crate::component::ComponentKind;
use crate::engine::Engine;
use crate::error::{ConfigError, Result};

/// Top-level model description: the fixed timestep plus a flat, name-keyed
/// set of components (spec §2.3 — no nesting, cross-references are by name).
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    pub dt: f64,
    pub components: HashMap<String, ComponentConfig>,
}

/// One component's configuration, tagged by `model_type` the way the
/// reference source's own JSON model definitions are (SPEC_FULL §2.3).
#[derive(Debug, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum ComponentConfig {
    BloodCompliance {
        vol: f64,
        u_vol: f64,
        el_base: f64,
        #[serde(default = "one")]
        el_base_fac: f64,
        #[serde(default)]
        el_k: f64,
    },
    TimeVaryingElastance {
        vol: f64,
        u_vol: f64,
        el_min: f64,
        el_max: f64,
        #[serde(default)]
        el_k: f64,
    },
    GasCompliance {
        vol: f64,
        u_vol: f64,
        el_base: f64,
        #[serde(default)]
        fixed_composition: bool,
    },
    Resistor {
        from: String,
        to: String,
        r_for: f64,
        #[serde(default)]
        r_back: Option<f64>,
        #[serde(default)]
        no_backflow: bool,
    },
    BloodChemistry {
        targets: Vec<String>,
        #[serde(default = "five")]
        interval_ticks: u32,
    },
    Ecg {
        #[serde(default = "heart_rate_default")]
        heart_rate: f64,
    },
    Heart {
        ecg: String,
        ra: String,
        la: String,
        rv: String,
        lv: String,
        cor: String,
    },
    IntrathoracicPressure {
        sources: Vec<String>,
        targets: Vec<(String, f64)>,
    },
    GasExchanger {
        blood: String,
        gas: String,
        #[serde(default = "point_zero_one")]
        diff_o2: f64,
        #[serde(default = "point_zero_one")]
        diff_co2: f64,
    },
    Metabolism {
        active_compartments: Vec<(String, f64)>,
    },
    Sensor {
        source: String,
        property: SensedPropertyConfig,
        setpoint: f64,
        #[serde(default = "point_one")]
        sensitivity: f64,
        #[serde(default = "one")]
        time_constant: f64,
    },
    Integrator {
        sensors: Vec<(String, f64)>,
    },
    Effector {
        integrator: String,
        target: EffectorTargetConfig,
        target_component: String,
        gain: f64,
        #[serde(default)]
        reference: f64,
    },
    Ventilator {
        insp_valve: String,
        exp_valve: String,
        ventin: String,
        ventout: String,
        ypiece: String,
    },
    Pda {
        resistor: String,
        #[serde(default)]
        diameter_mm: f64,
    },
    Ecls {
        drainage: String,
        return_site: String,
        resistor: String,
    },
    Lymphatics {},
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensedPropertyConfig {
    Pres,
    Vol,
    Ph,
    Pco2,
    Po2,
    Hco3,
    Be,
}

impl From<SensedPropertyConfig> for SensedProperty {
    fn from(value: SensedPropertyConfig) -> Self {
        match value {
            SensedPropertyConfig::Pres => SensedProperty::Pres,
            SensedPropertyConfig::Vol => SensedProperty::Vol,
            SensedPropertyConfig::Ph => SensedProperty::Ph,
            SensedPropertyConfig::Pco2 => SensedProperty::Pco2,
            SensedPropertyConfig::Po2 => SensedProperty::Po2,
            SensedPropertyConfig::Hco3 => SensedProperty::Hco3,
            SensedPropertyConfig::Be => SensedProperty::Be,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectorTargetConfig {
    UVol,
    ElBase,
    RFor,
    HeartRate,
}

impl From<EffectorTargetConfig> for EffectorTarget {
    fn from(value: EffectorTargetConfig) -> Self {
        match value {
            EffectorTargetConfig::UVol => EffectorTarget::UVol,
            EffectorTargetConfig::ElBase => EffectorTarget::ElBase,
            EffectorTargetConfig::RFor => EffectorTarget::RFor,
            EffectorTargetConfig::HeartRate => EffectorTarget::HeartRate,
        }
    }
}

fn one() -> f64 {
    1.0
}
fn five() -> u32 {
    5
}
fn point_zero_one() -> f64 {
    0.01
}
fn point_one() -> f64 {
    0.1
}
fn heart_rate_default() -> f64 {
    140.0
}

/// Parses a JSON model description and builds a fully registered `Engine`.
///
/// Components referencing blood/gas compartments, resistors or other
/// control-pipeline components by name (e.g. a `Resistor`'s `from`/`to`, a
/// `Heart`'s chamber names) are resolved in a second pass once every
/// capacitive/resistor/ecg/sensor/integrator component has a registered
/// index, so config order does not matter except for the cross-reference
/// rule itself (spec §7).
pub fn load(json: &str) -> Result<Engine> {
    let parsed: ModelConfig = serde_json::from_str(json)?;
    load_config(parsed)
}

pub fn load_config(config: ModelConfig) -> Result<Engine> {
    let mut engine = Engine::new(config.dt);

    // Pass 1: register every component with a provisional/self-contained
    // state. Cross-references are resolved in pass 2 once all names exist.
    let mut pending: Vec<(String, ComponentConfig)> = config.components.into_iter().collect();
    pending.sort_by(|a, b| a.0.cmp(&b.0));

    let mut placeholders = HashMap::new();
    for (name, cfg) in &pending {
        let placeholder = build_placeholder(name, cfg);
        let idx = engine.register(placeholder)?;
        placeholders.insert(name.clone(), idx);
    }

    for (name, cfg) in pending.drain(..) {
        wire(&mut engine, &placeholders, &name, cfg)?;
    }

    Ok(engine)
}

fn build_placeholder(name: &str, cfg: &ComponentConfig) -> ComponentKind {
    match cfg {
        ComponentConfig::BloodCompliance { .. } | ComponentConfig::TimeVaryingElastance { .. } => {
            ComponentKind::Capacitive(CapacitiveElement::new(
                name,
                Content::Blood(BloodComposition::default()),
                Elastance::Fixed { el_base: 1.0, el_base_fac: 1.0 },
            ))
        }
        ComponentConfig::GasCompliance { .. } => ComponentKind::Capacitive(CapacitiveElement::new(
            name,
            Content::Gas(GasComposition::default()),
            Elastance::Fixed { el_base: 1.0, el_base_fac: 1.0 },
        )),
        ComponentConfig::Resistor { .. } => ComponentKind::Resistor(Resistor::new(name, 0, 0)),
        ComponentConfig::BloodChemistry { .. } => ComponentKind::Chemistry(BloodChemistry::new(name, vec![])),
        ComponentConfig::Ecg { .. } => ComponentKind::Ecg(Ecg::new(name)),
        ComponentConfig::Heart { .. } => ComponentKind::Heart(HeartDriver::new(name, 0, 0, 0, 0, 0, 0)),
        ComponentConfig::IntrathoracicPressure { .. } => {
            ComponentKind::Intrathoracic(IntrathoracicPressure::new(name, vec![], vec![]))
        }
        ComponentConfig::GasExchanger { .. } => ComponentKind::GasExchanger(GasExchanger::new(name, 0, 0)),
        ComponentConfig::Metabolism { .. } => ComponentKind::Metabolism(Metabolism::new(name, vec![])),
        ComponentConfig::Sensor { .. } => ComponentKind::Sensor(Sensor::new(name, 0, SensedProperty::Pres)),
        ComponentConfig::Integrator { .. } => ComponentKind::Integrator(Integrator::new(name, vec![])),
        ComponentConfig::Effector { .. } => {
            ComponentKind::Effector(Effector::new(name, 0, EffectorTarget::HeartRate, 0))
        }
        ComponentConfig::Ventilator { .. } => ComponentKind::Ventilator(Ventilator::new(name, 0, 0, 0, 0, 0)),
        ComponentConfig::Pda { .. } => ComponentKind::Pda(Pda::new(name, 0)),
        ComponentConfig::Ecls { .. } => ComponentKind::Ecls(Ecls::new(name, 0, 0, 0)),
        ComponentConfig::Lymphatics {} => ComponentKind::Lymphatics(Lymphatics::new(name)),
    }
}

fn resolve(placeholders: &HashMap<String, usize>, component: &str, reference: &str) -> Result<usize> {
    placeholders.get(reference).copied().ok_or_else(|| {
        ConfigError::UnresolvedReference { component: component.to_string(), reference: reference.to_string() }.into()
    })
}

fn wire(engine: &mut Engine, placeholders: &HashMap<String, usize>, name: &str, cfg: ComponentConfig) -> Result<()> {
    let idx = *placeholders.get(name).expect("placeholder registered in pass 1");
    let mut slot = engine.get_mut(idx);

    match (cfg, &mut *slot) {
        (ComponentConfig::BloodCompliance { vol, u_vol, el_base, el_base_fac, el_k }, ComponentKind::Capacitive(c)) => {
            c.vol = vol;
            c.u_vol = u_vol;
            c.el_k = el_k;
            c.elastance = Elastance::Fixed { el_base, el_base_fac };
        }
        (ComponentConfig::TimeVaryingElastance { vol, u_vol, el_min, el_max, el_k }, ComponentKind::Capacitive(c)) => {
            c.vol = vol;
            c.u_vol = u_vol;
            c.el_k = el_k;
            c.elastance = Elastance::TimeVarying {
                el_min,
                el_min_fac: 1.0,
                el_max,
                el_max_fac: 1.0,
                varying_elastance_factor: 0.0,
            };
        }
        (ComponentConfig::GasCompliance { vol, u_vol, el_base, fixed_composition }, ComponentKind::Capacitive(c)) => {
            c.vol = vol;
            c.u_vol = u_vol;
            c.elastance = Elastance::Fixed { el_base, el_base_fac: 1.0 };
            if let Some(gas) = c.gas_mut() {
                gas.fixed_composition = fixed_composition;
            }
        }
        (ComponentConfig::Resistor { from, to, r_for, r_back, no_backflow }, ComponentKind::Resistor(r)) => {
            r.from = resolve(placeholders, name, &from)?;
            r.to = resolve(placeholders, name, &to)?;
            r.r_for = r_for;
            r.r_back = r_back.unwrap_or(r_for);
            r.no_backflow = no_backflow;
        }
        (ComponentConfig::BloodChemistry { targets, interval_ticks }, ComponentKind::Chemistry(chem)) => {
            chem.targets = targets.iter().map(|t| resolve(placeholders, name, t)).collect::<Result<_>>()?;
            chem.interval_ticks = interval_ticks;
        }
        (ComponentConfig::Ecg { heart_rate }, ComponentKind::Ecg(ecg)) => {
            ecg.heart_rate = heart_rate;
        }
        (ComponentConfig::Heart { ecg, ra, la, rv, lv, cor }, ComponentKind::Heart(heart)) => {
            heart.ecg = resolve(placeholders, name, &ecg)?;
            heart.ra = resolve(placeholders, name, &ra)?;
            heart.la = resolve(placeholders, name, &la)?;
            heart.rv = resolve(placeholders, name, &rv)?;
            heart.lv = resolve(placeholders, name, &lv)?;
            heart.cor = resolve(placeholders, name, &cor)?;
        }
        (ComponentConfig::IntrathoracicPressure { sources, targets }, ComponentKind::Intrathoracic(itp)) => {
            itp.sources = sources.iter().map(|s| resolve(placeholders, name, s)).collect::<Result<_>>()?;
            itp.targets = targets
                .iter()
                .map(|(t, w)| resolve(placeholders, name, t).map(|idx| (idx, *w)))
                .collect::<Result<_>>()?;
        }
        (ComponentConfig::GasExchanger { blood, gas, diff_o2, diff_co2 }, ComponentKind::GasExchanger(gx)) => {
            gx.blood = resolve(placeholders, name, &blood)?;
            gx.gas = resolve(placeholders, name, &gas)?;
            gx.diff_o2 = diff_o2;
            gx.diff_co2 = diff_co2;
        }
        (ComponentConfig::Metabolism { active_compartments }, ComponentKind::Metabolism(met)) => {
            met.active_compartments = active_compartments
                .iter()
                .map(|(t, fvatp)| resolve(placeholders, name, t).map(|idx| ActiveCompartment { target: idx, fvatp: *fvatp }))
                .collect::<Result<_>>()?;
        }
        (ComponentConfig::Sensor { source, property, setpoint, sensitivity, time_constant }, ComponentKind::Sensor(sensor)) => {
            sensor.source = resolve(placeholders, name, &source)?;
            sensor.property = property.into();
            sensor.setpoint = setpoint;
            sensor.sensitivity = sensitivity;
            sensor.time_constant = time_constant;
        }
        (ComponentConfig::Integrator { sensors }, ComponentKind::Integrator(integrator)) => {
            integrator.sensors = sensors
                .iter()
                .map(|(s, w)| resolve(placeholders, name, s).map(|idx| (idx, *w)))
                .collect::<Result<_>>()?;
        }
        (ComponentConfig::Effector { integrator, target, target_component, gain, reference }, ComponentKind::Effector(effector)) => {
            effector.integrator = resolve(placeholders, name, &integrator)?;
            effector.target = target.into();
            effector.target_idx = resolve(placeholders, name, &target_component)?;
            effector.gain = gain;
            effector.reference = reference;
        }
        (ComponentConfig::Ventilator { insp_valve, exp_valve, ventin, ventout, ypiece }, ComponentKind::Ventilator(vent)) => {
            vent.insp_valve = resolve(placeholders, name, &insp_valve)?;
            vent.exp_valve = resolve(placeholders, name, &exp_valve)?;
            vent.ventin = resolve(placeholders, name, &ventin)?;
            vent.ventout = resolve(placeholders, name, &ventout)?;
            vent.ypiece = resolve(placeholders, name, &ypiece)?;
        }
        (ComponentConfig::Pda { resistor, diameter_mm }, ComponentKind::Pda(pda)) => {
            pda.resistor = resolve(placeholders, name, &resistor)?;
            pda.diameter_mm = diameter_mm;
        }
        (ComponentConfig::Ecls { drainage, return_site, resistor }, ComponentKind::Ecls(ecls)) => {
            ecls.drainage = resolve(placeholders, name, &drainage)?;
            ecls.return_site = resolve(placeholders, name, &return_site)?;
            ecls.resistor = resolve(placeholders, name, &resistor)?;
        }
        (ComponentConfig::Lymphatics {}, ComponentKind::Lymphatics(_)) => {}
        _ => unreachable!("placeholder kind always matches its own config variant"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_two_compliances_and_a_resistor() {
        let json = r#"
        {
            "dt": 0.0005,
            "components": {
                "c1": { "model_type": "blood_compliance", "vol": 0.2, "u_vol": 0.1, "el_base": 10.0 },
                "c2": { "model_type": "blood_compliance", "vol": 0.1, "u_vol": 0.1, "el_base": 10.0 },
                "r": { "model_type": "resistor", "from": "c1", "to": "c2", "r_for": 100.0 }
            }
        }"#;
        let engine = load(json).unwrap();
        let r_idx = engine.resolve("r").unwrap();
        let c1_idx = engine.resolve("c1").unwrap();
        match &*engine.get(r_idx) {
            ComponentKind::Resistor(r) => assert_eq!(r.from, c1_idx),
            _ => panic!("expected resistor"),
        }
    }

    #[test]
    fn unresolved_reference_is_reported() {
        let json = r#"
        {
            "dt": 0.0005,
            "components": {
                "r": { "model_type": "resistor", "from": "missing", "to": "also_missing", "r_for": 1.0 }
            }
        }"#;
        assert!(load(json).is_err());
    }
}
