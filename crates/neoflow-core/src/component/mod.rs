//! The component kinds the engine can register and step, and the tagged
//! enum (`ComponentKind`) that lets `Engine` hold them in one
//! `Vec<RefCell<ComponentKind>>` while dispatching to each kind's own
//! stepping logic (spec §9's "mutation discipline").

pub mod actuators;
pub mod autonomic;
pub mod capacitive;
pub mod chemistry;
pub mod gas_exchanger;
pub mod heart;
pub mod intrathoracic;
pub mod metabolism;
pub mod resistor;
pub mod ventilator;

use actuators::{Ecls, Lymphatics, Pda};
use autonomic::{Effector, Integrator, Sensor};
use capacitive::CapacitiveElement;
use chemistry::BloodChemistry;
use gas_exchanger::GasExchanger;
use heart::{Ecg, HeartDriver};
use intrathoracic::IntrathoracicPressure;
use metabolism::Metabolism;
use resistor::Resistor;
use ventilator::Ventilator;

/// Every component kind the engine knows how to register and step.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    Capacitive(CapacitiveElement),
    Resistor(Resistor),
    Chemistry(BloodChemistry),
    Ecg(Ecg),
    Heart(HeartDriver),
    Intrathoracic(IntrathoracicPressure),
    GasExchanger(GasExchanger),
    Metabolism(Metabolism),
    Sensor(Sensor),
    Integrator(Integrator),
    Effector(Effector),
    Ventilator(Ventilator),
    Pda(Pda),
    Ecls(Ecls),
    Lymphatics(Lymphatics),
}

impl ComponentKind {
    pub fn name(&self) -> &str {
        match self {
            ComponentKind::Capacitive(c) => &c.name,
            ComponentKind::Resistor(c) => &c.name,
            ComponentKind::Chemistry(c) => &c.name,
            ComponentKind::Ecg(c) => &c.name,
            ComponentKind::Heart(c) => &c.name,
            ComponentKind::Intrathoracic(c) => &c.name,
            ComponentKind::GasExchanger(c) => &c.name,
            ComponentKind::Metabolism(c) => &c.name,
            ComponentKind::Sensor(c) => &c.name,
            ComponentKind::Integrator(c) => &c.name,
            ComponentKind::Effector(c) => &c.name,
            ComponentKind::Ventilator(c) => &c.name,
            ComponentKind::Pda(c) => &c.name,
            ComponentKind::Ecls(c) => &c.name,
            ComponentKind::Lymphatics(c) => &c.name,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            ComponentKind::Capacitive(c) => c.enabled,
            ComponentKind::Resistor(c) => c.enabled,
            ComponentKind::Chemistry(c) => c.enabled,
            ComponentKind::Ecg(c) => c.enabled,
            ComponentKind::Heart(c) => c.enabled,
            ComponentKind::Intrathoracic(c) => c.enabled,
            ComponentKind::GasExchanger(c) => c.enabled,
            ComponentKind::Metabolism(c) => c.enabled,
            ComponentKind::Sensor(c) => c.enabled,
            ComponentKind::Integrator(c) => c.enabled,
            ComponentKind::Effector(c) => c.enabled,
            ComponentKind::Ventilator(c) => c.enabled,
            ComponentKind::Pda(c) => c.enabled,
            ComponentKind::Ecls(c) => c.enabled,
            ComponentKind::Lymphatics(c) => c.enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            ComponentKind::Capacitive(c) => c.enabled = enabled,
            ComponentKind::Resistor(c) => c.enabled = enabled,
            ComponentKind::Chemistry(c) => c.enabled = enabled,
            ComponentKind::Ecg(c) => c.enabled = enabled,
            ComponentKind::Heart(c) => c.enabled = enabled,
            ComponentKind::Intrathoracic(c) => c.enabled = enabled,
            ComponentKind::GasExchanger(c) => c.enabled = enabled,
            ComponentKind::Metabolism(c) => c.enabled = enabled,
            ComponentKind::Sensor(c) => c.enabled = enabled,
            ComponentKind::Integrator(c) => c.enabled = enabled,
            ComponentKind::Effector(c) => c.enabled = enabled,
            ComponentKind::Ventilator(c) => c.enabled = enabled,
            ComponentKind::Pda(c) => c.enabled = enabled,
            ComponentKind::Ecls(c) => c.enabled = enabled,
            ComponentKind::Lymphatics(c) => c.enabled = enabled,
        }
    }

    pub fn as_capacitive(&self) -> Option<&CapacitiveElement> {
        match self {
            ComponentKind::Capacitive(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_capacitive_mut(&mut self) -> Option<&mut CapacitiveElement> {
        match self {
            ComponentKind::Capacitive(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_resistor_mut(&mut self) -> Option<&mut Resistor> {
        match self {
            ComponentKind::Resistor(c) => Some(c),
            _ => None,
        }
    }
}
