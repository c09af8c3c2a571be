//! Discrete-time lumped-parameter simulator of the neonatal cardiopulmonary
//! system: capacitive elements, resistors and a handful of control/actuator
//! components stepped by a fixed-timestep `Engine` (spec §2/§9).

pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod math;
pub mod param;
pub mod quantity;
pub mod telemetry;

pub use config::{load, load_config, ComponentConfig, ModelConfig};
pub use engine::Engine;
pub use error::{ConfigError, Result};
pub use quantity::{SimTime, SimTimeSpan};
