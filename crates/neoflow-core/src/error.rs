//! Error kinds crossing the public API boundary.
//!
//! Only configuration problems are fatal (spec §7); everything else (Brent
//! non-convergence, mass overdraft, negative substance totals) is a local,
//! tolerated condition handled inline by the component that hit it and
//! logged at `warn`/`trace` rather than returned.

use std::error::Error;
use std::fmt;

/// Raised while building the component registry from a `ModelConfig`.
pub enum ConfigError {
    /// A component referenced a `model_type` this crate does not implement.
    UnknownModelType { component: String, model_type: String },
    /// Two components were registered under the same name.
    DuplicateComponent { name: String },
    /// A component referenced another component (or one of its properties)
    /// by name, and the reference could not be resolved during
    /// initialization.
    UnresolvedReference { component: String, reference: String },
}

impl Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownModelType { component, model_type } => write!(
                f,
                "component '{component}' requested unknown model_type '{model_type}'"
            ),
            ConfigError::DuplicateComponent { name } => {
                write!(f, "component name '{name}' is already registered")
            }
            ConfigError::UnresolvedReference { component, reference } => write!(
                f,
                "component '{component}' could not resolve reference '{reference}'"
            ),
        }
    }
}

impl fmt::Debug for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} (file: {}, line: {})", file!(), line!())
    }
}

pub type Result<T> = anyhow::Result<T>;
