//! Intrathoracic pressure distribution (spec §4.8), grounded on
//! `original_source/explain_core/core_models/IntrathoracicPressure.py`.

/// Averages the pressure of a set of source compartments and writes a
/// weighted fraction of the mean into each target's `pres_itp`.
#[derive(Debug, Clone)]
pub struct IntrathoracicPressure {
    pub name: String,
    pub enabled: bool,

    pub sources: Vec<usize>,
    pub targets: Vec<(usize, f64)>,

    pub pres: f64,
}

impl IntrathoracicPressure {
    pub fn new(name: impl Into<String>, sources: Vec<usize>, targets: Vec<(usize, f64)>) -> Self {
        IntrathoracicPressure {
            name: name.into(),
            enabled: true,
            sources,
            targets,
            pres: 0.0,
        }
    }

    /// Given the current pressures of `sources` (caller-gathered, since
    /// this component cannot borrow its peers itself), computes the mean
    /// and returns `(target_idx, pres_itp)` pairs to apply.
    pub fn calculate(&mut self, source_pressures: &[f64]) -> Vec<(usize, f64)> {
        if !self.enabled || source_pressures.is_empty() {
            return Vec::new();
        }
        self.pres = source_pressures.iter().sum::<f64>() / source_pressures.len() as f64;
        self.targets.iter().map(|(idx, weight)| (*idx, weight * self.pres)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_sources_and_weights_targets() {
        let mut itp = IntrathoracicPressure::new("itp", vec![0, 1], vec![(2, 1.0), (3, 0.5)]);
        let out = itp.calculate(&[760.0, 764.0]);
        assert!((itp.pres - 762.0).abs() < 1e-9);
        assert_eq!(out, vec![(2, 762.0), (3, 381.0)]);
    }

    #[test]
    fn disabled_produces_no_targets() {
        let mut itp = IntrathoracicPressure::new("itp", vec![0], vec![(1, 1.0)]);
        itp.enabled = false;
        assert!(itp.calculate(&[760.0]).is_empty());
    }
}
