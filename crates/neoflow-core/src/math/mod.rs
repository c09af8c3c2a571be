//! Small hand-rolled numeric helpers shared by components.

use std::f64::consts::E;

pub mod brent;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Copy)]
pub enum BoundFn {
    Linear,
    Sigmoid,
}

impl BoundFn {
    pub fn call(&self, t: f64, d: f64, a: f64) -> f64 {
        match self {
            BoundFn::Linear => bound_linear(t, d, a),
            BoundFn::Sigmoid => bound_sigmoid(t, d, a),
        }
    }
}

/// A mathematical sigmoid / logistic function with additional bounds
/// to define function shape
///
/// ### Arguments
/// * `t` - time
/// * `d` - duration
/// * `a` - amplitude
pub fn bound_sigmoid(t: f64, d: f64, a: f64) -> f64 {
    a / (1.0 + f64::exp(-((4.0 * E / d) * t - 2.0 * E)))
}

/// A linear function with additional bounds to define function shape
///
/// ### Arguments
/// * `t` - time
/// * `d` - duration
/// * `a` - amplitude
pub fn bound_linear(t: f64, d: f64, a: f64) -> f64 {
    if t < d {
        return a * t / d;
    }
    a
}

/// Single Gaussian activation pulse, used by the heart driver for the
/// atrial activation factor.
///
/// ### Arguments
/// * `t` - elapsed time within the activation window
/// * `amplitude` - peak height
/// * `peak` - time at which the pulse peaks
/// * `width` - standard-deviation-like width parameter
pub fn gaussian(t: f64, amplitude: f64, peak: f64, width: f64) -> f64 {
    amplitude * f64::exp(-((t - peak) / width).powi(2))
}

/// Water vapour pressure (mmHg) at the given temperature in degrees Celsius.
///
/// `p_H2O = exp(20.386 - 5132/(T+273))`
pub fn water_vapour_pressure_mmhg(temp_c: f64) -> f64 {
    f64::exp(20.386 - 5132.0 / (temp_c + 273.0))
}

#[cfg(test)]
mod tests {
    use super::{bound_linear, bound_sigmoid, gaussian, water_vapour_pressure_mmhg};

    macro_rules! func_tests {
        ($($name:ident: $func:ident, $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (t, d, a, expected) = $value;
                let result = $func(t,d,a);
                assert!((result - expected).abs() < 0.01, "t: {}, result: {}", t, result);
            }
        )*
        }
    }

    func_tests! {
        linear_0:    bound_linear, (0.0, 1.0, 1.0, 0.0),
        linear_1q:   bound_linear, (0.25, 1.0, 1.0, 0.25),
        linear_1h:   bound_linear, (0.5, 1.0, 1.0, 0.5),
        linear_3q:   bound_linear, (0.75, 1.0, 1.0, 0.75),
        linear_1:    bound_linear, (1.0, 1.0, 1.0, 1.0),
        linear_1_1h: bound_linear, (1.5, 1.0, 1.0, 1.0),

        sigmoid_0:    bound_sigmoid, (0.0, 1.0, 1.0, 0.0),
        sigmoid_1q:   bound_sigmoid, (0.25, 1.0, 1.0, 0.0619),
        sigmoid_1h:   bound_sigmoid, (0.5, 1.0, 1.0, 0.5),
        sigmoid_3q:   bound_sigmoid, (0.75, 1.0, 1.0, 0.9381),
        sigmoid_1:    bound_sigmoid, (1.0, 1.0, 1.0, 1.0),
        sigmoid_1_1h: bound_sigmoid, (1.5, 1.0, 1.0, 1.0),
    }

    #[test]
    fn gaussian_peaks_at_peak_time() {
        let peak_val = gaussian(0.5, 1.0, 0.5, 0.1);
        let off_peak = gaussian(0.2, 1.0, 0.5, 0.1);
        assert!((peak_val - 1.0).abs() < 1e-9);
        assert!(off_peak < peak_val);
    }

    #[test]
    fn water_vapour_pressure_at_body_temp() {
        // Body temperature water vapour pressure is ~47 mmHg.
        let p = water_vapour_pressure_mmhg(37.0);
        assert!((p - 47.0).abs() < 1.0, "p: {}", p);
    }
}
