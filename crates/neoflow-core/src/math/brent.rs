//! Brent's method root finder.
//!
//! Bracket-preserving hybrid of inverse quadratic interpolation, secant, and
//! bisection. Used by the blood chemistry solvers (§4.4) to find the
//! hydrogen-ion concentration that zeroes the plasma net-charge equation and
//! the partial pressure of oxygen that reproduces a measured total oxygen
//! content. Self-limits to `max_iter` iterations and returns `None` rather
//! than panicking; callers must tolerate non-convergence by leaving their
//! state unchanged for that tick.

/// Finds `x` such that `f(x) == 0` within `[x0, x1]`.
///
/// Returns `None` if `f(x0)` and `f(x1)` do not straddle zero, or if the
/// iteration cap is reached before convergence.
pub fn find_root<F>(mut f: F, x0: f64, x1: f64, max_iter: u32, tolerance: f64) -> Option<f64>
where
    F: FnMut(f64) -> f64,
{
    let mut x0 = x0;
    let mut x1 = x1;

    let mut fx0 = f(x0);
    let mut fx1 = f(x1);

    if fx0 * fx1 > 0.0 {
        return None;
    }

    if fx0.abs() < fx1.abs() {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut fx0, &mut fx1);
    }

    let mut x2 = x0;
    let mut fx2;
    let mut mflag = true;
    let mut d: Option<f64> = None;
    let mut steps_taken = 0u32;

    while steps_taken < max_iter && (x1 - x0).abs() > tolerance {
        fx0 = f(x0);
        fx1 = f(x1);
        fx2 = f(x2);

        let mut new = if fx0 != fx2 && fx1 != fx2 {
            let l0 = (x0 * fx1 * fx2) / ((fx0 - fx1) * (fx0 - fx2));
            let l1 = (x1 * fx0 * fx2) / ((fx1 - fx0) * (fx1 - fx2));
            let l2 = (x2 * fx1 * fx0) / ((fx2 - fx0) * (fx2 - fx1));
            l0 + l1 + l2
        } else {
            x1 - (fx1 * (x1 - x0)) / (fx1 - fx0)
        };

        let bisect = new < (3.0 * x0 + x1) / 4.0
            || new > x1
            || (mflag && (new - x1).abs() >= (x1 - x2).abs() / 2.0)
            || (!mflag && d.map_or(true, |d| (new - x1).abs() >= (x2 - d).abs() / 2.0))
            || (mflag && (x1 - x2).abs() < tolerance)
            || (!mflag && d.map_or(true, |d| (x2 - d).abs() < tolerance));

        if bisect {
            new = (x0 + x1) / 2.0;
            mflag = true;
        } else {
            mflag = false;
        }

        let fnew = f(new);
        d = Some(x2);
        x2 = x1;

        if fx0 * fnew < 0.0 {
            x1 = new;
        } else {
            x0 = new;
        }

        if fx0.abs() < fx1.abs() {
            std::mem::swap(&mut x0, &mut x1);
        }

        steps_taken += 1;
    }

    if steps_taken >= max_iter {
        None
    } else {
        Some(x1)
    }
}
