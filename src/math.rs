//! Small numerical helpers shared by the analyze/amplify stages.
//!
//! None of the crates in this workspace's dependency graph expose an `erf`
//! implementation (the standard library doesn't have one either outside of
//! nightly intrinsics), so the soft-knee saturator below carries its own.

/// Error function approximation (Abramowitz & Stegun 7.1.26), accurate to
/// within 1.5e-7 absolute error over the whole real line. Good enough for a
/// saturator whose output only needs to be monotonic and bounded.
#[must_use]
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / P.mul_add(x, 1.0);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    let y = 1.0 - poly * (-x * x).exp();
    sign * y
}

/// Soft-knee saturator: maps `val` through `threshold` such that
/// `bound(threshold, threshold) == threshold * erf(sqrt(pi)/2)` and the
/// function saturates smoothly as `val` grows past `threshold`.
#[must_use]
pub fn bound(threshold: f64, val: f64) -> f64 {
    const CONST: f64 = std::f64::consts::PI.sqrt() / 2.0;
    erf(CONST * (val / threshold)) * threshold
}

/// Finds the effective threshold `t_eff` such that driving [`bound`] with a
/// unit-amplitude input at `t_eff` reproduces `threshold` as closely as
/// possible, via bit-halving (binary search with halving step size).
#[must_use]
pub fn setup_compress_thresh(threshold: f64) -> f64 {
    if threshold > f64::EPSILON && threshold < (1.0 - f64::EPSILON) {
        let mut current = threshold;
        let mut step = 1.0;
        while step > f64::EPSILON {
            while (current + step > current) && (bound(current + step, 1.0) <= threshold) {
                current += step;
            }
            step /= 2.0;
        }
        current
    } else {
        threshold
    }
}

/// Linearly blends `prev` into `next` using a per-sample fade table entry.
#[must_use]
#[inline]
pub fn fade(prev: f64, next: f64, fade_prev: f64, fade_next: f64) -> f64 {
    fade_prev.mul_add(prev, fade_next * next)
}

/// Exponential smoothing update: `aggressiveness * new + (1 - aggressiveness) * old`.
#[must_use]
#[inline]
pub fn update_value(new: f64, old: f64, aggressiveness: f64) -> f64 {
    aggressiveness.mul_add(new, (1.0 - aggressiveness) * old)
}

/// Clamps `val` into `[min, max]`, matching the constructor-time parameter
/// clamping used throughout [`crate::config`].
#[must_use]
#[inline]
pub fn limit(min: f64, val: f64, max: f64) -> f64 {
    val.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erf_matches_known_values() {
        assert!((erf(0.0) - 0.0).abs() < 1e-9);
        assert!((erf(1.0) - 0.842_700_792_95).abs() < 1e-6);
        assert!((erf(-1.0) + 0.842_700_792_95).abs() < 1e-6);
        assert!((erf(3.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bound_is_odd_and_saturating() {
        assert!((bound(1.0, 0.0)).abs() < 1e-12);
        assert!(bound(1.0, 10.0) < 1.0);
        assert!((bound(1.0, 10.0) - -bound(1.0, -10.0)).abs() < 1e-12);
    }

    #[test]
    fn setup_compress_thresh_is_within_bounds() {
        let t = setup_compress_thresh(0.5);
        assert!(t > 0.0 && t < 1.0);
        assert!((bound(t, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn setup_compress_thresh_passes_through_extremes() {
        assert_eq!(setup_compress_thresh(0.0), 0.0);
        assert_eq!(setup_compress_thresh(1.0), 1.0);
    }
}
