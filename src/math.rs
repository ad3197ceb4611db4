/// Computes the infinity norm: `max(abs(a))`, zero for an empty slice and
/// NaN if any component is NaN.
pub fn norm_inf(a: &[f64]) -> f64 {
    let mut max = 0.0;
    for &ai in a {
        let absai = ai.abs();
        // f64::max would drop a NaN
        if absai.is_nan() {
            return f64::NAN;
        }
        if absai > max {
            max = absai;
        }
    }
    max
}

/// Returns the largest `alpha` in (0, 1] such that `p + alpha*dp >= (1 - tau)*p`.
///
/// Only components with `dp[i] < 0` can approach the boundary, so the result
/// is `min(1, min(-tau * p[i] / dp[i]))` over those components.
pub fn fraction_to_the_boundary(p: &[f64], dp: &[f64], tau: f64) -> f64 {
    let mut alpha_max = 1.0;
    for (&pi, &dpi) in p.iter().zip(dp) {
        if dpi < 0.0 {
            alpha_max = f64::min(alpha_max, -tau * pi / dpi);
        }
    }
    alpha_max
}

/// Component-wise `max(a[i], floor)`, in place.
pub(crate) fn clamp_below(a: &mut [f64], floor: f64) {
    for ai in a.iter_mut() {
        if *ai < floor {
            *ai = floor;
        }
    }
}

/// True if every component is strictly positive.
pub fn all_positive(a: &[f64]) -> bool {
    a.iter().all(|&v| v > 0.0)
}
