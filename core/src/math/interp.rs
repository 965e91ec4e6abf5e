/// Piecewise-linear interpolation of `ys` (sampled at strictly increasing
/// `xs`) at `x`.
///
/// Queries outside `[xs[0], xs[n - 1]]` clamp to the end values; callers that
/// must not extrapolate keep their queries inside the knot range. The result
/// is clamped to the two bracketing values so rounding cannot leave them.
pub fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    if xs.is_empty() || xs.len() != ys.len() {
        return None;
    }
    let last = xs.len() - 1;
    if x <= xs[0] {
        return Some(ys[0]);
    }
    if x >= xs[last] {
        return Some(ys[last]);
    }

    // first knot strictly greater than x; 1..=last given the checks above
    let upper = xs.partition_point(|&knot| knot <= x);
    let lower = upper - 1;
    let (x0, x1) = (xs[lower], xs[upper]);
    let (y0, y1) = (ys[lower], ys[upper]);
    let fraction = (x - x0) / (x1 - x0);
    let value = y0 + (y1 - y0) * fraction;
    Some(value.clamp(y0.min(y1), y0.max(y1)))
}

/// Interpolates every query in `grid`.
pub fn interpolate_all(xs: &[f64], ys: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    grid.iter().map(|&x| interpolate(xs, ys, x)).collect()
}
