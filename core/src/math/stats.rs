pub struct StatsHelper;

impl StatsHelper {
    /// Smallest and largest finite value, if any.
    pub fn bounds(values: &[f64]) -> Option<(f64, f64)> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_skip_non_finite_values() {
        assert_eq!(StatsHelper::bounds(&[]), None);
        assert_eq!(
            StatsHelper::bounds(&[f64::NEG_INFINITY, 3.0, -1.0, 2.0]),
            Some((-1.0, 3.0))
        );
    }
}
