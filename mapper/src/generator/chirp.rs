use std::f64::consts::PI;

/// Linear FM sweep from `start_frequency` across `bandwidth` Hz, sampled for
/// `duration` seconds.
pub fn linear_chirp(
    sample_rate: f64,
    duration: f64,
    start_frequency: f64,
    bandwidth: f64,
) -> Vec<f64> {
    let length = (sample_rate * duration).round().max(1.0) as usize;
    let sweep_rate = bandwidth / duration;
    (0..length)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * PI * (start_frequency * t + 0.5 * sweep_rate * t * t)).cos()
        })
        .collect()
}
