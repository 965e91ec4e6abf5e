use crate::math::interp::interpolate_all;
use crate::prelude::{require_positive, CoreError, CoreResult};
use crate::processing::peaks::Peak;
use crate::survey::GpsTrack;
use serde::{Deserialize, Serialize};

/// Upper bound on timebase length; a finer step is treated as a mistake.
const MAX_GRID_POINTS: usize = 1 << 26;

/// Tolerance absorbing rounding in `(end - start) / time_step`.
const GRID_EPSILON: f64 = 1e-9;

/// Echo power and platform position at one tick of the common timebase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedSample {
    pub time: f64,
    pub power: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Resamples the echo power series and the GPS track onto one uniform grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAligner {
    time_step: f64,
}

impl TimeAligner {
    pub const DEFAULT_TIME_STEP: f64 = 0.025;

    pub fn new(time_step: f64) -> CoreResult<Self> {
        Ok(Self {
            time_step: require_positive("time_step", time_step)?,
        })
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Aligns `peaks` (timed from the start of the receive capture) with
    /// `track`, whose clock is shifted so its first fix is t = 0.
    pub fn execute(&self, peaks: &[Peak], track: &GpsTrack) -> CoreResult<Vec<AlignedSample>> {
        if peaks.is_empty() {
            return Err(CoreError::InvalidInput("no peaks to align".into()));
        }
        if track.is_empty() {
            return Err(CoreError::InvalidInput("GPS track has no fixes".into()));
        }
        if let Some(index) = peaks.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(CoreError::InvalidInput(format!(
                "peak times must increase, peak {} is not after peak {}",
                index + 1,
                index
            )));
        }

        let track = track.normalized();
        let peak_times: Vec<f64> = peaks.iter().map(|p| p.time).collect();
        let peak_power: Vec<f64> = peaks.iter().map(|p| p.power).collect();
        let (peak_start, peak_end) = (peak_times[0], peak_times[peak_times.len() - 1]);
        let (gps_start, gps_end) = track.time_span();

        let start = peak_start.max(gps_start);
        let end = peak_end.min(gps_end);
        if start >= end {
            return Err(CoreError::NoOverlap {
                peak_start,
                peak_end,
                gps_start,
                gps_end,
            });
        }

        let grid = self.timebase(start, end)?;
        let gps_times = track.times();
        let power = interpolate_all(&peak_times, &peak_power, &grid);
        let latitude = interpolate_all(&gps_times, &track.latitudes(), &grid);
        let longitude = interpolate_all(&gps_times, &track.longitudes(), &grid);
        let altitude = interpolate_all(&gps_times, &track.altitudes(), &grid);

        match (power, latitude, longitude, altitude) {
            (Some(power), Some(latitude), Some(longitude), Some(altitude)) => Ok(grid
                .iter()
                .enumerate()
                .map(|(i, &time)| AlignedSample {
                    time,
                    power: power[i],
                    latitude: latitude[i],
                    longitude: longitude[i],
                    altitude: altitude[i],
                })
                .collect()),
            _ => Err(CoreError::InvalidInput(
                "interpolation source columns are inconsistent".into(),
            )),
        }
    }

    /// `start + i * time_step` up to and including `end` when it falls on a
    /// tick. The last tick is clamped to `end`.
    fn timebase(&self, start: f64, end: f64) -> CoreResult<Vec<f64>> {
        let intervals = ((end - start) / self.time_step + GRID_EPSILON).floor();
        if intervals < 1.0 {
            return Err(CoreError::InsufficientOverlap {
                start,
                end,
                time_step: self.time_step,
            });
        }
        if intervals >= MAX_GRID_POINTS as f64 {
            return Err(CoreError::InvalidConfiguration(format!(
                "time_step {} s yields more than {} ticks over [{}, {}] s",
                self.time_step, MAX_GRID_POINTS, start, end
            )));
        }

        let count = intervals as usize + 1;
        Ok((0..count)
            .map(|i| (start + i as f64 * self.time_step).min(end))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::GpsSample;

    fn peaks_between(start: f64, end: f64, count: usize) -> Vec<Peak> {
        (0..count)
            .map(|i| {
                let time = start + (end - start) * i as f64 / (count - 1) as f64;
                Peak {
                    lag: i as i64,
                    time,
                    amplitude_db: 10.0 + i as f64,
                    power: 100.0 + (i as f64 * 1.3).sin() * 40.0,
                }
            })
            .collect()
    }

    fn track_between(start: f64, end: f64, count: usize) -> GpsTrack {
        let samples = (0..count)
            .map(|i| {
                let time = start + (end - start) * i as f64 / (count - 1) as f64;
                GpsSample::new(
                    time,
                    45.0 + 0.001 * i as f64,
                    -120.0 - 0.002 * i as f64,
                    800.0 + (i % 3) as f64,
                )
            })
            .collect();
        GpsTrack::new(samples).unwrap()
    }

    #[test]
    fn overlap_window_is_gridded_inclusively() {
        let aligner = TimeAligner::new(1.0).unwrap();
        let aligned = aligner
            .execute(&peaks_between(5.0, 15.0, 11), &track_between(0.0, 10.0, 11))
            .unwrap();
        let times: Vec<f64> = aligned.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn disjoint_windows_fail_with_no_overlap() {
        let aligner = TimeAligner::new(0.1).unwrap();
        let err = aligner
            .execute(&peaks_between(5.0, 6.0, 3), &track_between(0.0, 1.0, 3))
            .unwrap_err();
        assert!(matches!(err, CoreError::NoOverlap { .. }));
    }

    #[test]
    fn touching_windows_fail_with_no_overlap() {
        let aligner = TimeAligner::new(0.1).unwrap();
        let err = aligner
            .execute(&peaks_between(1.0, 2.0, 3), &track_between(0.0, 1.0, 3))
            .unwrap_err();
        assert!(matches!(err, CoreError::NoOverlap { .. }));
    }

    #[test]
    fn narrow_overlap_fails_with_insufficient_overlap() {
        let aligner = TimeAligner::new(1.0).unwrap();
        let err = aligner
            .execute(&peaks_between(0.5, 5.0, 4), &track_between(0.0, 1.0, 3))
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientOverlap { .. }));
    }

    #[test]
    fn gps_clock_is_normalized_before_alignment() {
        let aligner = TimeAligner::new(0.5).unwrap();
        let aligned = aligner
            .execute(&peaks_between(0.0, 2.0, 5), &track_between(1_000.0, 1_002.0, 5))
            .unwrap();
        assert_eq!(aligned.len(), 5);
        assert_eq!(aligned[0].time, 0.0);
        assert_eq!(aligned[4].time, 2.0);
    }

    #[test]
    fn grid_spacing_is_constant() {
        let aligner = TimeAligner::new(0.025).unwrap();
        let aligned = aligner
            .execute(&peaks_between(0.013, 7.3, 40), &track_between(0.0, 9.0, 10))
            .unwrap();
        for pair in aligned.windows(2) {
            assert!(pair[1].time > pair[0].time);
            assert!((pair[1].time - pair[0].time - 0.025).abs() < 1e-9);
        }
    }

    #[test]
    fn interpolated_fields_stay_within_source_bounds() {
        let peaks = peaks_between(0.2, 9.7, 23);
        let track = track_between(0.0, 9.0, 13);
        let aligned = TimeAligner::new(0.01).unwrap().execute(&peaks, &track).unwrap();

        let within = |value: f64, source: &[f64]| {
            let lo = source.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = source.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            value >= lo && value <= hi
        };
        let power: Vec<f64> = peaks.iter().map(|p| p.power).collect();
        for sample in &aligned {
            assert!(within(sample.power, &power));
            assert!(within(sample.latitude, &track.latitudes()));
            assert!(within(sample.longitude, &track.longitudes()));
            assert!(within(sample.altitude, &track.altitudes()));
        }
    }

    #[test]
    fn linear_interpolation_between_fixes() {
        let peaks = vec![
            Peak { lag: 0, time: 0.0, amplitude_db: 0.0, power: 0.0 },
            Peak { lag: 10, time: 4.0, amplitude_db: 0.0, power: 8.0 },
        ];
        let track = GpsTrack::new(vec![
            GpsSample::new(0.0, 10.0, 20.0, 100.0),
            GpsSample::new(4.0, 14.0, 16.0, 300.0),
        ])
        .unwrap();
        let aligned = TimeAligner::new(1.0).unwrap().execute(&peaks, &track).unwrap();
        assert_eq!(aligned.len(), 5);
        assert_eq!(aligned[1].power, 2.0);
        assert_eq!(aligned[1].latitude, 11.0);
        assert_eq!(aligned[1].longitude, 19.0);
        assert_eq!(aligned[1].altitude, 150.0);
    }

    #[test]
    fn unordered_peaks_are_rejected() {
        let mut peaks = peaks_between(0.0, 2.0, 3);
        peaks.swap(0, 2);
        let err = TimeAligner::new(0.5)
            .unwrap()
            .execute(&peaks, &track_between(0.0, 2.0, 3))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn time_step_must_be_positive() {
        assert!(matches!(
            TimeAligner::new(0.0),
            Err(CoreError::InvalidConfiguration(_))
        ));
        assert!(TimeAligner::new(-0.5).is_err());
        assert!(TimeAligner::new(f64::NAN).is_err());
    }
}
