use crate::prelude::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Single GPS fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsSample {
    pub time: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GpsSample {
    pub fn new(time: f64, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            time,
            latitude,
            longitude,
            altitude,
        }
    }

    fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
    }
}

/// Time-sorted GPS track.
///
/// Timestamps never decrease. When consecutive fixes share a timestamp only
/// the first one is kept, so the time axis is strictly increasing and safe to
/// interpolate against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GpsSample>", into = "Vec<GpsSample>")]
pub struct GpsTrack {
    samples: Vec<GpsSample>,
}

impl TryFrom<Vec<GpsSample>> for GpsTrack {
    type Error = CoreError;

    fn try_from(samples: Vec<GpsSample>) -> CoreResult<Self> {
        GpsTrack::new(samples)
    }
}

impl From<GpsTrack> for Vec<GpsSample> {
    fn from(track: GpsTrack) -> Self {
        track.samples
    }
}

impl GpsTrack {
    pub fn new(samples: Vec<GpsSample>) -> CoreResult<Self> {
        if samples.is_empty() {
            return Err(CoreError::InvalidInput("GPS track has no fixes".into()));
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(CoreError::InvalidInput(format!(
                "GPS fix {} has a non-finite field",
                index
            )));
        }
        if let Some(index) = samples.windows(2).position(|w| w[1].time < w[0].time) {
            return Err(CoreError::InvalidInput(format!(
                "GPS time decreases between fixes {} and {}",
                index,
                index + 1
            )));
        }

        let mut deduplicated: Vec<GpsSample> = Vec::with_capacity(samples.len());
        for sample in samples {
            match deduplicated.last() {
                Some(previous) if previous.time == sample.time => {}
                _ => deduplicated.push(sample),
            }
        }

        Ok(Self {
            samples: deduplicated,
        })
    }

    /// Builds a track from the parallel arrays a GPS loader produces.
    pub fn from_columns(
        time: &[f64],
        latitude: &[f64],
        longitude: &[f64],
        altitude: &[f64],
    ) -> CoreResult<Self> {
        let len = time.len();
        if latitude.len() != len || longitude.len() != len || altitude.len() != len {
            return Err(CoreError::InvalidInput(format!(
                "GPS columns differ in length: time {}, lat {}, lon {}, alt {}",
                len,
                latitude.len(),
                longitude.len(),
                altitude.len()
            )));
        }
        let samples = (0..len)
            .map(|i| GpsSample::new(time[i], latitude[i], longitude[i], altitude[i]))
            .collect();
        Self::new(samples)
    }

    pub fn samples(&self) -> &[GpsSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Multiplies every timestamp by `scale`, e.g. `1e-6` for a logger that
    /// stamps fixes in microseconds.
    pub fn scaled(&self, scale: f64) -> CoreResult<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(CoreError::InvalidConfiguration(format!(
                "gps time scale must be positive, got {}",
                scale
            )));
        }
        let samples = self
            .samples
            .iter()
            .map(|s| GpsSample {
                time: s.time * scale,
                ..*s
            })
            .collect();
        Self::new(samples)
    }

    /// Shifts the time axis so the first fix sits at t = 0.
    pub fn normalized(&self) -> Self {
        let origin = self.samples[0].time;
        let samples = self
            .samples
            .iter()
            .map(|s| GpsSample {
                time: s.time - origin,
                ..*s
            })
            .collect();
        Self { samples }
    }

    /// First and last timestamp.
    pub fn time_span(&self) -> (f64, f64) {
        (
            self.samples[0].time,
            self.samples[self.samples.len() - 1].time,
        )
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn latitudes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.latitude).collect()
    }

    pub fn longitudes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.longitude).collect()
    }

    pub fn altitudes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.altitude).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(time: f64) -> GpsSample {
        GpsSample::new(time, 45.0 + time, -120.0, 1000.0)
    }

    #[test]
    fn track_rejects_empty_and_decreasing_input() {
        assert!(GpsTrack::new(Vec::new()).is_err());
        let err = GpsTrack::new(vec![fix(2.0), fix(1.0)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn track_collapses_duplicate_timestamps() {
        let mut second = fix(1.0);
        second.latitude = 0.0;
        let track = GpsTrack::new(vec![fix(0.0), fix(1.0), second, fix(2.0)]).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.samples()[1].latitude, 46.0);
    }

    #[test]
    fn track_normalizes_to_zero_origin() {
        let track = GpsTrack::new(vec![fix(100.0), fix(101.5)]).unwrap();
        let normalized = track.normalized();
        assert_eq!(normalized.time_span(), (0.0, 1.5));
        assert_eq!(normalized.samples()[1].latitude, 146.5);
    }

    #[test]
    fn track_from_columns_checks_lengths() {
        let err = GpsTrack::from_columns(&[0.0, 1.0], &[1.0], &[1.0, 2.0], &[0.0, 0.0]);
        assert!(err.is_err());
        let track =
            GpsTrack::from_columns(&[0.0, 1.0], &[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]).unwrap();
        assert_eq!(track.longitudes(), vec![3.0, 4.0]);
    }

    #[test]
    fn track_scales_microsecond_stamps() {
        let track = GpsTrack::new(vec![fix(0.0), fix(2_000_000.0)]).unwrap();
        let scaled = track.scaled(1e-6).unwrap();
        assert!((scaled.time_span().1 - 2.0).abs() < 1e-12);
        assert!(track.scaled(0.0).is_err());
    }
}
