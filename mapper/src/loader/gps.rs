use anyhow::{anyhow, bail, Context};
use log::debug;
use reflectcore::survey::{GpsSample, GpsTrack};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Layout of a GPS log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpsFormat {
    /// `time lat lon alt` per line, whitespace or comma separated.
    #[default]
    Columns,
    /// Raw NMEA sentences; fixes come from `GGA`.
    Nmea,
}

pub fn load_track<P: AsRef<Path>>(
    path: P,
    format: GpsFormat,
    time_scale: f64,
) -> anyhow::Result<GpsTrack> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading GPS log {}", path_ref.display()))?;
    let track = match format {
        GpsFormat::Columns => parse_columns(&contents)?
            .scaled(time_scale)
            .context("scaling GPS timestamps")?,
        GpsFormat::Nmea => parse_nmea(&contents)?,
    };
    debug!("loaded {} GPS fixes from {}", track.len(), path_ref.display());
    Ok(track)
}

pub fn parse_columns(contents: &str) -> anyhow::Result<GpsTrack> {
    let mut samples = Vec::new();
    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .map(|field| field.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("GPS line {}: non-numeric field", number + 1))?;
        if fields.len() != 4 {
            bail!(
                "GPS line {}: expected time, lat, lon, alt but found {} fields",
                number + 1,
                fields.len()
            );
        }
        samples.push(GpsSample::new(fields[0], fields[1], fields[2], fields[3]));
    }
    GpsTrack::new(samples).context("building GPS track")
}

/// Reads every valid `GGA` fix. Time is UTC seconds of day, carried past
/// midnight when the clock wraps. A fix stepping back by less than half a
/// day is out of order and dropped.
pub fn parse_nmea(contents: &str) -> anyhow::Result<GpsTrack> {
    let mut samples = Vec::new();
    let mut day_offset = 0.0;
    let mut last_time: Option<f64> = None;

    for line in contents.lines() {
        let line = line.trim();
        let Some(fix) = parse_gga(line) else {
            continue;
        };
        let mut time = fix.time + day_offset;
        if let Some(previous) = last_time {
            if previous - time > SECONDS_PER_DAY / 2.0 {
                day_offset += SECONDS_PER_DAY;
                time += SECONDS_PER_DAY;
            } else if time < previous {
                debug!("dropping out-of-order GGA fix at {} s", fix.time);
                continue;
            }
        }
        last_time = Some(time);
        samples.push(GpsSample { time, ..fix });
    }

    if samples.is_empty() {
        return Err(anyhow!("NMEA log holds no valid GGA fixes"));
    }
    GpsTrack::new(samples).context("building GPS track")
}

fn parse_gga(sentence: &str) -> Option<GpsSample> {
    let body = checked_body(sentence)?;
    let fields: Vec<&str> = body.split(',').collect();
    if fields.len() < 10 || !fields[0].ends_with("GGA") {
        return None;
    }
    let quality: u32 = fields[6].parse().ok()?;
    if quality == 0 {
        return None;
    }
    let time = parse_clock(fields[1])?;
    let latitude = parse_angle(fields[2], fields[3], 2)?;
    let longitude = parse_angle(fields[4], fields[5], 3)?;
    let altitude: f64 = fields[9].parse().ok()?;
    Some(GpsSample::new(time, latitude, longitude, altitude))
}

/// Strips `$` and the checksum, verifying it when present.
fn checked_body(sentence: &str) -> Option<&str> {
    let sentence = sentence.strip_prefix('$')?;
    match sentence.split_once('*') {
        Some((body, checksum)) => {
            let expected = u8::from_str_radix(checksum.trim(), 16).ok()?;
            let actual = body.bytes().fold(0u8, |acc, b| acc ^ b);
            (actual == expected).then_some(body)
        }
        None => Some(sentence),
    }
}

/// `hhmmss.sss` to seconds.
fn parse_clock(field: &str) -> Option<f64> {
    if field.len() < 6 || !field.is_ascii() {
        return None;
    }
    let hours: f64 = field[0..2].parse().ok()?;
    let minutes: f64 = field[2..4].parse().ok()?;
    let seconds: f64 = field[4..].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// `(d)ddmm.mmmm` plus hemisphere to signed decimal degrees.
fn parse_angle(field: &str, hemisphere: &str, degree_digits: usize) -> Option<f64> {
    if field.len() <= degree_digits || !field.is_ascii() {
        return None;
    }
    let degrees: f64 = field[..degree_digits].parse().ok()?;
    let minutes: f64 = field[degree_digits..].parse().ok()?;
    let value = degrees + minutes / 60.0;
    match hemisphere {
        "N" | "E" => Some(value),
        "S" | "W" => Some(-value),
        _ => None,
    }
}
