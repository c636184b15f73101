//! Sensor bridge helpers
//!
//! Turns raw potentiometer readings and sensor console lines into angles.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::{ADC_BUFFER_SIZE, ANGLE_REPORT_THRESHOLD};

lazy_static! {
    /// `Angle: 123 degrees`, `Angle: -12.5`
    static ref RE_ANGLE_LINE: Regex = Regex::new(
        r"(?i)\bangle\s*[:=]\s*(-?\d+(?:\.\d+)?)\s*(?:deg(?:rees)?|°)?\s*$"
    ).unwrap();

    /// Bare number on its own line
    static ref RE_BARE_NUMBER: Regex = Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*$").unwrap();

    /// `Angle: 40000 (raw), 61.0%`, `adc=40000`, `40000`
    static ref RE_RAW_ADC: Regex = Regex::new(
        r"(?i)^(?:[a-z]+\s*[:=]\s*)?(\d{1,5})\s*(?:\(raw\).*)?$"
    ).unwrap();
}

#[derive(Deserialize)]
struct AngleMessage {
    angle: f64,
}

/// Extract an angle from one line of sensor output.
///
/// Accepts `Angle: 123 degrees`, `{"angle": 123}` and bare numbers.
/// Anything else (status chatter, raw ADC lines) yields `None`.
pub fn parse_angle_line(line: &str) -> Option<f64> {
    let line = line.trim();
    if line.starts_with('{') {
        return serde_json::from_str::<AngleMessage>(line)
            .ok()
            .map(|m| m.angle);
    }
    RE_ANGLE_LINE
        .captures(line)
        .or_else(|| RE_BARE_NUMBER.captures(line))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Extract a 16-bit ADC sample from one line of raw sensor output
pub fn parse_raw_adc_line(line: &str) -> Option<u16> {
    RE_RAW_ADC
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
}

/// Line format a sensor feed speaks
#[derive(Debug, Clone)]
pub enum LineDecoder {
    /// Lines already carry degrees
    Angle,
    /// Lines carry raw ADC samples, smoothed before use
    RawAdc(AdcAngleFilter),
}

impl LineDecoder {
    pub fn raw_adc() -> Self {
        Self::RawAdc(AdcAngleFilter::new())
    }

    /// Angle to feed the evaluator for `line`, if any.
    ///
    /// In raw mode a sample that moved less than the report threshold
    /// yields `None`, like the firmware staying quiet.
    pub fn decode(&mut self, line: &str) -> Option<f64> {
        match self {
            Self::Angle => parse_angle_line(line),
            Self::RawAdc(filter) => parse_raw_adc_line(line)
                .and_then(|raw| filter.sample(raw))
                .map(f64::from),
        }
    }
}

/// Moving-average filter over 16-bit ADC samples
///
/// The buffer starts zeroed, so the first few readings ramp up toward the
/// true angle just like the firmware.
#[derive(Debug, Clone)]
pub struct AdcAngleFilter {
    readings: [u16; ADC_BUFFER_SIZE],
    index: usize,
    last_reported: Option<u32>,
}

impl Default for AdcAngleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcAngleFilter {
    pub fn new() -> Self {
        Self {
            readings: [0; ADC_BUFFER_SIZE],
            index: 0,
            last_reported: None,
        }
    }

    /// Add a sample and return the smoothed angle in whole degrees
    pub fn push(&mut self, raw: u16) -> u32 {
        self.readings[self.index] = raw;
        self.index = (self.index + 1) % ADC_BUFFER_SIZE;

        let sum: u32 = self.readings.iter().map(|&r| r as u32).sum();
        let avg = sum / ADC_BUFFER_SIZE as u32;
        let adc_12bit = avg >> 4;
        (adc_12bit as f64 / 4095.0 * 360.0).round() as u32
    }

    /// Add a sample; return the angle only if it moved enough to report
    pub fn sample(&mut self, raw: u16) -> Option<u32> {
        let angle = self.push(raw);
        match self.last_reported {
            Some(prev) if prev.abs_diff(angle) < ANGLE_REPORT_THRESHOLD => None,
            _ => {
                self.last_reported = Some(angle);
                Some(angle)
            }
        }
    }
}
