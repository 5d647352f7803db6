//! Sensor readings as the renderers see them.
//!
//! The hardware monitor reports values as display strings with units
//! (`"45.0 °C"`, `"1200 RPM"`, `"12.5 %"`). A [`SensorValue`] keeps that string
//! for display and derives a number from its leading numeric prefix, the way
//! JavaScript's `parseFloat` does, for gauges and charts.

use std::fmt;

use serde::Deserialize;

/// A raw sensor value: either a JSON number or a display string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Number(f64),
    Text(String),
}

impl SensorValue {
    /// Numeric interpretation, `None` when nothing numeric can be read.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => v.is_finite().then_some(*v),
            Self::Text(text) => parse_leading_float(text),
        }
    }

    /// True for the empty string the monitor sends on group nodes.
    pub fn is_absent(&self) -> bool { matches!(self, Self::Text(text) if text.trim().is_empty()) }
}

impl Default for SensorValue {
    fn default() -> Self { Self::Text(String::new()) }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for SensorValue {
    fn from(value: f64) -> Self { Self::Number(value) }
}

impl From<&str> for SensorValue {
    fn from(value: &str) -> Self { Self::Text(value.to_string()) }
}

impl From<String> for SensorValue {
    fn from(value: String) -> Self { Self::Text(value) }
}

/// One named reading from the sensor tree.
///
/// `ordinal` is zero when the reading leaves the fetcher; each binding stamps
/// its own sequence number on ingestion via [`SensorReading::with_ordinal`].
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    full_name: String,
    value: SensorValue,
    min: Option<f64>,
    max: Option<f64>,
    ordinal: u64,
}

impl SensorReading {
    pub fn new(
        full_name: impl Into<String>,
        value: impl Into<SensorValue>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            value: value.into(),
            min: None,
            max: None,
            ordinal: 0,
        }
    }

    /// Attach the sensor's reported range.
    pub fn with_range(
        mut self,
        min: impl Into<Option<f64>>,
        max: impl Into<Option<f64>>,
    ) -> Self {
        self.min = min.into();
        self.max = max.into();
        self
    }

    /// Copy of this reading carrying a binding-local sequence number.
    pub fn with_ordinal(
        mut self,
        ordinal: u64,
    ) -> Self {
        self.ordinal = ordinal;
        self
    }

    pub fn full_name(&self) -> &str { &self.full_name }

    pub const fn value(&self) -> &SensorValue { &self.value }

    pub fn numeric_value(&self) -> Option<f64> { self.value.as_f64() }

    pub const fn min(&self) -> Option<f64> { self.min }

    pub const fn max(&self) -> Option<f64> { self.max }

    pub const fn ordinal(&self) -> u64 { self.ordinal }
}

/// Parse the longest numeric prefix of `text`, after leading whitespace.
///
/// Accepts an optional sign, digits with an optional fraction, and an optional
/// exponent. Returns `None` when the prefix holds no digits.
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let digits_from = |mut i: usize| {
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digit_count = int_end - end;
    end = int_end;

    if end < len && bytes[end] == b'.' {
        let frac_end = digits_from(end + 1);
        digit_count += frac_end - (end + 1);
        if digit_count > 0 {
            end = frac_end;
        }
    }
    if digit_count == 0 {
        return None;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < len && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().ok().filter(|v: &f64| v.is_finite())
}

// =============================================================================
// Unit Tests
// =============================================================================
