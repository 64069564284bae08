//! Numeric parsing shared by selectors and expression operands.
//!
//! Ported from `parseValue`/`findFirstNumberEndIndex` in the original
//! `generalRouter.cpp`: a handful of unit-aware parsers rather than a
//! general-purpose grammar, since the DSL only ever needs four shapes.

use crate::error::Error;

/// The numeric interpretation applied to a selector or expression operand.
///
/// Declared alongside a rule/expression in the DSL (e.g. `type="speed"`)
/// and used both for literal parsing and for interpreting a dereferenced
/// tag's value text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericType {
    /// km/h on the wire, converted to m/s.
    Speed,
    /// Tonnage; parsed as a plain float (no unit conversion).
    Weight,
    /// A length, with an optional trailing unit suffix (`m`, `km`, `ft`, `mi`).
    Length,
    /// The leading numeric prefix of the text, everything else ignored.
    Plain,
}

impl NumericType {
    /// Parses from the DSL's type names (`speed`, `weight`, `length`; anything
    /// else is `plain`, matching the original's default-to-plain behavior for
    /// unrecognized type strings).
    pub fn parse(name: &str) -> Self {
        match name {
            "speed" => NumericType::Speed,
            "weight" => NumericType::Weight,
            "length" => NumericType::Length,
            _ => NumericType::Plain,
        }
    }
}

const KM_PER_HOUR_TO_M_PER_SEC: f64 = 3.6;

/// Scans the leading numeric prefix of `text` (optional sign, digits, optional
/// decimal point and more digits) and returns the parsed value along with the
/// byte length consumed. Returns `None` if no numeric prefix is present.
fn leading_number(text: &str) -> Option<(f64, usize)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        let after_dot = i + 1;
        let mut j = after_dot;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > after_dot {
            i = j;
        }
    }
    if i == digits_start {
        return None;
    }
    text[..i].parse::<f64>().ok().map(|v| (v, i))
}

fn length_unit_factor(unit: &str) -> Option<f64> {
    match unit {
        "" | "m" => Some(1.0),
        "km" => Some(1000.0),
        "ft" => Some(0.3048),
        "mi" => Some(1609.344),
        _ => None,
    }
}

/// Parses `text` under `ty`. Returns `None` (the `MISSING` sentinel) when the
/// text cannot be parsed at all.
pub fn parse_value(text: &str, ty: NumericType) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match ty {
        NumericType::Speed => leading_number(text).map(|(v, _)| v / KM_PER_HOUR_TO_M_PER_SEC),
        NumericType::Weight => leading_number(text).map(|(v, _)| v),
        NumericType::Length => {
            let (value, consumed) = leading_number(text)?;
            let unit = text[consumed..].trim();
            length_unit_factor(unit).map(|factor| value * factor)
        }
        NumericType::Plain => leading_number(text).map(|(v, _)| v),
    }
}

/// Converts km/h to m/s, used for the router-metadata keys
/// (`minDefaultSpeed`/`maxDefaultSpeed`) which are documented in the wire
/// format as km/h but stored internally as m/s.
pub fn kmh_to_ms(kmh: f64) -> f64 {
    kmh / KM_PER_HOUR_TO_M_PER_SEC
}

/// Converts m/s back to km/h (the inverse of [`kmh_to_ms`]), needed because
/// the original re-derives a km/h fallback default when re-parsing
/// `minDefaultSpeed`/`maxDefaultSpeed` (see `Router::set_attribute`).
pub fn ms_to_kmh(ms: f64) -> f64 {
    ms * KM_PER_HOUR_TO_M_PER_SEC
}

/// Parses a `type` name into a [`NumericType`], failing only when callers
/// explicitly want to reject unknown names rather than silently falling back
/// to `Plain` (used for a handful of stricter construction paths).
///
/// # Errors
///
/// Returns [`Error::UnknownNumericType`] if `name` is not one of `speed`,
/// `weight`, `length`, or `plain`.
pub fn parse_numeric_type_strict(name: &str) -> Result<NumericType, Error> {
    match name {
        "speed" | "weight" | "length" | "plain" => Ok(NumericType::parse(name)),
        other => Err(Error::UnknownNumericType(other.to_string())),
    }
}
