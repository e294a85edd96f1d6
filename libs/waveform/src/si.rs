//! SI-prefixed quantities.

/// The multiplier of an SI prefix character.
pub fn si_prefix_multiplier(prefix: char) -> Option<f64> {
    Some(match prefix {
        'E' => 1e18,
        'P' => 1e15,
        'T' => 1e12,
        'G' => 1e9,
        'M' => 1e6,
        'k' => 1e3,
        'm' => 1e-3,
        'u' => 1e-6,
        'n' => 1e-9,
        'p' => 1e-12,
        'f' => 1e-15,
        'a' => 1e-18,
        _ => return None,
    })
}

/// Converts a value with a prefixed unit, such as `"3 mV"`, to a number.
///
/// A single-character unit carries no prefix. Returns `None` for text that is
/// not a number followed by a unit, or for an unknown prefix.
///
/// ```
/// use waveform::si::si_string_to_float;
///
/// assert_eq!(si_string_to_float("3 mV"), Some(3e-3));
/// assert_eq!(si_string_to_float("2 A"), Some(2.0));
/// assert_eq!(si_string_to_float("saturated"), None);
/// ```
pub fn si_string_to_float(s: &str) -> Option<f64> {
    let mut parts = s.split_whitespace();
    let (Some(value), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let value: f64 = value.parse().ok()?;
    let mut chars = unit.chars();
    let first = chars.next()?;
    if chars.next().is_none() {
        return Some(value);
    }
    match si_prefix_multiplier(first) {
        Some(mult) => Some(value * mult),
        None => {
            tracing::warn!("invalid SI prefix {}, failed to convert `{}`", first, s);
            None
        }
    }
}
