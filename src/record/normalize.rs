//! Field normalization
//!
//! Small pure helpers that turn raw text fields into typed values.
//! Every helper returns `None` instead of failing when the text cannot be
//! converted, so a bad field never drops the record it belongs to.

/// Converts a duration such as `"1h 30m"`, `"2h"` or `"45m"` to minutes
///
/// Returns `None` for absent or malformed input and when the total is zero.
///
/// # Example
///
/// ```
/// use chart_harvest::record::duration_to_minutes;
///
/// assert_eq!(duration_to_minutes(Some("2h 22m")), Some(142));
/// assert_eq!(duration_to_minutes(Some("Xh")), None);
/// ```
pub fn duration_to_minutes(text: Option<&str>) -> Option<u32> {
    let mut rest = text?.trim();
    let mut total: u32 = 0;

    if let Some((hours, after)) = rest.split_once('h') {
        let hours: u32 = hours.trim().parse().ok()?;
        total = total.checked_add(hours.checked_mul(60)?)?;
        rest = after.trim();
    }

    if rest.contains('m') {
        let minutes: u32 = rest.replace('m', "").trim().parse().ok()?;
        total = total.checked_add(minutes)?;
    }

    (total > 0).then_some(total)
}

/// Parses an all-digit year such as `"1994"`
pub fn coerce_year(text: &str) -> Option<i32> {
    all_digits(text)?.parse().ok()
}

/// Parses a rating such as `"8.4"`; at most one decimal point is accepted
pub fn coerce_rating(text: &str) -> Option<f64> {
    let text = text.trim();
    let mut parts = text.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();

    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !digits_only(whole) || !digits_only(fraction) {
        return None;
    }

    text.parse().ok()
}

/// Parses an all-digit critic score such as `"76"`
pub fn coerce_metascore(text: &str) -> Option<i32> {
    all_digits(text)?.parse().ok()
}

fn all_digits(text: &str) -> Option<&str> {
    let text = text.trim();
    (!text.is_empty() && text.chars().all(|c| c.is_ascii_digit())).then_some(text)
}
