//! Severity classification of raw log lines.

use once_cell::sync::Lazy;
use regex::Regex;
use shepherd_types::Level;

/// A standalone run of exactly three decimal digits, in any script.
static STATUS_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3})\b").expect("status code pattern is valid"));

/// A single Unicode decimal digit (general category `Nd`).
static DECIMAL_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d$").expect("digit pattern is valid"));

/// Result of classifying one raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The extracted code, or `0` when the line carries none.
    pub status_code: u16,
    pub level: Level,
}

/// Extracts the leftmost standalone three-digit number from `raw` and maps
/// it to a severity.
///
/// Never fails: a line without a match is classified as code `0`, level
/// [`Level::Info`]. Digits inside a longer run (`a1234b`) or glued to a
/// word character (`x500`) do not count. Non-ASCII decimal digits count
/// by their numeric value, so Arabic-Indic `٥٠٣` is `503`.
pub fn classify(raw: &str) -> Classification {
    let status_code = STATUS_CODE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| digits_value(m.as_str()))
        .unwrap_or(0);

    Classification {
        status_code,
        level: Level::from_status(status_code),
    }
}

fn digits_value(digits: &str) -> Option<u16> {
    digits.chars().try_fold(0u16, |acc, c| {
        let d = decimal_value(c)?;
        acc.checked_mul(10)?.checked_add(d as u16)
    })
}

/// Numeric value of a decimal digit.
///
/// Unicode encodes decimal digits in contiguous runs of ten, zero first, so
/// the value is the digit's distance from the start of its run modulo ten.
/// The modulo handles adjacent runs such as the mathematical digit styles.
fn decimal_value(c: char) -> Option<u32> {
    if let Some(d) = c.to_digit(10) {
        return Some(d);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut preceding = 0;
    let mut cp = c as u32;
    while let Some(prev) = cp.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        preceding += 1;
        cp -= 1;
    }
    Some(preceding % 10)
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}
