//! Rounding and number-list formatting used in the generated documents.

use std::fmt;
use thiserror::Error;

/// Separator placed between entries of a formatted number list.
pub const LIST_SEPARATOR: &str = "、";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("value {0} cannot be rounded")]
    NotFinite(f64),
}

/// Result of [`round_half_even`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rounded {
    /// Precision 0
    Integer(i64),
    /// Fixed-decimal text with exactly `precision` decimals
    Decimal(String),
}

impl fmt::Display for Rounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rounded::Integer(value) => write!(f, "{value}"),
            Rounded::Decimal(text) => f.write_str(text),
        }
    }
}

/// Round following the national numerical rounding rule (GB/T 8170).
///
/// The first discarded digit decides: below 5 truncates, above 5 rounds up.
/// Exactly 5 with only zeros after it rounds to make the last kept digit
/// even; a 5 followed by any other digit rounds up.
///
/// The decision is taken on the shortest decimal text of `value`, so
/// `2.445` rounds to `2.44` regardless of its binary representation.
pub fn round_half_even(value: f64, precision: u32) -> Result<Rounded, NumericError> {
    if !value.is_finite() {
        return Err(NumericError::NotFinite(value));
    }
    let text = format!("{}", value.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let precision = precision as usize;
    let mut frac_digits: Vec<u8> = frac_part.bytes().map(|b| b - b'0').collect();
    if frac_digits.len() < precision + 1 {
        frac_digits.resize(precision + 1, 0);
    }

    let mut kept: Vec<u8> = int_part.bytes().map(|b| b - b'0').collect();
    kept.extend_from_slice(&frac_digits[..precision]);
    let first_discarded = frac_digits[precision];
    let rest_is_zero = frac_digits[precision + 1..].iter().all(|&d| d == 0);
    let last_kept = kept.last().copied().unwrap_or(0);

    let round_up = match first_discarded {
        0..=4 => false,
        5 if rest_is_zero => last_kept % 2 == 1,
        _ => true,
    };
    if round_up {
        increment_digits(&mut kept);
    }

    let is_zero = kept.iter().all(|&d| d == 0);
    let sign = if value.is_sign_negative() && !is_zero { "-" } else { "" };
    let digits: String = kept.iter().map(|d| char::from(b'0' + d)).collect();

    if precision == 0 {
        let magnitude: i64 = digits
            .parse()
            .map_err(|_| NumericError::NotANumber(text.clone()))?;
        return Ok(Rounded::Integer(if sign.is_empty() { magnitude } else { -magnitude }));
    }

    let split = digits.len() - precision;
    let int_digits = digits[..split].trim_start_matches('0');
    let int_digits = if int_digits.is_empty() { "0" } else { int_digits };
    Ok(Rounded::Decimal(format!(
        "{sign}{int_digits}.{}",
        &digits[split..]
    )))
}

/// [`round_half_even`] for a value read from a spreadsheet cell.
pub fn round_half_even_str(value: &str, precision: u32) -> Result<Rounded, NumericError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| NumericError::NotANumber(value.to_string()))?;
    round_half_even(parsed, precision)
}

fn increment_digits(digits: &mut Vec<u8>) {
    for digit in digits.iter_mut().rev() {
        if *digit == 9 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
    digits.insert(0, 1);
}

/// Format item numbers as a compact list, e.g. `1、3~6、13、14`.
///
/// A leading `*` reference marker is ignored. Runs of three or more
/// consecutive numbers collapse to `min~max`; a run of exactly two is
/// written as two entries. Entries that are not numbers are kept as-is and
/// break any run.
pub fn format_run_lengths<S: AsRef<str>>(numbers: &[S]) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut run: Option<(u64, u64)> = None;

    let flush = |run: (u64, u64), out: &mut Vec<String>| {
        let (start, end) = run;
        if start == end {
            out.push(start.to_string());
        } else if end == start + 1 {
            out.push(start.to_string());
            out.push(end.to_string());
        } else {
            out.push(format!("{start}~{end}"));
        }
    };

    for entry in numbers {
        let entry = entry.as_ref();
        match entry.replace('*', "").trim().parse::<u64>() {
            Ok(number) => {
                run = match run {
                    Some((start, end)) if number == end + 1 => Some((start, number)),
                    Some(previous) => {
                        flush(previous, &mut out);
                        Some((number, number))
                    }
                    None => Some((number, number)),
                };
            }
            Err(_) => {
                if let Some(previous) = run.take() {
                    flush(previous, &mut out);
                }
                out.push(entry.to_string());
            }
        }
    }
    if let Some(previous) = run {
        flush(previous, &mut out);
    }

    out.join(LIST_SEPARATOR)
}
