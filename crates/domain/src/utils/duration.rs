//! Duration parsing and formatting
//!
//! Durations are whole seconds. Four input notations are understood:
//!
//! | Notation | Example | Seconds |
//! |----------|---------|---------|
//! | natural  | `2h38m17s` | 9497 |
//! | colon    | `13:27:54` | 48474 |
//! | decimal  | `1,5` | 5400 |
//! | seconds  | `3600` | 3600 |

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{KimaiError, Result};

static NATURAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").unwrap()
});

/// Input notation for [`parse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationFormat {
    Natural,
    Colon,
    Decimal,
    Seconds,
}

impl fmt::Display for DurationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Natural => "natural",
            Self::Colon => "colon",
            Self::Decimal => "decimal",
            Self::Seconds => "seconds",
        };
        f.write_str(name)
    }
}

impl FromStr for DurationFormat {
    type Err = KimaiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "natural" => Ok(Self::Natural),
            "colon" => Ok(Self::Colon),
            "decimal" => Ok(Self::Decimal),
            "seconds" => Ok(Self::Seconds),
            other => Err(KimaiError::InvalidInput(format!("Unknown duration format: {other}"))),
        }
    }
}

/// Format seconds as `HH:MM`, or `HH:MM:SS` when `with_seconds` is set.
///
/// Hours are not wrapped at 24. Negative values get a leading `-`.
pub fn format(seconds: Option<i64>, with_seconds: bool) -> Option<String> {
    let seconds = seconds?;
    let sign = if seconds < 0 { "-" } else { "" };
    let (hours, minutes, secs) = split(seconds.unsigned_abs());

    Some(if with_seconds {
        format!("{sign}{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}")
    })
}

/// Format with a locale pattern containing `%h`, `%m` and `%s`.
///
/// Negative durations render as `?`.
pub fn format_with_pattern(seconds: Option<i64>, pattern: &str) -> Option<String> {
    let seconds = seconds?;
    if seconds < 0 {
        return Some("?".to_string());
    }
    let (hours, minutes, secs) = split(seconds.unsigned_abs());

    Some(
        pattern
            .replace("%h", &format!("{hours:02}"))
            .replace("%m", &format!("{minutes:02}"))
            .replace("%s", &format!("{secs:02}")),
    )
}

/// Decimal hours rounded to two places, e.g. 5400 → 1.5
pub fn to_decimal_hours(seconds: i64) -> f64 {
    (seconds as f64 / 36.0).round() / 100.0
}

/// Parse `input` with an explicitly named notation.
///
/// # Errors
/// `InvalidInput` for an unknown mode or input that does not match it.
pub fn parse_with_mode(input: &str, mode: &str) -> Result<i64> {
    let format = mode.parse::<DurationFormat>()?;
    parse(input, format)
}

/// Parse `input` in the given notation.
///
/// Empty input and `0` are zero in every notation.
///
/// # Errors
/// `InvalidInput` when the input does not match the notation.
pub fn parse(input: &str, format: DurationFormat) -> Result<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return Ok(0);
    }

    match format {
        DurationFormat::Natural => parse_natural(trimmed),
        DurationFormat::Colon => parse_colon(trimmed),
        DurationFormat::Decimal => parse_decimal(trimmed),
        DurationFormat::Seconds => parse_seconds(trimmed),
    }
}

/// Detect the notation of `input` and parse it.
///
/// A colon selects colon notation, any of `h`/`m`/`s` selects natural
/// notation, anything else is read as decimal hours.
///
/// # Errors
/// `InvalidInput` when the detected notation rejects the input.
pub fn parse_duration_string(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    let format = if trimmed.contains(':') {
        DurationFormat::Colon
    } else if trimmed.to_lowercase().contains(['h', 'm', 's']) {
        DurationFormat::Natural
    } else {
        DurationFormat::Decimal
    };
    parse(trimmed, format)
}

fn split(total: u64) -> (u64, u64, u64) {
    (total / 3600, (total % 3600) / 60, total % 60)
}

fn invalid(input: &str) -> KimaiError {
    KimaiError::InvalidInput(format!("Invalid duration: {input}"))
}

fn parse_natural(input: &str) -> Result<i64> {
    let compact: String =
        input.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
    let captures = NATURAL_PATTERN.captures(&compact).ok_or_else(|| invalid(input))?;

    let mut matched = false;
    let mut total = 0_i64;
    for (index, factor) in [(1, 3600), (2, 60), (3, 1)] {
        if let Some(group) = captures.get(index) {
            matched = true;
            let value: i64 = group.as_str().parse().map_err(|_| invalid(input))?;
            total = value
                .checked_mul(factor)
                .and_then(|seconds| total.checked_add(seconds))
                .ok_or_else(|| invalid(input))?;
        }
    }

    if matched {
        Ok(total)
    } else {
        Err(invalid(input))
    }
}

fn parse_colon(input: &str) -> Result<i64> {
    let parts: Vec<&str> = input.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(invalid(input));
    }

    let mut values = Vec::with_capacity(3);
    for part in &parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid(input));
        }
        values.push(part.parse::<i64>().map_err(|_| invalid(input))?);
    }

    let seconds = values.get(2).copied().unwrap_or(0);
    values[0]
        .checked_mul(3600)
        .zip(values[1].checked_mul(60))
        .and_then(|(hours, minutes)| hours.checked_add(minutes))
        .and_then(|total| total.checked_add(seconds))
        .ok_or_else(|| invalid(input))
}

fn parse_decimal(input: &str) -> Result<i64> {
    let hours: f64 = input.replace(',', ".").parse().map_err(|_| invalid(input))?;
    if !hours.is_finite() {
        return Err(invalid(input));
    }
    Ok((hours * 3600.0).round() as i64)
}

fn parse_seconds(input: &str) -> Result<i64> {
    let seconds: i64 = input.parse().map_err(|_| invalid(input))?;
    Ok(seconds.max(0))
}
