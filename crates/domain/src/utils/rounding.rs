//! Rounding of timesheet begin and end times

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Direction applied to begin/end when rounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Begin rounds down, end rounds up
    #[default]
    Default,
    Closest,
    Floor,
    Ceil,
}

impl_domain_status_conversions!(RoundingMode {
    Default => "default",
    Closest => "closest",
    Floor => "floor",
    Ceil => "ceil",
});

/// Minutes to round to; zero disables rounding for that side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingConfig {
    pub begin: u32,
    pub end: u32,
    pub mode: RoundingMode,
}

impl RoundingConfig {
    pub fn is_enabled(&self) -> bool {
        self.begin > 0 || self.end > 0
    }

    pub fn round_begin(&self, begin: DateTime<Utc>) -> DateTime<Utc> {
        let direction = match self.mode {
            RoundingMode::Default | RoundingMode::Floor => Direction::Down,
            RoundingMode::Closest => Direction::Nearest,
            RoundingMode::Ceil => Direction::Up,
        };
        round(begin, self.begin, direction)
    }

    pub fn round_end(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        let direction = match self.mode {
            RoundingMode::Default | RoundingMode::Ceil => Direction::Up,
            RoundingMode::Closest => Direction::Nearest,
            RoundingMode::Floor => Direction::Down,
        };
        round(end, self.end, direction)
    }

    /// Rounded (begin, end).
    ///
    /// Rounding never moves a valid end before the rounded begin. An end that
    /// already precedes the begin is returned unchanged so validation still
    /// rejects the range.
    pub fn apply(
        &self,
        begin: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        let rounded_begin = self.round_begin(begin);
        let end = end.map(|end| {
            if end < begin {
                end
            } else {
                self.round_end(end).max(rounded_begin)
            }
        });
        (rounded_begin, end)
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Down,
    Up,
    Nearest,
}

fn round(instant: DateTime<Utc>, minutes: u32, direction: Direction) -> DateTime<Utc> {
    if minutes == 0 {
        return instant;
    }
    let step = Duration::minutes(i64::from(minutes));
    let result = match direction {
        Direction::Down => instant.duration_trunc(step),
        Direction::Up => instant.duration_trunc(step).map(|floor| {
            if floor == instant {
                floor
            } else {
                floor.checked_add_signed(step).unwrap_or(floor)
            }
        }),
        Direction::Nearest => instant.duration_round(step),
    };
    result.unwrap_or(instant)
}
