//! Statistic models produced by the statistic and reporting services

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{KimaiError, Result};
use crate::types::{Activity, Customer, Project, User};

/* -------------------------------------------------------------------------- */
/* Totals */
/* -------------------------------------------------------------------------- */

/// Summed values of a set of timesheets
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub duration: i64,
    pub rate: f64,
    pub internal_rate: f64,
    pub billable_duration: i64,
    pub billable_rate: f64,
}

impl Totals {
    pub fn add(&mut self, duration: i64, rate: f64, internal_rate: f64, billable: bool) {
        self.duration += duration;
        self.rate += rate;
        self.internal_rate += internal_rate;
        if billable {
            self.billable_duration += duration;
            self.billable_rate += rate;
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.duration += other.duration;
        self.rate += other.rate;
        self.internal_rate += other.internal_rate;
        self.billable_duration += other.billable_duration;
        self.billable_rate += other.billable_rate;
    }
}

/* -------------------------------------------------------------------------- */
/* Calendar buckets */
/* -------------------------------------------------------------------------- */

/// One calendar month with its totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Month {
    month: String,
    #[serde(flatten)]
    pub totals: Totals,
}

impl Month {
    /// Accepts `1`..`12`, optionally zero padded.
    ///
    /// # Errors
    /// `InvalidInput` for anything else.
    pub fn new(month: &str) -> Result<Self> {
        let number = leading_int(month);
        if !(1..=12).contains(&number) {
            return Err(KimaiError::InvalidInput(format!(
                "Invalid month given. Expected 1-12, received \"{number}\"."
            )));
        }
        Ok(Self { month: format!("{:0>2}", month.trim()), totals: Totals::default() })
    }

    /// Two digit month, e.g. `03`
    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn month_number(&self) -> u32 {
        self.month.parse().unwrap_or(0)
    }
}

/// Integer prefix of `value`, 0 when there is none.
fn leading_int(value: &str) -> i64 {
    let trimmed = value.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = digits.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<i64>().map_or(0, |n| sign * n)
}

/// A year pre-filled with all twelve months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Year {
    pub year: i32,
    pub months: Vec<Month>,
}

impl Year {
    pub fn new(year: i32) -> Self {
        let months = (1..=12)
            .filter_map(|m| Month::new(&m.to_string()).ok())
            .collect();
        Self { year, months }
    }

    pub fn month_mut(&mut self, month: u32) -> Option<&mut Month> {
        self.months.iter_mut().find(|m| m.month_number() == month)
    }

    pub fn totals(&self) -> Totals {
        let mut totals = Totals::default();
        for month in &self.months {
            totals.merge(&month.totals);
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: Totals,
}

impl Day {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, totals: Totals::default() }
    }
}

/* -------------------------------------------------------------------------- */
/* Per-user statistics */
/* -------------------------------------------------------------------------- */

/// Every day of a range for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatistic {
    pub user: User,
    pub days: Vec<Day>,
}

impl DailyStatistic {
    pub fn new(user: User, dates: &[NaiveDate]) -> Self {
        Self { user, days: dates.iter().copied().map(Day::new).collect() }
    }

    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut Day> {
        self.days.iter_mut().find(|d| d.date == date)
    }
}

/// Years and months for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStatistic {
    pub user: User,
    pub years: BTreeMap<i32, Year>,
}

impl MonthlyStatistic {
    /// Pre-fills every year between `first` and `last`.
    pub fn new(user: User, first_year: i32, last_year: i32) -> Self {
        let years = (first_year..=last_year).map(|y| (y, Year::new(y))).collect();
        Self { user, years }
    }

    pub fn month_mut(&mut self, year: i32, month: u32) -> Option<&mut Month> {
        self.years.get_mut(&year).and_then(|y| y.month_mut(month))
    }
}

/// Days of one activity inside a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDays {
    pub activity: Activity,
    pub days: Vec<Day>,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDays {
    pub project: Project,
    pub activities: Vec<ActivityDays>,
    pub totals: Totals,
}

/// User → project → activity → days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDayGrouping {
    pub user: User,
    pub projects: Vec<ProjectDays>,
    pub totals: Totals,
}

/* -------------------------------------------------------------------------- */
/* Project statistics */
/* -------------------------------------------------------------------------- */

/// Aggregates over all timesheets of one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatistic {
    pub record_count: i64,
    pub duration: i64,
    pub rate: f64,
    pub internal_rate: f64,
    pub first_record: Option<DateTime<Utc>>,
    pub last_record: Option<DateTime<Utc>>,
}

/// Project totals for a reporting period and its budget window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBudgetStatistic {
    pub project: Project,
    pub period: Totals,
    pub budget_window: Totals,
    pub budget_begin: NaiveDate,
    pub budget_end: NaiveDate,
}

impl ProjectBudgetStatistic {
    /// Share of the money budget used in the budget window, in percent.
    pub fn budget_percent(&self) -> Option<f64> {
        self.project
            .budget
            .filter(|b| *b > 0.0)
            .map(|b| (self.budget_window.rate / b * 100.0 * 100.0).round() / 100.0)
    }

    pub fn time_budget_percent(&self) -> Option<f64> {
        self.project.time_budget.filter(|t| *t > 0).map(|t| {
            (self.budget_window.duration as f64 / t as f64 * 100.0 * 100.0).round() / 100.0
        })
    }
}

/// Report rows of one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDateRangeRow {
    pub customer: Customer,
    pub projects: Vec<ProjectBudgetStatistic>,
}

/// Month report split by budget period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDateRangeReport {
    pub month: NaiveDate,
    pub monthly: Vec<ProjectDateRangeRow>,
    pub quarterly: Vec<ProjectDateRangeRow>,
    /// Projects with a lifetime budget or none at all
    pub other: Vec<ProjectDateRangeRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_accepts_one_to_twelve() {
        assert_eq!(Month::new("1").unwrap().month(), "01");
        assert_eq!(Month::new("09").unwrap().month(), "09");
        assert_eq!(Month::new("12").unwrap().month_number(), 12);
    }

    #[test]
    fn month_rejects_invalid_values() {
        for (input, received) in [("0", "0"), ("13", "13"), ("foo", "0"), ("-1", "-1")] {
            let err = Month::new(input).unwrap_err();
            assert_eq!(
                err.message(),
                format!("Invalid month given. Expected 1-12, received \"{received}\".")
            );
        }
    }

    #[test]
    fn billable_rows_count_twice() {
        let mut totals = Totals::default();
        totals.add(3600, 100.0, 80.0, true);
        totals.add(1800, 50.0, 40.0, false);
        assert_eq!(totals.duration, 5400);
        assert_eq!(totals.billable_duration, 3600);
        assert!((totals.billable_rate - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn year_has_twelve_months() {
        let mut year = Year::new(2024);
        assert_eq!(year.months.len(), 12);
        year.month_mut(3).unwrap().totals.add(60, 1.0, 1.0, false);
        assert_eq!(year.totals().duration, 60);
    }
}
