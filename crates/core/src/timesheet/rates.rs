//! Rate calculation for timesheets
//!
//! The hourly rate is resolved from the most specific source that defines
//! one: timesheet, activity, project, customer, user preference. Fixed
//! rates follow the same chain without the user step and win over hourly
//! rates.

use kimai_domain::constants::RATE_PRECISION;
use kimai_domain::{Activity, Customer, Project, Timesheet, User};

/// Records a rate is resolved from
pub struct RateContext<'a> {
    pub user: &'a User,
    pub project: &'a Project,
    pub activity: &'a Activity,
    pub customer: &'a Customer,
}

/// Calculated rates of one timesheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub rate: f64,
    pub internal_rate: f64,
    pub hourly_rate: f64,
    pub fixed_rate: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RateCalculator;

impl RateCalculator {
    pub fn hourly_rate(&self, timesheet: &Timesheet, ctx: &RateContext<'_>) -> f64 {
        timesheet
            .hourly_rate
            .or(ctx.activity.hourly_rate)
            .or(ctx.project.hourly_rate)
            .or(ctx.customer.hourly_rate)
            .or(ctx.user.hourly_rate)
            .unwrap_or(0.0)
    }

    pub fn fixed_rate(&self, timesheet: &Timesheet, ctx: &RateContext<'_>) -> Option<f64> {
        timesheet
            .fixed_rate
            .or(ctx.activity.fixed_rate)
            .or(ctx.project.fixed_rate)
            .or(ctx.customer.fixed_rate)
    }

    /// Rates for the timesheet's current duration.
    pub fn calculate(&self, timesheet: &Timesheet, ctx: &RateContext<'_>) -> Rates {
        let duration = timesheet.duration.unwrap_or(0);
        let hourly_rate = self.hourly_rate(timesheet, ctx);
        let fixed_rate = self.fixed_rate(timesheet, ctx);

        let (rate, internal_rate) = match fixed_rate {
            Some(fixed) => (fixed, fixed),
            None => {
                let internal_hourly = ctx.user.internal_rate.unwrap_or(hourly_rate);
                (per_duration(hourly_rate, duration), per_duration(internal_hourly, duration))
            }
        };

        Rates { rate: round(rate), internal_rate: round(internal_rate), hourly_rate, fixed_rate }
    }

    /// Write the calculated rates onto the timesheet.
    pub fn apply(&self, timesheet: &mut Timesheet, ctx: &RateContext<'_>) {
        let rates = self.calculate(timesheet, ctx);
        timesheet.rate = rates.rate;
        timesheet.internal_rate = Some(rates.internal_rate);
    }
}

fn per_duration(hourly: f64, seconds: i64) -> f64 {
    hourly * seconds as f64 / 3600.0
}

fn round(value: f64) -> f64 {
    let factor = 10_f64.powi(RATE_PRECISION);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    struct Fixture {
        user: User,
        project: Project,
        activity: Activity,
        customer: Customer,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                user: User::new("u", "u@example.com"),
                project: Project::new(1, "P"),
                activity: Activity::new(None, "A"),
                customer: Customer::new("C"),
            }
        }

        fn ctx(&self) -> RateContext<'_> {
            RateContext {
                user: &self.user,
                project: &self.project,
                activity: &self.activity,
                customer: &self.customer,
            }
        }
    }

    fn timesheet(duration: i64) -> Timesheet {
        let mut ts = Timesheet::new(1, 1, 1, Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(), "UTC");
        ts.duration = Some(duration);
        ts
    }

    #[test]
    fn resolution_order() {
        let mut f = Fixture::new();
        let calc = RateCalculator;
        let ts = timesheet(3600);
        assert!((calc.hourly_rate(&ts, &f.ctx())).abs() < f64::EPSILON);

        f.user.hourly_rate = Some(10.0);
        assert!((calc.hourly_rate(&ts, &f.ctx()) - 10.0).abs() < f64::EPSILON);
        f.customer.hourly_rate = Some(20.0);
        assert!((calc.hourly_rate(&ts, &f.ctx()) - 20.0).abs() < f64::EPSILON);
        f.project.hourly_rate = Some(30.0);
        assert!((calc.hourly_rate(&ts, &f.ctx()) - 30.0).abs() < f64::EPSILON);
        f.activity.hourly_rate = Some(40.0);
        assert!((calc.hourly_rate(&ts, &f.ctx()) - 40.0).abs() < f64::EPSILON);

        let mut own = timesheet(3600);
        own.hourly_rate = Some(50.0);
        assert!((calc.hourly_rate(&own, &f.ctx()) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hourly_rate_scales_with_duration() {
        let mut f = Fixture::new();
        f.project.hourly_rate = Some(75.0);
        f.user.internal_rate = Some(40.0);
        let rates = RateCalculator.calculate(&timesheet(5400), &f.ctx());
        assert!((rates.rate - 112.5).abs() < f64::EPSILON);
        assert!((rates.internal_rate - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fixed_rate_wins() {
        let mut f = Fixture::new();
        f.project.hourly_rate = Some(75.0);
        f.customer.fixed_rate = Some(99.0);
        let rates = RateCalculator.calculate(&timesheet(7200), &f.ctx());
        assert!((rates.rate - 99.0).abs() < f64::EPSILON);
        assert_eq!(rates.fixed_rate, Some(99.0));
    }

    #[test]
    fn rates_are_rounded_to_four_places() {
        let mut f = Fixture::new();
        f.user.hourly_rate = Some(10.0);
        let mut ts = timesheet(1);
        RateCalculator.apply(&mut ts, &f.ctx());
        assert!((ts.rate - 0.0028).abs() < 1e-9);
    }
}
