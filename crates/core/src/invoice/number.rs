//! Invoice number generation

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use kimai_domain::Result;

use super::ports::InvoiceRepository;

/// `date` strategy: the creation date in a chrono format, suffixed with
/// `-1`, `-2`, ... while the number is taken.
#[derive(Debug, Clone)]
pub struct DateNumberGenerator {
    format: String,
}

impl DateNumberGenerator {
    pub fn new(format: impl Into<String>) -> Self {
        Self { format: format.into() }
    }

    pub fn base(&self, now: DateTime<Utc>, tz: Tz) -> String {
        now.with_timezone(&tz).format(&self.format).to_string()
    }

    pub async fn next(
        &self,
        invoices: &dyn InvoiceRepository,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Result<String> {
        let base = self.base(now, tz);
        let mut candidate = base.clone();
        let mut counter = 0_u32;
        while invoices.number_exists(&candidate).await? {
            counter += 1;
            candidate = format!("{base}-{counter}");
        }
        Ok(candidate)
    }
}
