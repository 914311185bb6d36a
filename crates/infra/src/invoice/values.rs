//! Flat `key => value` maps of an invoice model.
//!
//! Global keys use the `invoice.`, `template.`, `query.` and `customer.`
//! prefixes; every line item gets its own `entry.` map.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use kimai_domain::constants::DATE_FORMAT;
use kimai_domain::utils::duration;
use kimai_domain::utils::money::{currency_symbol, format_money, format_number};
use kimai_domain::{InvoiceItem, InvoiceModel};

pub type Values = BTreeMap<String, String>;

/// Formats amounts, dates and durations for one locale.
#[derive(Debug, Clone)]
pub struct ValueFormatter {
    locale: String,
    duration_pattern: String,
}

impl ValueFormatter {
    pub fn new(locale: impl Into<String>, duration_pattern: impl Into<String>) -> Self {
        Self { locale: locale.into(), duration_pattern: duration_pattern.into() }
    }

    /// Template language wins over the configured locale.
    fn locale<'a>(&'a self, model: &'a InvoiceModel) -> &'a str {
        model.template.language.as_deref().filter(|l| !l.is_empty()).unwrap_or(&self.locale)
    }

    fn money(&self, values: &mut Values, key: &str, amount: f64, currency: &str, locale: &str) {
        values.insert(key.to_string(), format_money(Some(amount), currency, locale));
        values.insert(format!("{key}_nc"), format_number(amount, locale));
        values.insert(format!("{key}_plain"), format!("{amount:.2}"));
    }

    fn duration(&self, seconds: i64) -> String {
        duration::format_with_pattern(Some(seconds), &self.duration_pattern).unwrap_or_default()
    }

    /// `invoice.*`, `template.*`, `query.*` and `customer.*` keys.
    pub fn global_values(&self, model: &InvoiceModel) -> Values {
        let locale = self.locale(model);
        let currency = model.currency.as_str();
        let mut values = Values::new();

        values.insert("invoice.due_date".into(), model.due_date.format(DATE_FORMAT).to_string());
        values.insert("invoice.date".into(), model.created_at.format(DATE_FORMAT).to_string());
        values.insert("invoice.number".into(), model.invoice_number.clone());
        values.insert("invoice.currency".into(), currency.to_string());
        values.insert("invoice.currency_symbol".into(), currency_symbol(currency));
        values.insert("invoice.vat".into(), format!("{}", model.vat));
        values.insert("invoice.user".into(), model.user_name.clone());
        self.money(&mut values, "invoice.tax", model.tax, currency, locale);
        self.money(&mut values, "invoice.total", model.total, currency, locale);
        self.money(&mut values, "invoice.subtotal", model.subtotal, currency, locale);
        values.insert("invoice.total_time".into(), self.duration(model.duration));
        values.insert(
            "invoice.duration_decimal".into(),
            format_number(duration::to_decimal_hours(model.duration), locale),
        );

        let template = &model.template;
        values.insert("template.name".into(), template.name.clone());
        values.insert("template.title".into(), template.title.clone());
        values.insert("template.company".into(), template.company.clone());
        values.insert("template.address".into(), template.address.clone().unwrap_or_default());
        values.insert("template.contact".into(), template.contact.clone().unwrap_or_default());
        values.insert("template.vat_id".into(), template.vat_id.clone().unwrap_or_default());
        values.insert(
            "template.payment_terms".into(),
            template.payment_terms.clone().unwrap_or_default(),
        );
        values.insert(
            "template.payment_details".into(),
            template.payment_details.clone().unwrap_or_default(),
        );
        values.insert("template.due_days".into(), template.due_days.to_string());

        if let Some(begin) = model.query.begin {
            values.insert("query.begin".into(), begin.format(DATE_FORMAT).to_string());
            values.insert("query.day".into(), begin.day().to_string());
            values.insert("query.month".into(), begin.format("%B").to_string());
            values.insert("query.month_number".into(), format!("{:02}", begin.month()));
            values.insert("query.year".into(), begin.year().to_string());
        }
        if let Some(end) = model.query.end {
            values.insert("query.end".into(), end.format(DATE_FORMAT).to_string());
        }

        let customer = &model.customer;
        values.insert("customer.id".into(), customer.id.to_string());
        values.insert("customer.name".into(), customer.name.clone());
        values.insert("customer.number".into(), customer.number.clone().unwrap_or_default());
        values.insert("customer.country".into(), customer.country.clone().unwrap_or_default());
        values.insert("customer.comment".into(), customer.comment.clone().unwrap_or_default());
        values.insert("customer.currency".into(), customer.currency.clone());

        values
    }

    /// `entry.*` keys of the line item at `index` (zero based).
    pub fn entry_values(&self, model: &InvoiceModel, index: usize, item: &InvoiceItem) -> Values {
        let locale = self.locale(model);
        let currency = model.currency.as_str();
        let timesheet = &item.timesheet;
        let tz: Tz = timesheet.timezone.parse().unwrap_or(Tz::UTC);
        let seconds = timesheet.duration.unwrap_or(0);
        let mut values = Values::new();

        values.insert("entry.row".into(), (index + 1).to_string());
        values.insert(
            "entry.description".into(),
            timesheet.description.clone().unwrap_or_default(),
        );
        let amount = match timesheet.fixed_rate {
            Some(_) => "1".to_string(),
            None => format_number(duration::to_decimal_hours(seconds), locale),
        };
        values.insert("entry.amount".into(), amount);
        let unit_rate = timesheet.fixed_rate.or(timesheet.hourly_rate).unwrap_or(0.0);
        self.money(&mut values, "entry.rate", unit_rate, currency, locale);
        self.money(&mut values, "entry.total", timesheet.rate, currency, locale);
        values.insert("entry.currency".into(), currency.to_string());
        values.insert("entry.duration".into(), self.duration(seconds));
        values.insert(
            "entry.duration_decimal".into(),
            format_number(duration::to_decimal_hours(seconds), locale),
        );
        values.insert("entry.duration_minutes".into(), (seconds / 60).to_string());

        insert_instant(&mut values, "entry.begin", timesheet.begin, tz);
        if let Some(end) = timesheet.end {
            insert_instant(&mut values, "entry.end", end, tz);
        }
        values.insert("entry.date".into(), timesheet.local_date().format(DATE_FORMAT).to_string());

        values.insert("entry.user_id".into(), timesheet.user_id.to_string());
        values.insert("entry.user_name".into(), item.user_name.clone());
        values.insert("entry.activity".into(), item.activity_name.clone());
        values.insert("entry.activity_id".into(), timesheet.activity_id.to_string());
        values.insert("entry.project".into(), item.project_name.clone());
        values.insert("entry.project_id".into(), timesheet.project_id.to_string());
        values.insert("entry.customer".into(), model.customer.name.clone());
        values.insert("entry.customer_id".into(), model.customer.id.to_string());
        if !timesheet.tags.is_empty() {
            values.insert("entry.tags".into(), timesheet.tags.join(", "));
        }
        for (name, value) in &timesheet.meta {
            values.insert(format!("entry.meta.{name}"), value.clone());
        }

        values
    }
}

fn insert_instant(values: &mut Values, key: &str, instant: DateTime<Utc>, tz: Tz) {
    let local = instant.with_timezone(&tz);
    values.insert(key.to_string(), local.format(DATE_FORMAT).to_string());
    values.insert(format!("{key}_time"), local.format("%H:%M").to_string());
    values.insert(format!("{key}_timestamp"), instant.timestamp().to_string());
}
