//! Invoices, invoice templates and the model handed to renderers

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DUE_DAYS;
use crate::impl_domain_status_conversions;
use crate::types::{Customer, Timesheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    New,
    Pending,
    Paid,
    Canceled,
}

impl_domain_status_conversions!(InvoiceStatus {
    New => "new",
    Pending => "pending",
    Paid => "paid",
    Canceled => "canceled",
});

/// An archived invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub customer_id: i64,
    pub user_id: i64,
    pub template_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub total: f64,
    pub tax: f64,
    pub vat: f64,
    pub currency: String,
    pub status: InvoiceStatus,
    pub due_days: u32,
    pub payment_date: Option<DateTime<Utc>>,
    /// File name inside the invoice archive
    pub filename: String,
}

impl Invoice {
    /// `None` when the due date lies outside the supported calendar.
    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.created_at.checked_add_days(chrono::Days::new(u64::from(self.due_days)))
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, InvoiceStatus::New | InvoiceStatus::Pending)
            && self.due_date().is_some_and(|due| now > due)
    }

    /// Apply a status change; `paid` records the payment date once.
    pub fn set_status(&mut self, status: InvoiceStatus, now: DateTime<Utc>) {
        if status == InvoiceStatus::Paid && self.payment_date.is_none() {
            self.payment_date = Some(now);
        }
        self.status = status;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTemplate {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub vat_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub payment_details: Option<String>,
    #[serde(default = "default_due_days")]
    pub due_days: u32,
    /// Percent
    #[serde(default)]
    pub vat: f64,
    #[serde(default = "default_calculator")]
    pub calculator: String,
    #[serde(default = "default_number_generator")]
    pub number_generator: String,
    /// Id of the invoice document used for rendering
    pub renderer: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl InvoiceTemplate {
    pub fn new(name: impl Into<String>, renderer: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: 0,
            title: name.clone(),
            company: name.clone(),
            name,
            vat_id: None,
            address: None,
            contact: None,
            payment_terms: None,
            payment_details: None,
            due_days: DEFAULT_DUE_DAYS,
            vat: 0.0,
            calculator: default_calculator(),
            number_generator: default_number_generator(),
            renderer: renderer.into(),
            language: None,
        }
    }
}

fn default_due_days() -> u32 {
    DEFAULT_DUE_DAYS
}

fn default_calculator() -> String {
    "default".to_string()
}

fn default_number_generator() -> String {
    "date".to_string()
}

/// Template fields accepted by create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceTemplateInput {
    pub name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub vat_id: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub payment_terms: Option<String>,
    pub payment_details: Option<String>,
    pub due_days: Option<u32>,
    pub vat: Option<f64>,
    pub renderer: Option<String>,
    pub language: Option<String>,
}

impl InvoiceTemplateInput {
    pub fn apply_to(self, template: &mut InvoiceTemplate) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(title) = self.title {
            template.title = title;
        }
        if let Some(company) = self.company {
            template.company = company;
        }
        if let Some(due_days) = self.due_days {
            template.due_days = due_days;
        }
        if let Some(vat) = self.vat {
            template.vat = vat;
        }
        if let Some(renderer) = self.renderer {
            template.renderer = renderer;
        }
        for (value, target) in [
            (self.vat_id, &mut template.vat_id),
            (self.address, &mut template.address),
            (self.contact, &mut template.contact),
            (self.payment_terms, &mut template.payment_terms),
            (self.payment_details, &mut template.payment_details),
            (self.language, &mut template.language),
        ] {
            if value.is_some() {
                *target = value;
            }
        }
    }
}

/// A file that renderers turn into an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    /// File stem, referenced by `InvoiceTemplate::renderer`
    pub id: String,
    /// File name including extension
    pub name: String,
    /// Shipped with the application and not deletable
    pub built_in: bool,
    #[serde(skip)]
    pub path: PathBuf,
}

impl InvoiceDocument {
    pub fn extension(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

/// Parameters of an invoice run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceQuery {
    pub customer: Option<i64>,
    pub template: Option<i64>,
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub projects: Vec<i64>,
    pub activities: Vec<i64>,
    pub users: Vec<i64>,
    pub mark_as_exported: bool,
}

/// One invoice line, built from a timesheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub timesheet: Timesheet,
    pub project_name: String,
    pub activity_name: String,
    pub user_name: String,
}

impl InvoiceItem {
    pub fn amount(&self) -> f64 {
        self.timesheet.rate
    }
}

/// Everything a renderer needs to produce an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceModel {
    pub invoice_number: String,
    pub created_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub customer: Customer,
    pub template: InvoiceTemplate,
    pub query: InvoiceQuery,
    pub currency: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: f64,
    pub vat: f64,
    pub tax: f64,
    pub total: f64,
    /// Sum of item durations in seconds
    pub duration: i64,
    pub user_name: String,
}

impl InvoiceModel {
    /// Recompute subtotal, tax, total and duration from the items.
    pub fn calculate(&mut self) {
        let subtotal: f64 = self.items.iter().map(InvoiceItem::amount).sum();
        self.subtotal = round2(subtotal);
        self.vat = self.template.vat;
        self.tax = round2(subtotal * self.template.vat / 100.0);
        self.total = round2(self.subtotal + self.tax);
        self.duration = self.items.iter().filter_map(|i| i.timesheet.duration).sum();
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
