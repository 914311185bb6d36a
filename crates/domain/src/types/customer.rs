//! Customers, projects and activities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub fixed_rate: Option<f64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub time_budget: Option<i64>,
    /// Template used for new invoices of this customer
    #[serde(default)]
    pub invoice_template_id: Option<i64>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            number: None,
            comment: None,
            visible: true,
            currency: default_currency(),
            country: None,
            timezone: None,
            hourly_rate: None,
            fixed_rate: None,
            budget: None,
            time_budget: None,
            invoice_template_id: None,
        }
    }
}

/// Period a project budget applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetType {
    Monthly,
    Quarterly,
}

impl_domain_status_conversions!(BudgetType {
    Monthly => "monthly",
    Quarterly => "quarterly",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub customer_id: i64,
    pub name: String,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub fixed_rate: Option<f64>,
    #[serde(default)]
    pub budget: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub time_budget: Option<i64>,
    /// `None` means the budget covers the whole project lifetime
    #[serde(default)]
    pub budget_type: Option<BudgetType>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(customer_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            customer_id,
            name: name.into(),
            order_number: None,
            comment: None,
            visible: true,
            hourly_rate: None,
            fixed_rate: None,
            budget: None,
            time_budget: None,
            budget_type: None,
            start: None,
            end: None,
        }
    }

    pub fn has_budget(&self) -> bool {
        self.budget.is_some_and(|b| b > 0.0) || self.time_budget.is_some_and(|t| t > 0)
    }
}

/// Fields accepted when creating or updating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInput {
    pub customer: Option<i64>,
    pub name: Option<String>,
    pub order_number: Option<String>,
    pub comment: Option<String>,
    pub visible: Option<bool>,
    pub hourly_rate: Option<f64>,
    pub fixed_rate: Option<f64>,
    pub budget: Option<f64>,
    pub time_budget: Option<i64>,
    pub budget_type: Option<BudgetType>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ProjectInput {
    /// Copy every provided field onto `project`.
    pub fn apply_to(self, project: &mut Project) {
        if let Some(customer) = self.customer {
            project.customer_id = customer;
        }
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(visible) = self.visible {
            project.visible = visible;
        }
        if self.order_number.is_some() {
            project.order_number = self.order_number;
        }
        if self.comment.is_some() {
            project.comment = self.comment;
        }
        if self.hourly_rate.is_some() {
            project.hourly_rate = self.hourly_rate;
        }
        if self.fixed_rate.is_some() {
            project.fixed_rate = self.fixed_rate;
        }
        if self.budget.is_some() {
            project.budget = self.budget;
        }
        if self.time_budget.is_some() {
            project.time_budget = self.time_budget;
        }
        if self.budget_type.is_some() {
            project.budget_type = self.budget_type;
        }
        if self.start.is_some() {
            project.start = self.start;
        }
        if self.end.is_some() {
            project.end = self.end;
        }
    }
}

/// Activity; without a project it is global and usable everywhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    #[serde(default)]
    pub project_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub fixed_rate: Option<f64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub time_budget: Option<i64>,
}

impl Activity {
    pub fn new(project_id: Option<i64>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            project_id,
            name: name.into(),
            comment: None,
            visible: true,
            hourly_rate: None,
            fixed_rate: None,
            budget: None,
            time_budget: None,
        }
    }

    pub fn is_global(&self) -> bool {
        self.project_id.is_none()
    }

    /// Whether this activity may be booked on `project_id`.
    pub fn is_usable_for(&self, project_id: i64) -> bool {
        self.project_id.map_or(true, |id| id == project_id)
    }
}

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    "EUR".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_activities_fit_every_project() {
        let global = Activity::new(None, "Support");
        let bound = Activity::new(Some(3), "Design");
        assert!(global.is_global());
        assert!(global.is_usable_for(7));
        assert!(bound.is_usable_for(3));
        assert!(!bound.is_usable_for(7));
    }

    #[test]
    fn project_input_only_touches_given_fields() {
        let mut project = Project::new(1, "Website");
        project.comment = Some("keep".into());
        ProjectInput { name: Some("Relaunch".into()), budget: Some(500.0), ..Default::default() }
            .apply_to(&mut project);
        assert_eq!(project.name, "Relaunch");
        assert_eq!(project.comment.as_deref(), Some("keep"));
        assert!(project.has_budget());
    }

    #[test]
    fn customer_defaults_from_json() {
        let customer: Customer = serde_json::from_str(r#"{"id": 4, "name": "ACME"}"#).unwrap();
        assert!(customer.visible);
        assert_eq!(customer.currency, "EUR");
    }
}
