//! Project and invoice archive filters

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::query::visibility::VisibilityQuery;
use crate::types::InvoiceStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectQuery {
    pub visibility: VisibilityQuery,
    pub customers: Vec<i64>,
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ProjectQuery {
    fn default() -> Self {
        Self {
            visibility: VisibilityQuery::default(),
            customers: Vec::new(),
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProjectQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// Raw query string of the project collection endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectQueryParams {
    pub customer: Option<i64>,
    pub visible: Option<String>,
    pub term: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl From<ProjectQueryParams> for ProjectQuery {
    fn from(params: ProjectQueryParams) -> Self {
        let mut query = Self::default();
        if let Some(visible) = params.visible {
            query.visibility.set_visibility(visible);
        }
        query.customers = params.customer.into_iter().collect();
        query.search = params.term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        query.page = params.page.unwrap_or(1).max(1);
        query.page_size = params.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        query
    }
}

/// Filter for the invoice archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceArchiveQuery {
    pub customers: Vec<i64>,
    pub status: Vec<InvoiceStatus>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for InvoiceArchiveQuery {
    fn default() -> Self {
        Self { customers: Vec::new(), status: Vec::new(), page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl InvoiceArchiveQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}
