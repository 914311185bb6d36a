//! Invoice service - models, rendering, archive, templates and documents

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Days;
use chrono_tz::Tz;
use kimai_domain::constants::{INVOICE_DOCUMENT_NAME_LIMIT, MAX_DUE_DAYS};
use kimai_domain::query::InvoiceArchiveQuery;
use kimai_domain::utils::date::{end_of_day, month_bounds, start_of_day};
use kimai_domain::utils::file_name::{convert_to_ascii_filename, invoice_document_filename};
use kimai_domain::{
    Customer, Invoice, InvoiceConfig, InvoiceDocument, InvoiceItem, InvoiceModel, InvoiceQuery,
    InvoiceStatus, InvoiceTemplate, InvoiceTemplateInput, KimaiError, Page, Permission, Result,
    User,
};
use tracing::{error, info};

use super::number::DateNumberGenerator;
use super::ports::{InvoiceDocumentStore, InvoiceRenderer, RenderedInvoice};
use crate::access::require;
use crate::clock::Clock;
use crate::repositories::Repositories;

pub struct InvoiceService {
    repos: Repositories,
    documents: Arc<dyn InvoiceDocumentStore>,
    renderers: Vec<Arc<dyn InvoiceRenderer>>,
    config: InvoiceConfig,
    clock: Arc<dyn Clock>,
    numbers: DateNumberGenerator,
}

impl InvoiceService {
    pub fn new(
        repos: Repositories,
        documents: Arc<dyn InvoiceDocumentStore>,
        renderers: Vec<Arc<dyn InvoiceRenderer>>,
        config: InvoiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let numbers = DateNumberGenerator::new(config.number_format.clone());
        Self { repos, documents, renderers, config, clock, numbers }
    }

    /* ---------------------------------------------------------------------- */
    /* Invoices */
    /* ---------------------------------------------------------------------- */

    /// Query covering the current month in `tz`.
    pub fn default_query(&self, tz: Tz) -> InvoiceQuery {
        let today = self.clock.now().with_timezone(&tz).date_naive();
        let (first, last) = month_bounds(today);
        InvoiceQuery {
            begin: Some(start_of_day(first, tz)),
            end: Some(end_of_day(last, tz)),
            ..InvoiceQuery::default()
        }
    }

    /// Collect the invoice model for a query without persisting anything.
    pub async fn create_model(&self, actor: &User, query: &InvoiceQuery) -> Result<InvoiceModel> {
        require(actor, Permission::ViewInvoice)?;

        let template_id =
            query.template.ok_or_else(|| KimaiError::InvalidInput("Missing template".into()))?;
        let template = self.load_template(template_id).await?;
        let customer_id =
            query.customer.ok_or_else(|| KimaiError::InvalidInput("Missing customer".into()))?;
        let customer = self.load_customer(customer_id).await?;

        let mut query = query.clone();
        if query.begin.is_none() || query.end.is_none() {
            let defaults = self.default_query(actor.tz());
            query.begin = query.begin.or(defaults.begin);
            query.end = query.end.or(defaults.end);
        }

        let timesheets = self.repos.timesheets.find_for_invoice(&query).await?;
        let items = self.build_items(timesheets).await?;

        let now = self.clock.now();
        let tz = actor.tz();
        let invoice_number = self.numbers.next(self.repos.invoices.as_ref(), now, tz).await?;
        let due_date = now
            .with_timezone(&tz)
            .date_naive()
            .checked_add_days(Days::new(u64::from(template.due_days)))
            .ok_or_else(|| {
                KimaiError::InvalidInput(format!("Invalid due days: {}", template.due_days))
            })?;

        let mut model = InvoiceModel {
            invoice_number,
            created_at: now,
            due_date,
            currency: customer.currency.clone(),
            customer,
            template,
            query,
            items,
            subtotal: 0.0,
            vat: 0.0,
            tax: 0.0,
            total: 0.0,
            duration: 0,
            user_name: actor.display_name().to_string(),
        };
        model.calculate();
        Ok(model)
    }

    /// Render a preview. `document_id` defaults to the template's document.
    pub async fn render(
        &self,
        actor: &User,
        query: &InvoiceQuery,
        document_id: Option<&str>,
    ) -> Result<RenderedInvoice> {
        let model = self.create_model(actor, query).await?;
        self.render_model(&model, document_id).await
    }

    /// Render, archive and persist an invoice.
    pub async fn create_invoice(
        &self,
        actor: &User,
        query: &InvoiceQuery,
        document_id: Option<&str>,
    ) -> Result<Invoice> {
        require(actor, Permission::CreateInvoice)?;
        let model = self.create_model(actor, query).await?;
        if model.items.is_empty() {
            return Err(KimaiError::InvalidInput("No entries found for the invoice".into()));
        }
        let rendered = self.render_model(&model, document_id).await?;

        let filename = invoice_filename(&model, &rendered);
        self.documents.archive(&filename, &rendered.content).await?;

        let invoice = Invoice {
            id: 0,
            invoice_number: model.invoice_number.clone(),
            customer_id: model.customer.id,
            user_id: actor.id,
            template_id: Some(model.template.id),
            created_at: model.created_at,
            total: model.total,
            tax: model.tax,
            vat: model.vat,
            currency: model.currency.clone(),
            status: InvoiceStatus::New,
            due_days: model.template.due_days,
            payment_date: None,
            filename: filename.clone(),
        };
        let invoice = match self.repos.invoices.create(invoice).await {
            Ok(invoice) => invoice,
            Err(err) => {
                error!(error = %err, "Failed to persist invoice, removing archived file");
                let _ = self.documents.remove_archived(&filename).await;
                return Err(err);
            }
        };

        if query.mark_as_exported {
            let ids: Vec<i64> = model.items.iter().filter_map(|i| i.timesheet.id).collect();
            self.repos.timesheets.set_exported(&ids, true).await?;
        }

        if model.customer.invoice_template_id.is_none() {
            let mut customer = model.customer.clone();
            customer.invoice_template_id = Some(model.template.id);
            self.repos.customers.update(&customer).await?;
        }

        info!(invoice_id = invoice.id, number = %invoice.invoice_number, "invoice created");
        Ok(invoice)
    }

    pub async fn change_status(
        &self,
        actor: &User,
        id: i64,
        status: InvoiceStatus,
    ) -> Result<Invoice> {
        require(actor, Permission::CreateInvoice)?;
        let mut invoice = self.load_invoice(id).await?;
        invoice.set_status(status, self.clock.now());
        self.repos.invoices.update(&invoice).await?;
        Ok(invoice)
    }

    pub async fn delete_invoice(&self, actor: &User, id: i64) -> Result<()> {
        require(actor, Permission::CreateInvoice)?;
        let invoice = self.load_invoice(id).await?;
        self.documents.remove_archived(&invoice.filename).await?;
        self.repos.invoices.delete(id).await?;
        info!(invoice_id = id, "invoice deleted");
        Ok(())
    }

    pub async fn list_invoices(
        &self,
        actor: &User,
        query: &InvoiceArchiveQuery,
    ) -> Result<Page<Invoice>> {
        require(actor, Permission::ViewInvoice)?;
        self.repos.invoices.list(query).await
    }

    /* ---------------------------------------------------------------------- */
    /* Templates */
    /* ---------------------------------------------------------------------- */

    pub async fn list_templates(&self, actor: &User) -> Result<Vec<InvoiceTemplate>> {
        require(actor, Permission::ViewInvoice)?;
        self.repos.invoice_templates.list().await
    }

    pub async fn get_template(&self, actor: &User, id: i64) -> Result<InvoiceTemplate> {
        require(actor, Permission::ViewInvoice)?;
        self.load_template(id).await
    }

    pub async fn create_template(
        &self,
        actor: &User,
        input: InvoiceTemplateInput,
    ) -> Result<InvoiceTemplate> {
        require(actor, Permission::ManageInvoiceTemplate)?;
        let name = input
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| KimaiError::InvalidInput("Missing template name".into()))?;
        let renderer = input
            .renderer
            .clone()
            .ok_or_else(|| KimaiError::InvalidInput("Missing invoice document".into()))?;

        let mut template = InvoiceTemplate::new(name, renderer);
        input.apply_to(&mut template);
        self.check_template(&template).await?;
        self.repos.invoice_templates.create(template).await
    }

    pub async fn update_template(
        &self,
        actor: &User,
        id: i64,
        input: InvoiceTemplateInput,
    ) -> Result<InvoiceTemplate> {
        require(actor, Permission::ManageInvoiceTemplate)?;
        let mut template = self.load_template(id).await?;
        input.apply_to(&mut template);
        self.check_template(&template).await?;
        self.repos.invoice_templates.update(&template).await?;
        Ok(template)
    }

    pub async fn delete_template(&self, actor: &User, id: i64) -> Result<()> {
        require(actor, Permission::ManageInvoiceTemplate)?;
        self.load_template(id).await?;
        self.repos.invoice_templates.delete(id).await
    }

    /// Copy a template under the first free name `NAME (N)`.
    pub async fn copy_template(&self, actor: &User, id: i64) -> Result<InvoiceTemplate> {
        require(actor, Permission::ManageInvoiceTemplate)?;
        let original = self.load_template(id).await?;

        let mut counter = 1;
        let mut name = format!("{} ({counter})", original.name);
        while self.repos.invoice_templates.find_by_name(&name).await?.is_some() {
            counter += 1;
            name = format!("{} ({counter})", original.name);
        }

        let mut copy = original;
        copy.id = 0;
        copy.name = name;
        self.repos.invoice_templates.create(copy).await
    }

    /* ---------------------------------------------------------------------- */
    /* Documents */
    /* ---------------------------------------------------------------------- */

    pub async fn list_documents(&self, actor: &User) -> Result<Vec<InvoiceDocument>> {
        require(actor, Permission::ManageInvoiceTemplate)?;
        self.documents.list().await
    }

    /// Store an uploaded document under a sanitised name.
    pub async fn upload_document(
        &self,
        actor: &User,
        original_name: &str,
        content: &[u8],
    ) -> Result<InvoiceDocument> {
        require(actor, Permission::ManageInvoiceTemplate)?;

        let (stem, extension) = original_name
            .rsplit_once('.')
            .ok_or_else(|| KimaiError::InvalidInput("Missing file extension".into()))?;
        let supported = self
            .renderers
            .iter()
            .flat_map(|r| r.extensions().iter())
            .any(|ext| ext.eq_ignore_ascii_case(extension));
        if !supported {
            return Err(KimaiError::InvalidInput(format!("Unsupported file extension: {extension}")));
        }

        let existing = self.documents.list().await?;
        if existing.len() >= self.config.max_documents {
            return Err(KimaiError::InvalidInput(format!(
                "Maximum of {} invoice documents reached",
                self.config.max_documents
            )));
        }

        let filename = invoice_document_filename(stem, extension, INVOICE_DOCUMENT_NAME_LIMIT);
        if filename.starts_with('.') {
            return Err(KimaiError::InvalidInput("Invalid document name".into()));
        }
        if existing.iter().any(|doc| doc.name == filename) {
            return Err(KimaiError::Conflict(format!("Document {filename} already exists")));
        }

        let document = self.documents.save(&filename, content).await?;
        info!(document = %document.id, "invoice document uploaded");
        Ok(document)
    }

    pub async fn delete_document(&self, actor: &User, id: &str) -> Result<()> {
        require(actor, Permission::ManageInvoiceTemplate)?;
        let document = self
            .documents
            .find(id)
            .await?
            .ok_or_else(|| KimaiError::not_found("Document", id))?;

        if document.built_in {
            return Err(KimaiError::InvalidInput("Document is built-in and cannot be deleted".into()));
        }
        if self.repos.invoice_templates.count_by_renderer(&document.id).await? > 0 {
            return Err(KimaiError::InvalidInput("Document is used and cannot be deleted".into()));
        }

        self.documents.delete(&document).await?;
        info!(document = %document.id, "invoice document deleted");
        Ok(())
    }

    /* ---------------------------------------------------------------------- */
    /* Helpers */
    /* ---------------------------------------------------------------------- */

    async fn render_model(
        &self,
        model: &InvoiceModel,
        document_id: Option<&str>,
    ) -> Result<RenderedInvoice> {
        let document_id = document_id.unwrap_or(&model.template.renderer);
        let document = self
            .documents
            .find(document_id)
            .await?
            .ok_or_else(|| KimaiError::not_found("Document", document_id))?;
        let renderer = self
            .renderers
            .iter()
            .find(|r| r.supports(&document))
            .ok_or_else(|| {
                KimaiError::InvalidInput(format!("No renderer available for {}", document.name))
            })?;
        let source = self.documents.read(&document).await?;
        renderer.render(&document, &source, model)
    }

    async fn build_items(&self, timesheets: Vec<kimai_domain::Timesheet>) -> Result<Vec<InvoiceItem>> {
        let mut projects: HashMap<i64, String> = HashMap::new();
        let mut activities: HashMap<i64, String> = HashMap::new();
        let mut users: HashMap<i64, String> = HashMap::new();
        let mut items = Vec::with_capacity(timesheets.len());

        for timesheet in timesheets {
            if !projects.contains_key(&timesheet.project_id) {
                let name = self
                    .repos
                    .projects
                    .find(timesheet.project_id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_default();
                projects.insert(timesheet.project_id, name);
            }
            if !activities.contains_key(&timesheet.activity_id) {
                let name = self
                    .repos
                    .activities
                    .find(timesheet.activity_id)
                    .await?
                    .map(|a| a.name)
                    .unwrap_or_default();
                activities.insert(timesheet.activity_id, name);
            }
            if !users.contains_key(&timesheet.user_id) {
                let name = self
                    .repos
                    .users
                    .find(timesheet.user_id)
                    .await?
                    .map(|u| u.display_name().to_string())
                    .unwrap_or_default();
                users.insert(timesheet.user_id, name);
            }

            items.push(InvoiceItem {
                project_name: projects.get(&timesheet.project_id).cloned().unwrap_or_default(),
                activity_name: activities.get(&timesheet.activity_id).cloned().unwrap_or_default(),
                user_name: users.get(&timesheet.user_id).cloned().unwrap_or_default(),
                timesheet,
            });
        }

        items.sort_by_key(|item| item.timesheet.begin);
        Ok(items)
    }

    async fn check_template(&self, template: &InvoiceTemplate) -> Result<()> {
        if template.due_days > MAX_DUE_DAYS {
            return Err(KimaiError::InvalidInput(format!(
                "Due days must be between 0 and {MAX_DUE_DAYS}"
            )));
        }
        if self.documents.find(&template.renderer).await?.is_none() {
            return Err(KimaiError::InvalidInput(format!(
                "Unknown invoice document: {}",
                template.renderer
            )));
        }
        if let Some(other) = self.repos.invoice_templates.find_by_name(&template.name).await? {
            if other.id != template.id {
                return Err(KimaiError::Conflict(format!(
                    "Template name {} is already used",
                    template.name
                )));
            }
        }
        Ok(())
    }

    async fn load_template(&self, id: i64) -> Result<InvoiceTemplate> {
        self.repos
            .invoice_templates
            .find(id)
            .await?
            .ok_or_else(|| KimaiError::not_found("Invoice template", id))
    }

    async fn load_customer(&self, id: i64) -> Result<Customer> {
        self.repos.customers.find(id).await?.ok_or_else(|| KimaiError::not_found("Customer", id))
    }

    async fn load_invoice(&self, id: i64) -> Result<Invoice> {
        self.repos.invoices.find(id).await?.ok_or_else(|| KimaiError::not_found("Invoice", id))
    }
}

fn invoice_filename(model: &InvoiceModel, rendered: &RenderedInvoice) -> String {
    format!(
        "{}-{}.{}",
        convert_to_ascii_filename(&model.invoice_number),
        convert_to_ascii_filename(&model.customer.name),
        rendered.extension
    )
}

