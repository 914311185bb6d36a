//! Shared test helpers for `kimai-core` integration tests.
//!
//! `Memory` implements every repository port on top of one shared state so
//! services can be exercised without SQLite.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use kimai_core::invoice::ports::{InvoiceRepository, InvoiceTemplateRepository};
use kimai_core::{
    ActivityRepository, CustomerRepository, FixedClock, InvoiceDocumentStore, InvoiceRenderer,
    Marketplace, ProjectRepository, RenderedInvoice, Repositories, TagRepository,
    TimesheetRepository, UserRepository,
};
use kimai_domain::query::{InvoiceArchiveQuery, ProjectQuery, TimesheetQuery, UserFilter, Visibility};
use kimai_domain::{
    Activity, Customer, Invoice, InvoiceDocument, InvoiceModel, InvoiceQuery, InvoiceTemplate,
    KimaiError, MarketplacePlugin, Page, Project, ProjectStatistic, Result, Role, Tag, Timesheet,
    User,
};

/* -------------------------------------------------------------------------- */
/* In-memory repositories */
/* -------------------------------------------------------------------------- */

#[derive(Default)]
pub struct State {
    next_id: i64,
    pub users: Vec<User>,
    pub customers: Vec<Customer>,
    pub projects: Vec<Project>,
    pub activities: Vec<Activity>,
    pub timesheets: Vec<Timesheet>,
    pub tags: Vec<Tag>,
    pub invoices: Vec<Invoice>,
    pub templates: Vec<InvoiceTemplate>,
}

impl State {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct Memory {
    pub state: Arc<Mutex<State>>,
}

impl Memory {
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.clone()),
            customers: Arc::new(self.clone()),
            projects: Arc::new(self.clone()),
            activities: Arc::new(self.clone()),
            timesheets: Arc::new(self.clone()),
            tags: Arc::new(self.clone()),
            invoices: Arc::new(self.clone()),
            invoice_templates: Arc::new(self.clone()),
        }
    }

    pub fn timesheets(&self) -> Vec<Timesheet> {
        self.state.lock().unwrap().timesheets.clone()
    }

    /// Store a timesheet directly, bypassing services.
    pub fn insert_timesheet(&self, mut timesheet: Timesheet) -> Timesheet {
        let mut state = self.state.lock().unwrap();
        timesheet.id = Some(state.id());
        state.timesheets.push(timesheet.clone());
        timesheet
    }

    pub fn customer_of(&self, project_id: i64) -> Option<i64> {
        let state = self.state.lock().unwrap();
        state.projects.iter().find(|p| p.id == project_id).map(|p| p.customer_id)
    }
}

fn in_range(ts: &Timesheet, begin: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    ts.begin >= begin && ts.begin <= end
}

#[async_trait]
impl UserRepository for Memory {
    async fn find(&self, id: i64) -> Result<Option<User>> {
        Ok(self.state.lock().unwrap().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.state.lock().unwrap().users.iter().find(|u| u.username == username).cloned())
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().filter(|u| visibility.matches(u.enabled)).cloned().collect())
    }

    async fn create(&self, mut user: User) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        user.id = state.id();
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let slot = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| KimaiError::not_found("User", user.id))?;
        *slot = user.clone();
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for Memory {
    async fn find(&self, id: i64) -> Result<Option<Customer>> {
        Ok(self.state.lock().unwrap().customers.iter().find(|c| c.id == id).cloned())
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Customer>> {
        let state = self.state.lock().unwrap();
        Ok(state.customers.iter().filter(|c| visibility.matches(c.visible)).cloned().collect())
    }

    async fn create(&self, mut customer: Customer) -> Result<Customer> {
        let mut state = self.state.lock().unwrap();
        customer.id = state.id();
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn update(&self, customer: &Customer) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.customers.iter_mut().find(|c| c.id == customer.id) {
            *slot = customer.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for Memory {
    async fn find(&self, id: i64) -> Result<Option<Project>> {
        Ok(self.state.lock().unwrap().projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, query: &ProjectQuery) -> Result<Page<Project>> {
        let state = self.state.lock().unwrap();
        let items: Vec<Project> = state
            .projects
            .iter()
            .filter(|p| query.visibility.visibility().matches(p.visible))
            .filter(|p| query.customers.is_empty() || query.customers.contains(&p.customer_id))
            .cloned()
            .collect();
        let total = items.len() as u64;
        Ok(Page::new(items, query.page, query.page_size, total))
    }

    async fn find_all(&self, customer_id: Option<i64>) -> Result<Vec<Project>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .projects
            .iter()
            .filter(|p| customer_id.map_or(true, |c| p.customer_id == c))
            .cloned()
            .collect())
    }

    async fn create(&self, mut project: Project) -> Result<Project> {
        let mut state = self.state.lock().unwrap();
        project.id = state.id();
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn update(&self, project: &Project) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.projects.iter_mut().find(|p| p.id == project.id) {
            *slot = project.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.state.lock().unwrap().projects.retain(|p| p.id != id);
        Ok(())
    }
}

#[async_trait]
impl ActivityRepository for Memory {
    async fn find(&self, id: i64) -> Result<Option<Activity>> {
        Ok(self.state.lock().unwrap().activities.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self, project_id: Option<i64>) -> Result<Vec<Activity>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .activities
            .iter()
            .filter(|a| a.is_global() || (project_id.is_some() && a.project_id == project_id))
            .cloned()
            .collect())
    }

    async fn create(&self, mut activity: Activity) -> Result<Activity> {
        let mut state = self.state.lock().unwrap();
        activity.id = state.id();
        state.activities.push(activity.clone());
        Ok(activity)
    }
}

#[async_trait]
impl TimesheetRepository for Memory {
    async fn find(&self, id: i64) -> Result<Option<Timesheet>> {
        Ok(self.state.lock().unwrap().timesheets.iter().find(|t| t.id == Some(id)).cloned())
    }

    async fn list(&self, query: &TimesheetQuery) -> Result<Page<Timesheet>> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<Timesheet> = state
            .timesheets
            .iter()
            .filter(|t| match query.user {
                UserFilter::Id(id) => t.user_id == id,
                _ => true,
            })
            .filter(|t| query.projects.is_empty() || query.projects.contains(&t.project_id))
            .filter(|t| query.begin.map_or(true, |b| t.begin >= b))
            .filter(|t| query.end.map_or(true, |e| t.begin <= e))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.begin.cmp(&a.begin));
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();
        Ok(Page::new(items, query.page, query.page_size, total))
    }

    async fn create(&self, mut timesheet: Timesheet) -> Result<Timesheet> {
        let mut state = self.state.lock().unwrap();
        timesheet.id = Some(state.id());
        state.timesheets.push(timesheet.clone());
        Ok(timesheet)
    }

    async fn update(&self, timesheet: &Timesheet) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let slot = state
            .timesheets
            .iter_mut()
            .find(|t| t.id == timesheet.id)
            .ok_or_else(|| KimaiError::NotFound("Timesheet not found".into()))?;
        *slot = timesheet.clone();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.state.lock().unwrap().timesheets.retain(|t| t.id != Some(id));
        Ok(())
    }

    async fn active(&self, user_id: i64) -> Result<Vec<Timesheet>> {
        let state = self.state.lock().unwrap();
        let mut active: Vec<Timesheet> = state
            .timesheets
            .iter()
            .filter(|t| t.user_id == user_id && t.is_running())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.begin.cmp(&a.begin));
        Ok(active)
    }

    async fn recent(
        &self,
        user_id: i64,
        begin: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<Timesheet>> {
        let state = self.state.lock().unwrap();
        let mut all: Vec<&Timesheet> = state
            .timesheets
            .iter()
            .filter(|t| t.user_id == user_id && begin.map_or(true, |b| t.begin >= b))
            .collect();
        all.sort_by(|a, b| b.begin.cmp(&a.begin));
        let mut seen = Vec::new();
        let mut result = Vec::new();
        for t in all {
            let pair = (t.project_id, t.activity_id);
            if !seen.contains(&pair) {
                seen.push(pair);
                result.push(t.clone());
            }
        }
        result.truncate(limit as usize);
        Ok(result)
    }

    async fn find_in_range(
        &self,
        user_id: i64,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Timesheet>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .timesheets
            .iter()
            .filter(|t| t.user_id == user_id && in_range(t, begin, end))
            .cloned()
            .collect())
    }

    async fn find_finished(
        &self,
        user_ids: &[i64],
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Timesheet>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .timesheets
            .iter()
            .filter(|t| user_ids.contains(&t.user_id) && !t.is_running() && in_range(t, begin, end))
            .cloned()
            .collect())
    }

    async fn find_finished_for_projects(
        &self,
        project_ids: &[i64],
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Timesheet>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .timesheets
            .iter()
            .filter(|t| {
                project_ids.contains(&t.project_id) && !t.is_running() && in_range(t, begin, end)
            })
            .cloned()
            .collect())
    }

    async fn find_for_invoice(&self, query: &InvoiceQuery) -> Result<Vec<Timesheet>> {
        let state = self.state.lock().unwrap();
        let customer_projects: Vec<i64> = state
            .projects
            .iter()
            .filter(|p| query.customer.map_or(true, |c| p.customer_id == c))
            .map(|p| p.id)
            .collect();
        Ok(state
            .timesheets
            .iter()
            .filter(|t| t.billable && !t.exported && !t.is_running())
            .filter(|t| customer_projects.contains(&t.project_id))
            .filter(|t| query.projects.is_empty() || query.projects.contains(&t.project_id))
            .filter(|t| query.activities.is_empty() || query.activities.contains(&t.activity_id))
            .filter(|t| query.users.is_empty() || query.users.contains(&t.user_id))
            .filter(|t| query.begin.map_or(true, |b| t.begin >= b))
            .filter(|t| query.end.map_or(true, |e| t.begin <= e))
            .cloned()
            .collect())
    }

    async fn set_exported(&self, ids: &[i64], exported: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for t in state.timesheets.iter_mut() {
            if t.id.is_some_and(|id| ids.contains(&id)) {
                t.exported = exported;
            }
        }
        Ok(())
    }

    async fn first_record(&self, user_id: i64) -> Result<Option<DateTime<Utc>>> {
        let state = self.state.lock().unwrap();
        Ok(state.timesheets.iter().filter(|t| t.user_id == user_id).map(|t| t.begin).min())
    }

    async fn project_statistic(&self, project_id: i64) -> Result<ProjectStatistic> {
        let state = self.state.lock().unwrap();
        let mut stats = ProjectStatistic::default();
        for t in state.timesheets.iter().filter(|t| t.project_id == project_id) {
            stats.record_count += 1;
            stats.duration += t.duration.unwrap_or(0);
            stats.rate += t.rate;
            stats.internal_rate += t.internal_rate.unwrap_or(0.0);
            stats.first_record = Some(stats.first_record.map_or(t.begin, |f| f.min(t.begin)));
            stats.last_record = Some(stats.last_record.map_or(t.begin, |l| l.max(t.begin)));
        }
        Ok(stats)
    }

    async fn delete_by_project(&self, project_id: i64) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.timesheets.len();
        state.timesheets.retain(|t| t.project_id != project_id);
        Ok((before - state.timesheets.len()) as u64)
    }
}

#[async_trait]
impl TagRepository for Memory {
    async fn list(&self) -> Result<Vec<Tag>> {
        Ok(self.state.lock().unwrap().tags.clone())
    }

    async fn ensure(&self, names: &[String]) -> Result<Vec<Tag>> {
        let mut state = self.state.lock().unwrap();
        let mut result = Vec::new();
        for name in names {
            if let Some(tag) = state.tags.iter().find(|t| &t.name == name) {
                result.push(tag.clone());
                continue;
            }
            let tag = Tag { id: state.id(), name: name.clone() };
            state.tags.push(tag.clone());
            result.push(tag);
        }
        Ok(result)
    }
}

#[async_trait]
impl InvoiceRepository for Memory {
    async fn find(&self, id: i64) -> Result<Option<Invoice>> {
        Ok(self.state.lock().unwrap().invoices.iter().find(|i| i.id == id).cloned())
    }

    async fn list(&self, query: &InvoiceArchiveQuery) -> Result<Page<Invoice>> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<Invoice> = state
            .invoices
            .iter()
            .filter(|i| query.customers.is_empty() || query.customers.contains(&i.customer_id))
            .filter(|i| query.status.is_empty() || query.status.contains(&i.status))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = items.len() as u64;
        Ok(Page::new(items, query.page, query.page_size, total))
    }

    async fn create(&self, mut invoice: Invoice) -> Result<Invoice> {
        let mut state = self.state.lock().unwrap();
        invoice.id = state.id();
        state.invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn update(&self, invoice: &Invoice) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.invoices.iter_mut().find(|i| i.id == invoice.id) {
            *slot = invoice.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.state.lock().unwrap().invoices.retain(|i| i.id != id);
        Ok(())
    }

    async fn number_exists(&self, number: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().invoices.iter().any(|i| i.invoice_number == number))
    }
}

#[async_trait]
impl InvoiceTemplateRepository for Memory {
    async fn find(&self, id: i64) -> Result<Option<InvoiceTemplate>> {
        Ok(self.state.lock().unwrap().templates.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<InvoiceTemplate>> {
        Ok(self.state.lock().unwrap().templates.iter().find(|t| t.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<InvoiceTemplate>> {
        Ok(self.state.lock().unwrap().templates.clone())
    }

    async fn create(&self, mut template: InvoiceTemplate) -> Result<InvoiceTemplate> {
        let mut state = self.state.lock().unwrap();
        template.id = state.id();
        state.templates.push(template.clone());
        Ok(template)
    }

    async fn update(&self, template: &InvoiceTemplate) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.templates.iter_mut().find(|t| t.id == template.id) {
            *slot = template.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.state.lock().unwrap().templates.retain(|t| t.id != id);
        Ok(())
    }

    async fn count_by_renderer(&self, renderer: &str) -> Result<u64> {
        let state = self.state.lock().unwrap();
        Ok(state.templates.iter().filter(|t| t.renderer == renderer).count() as u64)
    }
}

/* -------------------------------------------------------------------------- */
/* Documents, renderer and marketplace */
/* -------------------------------------------------------------------------- */

#[derive(Default)]
pub struct MemoryDocuments {
    pub documents: Mutex<HashMap<String, (InvoiceDocument, String)>>,
    pub archive: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryDocuments {
    pub fn with_built_in(name: &str, source: &str) -> Self {
        let store = Self::default();
        let (id, _) = name.rsplit_once('.').unwrap();
        let document = InvoiceDocument {
            id: id.to_string(),
            name: name.to_string(),
            built_in: true,
            path: PathBuf::from(name),
        };
        store.documents.lock().unwrap().insert(id.to_string(), (document, source.to_string()));
        store
    }

    pub fn archived(&self) -> Vec<String> {
        self.archive.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl InvoiceDocumentStore for MemoryDocuments {
    async fn list(&self) -> Result<Vec<InvoiceDocument>> {
        let mut docs: Vec<InvoiceDocument> =
            self.documents.lock().unwrap().values().map(|(d, _)| d.clone()).collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    async fn find(&self, id: &str) -> Result<Option<InvoiceDocument>> {
        Ok(self.documents.lock().unwrap().get(id).map(|(d, _)| d.clone()))
    }

    async fn read(&self, document: &InvoiceDocument) -> Result<String> {
        self.documents
            .lock()
            .unwrap()
            .get(&document.id)
            .map(|(_, source)| source.clone())
            .ok_or_else(|| KimaiError::not_found("Document", &document.id))
    }

    async fn save(&self, filename: &str, content: &[u8]) -> Result<InvoiceDocument> {
        let (id, _) = filename.rsplit_once('.').unwrap();
        let document = InvoiceDocument {
            id: id.to_string(),
            name: filename.to_string(),
            built_in: false,
            path: PathBuf::from(filename),
        };
        let source = String::from_utf8_lossy(content).to_string();
        self.documents.lock().unwrap().insert(id.to_string(), (document.clone(), source));
        Ok(document)
    }

    async fn delete(&self, document: &InvoiceDocument) -> Result<()> {
        self.documents.lock().unwrap().remove(&document.id);
        Ok(())
    }

    async fn archive(&self, filename: &str, content: &[u8]) -> Result<PathBuf> {
        self.archive.lock().unwrap().insert(filename.to_string(), content.to_vec());
        Ok(PathBuf::from(filename))
    }

    async fn remove_archived(&self, filename: &str) -> Result<()> {
        self.archive.lock().unwrap().remove(filename);
        Ok(())
    }
}

/// Renders `NUMBER;TOTAL;ITEMS` for `.txt` documents.
pub struct SummaryRenderer;

impl InvoiceRenderer for SummaryRenderer {
    fn id(&self) -> &'static str {
        "summary"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["txt"]
    }

    fn render(
        &self,
        _document: &InvoiceDocument,
        _source: &str,
        model: &InvoiceModel,
    ) -> Result<RenderedInvoice> {
        let content = format!("{};{:.2};{}", model.invoice_number, model.total, model.items.len());
        Ok(RenderedInvoice {
            content: content.into_bytes(),
            extension: "txt".into(),
            content_type: "text/plain".into(),
        })
    }
}

pub struct StaticMarketplace(pub Result<Vec<MarketplacePlugin>>);

#[async_trait]
impl Marketplace for StaticMarketplace {
    async fn fetch_plugins(&self) -> Result<Vec<MarketplacePlugin>> {
        self.0.clone()
    }
}

/* -------------------------------------------------------------------------- */
/* Fixtures */
/* -------------------------------------------------------------------------- */

/// Wednesday, 2024-03-13 12:00 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap()
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(now()))
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

pub struct Fixture {
    pub memory: Memory,
    pub repos: Repositories,
    pub user: User,
    pub teamlead: User,
    pub admin: User,
    pub customer: Customer,
    pub project: Project,
    pub activity: Activity,
}

impl Fixture {
    pub async fn new() -> Self {
        let memory = Memory::default();
        let repos = memory.repositories();

        let user = repos.users.create(make_user("john_user", Role::User)).await.unwrap();
        let teamlead = repos.users.create(make_user("tony_teamlead", Role::Teamlead)).await.unwrap();
        let admin = repos.users.create(make_user("susan_super", Role::SuperAdmin)).await.unwrap();

        let mut customer = Customer::new("Acme");
        customer.hourly_rate = Some(100.0);
        let customer = repos.customers.create(customer).await.unwrap();
        let project = repos.projects.create(Project::new(customer.id, "Website")).await.unwrap();
        let activity = repos.activities.create(Activity::new(None, "Development")).await.unwrap();

        Self { memory, repos, user, teamlead, admin, customer, project, activity }
    }

    /// A stopped record for `user_id` on the fixture project.
    pub fn record(&self, user_id: i64, begin: DateTime<Utc>, seconds: i64) -> Timesheet {
        let mut ts = Timesheet::new(user_id, self.project.id, self.activity.id, begin, "UTC");
        ts.stop_at(begin + chrono::Duration::seconds(seconds));
        ts.rate = seconds as f64 / 3600.0 * 100.0;
        ts
    }
}

pub fn make_user(username: &str, role: Role) -> User {
    let mut user = User::new(username, format!("{username}@example.com"));
    user.roles = vec![role];
    user
}
