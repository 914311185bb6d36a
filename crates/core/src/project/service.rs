//! Project service - customers, projects and activities

use std::sync::Arc;

use kimai_domain::query::{ProjectQuery, Visibility};
use kimai_domain::utils::duration;
use kimai_domain::{
    Activity, Customer, KimaiError, Page, Permission, Project, ProjectInput, ProjectStatistic,
    Result, User,
};
use tracing::{info, warn};

use super::ports::{ActivityRepository, CustomerRepository, ProjectRepository};
use crate::access::require;
use crate::timesheet::TimesheetRepository;

pub struct ProjectService {
    customers: Arc<dyn CustomerRepository>,
    projects: Arc<dyn ProjectRepository>,
    activities: Arc<dyn ActivityRepository>,
    timesheets: Arc<dyn TimesheetRepository>,
}

impl ProjectService {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        projects: Arc<dyn ProjectRepository>,
        activities: Arc<dyn ActivityRepository>,
        timesheets: Arc<dyn TimesheetRepository>,
    ) -> Self {
        Self { customers, projects, activities, timesheets }
    }

    pub async fn list(&self, actor: &User, query: &ProjectQuery) -> Result<Page<Project>> {
        require(actor, Permission::ViewProject)?;
        self.projects.list(query).await
    }

    pub async fn get(&self, actor: &User, id: i64) -> Result<Project> {
        require(actor, Permission::ViewProject)?;
        self.load(id).await
    }

    pub async fn create(&self, actor: &User, input: ProjectInput) -> Result<Project> {
        require(actor, Permission::CreateProject)?;
        let customer_id =
            input.customer.ok_or_else(|| KimaiError::InvalidInput("Missing customer".into()))?;
        let name = input
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| KimaiError::InvalidInput("Missing project name".into()))?;
        self.load_customer(customer_id).await?;

        let mut project = Project::new(customer_id, name);
        input.apply_to(&mut project);
        check_period(&project)?;

        let project = self.projects.create(project).await?;
        info!(project_id = project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub async fn update(&self, actor: &User, id: i64, input: ProjectInput) -> Result<Project> {
        require(actor, Permission::EditProject)?;
        let mut project = self.load(id).await?;
        if let Some(customer_id) = input.customer {
            self.load_customer(customer_id).await?;
        }
        input.apply_to(&mut project);
        if project.name.trim().is_empty() {
            return Err(KimaiError::InvalidInput("Missing project name".into()));
        }
        check_period(&project)?;
        self.projects.update(&project).await?;
        Ok(project)
    }

    /// Delete a project. Projects with records need `force`, which deletes
    /// their timesheets too.
    pub async fn delete(&self, actor: &User, id: i64, force: bool) -> Result<()> {
        require(actor, Permission::DeleteProject)?;
        self.load(id).await?;

        let stats = self.timesheets.project_statistic(id).await?;
        if stats.record_count > 0 {
            if !force {
                return Err(KimaiError::Conflict(format!(
                    "Project has {} timesheet records with a total duration of {}",
                    stats.record_count,
                    duration::format(Some(stats.duration), false).unwrap_or_default()
                )));
            }
            let removed = self.timesheets.delete_by_project(id).await?;
            warn!(project_id = id, removed, "deleted timesheets together with project");
        }

        self.projects.delete(id).await?;
        info!(project_id = id, "project deleted");
        Ok(())
    }

    pub async fn statistics(&self, actor: &User, id: i64) -> Result<ProjectStatistic> {
        require(actor, Permission::ViewProject)?;
        self.load(id).await?;
        self.timesheets.project_statistic(id).await
    }

    /* ---------------------------------------------------------------------- */

    pub async fn customers(&self, actor: &User, visibility: Visibility) -> Result<Vec<Customer>> {
        require(actor, Permission::ViewProject)?;
        self.customers.list(visibility).await
    }

    pub async fn create_customer(&self, actor: &User, customer: Customer) -> Result<Customer> {
        require(actor, Permission::CreateProject)?;
        if customer.name.trim().is_empty() {
            return Err(KimaiError::InvalidInput("Missing customer name".into()));
        }
        self.customers.create(customer).await
    }

    /// Activities usable for `project_id` (global ones included).
    pub async fn activities(&self, project_id: Option<i64>) -> Result<Vec<Activity>> {
        self.activities.list(project_id).await
    }

    pub async fn create_activity(&self, actor: &User, activity: Activity) -> Result<Activity> {
        require(actor, Permission::CreateProject)?;
        if activity.name.trim().is_empty() {
            return Err(KimaiError::InvalidInput("Missing activity name".into()));
        }
        if let Some(project_id) = activity.project_id {
            self.load(project_id).await?;
        }
        self.activities.create(activity).await
    }

    async fn load(&self, id: i64) -> Result<Project> {
        self.projects.find(id).await?.ok_or_else(|| KimaiError::not_found("Project", id))
    }

    async fn load_customer(&self, id: i64) -> Result<Customer> {
        self.customers.find(id).await?.ok_or_else(|| KimaiError::not_found("Customer", id))
    }
}

fn check_period(project: &Project) -> Result<()> {
    if let (Some(start), Some(end)) = (project.start, project.end) {
        if end < start {
            return Err(KimaiError::InvalidInput(
                "The project end must not be before its start".into(),
            ));
        }
    }
    Ok(())
}
