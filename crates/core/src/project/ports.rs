//! Port interfaces for customers, projects and activities

use async_trait::async_trait;
use kimai_domain::query::{ProjectQuery, Visibility};
use kimai_domain::{Activity, Customer, Page, Project, Result};

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Customer>>;

    async fn list(&self, visibility: Visibility) -> Result<Vec<Customer>>;

    async fn create(&self, customer: Customer) -> Result<Customer>;

    async fn update(&self, customer: &Customer) -> Result<()>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Project>>;

    async fn list(&self, query: &ProjectQuery) -> Result<Page<Project>>;

    /// Every project, optionally limited to one customer
    async fn find_all(&self, customer_id: Option<i64>) -> Result<Vec<Project>>;

    async fn create(&self, project: Project) -> Result<Project>;

    async fn update(&self, project: &Project) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Activity>>;

    /// Activities of a project plus all global activities
    async fn list(&self, project_id: Option<i64>) -> Result<Vec<Activity>>;

    async fn create(&self, activity: Activity) -> Result<Activity>;
}
