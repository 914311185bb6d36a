//! SQLite-backed project repository.

use std::sync::Arc;

use async_trait::async_trait;
use kimai_core::ProjectRepository;
use kimai_domain::query::{ProjectQuery, Visibility};
use kimai_domain::{BudgetType, KimaiError, Page, Project, Result};
use rusqlite::{Row, ToSql};
use tokio::task;

use super::manager::DbManager;
use super::rows::{
    bool_to_int, from_optional_timestamp, int_to_bool, map_join_error, map_storage_error,
    parse_column, placeholders, SqlParams,
};

const PROJECT_COLUMNS: &str = "p.id, p.customer_id, p.name, p.order_number, p.comment, \
     p.visible, p.hourly_rate, p.fixed_rate, p.budget, p.time_budget, p.budget_type, \
     p.start_date, p.end_date";

const INSERT_PROJECT_SQL: &str = "INSERT INTO projects (
        customer_id, name, order_number, comment, visible, hourly_rate, fixed_rate,
        budget, time_budget, budget_type, start_date, end_date
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const UPDATE_PROJECT_SQL: &str = "UPDATE projects SET
        customer_id = ?1, name = ?2, order_number = ?3, comment = ?4, visible = ?5,
        hourly_rate = ?6, fixed_rate = ?7, budget = ?8, time_budget = ?9, budget_type = ?10,
        start_date = ?11, end_date = ?12
    WHERE id = ?13";

pub struct SqliteProjectRepository {
    db: Arc<DbManager>,
}

impl SqliteProjectRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn find(&self, id: i64) -> Result<Option<Project>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Option<Project>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?1");
            conn.query_optional(&sql, &[&id], map_project_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, query: &ProjectQuery) -> Result<Page<Project>> {
        let db = Arc::clone(&self.db);
        let query = query.clone();
        task::spawn_blocking(move || -> Result<Page<Project>> {
            let conn = db.get_connection()?;
            let (filter, params) = build_project_filter(&query);

            let count_sql = format!(
                "SELECT COUNT(*) FROM projects p JOIN customers c ON c.id = p.customer_id{filter}"
            );
            let total: i64 = conn
                .query_row(&count_sql, &params.as_refs(), |row| row.get(0))
                .map_err(map_storage_error)?;

            let list_sql = format!(
                "SELECT {PROJECT_COLUMNS} FROM projects p JOIN customers c ON c.id = p.customer_id\
                 {filter} ORDER BY p.name, p.id LIMIT {} OFFSET {}",
                query.page_size,
                query.offset()
            );
            let mut stmt = conn.prepare(&list_sql).map_err(map_storage_error)?;
            let items =
                stmt.query_map(&params.as_refs(), map_project_row).map_err(map_storage_error)?;

            Ok(Page::new(items, query.page, query.page_size, u64::try_from(total).unwrap_or(0)))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_all(&self, customer_id: Option<i64>) -> Result<Vec<Project>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Project>> {
            let conn = db.get_connection()?;
            match customer_id {
                Some(customer_id) => {
                    let sql = format!(
                        "SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.customer_id = ?1 ORDER BY p.name"
                    );
                    let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
                    stmt.query_map(&[&customer_id], map_project_row).map_err(map_storage_error)
                }
                None => {
                    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p ORDER BY p.name");
                    let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
                    stmt.query_map(&[], map_project_row).map_err(map_storage_error)
                }
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, project: Project) -> Result<Project> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Project> {
            let conn = db.get_connection()?;
            let mut project = project;
            let visible = bool_to_int(project.visible);
            let budget_type = project.budget_type.map(|t| t.as_str());
            let start = project.start.map(|d| d.timestamp());
            let end = project.end.map(|d| d.timestamp());
            let params: [&dyn ToSql; 12] = [
                &project.customer_id,
                &project.name,
                &project.order_number,
                &project.comment,
                &visible,
                &project.hourly_rate,
                &project.fixed_rate,
                &project.budget,
                &project.time_budget,
                &budget_type,
                &start,
                &end,
            ];
            conn.execute(INSERT_PROJECT_SQL, &params).map_err(map_storage_error)?;
            project.id = conn.last_insert_rowid();
            Ok(project)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, project: &Project) -> Result<()> {
        let db = Arc::clone(&self.db);
        let project = project.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let visible = bool_to_int(project.visible);
            let budget_type = project.budget_type.map(|t| t.as_str());
            let start = project.start.map(|d| d.timestamp());
            let end = project.end.map(|d| d.timestamp());
            let params: [&dyn ToSql; 13] = [
                &project.customer_id,
                &project.name,
                &project.order_number,
                &project.comment,
                &visible,
                &project.hourly_rate,
                &project.fixed_rate,
                &project.budget,
                &project.time_budget,
                &budget_type,
                &start,
                &end,
                &project.id,
            ];
            let changed = conn.execute(UPDATE_PROJECT_SQL, &params).map_err(map_storage_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("Project", project.id));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute("DELETE FROM projects WHERE id = ?1", &[&id])
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("Project", id));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

/// `WHERE` clause (with leading space) and its parameters.
fn build_project_filter(query: &ProjectQuery) -> (String, SqlParams) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params = SqlParams::default();

    match query.visibility.visibility() {
        Visibility::Visible => clauses.push("p.visible = 1 AND c.visible = 1".into()),
        Visibility::Hidden => {
            if query.visibility.is_exclusive_visibility() {
                clauses.push("p.visible = 0 AND c.visible = 0".into());
            } else {
                clauses.push("(p.visible = 0 OR c.visible = 0)".into());
            }
        }
        Visibility::Both => {}
    }

    if !query.customers.is_empty() {
        clauses.push(format!("p.customer_id IN ({})", placeholders(query.customers.len())));
        params.extend_ids(&query.customers);
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        clauses.push("(p.name LIKE ? OR p.comment LIKE ? OR p.order_number LIKE ?)".into());
        let pattern = format!("%{search}%");
        for _ in 0..3 {
            params.push(pattern.clone());
        }
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

fn map_project_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let budget_type: Option<String> = row.get(10)?;
    Ok(Project {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        name: row.get(2)?,
        order_number: row.get(3)?,
        comment: row.get(4)?,
        visible: int_to_bool(row.get(5)?),
        hourly_rate: row.get(6)?,
        fixed_rate: row.get(7)?,
        budget: row.get(8)?,
        time_budget: row.get(9)?,
        budget_type: budget_type.map(|raw| parse_column::<BudgetType>(10, &raw)).transpose()?,
        start: from_optional_timestamp(11, row.get(11)?)?,
        end: from_optional_timestamp(12, row.get(12)?)?,
    })
}
