//! SQLite-backed timesheet repository.
//!
//! Instants are stored as unix seconds in `start_time`/`end_time`. Tags live
//! in the `timesheet_tags` join table and meta fields as a JSON object.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kimai_common::storage::SqliteConnection;
use kimai_core::TimesheetRepository;
use kimai_domain::query::{
    BillableFilter, ExportFilter, TimesheetOrderBy, TimesheetQuery, TimesheetState, UserFilter,
};
use kimai_domain::{InvoiceQuery, KimaiError, Page, ProjectStatistic, Result, Timesheet};
use rusqlite::{params, Row, Transaction};
use tokio::task;
use tracing::debug;

use super::manager::DbManager;
use super::rows::{
    bool_to_int, from_optional_timestamp, from_timestamp, int_to_bool, map_join_error,
    map_sql_error, map_storage_error, placeholders, to_timestamp, SqlParams,
};

const TIMESHEET_COLUMNS: &str = "t.id, t.user_id, t.project_id, t.activity_id, t.start_time, \
     t.end_time, t.timezone, t.duration, t.description, t.rate, t.internal_rate, t.hourly_rate, \
     t.fixed_rate, t.billable, t.exported, t.meta, t.created_at, t.modified_at";

const INSERT_TIMESHEET_SQL: &str = "INSERT INTO timesheets (
        user_id, project_id, activity_id, start_time, end_time, timezone, duration,
        description, rate, internal_rate, hourly_rate, fixed_rate, billable, exported,
        meta, created_at, modified_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)";

const UPDATE_TIMESHEET_SQL: &str = "UPDATE timesheets SET
        user_id = ?1, project_id = ?2, activity_id = ?3, start_time = ?4, end_time = ?5,
        timezone = ?6, duration = ?7, description = ?8, rate = ?9, internal_rate = ?10,
        hourly_rate = ?11, fixed_rate = ?12, billable = ?13, exported = ?14, meta = ?15,
        modified_at = ?16
    WHERE id = ?17";

const PROJECT_STATISTIC_SQL: &str = "SELECT
        COUNT(*),
        COALESCE(SUM(duration), 0),
        COALESCE(SUM(rate), 0),
        COALESCE(SUM(COALESCE(internal_rate, 0)), 0),
        MIN(start_time),
        MAX(COALESCE(end_time, start_time))
    FROM timesheets WHERE project_id = ?1";

pub struct SqliteTimesheetRepository {
    db: Arc<DbManager>,
}

impl SqliteTimesheetRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Run a `SELECT` built from [`TIMESHEET_COLUMNS`] and attach tags.
    async fn select(&self, tail: String, params: SqlParams) -> Result<Vec<Timesheet>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Timesheet>> {
            let conn = db.get_connection()?;
            select_timesheets(&conn, &tail, &params)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl TimesheetRepository for SqliteTimesheetRepository {
    async fn find(&self, id: i64) -> Result<Option<Timesheet>> {
        let mut params = SqlParams::default();
        params.push(id);
        let mut found = self.select("WHERE t.id = ?".into(), params).await?;
        Ok(found.pop())
    }

    async fn list(&self, query: &TimesheetQuery) -> Result<Page<Timesheet>> {
        let db = Arc::clone(&self.db);
        let query = query.clone();
        task::spawn_blocking(move || -> Result<Page<Timesheet>> {
            let conn = db.get_connection()?;
            let (filter, params) = build_timesheet_filter(&query)?;

            let count_sql = format!("SELECT COUNT(*) FROM timesheets t {filter}");
            let total: i64 = conn
                .query_row(&count_sql, &params.as_refs(), |row| row.get(0))
                .map_err(map_storage_error)?;

            let tail = format!(
                "{filter} ORDER BY {} {}, t.id {} LIMIT {} OFFSET {}",
                order_column(query.order_by),
                query.order.as_sql(),
                query.order.as_sql(),
                i64::from(query.page_size),
                query.offset()
            );
            let items = select_timesheets(&conn, &tail, &params)?;
            debug!(total, returned = items.len(), "timesheet list query");

            Ok(Page::new(items, query.page, query.page_size, u64::try_from(total).unwrap_or(0)))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, timesheet: Timesheet) -> Result<Timesheet> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Timesheet> {
            let mut conn = db.get_connection()?;
            let mut timesheet = timesheet;
            let now = Utc::now();
            timesheet.created_at.get_or_insert(now);
            timesheet.modified_at.get_or_insert(now);

            let tx = conn.transaction().map_err(map_sql_error)?;
            let meta = encode_meta(&timesheet.meta)?;
            tx.execute(
                INSERT_TIMESHEET_SQL,
                params![
                    timesheet.user_id,
                    timesheet.project_id,
                    timesheet.activity_id,
                    to_timestamp(timesheet.begin),
                    timesheet.end.map(to_timestamp),
                    timesheet.timezone,
                    timesheet.duration,
                    timesheet.description,
                    timesheet.rate,
                    timesheet.internal_rate,
                    timesheet.hourly_rate,
                    timesheet.fixed_rate,
                    bool_to_int(timesheet.billable),
                    bool_to_int(timesheet.exported),
                    meta,
                    timesheet.created_at.map(to_timestamp),
                    timesheet.modified_at.map(to_timestamp),
                ],
            )
            .map_err(map_sql_error)?;
            let id = tx.last_insert_rowid();
            replace_tags(&tx, id, &timesheet.tags)?;
            tx.commit().map_err(map_sql_error)?;

            timesheet.id = Some(id);
            Ok(timesheet)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, timesheet: &Timesheet) -> Result<()> {
        let id = timesheet
            .id
            .ok_or_else(|| KimaiError::InvalidInput("Cannot update an unsaved timesheet".into()))?;
        let db = Arc::clone(&self.db);
        let timesheet = timesheet.clone();
        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db.get_connection()?;
            let modified_at = timesheet.modified_at.unwrap_or_else(Utc::now);
            let meta = encode_meta(&timesheet.meta)?;

            let tx = conn.transaction().map_err(map_sql_error)?;
            let changed = tx
                .execute(
                    UPDATE_TIMESHEET_SQL,
                    params![
                        timesheet.user_id,
                        timesheet.project_id,
                        timesheet.activity_id,
                        to_timestamp(timesheet.begin),
                        timesheet.end.map(to_timestamp),
                        timesheet.timezone,
                        timesheet.duration,
                        timesheet.description,
                        timesheet.rate,
                        timesheet.internal_rate,
                        timesheet.hourly_rate,
                        timesheet.fixed_rate,
                        bool_to_int(timesheet.billable),
                        bool_to_int(timesheet.exported),
                        meta,
                        to_timestamp(modified_at),
                        id,
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("Timesheet", id));
            }
            replace_tags(&tx, id, &timesheet.tags)?;
            tx.commit().map_err(map_sql_error)?;
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
                .execute("DELETE FROM timesheets WHERE id = ?1", &[&id])
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("Timesheet", id));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn active(&self, user_id: i64) -> Result<Vec<Timesheet>> {
        let mut params = SqlParams::default();
        params.push(user_id);
        self.select(
            "WHERE t.user_id = ? AND t.end_time IS NULL ORDER BY t.start_time DESC, t.id DESC"
                .into(),
            params,
        )
        .await
    }

    async fn recent(
        &self,
        user_id: i64,
        begin: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<Timesheet>> {
        let mut params = SqlParams::default();
        params.push(user_id);
        let begin_clause = match begin {
            Some(begin) => {
                params.push(to_timestamp(begin));
                " AND start_time >= ?"
            }
            None => "",
        };
        let tail = format!(
            "WHERE t.id IN (
                SELECT MAX(id) FROM timesheets
                WHERE user_id = ?{begin_clause}
                GROUP BY project_id, activity_id
            )
            ORDER BY t.start_time DESC, t.id DESC LIMIT {limit}"
        );
        self.select(tail, params).await
    }

    async fn find_in_range(
        &self,
        user_id: i64,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Timesheet>> {
        let mut params = SqlParams::default();
        params.push(user_id);
        params.push(to_timestamp(begin));
        params.push(to_timestamp(end));
        self.select(
            "WHERE t.user_id = ? AND t.start_time BETWEEN ? AND ? ORDER BY t.start_time, t.id"
                .into(),
            params,
        )
        .await
    }

    async fn find_finished(
        &self,
        user_ids: &[i64],
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Timesheet>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = SqlParams::default();
        params.extend_ids(user_ids);
        params.push(to_timestamp(begin));
        params.push(to_timestamp(end));
        let tail = format!(
            "WHERE t.user_id IN ({}) AND t.end_time IS NOT NULL AND t.start_time BETWEEN ? AND ?
             ORDER BY t.start_time, t.id",
            placeholders(user_ids.len())
        );
        self.select(tail, params).await
    }

    async fn find_finished_for_projects(
        &self,
        project_ids: &[i64],
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Timesheet>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = SqlParams::default();
        params.extend_ids(project_ids);
        params.push(to_timestamp(begin));
        params.push(to_timestamp(end));
        let tail = format!(
            "WHERE t.project_id IN ({}) AND t.end_time IS NOT NULL AND t.start_time BETWEEN ? AND ?
             ORDER BY t.start_time, t.id",
            placeholders(project_ids.len())
        );
        self.select(tail, params).await
    }

    async fn find_for_invoice(&self, query: &InvoiceQuery) -> Result<Vec<Timesheet>> {
        let (filter, params) = build_invoice_filter(query);
        self.select(format!("{filter} ORDER BY t.start_time, t.id"), params).await
    }

    async fn set_exported(&self, ids: &[i64], exported: bool) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let db = Arc::clone(&self.db);
        let ids = ids.to_vec();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let mut params = SqlParams::default();
            params.push(bool_to_int(exported));
            params.extend_ids(&ids);
            let sql = format!(
                "UPDATE timesheets SET exported = ? WHERE id IN ({})",
                placeholders(ids.len())
            );
            conn.execute(&sql, &params.as_refs()).map_err(map_storage_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn first_record(&self, user_id: i64) -> Result<Option<DateTime<Utc>>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Option<DateTime<Utc>>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT MIN(start_time) FROM timesheets WHERE user_id = ?1",
                &[&user_id],
                |row| from_optional_timestamp(0, row.get(0)?),
            )
            .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn project_statistic(&self, project_id: i64) -> Result<ProjectStatistic> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<ProjectStatistic> {
            let conn = db.get_connection()?;
            conn.query_row(PROJECT_STATISTIC_SQL, &[&project_id], |row| {
                Ok(ProjectStatistic {
                    record_count: row.get(0)?,
                    duration: row.get(1)?,
                    rate: row.get(2)?,
                    internal_rate: row.get(3)?,
                    first_record: from_optional_timestamp(4, row.get(4)?)?,
                    last_record: from_optional_timestamp(5, row.get(5)?)?,
                })
            })
            .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete_by_project(&self, project_id: i64) -> Result<u64> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<u64> {
            let conn = db.get_connection()?;
            let deleted = conn
                .execute("DELETE FROM timesheets WHERE project_id = ?1", &[&project_id])
                .map_err(map_storage_error)?;
            Ok(deleted as u64)
        })
        .await
        .map_err(map_join_error)?
    }
}

/* -------------------------------------------------------------------------- */
/* Query building */
/* -------------------------------------------------------------------------- */

fn order_column(order_by: TimesheetOrderBy) -> &'static str {
    match order_by {
        TimesheetOrderBy::Id => "t.id",
        TimesheetOrderBy::Begin => "t.start_time",
        TimesheetOrderBy::End => "t.end_time",
        TimesheetOrderBy::Rate => "t.rate",
    }
}

fn where_clause(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}

fn build_timesheet_filter(query: &TimesheetQuery) -> Result<(String, SqlParams)> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params = SqlParams::default();

    match query.user {
        UserFilter::Id(user_id) => {
            clauses.push("t.user_id = ?".into());
            params.push(user_id);
        }
        UserFilter::All => {}
        UserFilter::Current => {
            return Err(KimaiError::Internal("timesheet query user was not resolved".into()));
        }
    }

    if !query.customers.is_empty() {
        clauses.push(format!(
            "t.project_id IN (SELECT id FROM projects WHERE customer_id IN ({}))",
            placeholders(query.customers.len())
        ));
        params.extend_ids(&query.customers);
    }
    if !query.projects.is_empty() {
        clauses.push(format!("t.project_id IN ({})", placeholders(query.projects.len())));
        params.extend_ids(&query.projects);
    }
    if !query.activities.is_empty() {
        clauses.push(format!("t.activity_id IN ({})", placeholders(query.activities.len())));
        params.extend_ids(&query.activities);
    }
    if !query.tags.is_empty() {
        clauses.push(format!(
            "t.id IN (SELECT tt.timesheet_id FROM timesheet_tags tt
                      JOIN tags g ON g.id = tt.tag_id WHERE g.name IN ({}))",
            placeholders(query.tags.len())
        ));
        for tag in &query.tags {
            params.push(tag.clone());
        }
    }
    if let Some(begin) = query.begin {
        clauses.push("t.start_time >= ?".into());
        params.push(to_timestamp(begin));
    }
    if let Some(end) = query.end {
        clauses.push("t.start_time <= ?".into());
        params.push(to_timestamp(end));
    }

    match query.state {
        TimesheetState::All => {}
        TimesheetState::Running => clauses.push("t.end_time IS NULL".into()),
        TimesheetState::Stopped => clauses.push("t.end_time IS NOT NULL".into()),
    }
    match query.billable {
        BillableFilter::All => {}
        BillableFilter::Yes => clauses.push("t.billable = 1".into()),
        BillableFilter::No => clauses.push("t.billable = 0".into()),
    }
    match query.exported {
        ExportFilter::All => {}
        ExportFilter::Exported => clauses.push("t.exported = 1".into()),
        ExportFilter::NotExported => clauses.push("t.exported = 0".into()),
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        clauses.push("(t.description LIKE ? OR t.meta LIKE ?)".into());
        let pattern = format!("%{}%", search.trim());
        params.push(pattern.clone());
        params.push(pattern);
    }
    if let Some(modified_after) = query.modified_after {
        clauses.push("t.modified_at >= ?".into());
        params.push(to_timestamp(modified_after));
    }

    Ok((where_clause(&clauses), params))
}

fn build_invoice_filter(query: &InvoiceQuery) -> (String, SqlParams) {
    let mut clauses: Vec<String> =
        vec!["t.billable = 1".into(), "t.exported = 0".into(), "t.end_time IS NOT NULL".into()];
    let mut params = SqlParams::default();

    if let Some(customer) = query.customer {
        clauses.push("t.project_id IN (SELECT id FROM projects WHERE customer_id = ?)".into());
        params.push(customer);
    }
    if !query.projects.is_empty() {
        clauses.push(format!("t.project_id IN ({})", placeholders(query.projects.len())));
        params.extend_ids(&query.projects);
    }
    if !query.activities.is_empty() {
        clauses.push(format!("t.activity_id IN ({})", placeholders(query.activities.len())));
        params.extend_ids(&query.activities);
    }
    if !query.users.is_empty() {
        clauses.push(format!("t.user_id IN ({})", placeholders(query.users.len())));
        params.extend_ids(&query.users);
    }
    if let Some(begin) = query.begin {
        clauses.push("t.start_time >= ?".into());
        params.push(to_timestamp(begin));
    }
    if let Some(end) = query.end {
        clauses.push("t.start_time <= ?".into());
        params.push(to_timestamp(end));
    }

    (where_clause(&clauses), params)
}

/* -------------------------------------------------------------------------- */
/* Row mapping and tags */
/* -------------------------------------------------------------------------- */

fn select_timesheets(
    conn: &SqliteConnection,
    tail: &str,
    params: &SqlParams,
) -> Result<Vec<Timesheet>> {
    let sql = format!("SELECT {TIMESHEET_COLUMNS} FROM timesheets t {tail}");
    let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
    let mut timesheets =
        stmt.query_map(&params.as_refs(), map_timesheet_row).map_err(map_storage_error)?;
    drop(stmt);
    attach_tags(conn, &mut timesheets)?;
    Ok(timesheets)
}

fn attach_tags(conn: &SqliteConnection, timesheets: &mut [Timesheet]) -> Result<()> {
    let ids: Vec<i64> = timesheets.iter().filter_map(|t| t.id).collect();
    if ids.is_empty() {
        return Ok(());
    }

    let mut params = SqlParams::default();
    params.extend_ids(&ids);
    let sql = format!(
        "SELECT tt.timesheet_id, g.name FROM timesheet_tags tt
         JOIN tags g ON g.id = tt.tag_id
         WHERE tt.timesheet_id IN ({}) ORDER BY g.name",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
    let rows: Vec<(i64, String)> = stmt
        .query_map(&params.as_refs(), |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(map_storage_error)?;

    let mut by_timesheet: HashMap<i64, Vec<String>> = HashMap::new();
    for (timesheet_id, name) in rows {
        by_timesheet.entry(timesheet_id).or_default().push(name);
    }
    for timesheet in timesheets.iter_mut() {
        if let Some(tags) = timesheet.id.and_then(|id| by_timesheet.remove(&id)) {
            timesheet.tags = tags;
        }
    }
    Ok(())
}

fn replace_tags(tx: &Transaction<'_>, timesheet_id: i64, tags: &[String]) -> Result<()> {
    tx.execute("DELETE FROM timesheet_tags WHERE timesheet_id = ?1", params![timesheet_id])
        .map_err(map_sql_error)?;
    for name in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![name])
            .map_err(map_sql_error)?;
        tx.execute(
            "INSERT OR IGNORE INTO timesheet_tags (timesheet_id, tag_id)
             SELECT ?1, id FROM tags WHERE name = ?2",
            params![timesheet_id, name],
        )
        .map_err(map_sql_error)?;
    }
    Ok(())
}

fn encode_meta(meta: &BTreeMap<String, String>) -> Result<String> {
    serde_json::to_string(meta)
        .map_err(|err| KimaiError::Internal(format!("failed to encode meta fields: {err}")))
}

fn map_timesheet_row(row: &Row<'_>) -> rusqlite::Result<Timesheet> {
    let meta_json: String = row.get(15)?;
    let meta: BTreeMap<String, String> = serde_json::from_str(&meta_json).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(15, rusqlite::types::Type::Text, Box::new(err))
    })?;

    Ok(Timesheet {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        activity_id: row.get(3)?,
        begin: from_timestamp(4, row.get(4)?)?,
        end: from_optional_timestamp(5, row.get(5)?)?,
        timezone: row.get(6)?,
        duration: row.get(7)?,
        description: row.get(8)?,
        rate: row.get(9)?,
        internal_rate: row.get(10)?,
        hourly_rate: row.get(11)?,
        fixed_rate: row.get(12)?,
        billable: int_to_bool(row.get(13)?),
        exported: int_to_bool(row.get(14)?),
        tags: Vec::new(),
        meta,
        created_at: from_optional_timestamp(16, row.get(16)?)?,
        modified_at: from_optional_timestamp(17, row.get(17)?)?,
    })
}
