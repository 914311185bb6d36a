//! Converts timesheet begin/end values stored as wall-clock time into UTC.
//!
//! Each stored value is read as local time in the record's own timezone and
//! rewritten as the matching UTC instant.

use std::io::Write;
use std::sync::Arc;

use chrono_tz::Tz;
use kimai_domain::utils::date::local_to_utc;
use kimai_domain::Result;
use rusqlite::params;
use tokio::task;
use tracing::{info, warn};

use crate::database::rows::{
    from_optional_timestamp, from_timestamp, map_join_error, map_sql_error, map_storage_error,
    to_timestamp, SqlParams,
};
use crate::database::DbManager;

/// Progress line break interval
const PROGRESS_WIDTH: usize = 80;

pub struct TimezoneConverter {
    db: Arc<DbManager>,
}

fn range_filter(first_id: Option<i64>, last_id: Option<i64>) -> (String, SqlParams) {
    let mut clauses = Vec::new();
    let mut params = SqlParams::default();
    if let Some(first) = first_id {
        clauses.push("id >= ?");
        params.push(first);
    }
    if let Some(last) = last_id {
        clauses.push("id <= ?");
        params.push(last);
    }
    let filter =
        if clauses.is_empty() { String::new() } else { format!(" WHERE {}", clauses.join(" AND ")) };
    (filter, params)
}

impl TimezoneConverter {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Number of records in the id range, both ends inclusive.
    pub async fn count(&self, first_id: Option<i64>, last_id: Option<i64>) -> Result<u64> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<u64> {
            let conn = db.get_connection()?;
            let (filter, params) = range_filter(first_id, last_id);
            let sql = format!("SELECT COUNT(*) FROM timesheets{filter}");
            conn.query_row(&sql, &params.as_refs(), |row| row.get::<_, i64>(0))
                .map(|count| count.max(0) as u64)
                .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Convert every record in the id range and return how many were written.
    ///
    /// `progress` receives one `.` per record and ` (i/amount)` plus a line
    /// break every 80 records.
    pub async fn convert<W>(
        &self,
        first_id: Option<i64>,
        last_id: Option<i64>,
        mut progress: W,
    ) -> Result<usize>
    where
        W: Write + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db.get_connection()?;
            let (filter, params) = range_filter(first_id, last_id);
            let sql = format!(
                "SELECT id, start_time, end_time, timezone FROM timesheets{filter} ORDER BY id"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            let rows = stmt
                .query_map(&params.as_refs(), |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        from_timestamp(1, row.get(1)?)?,
                        from_optional_timestamp(2, row.get(2)?)?,
                        row.get::<_, String>(3)?,
                    ))
                })
                .map_err(map_storage_error)?;
            drop(stmt);

            let amount = rows.len();
            let tx = conn.transaction().map_err(map_sql_error)?;
            for (index, (id, begin, end, timezone)) in rows.into_iter().enumerate() {
                let tz: Tz = timezone.parse().unwrap_or_else(|_| {
                    warn!(id, timezone = %timezone, "unknown timezone, using UTC");
                    Tz::UTC
                });
                let begin = local_to_utc(begin.naive_utc(), tz);
                let end = end.map(|end| local_to_utc(end.naive_utc(), tz));
                let duration = end.map(|end| (end - begin).num_seconds().max(0));

                tx.execute(
                    "UPDATE timesheets SET start_time = ?1, end_time = ?2, duration = ?3 WHERE id = ?4",
                    params![to_timestamp(begin), end.map(to_timestamp), duration, id],
                )
                .map_err(map_sql_error)?;

                let done = index + 1;
                let step = if done % PROGRESS_WIDTH == 0 {
                    format!(". ({done}/{amount})\n")
                } else {
                    ".".to_string()
                };
                let _ = progress.write_all(step.as_bytes());
            }
            tx.commit().map_err(map_sql_error)?;
            let _ = writeln!(progress);
            let _ = progress.flush();

            info!(records = amount, "timesheet timezones converted");
            Ok(amount)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn seed(db: &DbManager, count: i64) {
        let conn = db.get_connection().unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, username, email, enabled, roles, timezone, language, created_at)
                 VALUES (1, 'susan', 's@example.com', 1, 'ROLE_USER', 'Europe/Berlin', 'en', 0);
             INSERT INTO customers (id, name, visible, currency) VALUES (1, 'ACME', 1, 'EUR');
             INSERT INTO projects (id, customer_id, name, visible) VALUES (1, 1, 'Web', 1);
             INSERT INTO activities (id, project_id, name, visible) VALUES (1, NULL, 'Dev', 1);",
        )
        .unwrap();
        let local_nine = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap().timestamp();
        for id in 1..=count {
            conn.execute(
                "INSERT INTO timesheets (id, user_id, project_id, activity_id, start_time, end_time, timezone, duration)
                 VALUES (?1, 1, 1, 1, ?2, ?3, 'Europe/Berlin', 3600)",
                &[&id as &dyn rusqlite::ToSql, &local_nine, &(local_nine + 3600)],
            )
            .unwrap();
        }
    }

    fn database(dir: &TempDir) -> Arc<DbManager> {
        let db = DbManager::new(dir.path().join("kimai.sqlite"), 2).unwrap();
        db.run_migrations().unwrap();
        Arc::new(db)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn converts_wall_clock_values_in_range() {
        let dir = TempDir::new().unwrap();
        let db = database(&dir);
        seed(&db, 3);
        let converter = TimezoneConverter::new(Arc::clone(&db));

        assert_eq!(converter.count(Some(2), None).await.unwrap(), 2);

        let output = Captured::default();
        let converted = converter.convert(Some(2), Some(3), output.clone()).await.unwrap();
        assert_eq!(converted, 2);
        assert_eq!(String::from_utf8(output.0.lock().unwrap().clone()).unwrap(), "..\n");

        let conn = db.get_connection().unwrap();
        let starts: Vec<i64> = conn
            .prepare("SELECT start_time FROM timesheets ORDER BY id")
            .unwrap()
            .query_map(&[], |row| row.get(0))
            .unwrap();
        let utc_eight = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap().timestamp();
        assert_eq!(starts[0], utc_eight + 3600);
        assert_eq!(starts[1], utc_eight);
        assert_eq!(starts[2], utc_eight);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn progress_breaks_every_eighty_records() {
        let dir = TempDir::new().unwrap();
        let db = database(&dir);
        seed(&db, 81);

        let output = Captured::default();
        TimezoneConverter::new(db).convert(None, None, output.clone()).await.unwrap();

        let text = String::from_utf8(output.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, format!("{}. (80/81)\n.\n", ".".repeat(79)));
    }
}
