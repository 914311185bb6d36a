//! SQLite-backed invoice archive.

use std::sync::Arc;

use async_trait::async_trait;
use kimai_core::InvoiceRepository;
use kimai_domain::query::InvoiceArchiveQuery;
use kimai_domain::{Invoice, InvoiceStatus, KimaiError, Page, Result};
use rusqlite::{Row, ToSql};
use tokio::task;

use super::manager::DbManager;
use super::rows::{
    from_optional_timestamp, from_timestamp, map_join_error, map_storage_error, parse_column,
    placeholders, to_timestamp, SqlParams,
};

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_id, user_id, template_id, created_at, \
     total, tax, vat, currency, status, due_days, payment_date, filename";

const INSERT_INVOICE_SQL: &str = "INSERT INTO invoices (
        invoice_number, customer_id, user_id, template_id, created_at, total, tax, vat,
        currency, status, due_days, payment_date, filename
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

const UPDATE_INVOICE_SQL: &str = "UPDATE invoices SET
        invoice_number = ?1, customer_id = ?2, user_id = ?3, template_id = ?4,
        created_at = ?5, total = ?6, tax = ?7, vat = ?8, currency = ?9, status = ?10,
        due_days = ?11, payment_date = ?12, filename = ?13
    WHERE id = ?14";

pub struct SqliteInvoiceRepository {
    db: Arc<DbManager>,
}

impl SqliteInvoiceRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InvoiceRepository for SqliteInvoiceRepository {
    async fn find(&self, id: i64) -> Result<Option<Invoice>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Option<Invoice>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");
            conn.query_optional(&sql, &[&id], map_invoice_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, query: &InvoiceArchiveQuery) -> Result<Page<Invoice>> {
        let db = Arc::clone(&self.db);
        let query = query.clone();
        task::spawn_blocking(move || -> Result<Page<Invoice>> {
            let conn = db.get_connection()?;
            let (filter, params) = build_archive_filter(&query);

            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM invoices{filter}"),
                    &params.as_refs(),
                    |row| row.get(0),
                )
                .map_err(map_storage_error)?;

            let sql = format!(
                "SELECT {INVOICE_COLUMNS} FROM invoices{filter}
                 ORDER BY created_at DESC, id DESC LIMIT {} OFFSET {}",
                query.page_size,
                query.offset()
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            let items =
                stmt.query_map(&params.as_refs(), map_invoice_row).map_err(map_storage_error)?;

            Ok(Page::new(items, query.page, query.page_size, u64::try_from(total).unwrap_or(0)))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, invoice: Invoice) -> Result<Invoice> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Invoice> {
            let conn = db.get_connection()?;
            let mut invoice = invoice;
            let created_at = to_timestamp(invoice.created_at);
            let status = invoice.status.as_str();
            let payment_date = invoice.payment_date.map(to_timestamp);
            let params: [&dyn ToSql; 13] = [
                &invoice.invoice_number,
                &invoice.customer_id,
                &invoice.user_id,
                &invoice.template_id,
                &created_at,
                &invoice.total,
                &invoice.tax,
                &invoice.vat,
                &invoice.currency,
                &status,
                &invoice.due_days,
                &payment_date,
                &invoice.filename,
            ];
            conn.execute(INSERT_INVOICE_SQL, &params).map_err(map_storage_error)?;
            invoice.id = conn.last_insert_rowid();
            Ok(invoice)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, invoice: &Invoice) -> Result<()> {
        let db = Arc::clone(&self.db);
        let invoice = invoice.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let created_at = to_timestamp(invoice.created_at);
            let status = invoice.status.as_str();
            let payment_date = invoice.payment_date.map(to_timestamp);
            let params: [&dyn ToSql; 14] = [
                &invoice.invoice_number,
                &invoice.customer_id,
                &invoice.user_id,
                &invoice.template_id,
                &created_at,
                &invoice.total,
                &invoice.tax,
                &invoice.vat,
                &invoice.currency,
                &status,
                &invoice.due_days,
                &payment_date,
                &invoice.filename,
                &invoice.id,
            ];
            let changed = conn.execute(UPDATE_INVOICE_SQL, &params).map_err(map_storage_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("Invoice", invoice.id));
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
                .execute("DELETE FROM invoices WHERE id = ?1", &[&id])
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("Invoice", id));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn number_exists(&self, number: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let number = number.to_string();
        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM invoices WHERE invoice_number = ?1",
                    &[&number],
                    |row| row.get(0),
                )
                .map_err(map_storage_error)?;
            Ok(count > 0)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn build_archive_filter(query: &InvoiceArchiveQuery) -> (String, SqlParams) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params = SqlParams::default();

    if !query.customers.is_empty() {
        clauses.push(format!("customer_id IN ({})", placeholders(query.customers.len())));
        params.extend_ids(&query.customers);
    }
    if !query.status.is_empty() {
        clauses.push(format!("status IN ({})", placeholders(query.status.len())));
        for status in &query.status {
            params.push(status.as_str().to_string());
        }
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

fn map_invoice_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    let status: String = row.get(10)?;
    Ok(Invoice {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        customer_id: row.get(2)?,
        user_id: row.get(3)?,
        template_id: row.get(4)?,
        created_at: from_timestamp(5, row.get(5)?)?,
        total: row.get(6)?,
        tax: row.get(7)?,
        vat: row.get(8)?,
        currency: row.get(9)?,
        status: parse_column::<InvoiceStatus>(10, &status)?,
        due_days: row.get(11)?,
        payment_date: from_optional_timestamp(12, row.get(12)?)?,
        filename: row.get(13)?,
    })
}
