//! SQLite-backed invoice template repository.

use std::sync::Arc;

use async_trait::async_trait;
use kimai_core::InvoiceTemplateRepository;
use kimai_domain::{InvoiceTemplate, KimaiError, Result};
use rusqlite::{Row, ToSql};
use tokio::task;

use super::manager::DbManager;
use super::rows::{map_join_error, map_storage_error};

const TEMPLATE_COLUMNS: &str = "id, name, title, company, vat_id, address, contact, \
     payment_terms, payment_details, due_days, vat, calculator, number_generator, renderer, language";

const INSERT_TEMPLATE_SQL: &str = "INSERT INTO invoice_templates (
        name, title, company, vat_id, address, contact, payment_terms, payment_details,
        due_days, vat, calculator, number_generator, renderer, language
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";

const UPDATE_TEMPLATE_SQL: &str = "UPDATE invoice_templates SET
        name = ?1, title = ?2, company = ?3, vat_id = ?4, address = ?5, contact = ?6,
        payment_terms = ?7, payment_details = ?8, due_days = ?9, vat = ?10, calculator = ?11,
        number_generator = ?12, renderer = ?13, language = ?14
    WHERE id = ?15";

pub struct SqliteInvoiceTemplateRepository {
    db: Arc<DbManager>,
}

impl SqliteInvoiceTemplateRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InvoiceTemplateRepository for SqliteInvoiceTemplateRepository {
    async fn find(&self, id: i64) -> Result<Option<InvoiceTemplate>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Option<InvoiceTemplate>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM invoice_templates WHERE id = ?1");
            conn.query_optional(&sql, &[&id], map_template_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<InvoiceTemplate>> {
        let db = Arc::clone(&self.db);
        let name = name.to_string();
        task::spawn_blocking(move || -> Result<Option<InvoiceTemplate>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM invoice_templates WHERE name = ?1");
            conn.query_optional(&sql, &[&name], map_template_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self) -> Result<Vec<InvoiceTemplate>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<InvoiceTemplate>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM invoice_templates ORDER BY name");
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(&[], map_template_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, template: InvoiceTemplate) -> Result<InvoiceTemplate> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<InvoiceTemplate> {
            let conn = db.get_connection()?;
            let mut template = template;
            let params: [&dyn ToSql; 14] = [
                &template.name,
                &template.title,
                &template.company,
                &template.vat_id,
                &template.address,
                &template.contact,
                &template.payment_terms,
                &template.payment_details,
                &template.due_days,
                &template.vat,
                &template.calculator,
                &template.number_generator,
                &template.renderer,
                &template.language,
            ];
            conn.execute(INSERT_TEMPLATE_SQL, &params).map_err(map_storage_error)?;
            template.id = conn.last_insert_rowid();
            Ok(template)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, template: &InvoiceTemplate) -> Result<()> {
        let db = Arc::clone(&self.db);
        let template = template.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let params: [&dyn ToSql; 15] = [
                &template.name,
                &template.title,
                &template.company,
                &template.vat_id,
                &template.address,
                &template.contact,
                &template.payment_terms,
                &template.payment_details,
                &template.due_days,
                &template.vat,
                &template.calculator,
                &template.number_generator,
                &template.renderer,
                &template.language,
                &template.id,
            ];
            let changed = conn.execute(UPDATE_TEMPLATE_SQL, &params).map_err(map_storage_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("Invoice template", template.id));
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
                .execute("DELETE FROM invoice_templates WHERE id = ?1", &[&id])
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("Invoice template", id));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn count_by_renderer(&self, renderer: &str) -> Result<u64> {
        let db = Arc::clone(&self.db);
        let renderer = renderer.to_string();
        task::spawn_blocking(move || -> Result<u64> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM invoice_templates WHERE renderer = ?1",
                    &[&renderer],
                    |row| row.get(0),
                )
                .map_err(map_storage_error)?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_template_row(row: &Row<'_>) -> rusqlite::Result<InvoiceTemplate> {
    Ok(InvoiceTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        title: row.get(2)?,
        company: row.get(3)?,
        vat_id: row.get(4)?,
        address: row.get(5)?,
        contact: row.get(6)?,
        payment_terms: row.get(7)?,
        payment_details: row.get(8)?,
        due_days: row.get(9)?,
        vat: row.get(10)?,
        calculator: row.get(11)?,
        number_generator: row.get(12)?,
        renderer: row.get(13)?,
        language: row.get(14)?,
    })
}
