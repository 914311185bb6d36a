//! SQLite-backed customer repository.

use std::sync::Arc;

use async_trait::async_trait;
use kimai_core::CustomerRepository;
use kimai_domain::query::Visibility;
use kimai_domain::{Customer, KimaiError, Result};
use rusqlite::{Row, ToSql};
use tokio::task;

use super::manager::DbManager;
use super::rows::{bool_to_int, int_to_bool, map_join_error, map_storage_error};

const CUSTOMER_COLUMNS: &str = "id, name, number, comment, visible, currency, country, timezone, \
     hourly_rate, fixed_rate, budget, time_budget, invoice_template_id";

const INSERT_CUSTOMER_SQL: &str = "INSERT INTO customers (
        name, number, comment, visible, currency, country, timezone,
        hourly_rate, fixed_rate, budget, time_budget, invoice_template_id
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const UPDATE_CUSTOMER_SQL: &str = "UPDATE customers SET
        name = ?1, number = ?2, comment = ?3, visible = ?4, currency = ?5, country = ?6,
        timezone = ?7, hourly_rate = ?8, fixed_rate = ?9, budget = ?10, time_budget = ?11,
        invoice_template_id = ?12
    WHERE id = ?13";

pub struct SqliteCustomerRepository {
    db: Arc<DbManager>,
}

impl SqliteCustomerRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepository {
    async fn find(&self, id: i64) -> Result<Option<Customer>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Option<Customer>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
            conn.query_optional(&sql, &[&id], map_customer_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Customer>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Customer>> {
            let conn = db.get_connection()?;
            let filter = match visibility {
                Visibility::Visible => " WHERE visible = 1",
                Visibility::Hidden => " WHERE visible = 0",
                Visibility::Both => "",
            };
            let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers{filter} ORDER BY name");
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(&[], map_customer_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, customer: Customer) -> Result<Customer> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Customer> {
            let conn = db.get_connection()?;
            let mut customer = customer;
            let visible = bool_to_int(customer.visible);
            let params: [&dyn ToSql; 12] = [
                &customer.name,
                &customer.number,
                &customer.comment,
                &visible,
                &customer.currency,
                &customer.country,
                &customer.timezone,
                &customer.hourly_rate,
                &customer.fixed_rate,
                &customer.budget,
                &customer.time_budget,
                &customer.invoice_template_id,
            ];
            conn.execute(INSERT_CUSTOMER_SQL, &params).map_err(map_storage_error)?;
            customer.id = conn.last_insert_rowid();
            Ok(customer)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, customer: &Customer) -> Result<()> {
        let db = Arc::clone(&self.db);
        let customer = customer.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let visible = bool_to_int(customer.visible);
            let params: [&dyn ToSql; 13] = [
                &customer.name,
                &customer.number,
                &customer.comment,
                &visible,
                &customer.currency,
                &customer.country,
                &customer.timezone,
                &customer.hourly_rate,
                &customer.fixed_rate,
                &customer.budget,
                &customer.time_budget,
                &customer.invoice_template_id,
                &customer.id,
            ];
            let changed = conn.execute(UPDATE_CUSTOMER_SQL, &params).map_err(map_storage_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("Customer", customer.id));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_customer_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        number: row.get(2)?,
        comment: row.get(3)?,
        visible: int_to_bool(row.get(4)?),
        currency: row.get(5)?,
        country: row.get(6)?,
        timezone: row.get(7)?,
        hourly_rate: row.get(8)?,
        fixed_rate: row.get(9)?,
        budget: row.get(10)?,
        time_budget: row.get(11)?,
        invoice_template_id: row.get(12)?,
    })
}
