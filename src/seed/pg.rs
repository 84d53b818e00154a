use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    error::SeedError,
    seed::{
        store::{SeedSession, SeedStore},
        types::{Customer, Invoice, Revenue, Table, UserRow},
    },
};

const CREATE_UUID_EXTENSION: &str = r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#;

fn create_table_sql(table: Table) -> &'static str {
    match table {
        Table::Users => {
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
            )
            "#
        }
        Table::Customers => {
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                image_url VARCHAR(255) NOT NULL
            )
            "#
        }
        Table::Invoices => {
            r#"
            CREATE TABLE IF NOT EXISTS invoices (
                id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
                customer_id UUID NOT NULL,
                amount INT NOT NULL,
                status VARCHAR(255) NOT NULL,
                date DATE NOT NULL
            )
            "#
        }
        Table::Revenue => {
            r#"
            CREATE TABLE IF NOT EXISTS revenue (
                month VARCHAR(4) NOT NULL UNIQUE,
                revenue INT NOT NULL
            )
            "#
        }
    }
}

/// PostgreSQL-backed store. Sessions are transactions checked out of the pool.
#[derive(Clone)]
pub struct PgSeedStore {
    pool: PgPool,
}

impl PgSeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeedStore for PgSeedStore {
    async fn begin(&self) -> Result<Box<dyn SeedSession>, SeedError> {
        let tx = self.pool.begin().await.map_err(SeedError::Transaction)?;
        debug!("seed transaction opened");
        Ok(Box::new(PgSeedSession {
            tx: Mutex::new(Some(tx)),
        }))
    }
}

/// The transaction sits behind an async mutex so concurrent inserts take turns on
/// the connection. Dropping the session without committing rolls back and returns
/// the connection to the pool.
pub struct PgSeedSession {
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

fn connection<'a>(
    slot: &'a mut Option<Transaction<'static, Postgres>>,
) -> Result<&'a mut PgConnection, SeedError> {
    slot.as_deref_mut()
        .ok_or(SeedError::Transaction(sqlx::Error::PoolClosed))
}

impl PgSeedSession {
    async fn take(&self) -> Result<Transaction<'static, Postgres>, SeedError> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or(SeedError::Transaction(sqlx::Error::PoolClosed))
    }
}

#[async_trait]
impl SeedSession for PgSeedSession {
    async fn ensure_schema(&self, table: Table) -> Result<(), SeedError> {
        let mut slot = self.tx.lock().await;
        let conn = connection(&mut slot)?;

        if table.uses_generated_ids() {
            sqlx::query(CREATE_UUID_EXTENSION)
                .execute(&mut *conn)
                .await
                .map_err(|e| SeedError::schema(table, e))?;
        }
        sqlx::query(create_table_sql(table))
            .execute(&mut *conn)
            .await
            .map_err(|e| SeedError::schema(table, e))?;

        debug!(%table, "table ensured");
        Ok(())
    }

    async fn insert_user(&self, user: &UserRow) -> Result<u64, SeedError> {
        let mut slot = self.tx.lock().await;
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .execute(connection(&mut slot)?)
        .await
        .map_err(|e| SeedError::insert(Table::Users, e))?;
        Ok(result.rows_affected())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<u64, SeedError> {
        let mut slot = self.tx.lock().await;
        let result = sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, image_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.image_url)
        .execute(connection(&mut slot)?)
        .await
        .map_err(|e| SeedError::insert(Table::Customers, e))?;
        Ok(result.rows_affected())
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<u64, SeedError> {
        let mut slot = self.tx.lock().await;
        // id comes from the column default, so the conflict clause never fires.
        let result = sqlx::query(
            r#"
            INSERT INTO invoices (customer_id, amount, status, date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(invoice.customer_id)
        .bind(invoice.amount)
        .bind(&invoice.status)
        .bind(invoice.date)
        .execute(connection(&mut slot)?)
        .await
        .map_err(|e| SeedError::insert(Table::Invoices, e))?;
        Ok(result.rows_affected())
    }

    async fn insert_revenue(&self, revenue: &Revenue) -> Result<u64, SeedError> {
        let mut slot = self.tx.lock().await;
        let result = sqlx::query(
            r#"
            INSERT INTO revenue (month, revenue)
            VALUES ($1, $2)
            ON CONFLICT (month) DO NOTHING
            "#,
        )
        .bind(&revenue.month)
        .bind(revenue.revenue)
        .execute(connection(&mut slot)?)
        .await
        .map_err(|e| SeedError::insert(Table::Revenue, e))?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), SeedError> {
        let tx = self.take().await?;
        tx.commit().await.map_err(SeedError::Transaction)?;
        debug!("seed transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), SeedError> {
        let tx = self.take().await?;
        tx.rollback().await.map_err(SeedError::Transaction)?;
        debug!("seed transaction rolled back");
        Ok(())
    }
}
