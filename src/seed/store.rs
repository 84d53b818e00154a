use async_trait::async_trait;

use crate::{
    error::SeedError,
    seed::types::{Customer, Invoice, Revenue, Table, UserRow},
};

/// Source of transactional sessions. Every seed run opens its own session.
#[async_trait]
pub trait SeedStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn SeedSession>, SeedError>;
}

/// One open transaction.
///
/// Statement methods take `&self` so a batch can have several of them in
/// flight at once; implementations serialize them on the underlying
/// connection. Inserts return the number of rows written, which is zero when
/// the key already exists.
#[async_trait]
pub trait SeedSession: Send + Sync {
    /// Creates `table` if it is absent. Never touches existing rows.
    async fn ensure_schema(&self, table: Table) -> Result<(), SeedError>;

    async fn insert_user(&self, user: &UserRow) -> Result<u64, SeedError>;

    async fn insert_customer(&self, customer: &Customer) -> Result<u64, SeedError>;

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<u64, SeedError>;

    async fn insert_revenue(&self, revenue: &Revenue) -> Result<u64, SeedError>;

    async fn commit(self: Box<Self>) -> Result<(), SeedError>;

    async fn rollback(self: Box<Self>) -> Result<(), SeedError>;
}
