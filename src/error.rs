use thiserror::Error;
use tokio::task::JoinError;

use crate::{password::PasswordError, seed::types::Table};

/// Everything that can abort a seed run. Each variant rolls the transaction back.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("ensuring table `{table}` failed: {source}")]
    Schema {
        table: Table,
        #[source]
        source: sqlx::Error,
    },

    #[error("inserting into `{table}` failed: {source}")]
    Insert {
        table: Table,
        #[source]
        source: sqlx::Error,
    },

    #[error("password hashing failed: {0}")]
    Hash(#[from] PasswordError),

    #[error("transaction error: {0}")]
    Transaction(#[source] sqlx::Error),

    #[error("hashing task did not complete: {0}")]
    Task(#[from] JoinError),
}

impl SeedError {
    pub fn schema(table: Table, source: sqlx::Error) -> Self {
        Self::Schema { table, source }
    }

    pub fn insert(table: Table, source: sqlx::Error) -> Self {
        Self::Insert { table, source }
    }

    /// Table the failure happened on, when there is one.
    pub fn table(&self) -> Option<Table> {
        match self {
            Self::Schema { table, .. } | Self::Insert { table, .. } => Some(*table),
            Self::Hash(_) => Some(Table::Users),
            Self::Transaction(_) | Self::Task(_) => None,
        }
    }
}
