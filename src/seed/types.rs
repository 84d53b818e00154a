use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

/// Tables owned by the seed, in the order they are seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Users,
    Customers,
    Invoices,
    Revenue,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Users, Table::Customers, Table::Invoices, Table::Revenue];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Customers => "customers",
            Table::Invoices => "invoices",
            Table::Revenue => "revenue",
        }
    }

    /// Whether the table defaults its id to `uuid_generate_v4()`.
    pub fn uses_generated_ids(self) -> bool {
        !matches!(self, Table::Revenue)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixture user. The password is plaintext until the runner hashes it.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Row as written to `users`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String, // argon2 PHC string
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// Fixture invoice. The id is assigned by the database on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub customer_id: Uuid,
    pub amount: i32, // cents
    pub status: String,
    pub date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Revenue {
    pub month: String,
    pub revenue: i32,
}

/// Rows actually inserted by one seed run, per table. Conflicting rows count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users: u64,
    pub customers: u64,
    pub invoices: u64,
    pub revenue: u64,
}

impl SeedReport {
    pub fn total(&self) -> u64 {
        self.users + self.customers + self.invoices + self.revenue
    }
}
