//! In-process store with the same conflict rules as the PostgreSQL tables.
//!
//! A session reads a private copy of the committed data and logs its writes.
//! Commit replays the log over the data committed at that moment, so nothing a
//! failed run wrote is ever visible and overlapping runs do not overwrite each
//! other. Faults can be armed to fail a given statement, which is how tests
//! force rollbacks.

use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::SeedError,
    seed::{
        store::{SeedSession, SeedStore},
        types::{Customer, Invoice, Revenue, Table, UserRow},
    },
};

/// Committed contents of the store.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    tables: BTreeSet<Table>,
    pub users: BTreeMap<Uuid, UserRow>,
    pub customers: BTreeMap<Uuid, Customer>,
    pub invoices: BTreeMap<Uuid, Invoice>,
    pub revenue: BTreeMap<String, i32>,
}

/// One statement a session wrote. Replayed against the committed data on commit.
#[derive(Debug, Clone)]
enum Write {
    CreateTable(Table),
    User(UserRow),
    Customer(Customer),
    Invoice(Uuid, Invoice),
    Revenue(Revenue),
}

impl Snapshot {
    pub fn has_table(&self, table: Table) -> bool {
        self.tables.contains(&table)
    }

    pub fn row_count(&self, table: Table) -> usize {
        match table {
            Table::Users => self.users.len(),
            Table::Customers => self.customers.len(),
            Table::Invoices => self.invoices.len(),
            Table::Revenue => self.revenue.len(),
        }
    }

    fn require(&self, table: Table) -> Result<(), SeedError> {
        if self.has_table(table) {
            Ok(())
        } else {
            Err(SeedError::insert(
                table,
                sqlx::Error::Protocol(format!("relation \"{table}\" does not exist")),
            ))
        }
    }

    /// Applies a write with the table's key rules. Returns the rows written,
    /// zero when the key is already taken.
    fn apply(&mut self, write: &Write) -> Result<u64, SeedError> {
        match write {
            Write::CreateTable(table) => {
                self.tables.insert(*table);
                Ok(0)
            }
            Write::User(user) => {
                self.require(Table::Users)?;
                if self.users.contains_key(&user.id) {
                    return Ok(0);
                }
                if self.users.values().any(|u| u.email == user.email) {
                    return Err(SeedError::insert(
                        Table::Users,
                        sqlx::Error::Protocol(
                            "duplicate key value violates unique constraint \"users_email_key\""
                                .into(),
                        ),
                    ));
                }
                self.users.insert(user.id, user.clone());
                Ok(1)
            }
            Write::Customer(customer) => {
                self.require(Table::Customers)?;
                if self.customers.contains_key(&customer.id) {
                    return Ok(0);
                }
                self.customers.insert(customer.id, customer.clone());
                Ok(1)
            }
            Write::Invoice(id, invoice) => {
                self.require(Table::Invoices)?;
                if self.invoices.contains_key(id) {
                    return Ok(0);
                }
                self.invoices.insert(*id, invoice.clone());
                Ok(1)
            }
            Write::Revenue(revenue) => {
                self.require(Table::Revenue)?;
                if revenue.month.chars().count() > 4 {
                    return Err(SeedError::insert(
                        Table::Revenue,
                        sqlx::Error::Protocol("value too long for type character varying(4)".into()),
                    ));
                }
                if self.revenue.contains_key(&revenue.month) {
                    return Ok(0);
                }
                self.revenue.insert(revenue.month.clone(), revenue.revenue);
                Ok(1)
            }
        }
    }
}

/// A statement to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail creating the table.
    Schema(Table),
    /// Fail the `nth` insert (zero based) into the table within a session.
    Insert { table: Table, nth: usize },
    /// Fail opening the session.
    Begin,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    committed: Arc<Mutex<Snapshot>>,
    faults: Arc<Mutex<Vec<Fault>>>,
    commits: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a fault for every session opened from now on.
    pub async fn inject(&self, fault: Fault) {
        self.faults.lock().await.push(fault);
    }

    pub async fn clear_faults(&self) {
        self.faults.lock().await.clear();
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.committed.lock().await.clone()
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn SeedSession>, SeedError> {
        let faults = self.faults.lock().await.clone();
        if faults.contains(&Fault::Begin) {
            return Err(SeedError::Transaction(connection_reset()));
        }
        let view = self.committed.lock().await.clone();
        Ok(Box::new(MemorySession {
            store: self.clone(),
            state: Mutex::new(SessionState {
                view,
                writes: Vec::new(),
            }),
            faults,
            inserts: Mutex::new(BTreeMap::new()),
        }))
    }
}

/// What the session sees (committed data as of `begin` plus its own writes)
/// and the writes it will publish.
struct SessionState {
    view: Snapshot,
    writes: Vec<Write>,
}

pub struct MemorySession {
    store: MemoryStore,
    state: Mutex<SessionState>,
    faults: Vec<Fault>,
    inserts: Mutex<BTreeMap<Table, usize>>,
}

fn connection_reset() -> sqlx::Error {
    sqlx::Error::Io(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    ))
}

impl MemorySession {
    /// Counts the insert and fails it if a fault is armed for this position.
    async fn check_insert(&self, table: Table) -> Result<(), SeedError> {
        let mut inserts = self.inserts.lock().await;
        let seen = inserts.entry(table).or_insert(0);
        let nth = *seen;
        *seen += 1;
        if self.faults.contains(&Fault::Insert { table, nth }) {
            return Err(SeedError::insert(table, connection_reset()));
        }
        Ok(())
    }

    async fn write(&self, write: Write) -> Result<u64, SeedError> {
        let mut state = self.state.lock().await;
        let written = state.view.apply(&write)?;
        if written > 0 || matches!(write, Write::CreateTable(_)) {
            state.writes.push(write);
        }
        Ok(written)
    }
}

#[async_trait]
impl SeedSession for MemorySession {
    async fn ensure_schema(&self, table: Table) -> Result<(), SeedError> {
        if self.faults.contains(&Fault::Schema(table)) {
            return Err(SeedError::schema(
                table,
                sqlx::Error::Protocol("permission denied to create extension \"uuid-ossp\"".into()),
            ));
        }
        self.write(Write::CreateTable(table)).await?;
        Ok(())
    }

    async fn insert_user(&self, user: &UserRow) -> Result<u64, SeedError> {
        self.check_insert(Table::Users).await?;
        self.write(Write::User(user.clone())).await
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<u64, SeedError> {
        self.check_insert(Table::Customers).await?;
        self.write(Write::Customer(customer.clone())).await
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<u64, SeedError> {
        self.check_insert(Table::Invoices).await?;
        self.write(Write::Invoice(Uuid::new_v4(), invoice.clone()))
            .await
    }

    async fn insert_revenue(&self, revenue: &Revenue) -> Result<u64, SeedError> {
        self.check_insert(Table::Revenue).await?;
        self.write(Write::Revenue(revenue.clone())).await
    }

    /// Replays this session's writes over whatever is committed now, so rows
    /// committed by an overlapping session are kept. Keys taken in the meantime
    /// are skipped; a unique violation fails the commit and publishes nothing.
    async fn commit(self: Box<Self>) -> Result<(), SeedError> {
        let MemorySession { store, state, .. } = *self;
        let writes = state.into_inner().writes;

        let mut committed = store.committed.lock().await;
        let mut next = committed.clone();
        for write in &writes {
            next.apply(write)?;
        }
        *committed = next;
        store.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), SeedError> {
        self.store.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn revenue(month: &str) -> Revenue {
        Revenue {
            month: month.into(),
            revenue: 100,
        }
    }

    #[tokio::test]
    async fn insert_before_schema_fails() {
        let store = MemoryStore::new();
        let session = store.begin().await.unwrap();
        let err = session.insert_revenue(&revenue("Jan")).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn conflicting_key_is_a_noop() {
        let store = MemoryStore::new();
        let session = store.begin().await.unwrap();
        session.ensure_schema(Table::Revenue).await.unwrap();
        assert_eq!(session.insert_revenue(&revenue("Jan")).await.unwrap(), 1);
        assert_eq!(session.insert_revenue(&revenue("Jan")).await.unwrap(), 0);
        session.commit().await.unwrap();
        assert_eq!(store.snapshot().await.row_count(Table::Revenue), 1);
    }

    #[tokio::test]
    async fn duplicate_email_under_new_id_is_rejected() {
        let store = MemoryStore::new();
        let session = store.begin().await.unwrap();
        session.ensure_schema(Table::Users).await.unwrap();
        let user = UserRow {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@example.com".into(),
            password: "hash".into(),
        };
        session.insert_user(&user).await.unwrap();
        let clash = UserRow {
            id: Uuid::new_v4(),
            ..user
        };
        let err = session.insert_user(&clash).await.unwrap_err();
        assert!(err.to_string().contains("users_email_key"));
    }

    #[tokio::test]
    async fn uncommitted_work_is_invisible() {
        let store = MemoryStore::new();
        let session = store.begin().await.unwrap();
        session.ensure_schema(Table::Invoices).await.unwrap();
        session
            .insert_invoice(&Invoice {
                customer_id: Uuid::new_v4(),
                amount: 100,
                status: "paid".into(),
                date: date!(2023 - 01 - 01),
            })
            .await
            .unwrap();
        session.rollback().await.unwrap();

        let snapshot = store.snapshot().await;
        assert!(!snapshot.has_table(Table::Invoices));
        assert_eq!(snapshot.row_count(Table::Invoices), 0);
        assert_eq!(store.rollbacks(), 1);
        assert_eq!(store.commits(), 0);
    }

    #[tokio::test]
    async fn overlapping_commits_keep_both_sessions_rows() {
        let store = MemoryStore::new();
        let first = store.begin().await.unwrap();
        let second = store.begin().await.unwrap();
        for session in [&first, &second] {
            session.ensure_schema(Table::Revenue).await.unwrap();
            session.ensure_schema(Table::Invoices).await.unwrap();
            session.insert_revenue(&revenue("Jan")).await.unwrap();
            session
                .insert_invoice(&Invoice {
                    customer_id: Uuid::new_v4(),
                    amount: 100,
                    status: "paid".into(),
                    date: date!(2023 - 01 - 01),
                })
                .await
                .unwrap();
        }
        second.insert_revenue(&revenue("Feb")).await.unwrap();

        first.commit().await.unwrap();
        second.commit().await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.row_count(Table::Invoices), 2);
        assert_eq!(snapshot.row_count(Table::Revenue), 2);
        assert_eq!(store.commits(), 2);
    }

    #[tokio::test]
    async fn commit_fails_on_email_taken_by_overlapping_session() {
        let store = MemoryStore::new();
        let user = |id| UserRow {
            id,
            name: "A".into(),
            email: "a@example.com".into(),
            password: "hash".into(),
        };
        let first = store.begin().await.unwrap();
        let second = store.begin().await.unwrap();
        first.ensure_schema(Table::Users).await.unwrap();
        second.ensure_schema(Table::Users).await.unwrap();
        first.insert_user(&user(Uuid::new_v4())).await.unwrap();
        second.insert_user(&user(Uuid::new_v4())).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(err.to_string().contains("users_email_key"));
        assert_eq!(store.snapshot().await.row_count(Table::Users), 1);
        assert_eq!(store.commits(), 1);
    }

    #[tokio::test]
    async fn armed_insert_fault_fires_once_per_session() {
        let store = MemoryStore::new();
        store
            .inject(Fault::Insert {
                table: Table::Revenue,
                nth: 1,
            })
            .await;
        let session = store.begin().await.unwrap();
        session.ensure_schema(Table::Revenue).await.unwrap();
        session.insert_revenue(&revenue("Jan")).await.unwrap();
        let err = session.insert_revenue(&revenue("Feb")).await.unwrap_err();
        assert!(matches!(err, SeedError::Insert { table: Table::Revenue, .. }));
        session.insert_revenue(&revenue("Mar")).await.unwrap();
    }

    #[tokio::test]
    async fn begin_fault_fails_before_any_work() {
        let store = MemoryStore::new();
        store.inject(Fault::Begin).await;
        assert!(matches!(
            store.begin().await,
            Err(SeedError::Transaction(_))
        ));
        store.clear_faults().await;
        assert!(store.begin().await.is_ok());
    }
}
