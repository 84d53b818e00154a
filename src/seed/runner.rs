use tracing::{error, info, instrument};

use crate::{
    error::SeedError,
    password::hash_password,
    seed::{
        batch,
        fixtures::Fixtures,
        store::{SeedSession, SeedStore},
        types::{SeedReport, Table, User, UserRow},
    },
};

/// Writes a fixture set into a store as one all-or-nothing transaction.
pub struct SeedRunner<'a> {
    store: &'a dyn SeedStore,
}

impl<'a> SeedRunner<'a> {
    pub fn new(store: &'a dyn SeedStore) -> Self {
        Self { store }
    }

    /// Seeds users, customers, invoices and revenue, in that order.
    ///
    /// Commits only if every statement succeeded. On the first failure the
    /// remaining work is abandoned, the transaction is rolled back and the
    /// triggering error is returned. Nothing is retried.
    #[instrument(skip_all)]
    pub async fn run(&self, fixtures: &Fixtures) -> Result<SeedReport, SeedError> {
        let session = self.store.begin().await?;

        match seed_all(session.as_ref(), fixtures).await {
            Ok(report) => {
                session.commit().await?;
                info!(
                    users = report.users,
                    customers = report.customers,
                    invoices = report.invoices,
                    revenue = report.revenue,
                    "seed committed"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback) = session.rollback().await {
                    error!(error = %rollback, "rollback after failed seed also failed");
                }
                Err(e)
            }
        }
    }
}

async fn seed_all(session: &dyn SeedSession, fixtures: &Fixtures) -> Result<SeedReport, SeedError> {
    Ok(SeedReport {
        users: seed_users(session, &fixtures.users).await?,
        customers: seed_customers(session, fixtures).await?,
        invoices: seed_invoices(session, fixtures).await?,
        revenue: seed_revenue(session, fixtures).await?,
    })
}

async fn hash_user(user: &User) -> Result<UserRow, SeedError> {
    let plain = user.password.clone();
    let password = tokio::task::spawn_blocking(move || hash_password(&plain)).await??;
    Ok(UserRow {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        password,
    })
}

async fn seed_users(session: &dyn SeedSession, users: &[User]) -> Result<u64, SeedError> {
    session.ensure_schema(Table::Users).await?;
    let inserted = batch::run_all(
        Table::Users,
        users.iter().map(|user| async move {
            let row = hash_user(user).await?;
            session.insert_user(&row).await
        }),
    )
    .await?;
    info!(inserted, total = users.len(), "seeded users");
    Ok(inserted)
}

async fn seed_customers(session: &dyn SeedSession, fixtures: &Fixtures) -> Result<u64, SeedError> {
    session.ensure_schema(Table::Customers).await?;
    let inserted = batch::run_all(
        Table::Customers,
        fixtures.customers.iter().map(|c| session.insert_customer(c)),
    )
    .await?;
    info!(inserted, total = fixtures.customers.len(), "seeded customers");
    Ok(inserted)
}

async fn seed_invoices(session: &dyn SeedSession, fixtures: &Fixtures) -> Result<u64, SeedError> {
    session.ensure_schema(Table::Invoices).await?;
    let inserted = batch::run_all(
        Table::Invoices,
        fixtures.invoices.iter().map(|i| session.insert_invoice(i)),
    )
    .await?;
    info!(inserted, total = fixtures.invoices.len(), "seeded invoices");
    Ok(inserted)
}

async fn seed_revenue(session: &dyn SeedSession, fixtures: &Fixtures) -> Result<u64, SeedError> {
    session.ensure_schema(Table::Revenue).await?;
    let inserted = batch::run_all(
        Table::Revenue,
        fixtures.revenue.iter().map(|r| session.insert_revenue(r)),
    )
    .await?;
    info!(inserted, total = fixtures.revenue.len(), "seeded revenue");
    Ok(inserted)
}
