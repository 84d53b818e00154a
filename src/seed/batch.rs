use std::future::Future;

use futures::future::try_join_all;
use tracing::debug;

use crate::{error::SeedError, seed::types::Table};

/// Drives every insert of one dataset concurrently and waits for all of them.
///
/// Returns the total number of rows written. The first failure drops the
/// operations still in flight and fails the whole batch.
pub async fn run_all<I, F>(table: Table, ops: I) -> Result<u64, SeedError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<u64, SeedError>>,
{
    let ops: Vec<F> = ops.into_iter().collect();
    let dispatched = ops.len();
    let inserted: u64 = try_join_all(ops).await?.into_iter().sum();
    debug!(%table, dispatched, inserted, "batch joined");
    Ok(inserted)
}
