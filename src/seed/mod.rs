use crate::state::AppState;
use axum::Router;

mod batch;
pub mod dto;
pub mod fixtures;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod pg;
pub mod runner;
pub mod store;
pub mod types;

pub use fixtures::Fixtures;
pub use runner::SeedRunner;
pub use store::{SeedSession, SeedStore};
pub use types::{SeedReport, Table};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::seed_routes())
}
