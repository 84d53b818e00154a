use serde::{Deserialize, Serialize};

pub const SEEDED_MESSAGE: &str = "Database seeded successfully";
pub const SKIPPED_MESSAGE: &str = "Skipping database connection during build";
/// Error body used when raw errors are not exposed to clients.
pub const GENERIC_FAILURE: &str = "Database seeding failed";

/// Body returned when the seed ran (or was skipped).
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body returned when the seed failed and was rolled back.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
