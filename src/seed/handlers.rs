use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{error, info, instrument};

use crate::{
    seed::{
        dto::{ErrorResponse, MessageResponse, GENERIC_FAILURE, SEEDED_MESSAGE, SKIPPED_MESSAGE},
        runner::SeedRunner,
    },
    state::AppState,
};

pub fn seed_routes() -> Router<AppState> {
    Router::new().route("/seed", get(seed))
}

#[instrument(skip(state))]
pub async fn seed(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    if state.config.is_placeholder() {
        info!("placeholder database url; skipping seed");
        return Ok(Json(MessageResponse {
            message: SKIPPED_MESSAGE.into(),
        }));
    }

    match SeedRunner::new(state.store.as_ref()).run(&state.fixtures).await {
        Ok(report) => {
            info!(rows = report.total(), "database seeded");
            Ok(Json(MessageResponse {
                message: SEEDED_MESSAGE.into(),
            }))
        }
        Err(e) => {
            error!(error = %e, table = ?e.table(), "database seeding failed");
            let error = if state.config.expose_seed_errors {
                e.to_string()
            } else {
                GENERIC_FAILURE.into()
            };
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error })))
        }
    }
}
