use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{accepted_response, success_response, validate_input},
    services::debt::ClearDebtOutcome,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ClearDebtRequest {
    #[validate(length(min = 1, message = "At least one supplier id is required"))]
    pub supplier_ids: Vec<i64>,
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/suppliers/clear-debt", post(clear_debt))
}

/// Resets debt for the selected suppliers. Small batches run inline; large
/// ones are handed to the background worker and acknowledged with 202.
async fn clear_debt(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<ClearDebtRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden(
            "administrator role required".to_string(),
        ));
    }
    validate_input(&payload)?;

    let outcome = state.services.debt.clear_debt(&payload.supplier_ids).await?;

    match outcome {
        ClearDebtOutcome::Cleared { updated } => Ok(success_response(json!({
            "status": "cleared",
            "updated": updated,
        }))
        .into_response()),
        ClearDebtOutcome::Enqueued { suppliers } => Ok(accepted_response(json!({
            "status": "accepted",
            "suppliers": suppliers,
            "message": "debt clearing runs in the background"
        }))
        .into_response()),
    }
}
