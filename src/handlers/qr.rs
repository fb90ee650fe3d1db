use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::{
    auth::AuthUser,
    errors::{ApiError, ServiceError},
    handlers::common::{accepted_response, validate_input},
    jobs::{SendQrCardJob, QR_CARD_TOPIC},
    message_queue::Message,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQrRequest {
    pub supplier_id: i64,
    #[validate(email(message = "Recipient must be a valid email address"))]
    pub email: String,
}

/// Queues QR contact card generation and delivery. The request is accepted
/// without checking that the supplier exists; failures surface in the
/// worker's logs, never to the caller.
pub async fn generate_qr(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<GenerateQrRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let job = SendQrCardJob {
        supplier_id: payload.supplier_id,
        email: payload.email,
    };
    let message = Message::job(QR_CARD_TOPIC, &job)
        .map_err(|e| ServiceError::QueueError(e.to_string()))?;
    state
        .queue
        .publish(message)
        .await
        .map_err(|e| ServiceError::QueueError(e.to_string()))?;

    info!(
        supplier_id = job.supplier_id,
        requested_by = user.user_id,
        "QR contact card delivery queued"
    );

    Ok(accepted_response(json!({
        "status": "accepted",
        "message": "QR code generation and delivery started"
    })))
}
