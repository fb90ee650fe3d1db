//! Background job definitions and the worker loop draining them.
//!
//! Jobs run at-most-once: a failure is logged and the message is nacked
//! without requeueing, matching the best-effort contract of the admin bulk
//! actions that enqueue them.

use crate::{
    message_queue::MessageQueue,
    services::{debt::DebtService, qr_card::QrCardService},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

pub const CLEAR_DEBT_TOPIC: &str = "debt.clear";
pub const QR_CARD_TOPIC: &str = "qr.contact_card";

/// Reset debt to zero for a set of suppliers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearDebtJob {
    pub supplier_ids: Vec<i64>,
}

/// Render a supplier's contact card as a QR PNG and mail it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendQrCardJob {
    pub supplier_id: i64,
    pub email: String,
}

/// Spawns the worker task draining both job topics.
pub fn start_worker(
    queue: Arc<dyn MessageQueue>,
    debt: Arc<DebtService>,
    qr_cards: Arc<QrCardService>,
) {
    tokio::spawn(async move {
        info!("background job worker started");
        loop {
            let drained = match drain_once(&queue, &debt, &qr_cards).await {
                Ok(drained) => drained,
                Err(e) => {
                    error!("job worker error: {}", e);
                    false
                }
            };
            if !drained {
                sleep(Duration::from_millis(500)).await;
            }
        }
    });
}

/// Processes at most one message per topic. Returns whether any work was
/// found, so the caller can back off when idle.
pub async fn drain_once(
    queue: &Arc<dyn MessageQueue>,
    debt: &DebtService,
    qr_cards: &QrCardService,
) -> Result<bool, crate::message_queue::MessageQueueError> {
    let mut drained = false;

    if let Some(message) = queue.subscribe(CLEAR_DEBT_TOPIC).await? {
        drained = true;
        match message.decode::<ClearDebtJob>() {
            Ok(job) => match debt.clear_debt_now(&job.supplier_ids).await {
                Ok(updated) => {
                    info!(updated, "async debt clear finished");
                    queue.ack(&message.id).await?;
                }
                Err(e) => {
                    error!("async debt clear failed: {}", e);
                    queue.nack(&message.id).await?;
                }
            },
            Err(e) => {
                error!("undecodable {} message {}: {}", CLEAR_DEBT_TOPIC, message.id, e);
                queue.nack(&message.id).await?;
            }
        }
    }

    if let Some(message) = queue.subscribe(QR_CARD_TOPIC).await? {
        drained = true;
        match message.decode::<SendQrCardJob>() {
            Ok(job) => match qr_cards.generate_and_send(job.supplier_id, &job.email).await {
                Ok(delivery) => {
                    info!(
                        supplier_id = delivery.supplier_id,
                        recipient = %delivery.recipient,
                        "QR contact card job finished"
                    );
                    queue.ack(&message.id).await?;
                }
                // Fire-and-forget: the enqueuing caller already got its 202,
                // so failures surface in the logs only.
                Err(e) => {
                    warn!("QR contact card job failed: {}", e);
                    queue.nack(&message.id).await?;
                }
            },
            Err(e) => {
                error!("undecodable {} message {}: {}", QR_CARD_TOPIC, message.id, e);
                queue.nack(&message.id).await?;
            }
        }
    }

    Ok(drained)
}
