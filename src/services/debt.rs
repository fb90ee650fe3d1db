//! Debt mutation workflows.
//!
//! Three entry points share one policy: interactive bulk clearing picks
//! synchronous or queued execution from the batch size, while the two
//! recurring jobs adjust every supplier with per-row atomic SQL arithmetic
//! so overlapping runs cannot lose updates.

use crate::{
    db::DbPool,
    entities::supplier,
    errors::ServiceError,
    jobs::{ClearDebtJob, CLEAR_DEBT_TOPIC},
    message_queue::{Message, MessageQueue},
};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};

/// Batches strictly larger than this are cleared on the job queue.
pub const ASYNC_CLEAR_THRESHOLD: usize = 20;

/// Scheduled increase samples from [5.00, 500.00], in cents.
const INCREASE_MIN_CENTS: i64 = 500;
const INCREASE_MAX_CENTS: i64 = 50_000;

/// Scheduled decrease samples from [100.00, 10000.00], in cents.
const DECREASE_MIN_CENTS: i64 = 10_000;
const DECREASE_MAX_CENTS: i64 = 1_000_000;

/// How a bulk debt-clear request is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sync,
    Async,
}

impl ExecutionMode {
    /// Pure threshold strategy, independent of the execution path.
    pub fn for_batch_size(batch_size: usize) -> Self {
        if batch_size > ASYNC_CLEAR_THRESHOLD {
            ExecutionMode::Async
        } else {
            ExecutionMode::Sync
        }
    }
}

/// Outcome reported back to the operator for a bulk clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearDebtOutcome {
    /// Debt was reset synchronously for `updated` suppliers.
    Cleared { updated: u64 },
    /// A background job was enqueued for `suppliers` ids; nothing has been
    /// mutated yet.
    Enqueued { suppliers: usize },
}

/// Service applying bulk and scheduled debt mutations.
#[derive(Clone)]
pub struct DebtService {
    db: Arc<DbPool>,
    queue: Arc<dyn MessageQueue>,
}

impl DebtService {
    pub fn new(db: Arc<DbPool>, queue: Arc<dyn MessageQueue>) -> Self {
        Self { db, queue }
    }

    /// Clears debt for a set of suppliers, choosing sync or async execution
    /// from the batch size.
    #[instrument(skip(self, supplier_ids))]
    pub async fn clear_debt(
        &self,
        supplier_ids: &[i64],
    ) -> Result<ClearDebtOutcome, ServiceError> {
        // Set semantics: duplicates in the request collapse to one id.
        let ids: Vec<i64> = supplier_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        match ExecutionMode::for_batch_size(ids.len()) {
            ExecutionMode::Sync => {
                let updated = self.clear_debt_now(&ids).await?;
                info!(updated, "debt cleared synchronously");
                Ok(ClearDebtOutcome::Cleared { updated })
            }
            ExecutionMode::Async => {
                let job = ClearDebtJob {
                    supplier_ids: ids.clone(),
                };
                let message = Message::job(CLEAR_DEBT_TOPIC, &job)
                    .map_err(|e| ServiceError::QueueError(e.to_string()))?;
                self.queue
                    .publish(message)
                    .await
                    .map_err(|e| ServiceError::QueueError(e.to_string()))?;
                info!(suppliers = ids.len(), "debt clearing enqueued");
                Ok(ClearDebtOutcome::Enqueued {
                    suppliers: ids.len(),
                })
            }
        }
    }

    /// Resets debt to zero for the given ids in one statement. Idempotent:
    /// re-running on already-zero rows succeeds with the same count.
    #[instrument(skip(self, supplier_ids))]
    pub async fn clear_debt_now(&self, supplier_ids: &[i64]) -> Result<u64, ServiceError> {
        if supplier_ids.is_empty() {
            return Ok(0);
        }

        let result = supplier::Entity::update_many()
            .col_expr(supplier::Column::Debt, Expr::value(Decimal::ZERO))
            .filter(supplier::Column::Id.is_in(supplier_ids.to_vec()))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Adds a uniformly sampled amount in [5.00, 500.00] to every supplier's
    /// debt, as an in-place increment per row. Returns the supplier count.
    #[instrument(skip(self))]
    pub async fn increase_all(&self) -> Result<u64, ServiceError> {
        let ids = self.all_supplier_ids().await?;

        for id in &ids {
            let amount = sample_amount(INCREASE_MIN_CENTS, INCREASE_MAX_CENTS);
            supplier::Entity::update_many()
                .col_expr(
                    supplier::Column::Debt,
                    Expr::col(supplier::Column::Debt).add(Expr::val(amount)),
                )
                .filter(supplier::Column::Id.eq(*id))
                .exec(&*self.db)
                .await?;
        }

        let count = ids.len() as u64;
        info!(suppliers = count, "debt increased for all suppliers");
        Ok(count)
    }

    /// Subtracts a uniformly sampled amount in [100.00, 10000.00] from every
    /// supplier's debt, clamped at zero inside the update statement itself.
    #[instrument(skip(self))]
    pub async fn decrease_all(&self) -> Result<u64, ServiceError> {
        let ids = self.all_supplier_ids().await?;

        for id in &ids {
            let amount = sample_amount(DECREASE_MIN_CENTS, DECREASE_MAX_CENTS);
            let clamped = Expr::case(
                Expr::col(supplier::Column::Debt).gte(Expr::val(amount)),
                Expr::col(supplier::Column::Debt).sub(Expr::val(amount)),
            )
            .finally(Expr::val(Decimal::ZERO));

            supplier::Entity::update_many()
                .col_expr(supplier::Column::Debt, clamped.into())
                .filter(supplier::Column::Id.eq(*id))
                .exec(&*self.db)
                .await?;
        }

        let count = ids.len() as u64;
        info!(suppliers = count, "debt decreased for all suppliers");
        Ok(count)
    }

    async fn all_supplier_ids(&self) -> Result<Vec<i64>, ServiceError> {
        let ids = supplier::Entity::find()
            .select_only()
            .column(supplier::Column::Id)
            .into_tuple::<i64>()
            .all(&*self.db)
            .await?;
        Ok(ids)
    }
}

/// Uniform amount in [min_cents, max_cents], carried as an exact
/// two-decimal value.
fn sample_amount(min_cents: i64, max_cents: i64) -> Decimal {
    let cents = rand::thread_rng().gen_range(min_cents..=max_cents);
    Decimal::new(cents, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn threshold_strategy_picks_sync_up_to_twenty() {
        assert_eq!(ExecutionMode::for_batch_size(0), ExecutionMode::Sync);
        assert_eq!(ExecutionMode::for_batch_size(1), ExecutionMode::Sync);
        assert_eq!(ExecutionMode::for_batch_size(20), ExecutionMode::Sync);
    }

    #[test]
    fn threshold_strategy_picks_async_above_twenty() {
        assert_eq!(ExecutionMode::for_batch_size(21), ExecutionMode::Async);
        assert_eq!(ExecutionMode::for_batch_size(500), ExecutionMode::Async);
    }

    #[test]
    fn sampled_amounts_have_two_decimals_and_stay_in_range() {
        for _ in 0..1000 {
            let amount = sample_amount(INCREASE_MIN_CENTS, INCREASE_MAX_CENTS);
            assert!(amount >= dec!(5.00), "amount {} below range", amount);
            assert!(amount <= dec!(500.00), "amount {} above range", amount);
            assert!(amount.scale() <= 2);
        }
        for _ in 0..1000 {
            let amount = sample_amount(DECREASE_MIN_CENTS, DECREASE_MAX_CENTS);
            assert!(amount >= dec!(100.00));
            assert!(amount <= dec!(10000.00));
        }
    }
}
