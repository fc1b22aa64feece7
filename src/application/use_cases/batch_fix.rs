use crate::application::use_cases::fixer::FixerUseCase;
use crate::domain::catalog_row::{CatalogRow, FixResult};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info};
use uuid::Uuid;

/// Runs the fixer over many rows with at most `concurrency` rows in flight.
pub struct BatchFixUseCase {
    fixer: Arc<FixerUseCase>,
    concurrency: usize,
}

impl BatchFixUseCase {
    pub fn new(fixer: Arc<FixerUseCase>, concurrency: usize) -> Self {
        Self {
            fixer,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// One result per input row, in input order. A row whose workflow fails
    /// comes back as [`FixResult::fallback`].
    pub async fn fix_rows(&self, rows: Vec<CatalogRow>) -> Vec<FixResult> {
        let batch_id = Uuid::new_v4();
        let started = Instant::now();
        let total = rows.len();
        info!(%batch_id, rows = total, concurrency = self.concurrency, "Batch started");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let tasks = rows.iter().enumerate().map(|(index, row)| {
            let semaphore = semaphore.clone();
            async move {
                // Never closed.
                let _permit = semaphore.acquire().await.ok();
                self.fix_or_fallback(row, Some((batch_id, index))).await
            }
        });
        let results = join_all(tasks).await;

        let changed = results
            .iter()
            .filter(|r| r.spec_changed || r.category_changed)
            .count();
        info!(
            %batch_id,
            rows = total,
            changed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch finished"
        );
        results
    }

    /// Single row with the same fallback as a batch.
    pub async fn fix_one(&self, row: &CatalogRow) -> FixResult {
        self.fix_or_fallback(row, None).await
    }

    async fn fix_or_fallback(&self, row: &CatalogRow, position: Option<(Uuid, usize)>) -> FixResult {
        match self.fixer.fix_row(row).await {
            Ok(result) => result,
            Err(err) => {
                match position {
                    Some((batch_id, index)) => {
                        error!(%batch_id, row = index, error = %err, "Row failed, returning input unchanged")
                    }
                    None => error!(error = %err, "Row failed, returning input unchanged"),
                }
                FixResult::fallback(row)
            }
        }
    }
}
