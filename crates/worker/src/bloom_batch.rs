//! Recompute the cached `entire_trees.bloom_status` column.
//!
//! Photos are walked in id order with keyset paging. Each page is written in
//! its own transaction, so an interrupted run keeps the pages already done.

use std::fmt;

use hanami_core::bloom::BloomStateCalculator;
use hanami_core::types::DbId;
use hanami_db::models::photo::{BloomBatchRow, BloomStatusUpdate};
use hanami_db::repositories::PhotoRepo;
use hanami_db::DbPool;

pub const DEFAULT_BATCH_SIZE: i64 = 1000;

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub batch_size: i64,
    /// Compute and report without writing.
    pub dry_run: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
        }
    }
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl BatchStats {
    pub fn add(&mut self, other: BatchStats) {
        self.processed += other.processed;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

/// Progress line against `total` rows.
pub struct Progress {
    pub stats: BatchStats,
    pub total: i64,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percentage = if self.total > 0 {
            self.stats.processed as f64 / self.total as f64 * 100.0
        } else {
            0.0
        };
        write!(
            f,
            "progress: {}/{} ({percentage:.1}%) | updated: {} | skipped: {} | errors: {}",
            self.stats.processed, self.total, self.stats.updated, self.stats.skipped, self.stats.errors
        )
    }
}

/// Bloom statuses for one page of photos.
///
/// Rows the calculator cannot place are skipped. A photo without a date is
/// counted as an error.
pub fn compute_updates(
    calculator: &BloomStateCalculator,
    rows: &[BloomBatchRow],
) -> (Vec<BloomStatusUpdate>, BatchStats) {
    let mut updates = Vec::with_capacity(rows.len());
    let mut stats = BatchStats::default();

    for row in rows {
        stats.processed += 1;
        let Some(taken) = row.photo_date else {
            tracing::error!(entire_tree_id = row.id, "Photo has no photo_date");
            stats.errors += 1;
            continue;
        };
        match calculator.calculate(
            taken.date_naive(),
            row.latitude,
            row.longitude,
            row.prefecture_code.as_deref(),
        ) {
            Some(status) => {
                stats.updated += 1;
                updates.push(BloomStatusUpdate {
                    id: row.id,
                    bloom_status: status.key().to_string(),
                });
            }
            None => stats.skipped += 1,
        }
    }
    (updates, stats)
}

/// Walk every photo and write its bloom status.
///
/// A failed page write is logged and its rows are moved from `updated` to
/// `errors`; the run continues with the next page.
pub async fn run(
    pool: &DbPool,
    calculator: &BloomStateCalculator,
    options: BatchOptions,
) -> Result<BatchStats, sqlx::Error> {
    let total = PhotoRepo::count(pool).await?;
    tracing::info!(total, batch_size = options.batch_size, dry_run = options.dry_run, "Bloom status batch started");

    let mut totals = BatchStats::default();
    let mut after: DbId = 0;

    loop {
        let rows = PhotoRepo::list_batch_after(pool, after, options.batch_size).await?;
        let Some(last) = rows.last() else {
            break;
        };
        after = last.id;

        let (updates, mut stats) = compute_updates(calculator, &rows);
        if !options.dry_run {
            if let Err(e) = PhotoRepo::update_bloom_statuses(pool, &updates).await {
                tracing::error!(error = %e, after_id = after, rows = updates.len(), "Bloom status page failed");
                stats.errors += stats.updated;
                stats.updated = 0;
            }
        }
        totals.add(stats);

        tracing::info!("{}", Progress { stats: totals, total });
    }

    tracing::info!(
        processed = totals.processed,
        updated = totals.updated,
        skipped = totals.skipped,
        errors = totals.errors,
        dry_run = options.dry_run,
        "Bloom status batch finished"
    );
    Ok(totals)
}
