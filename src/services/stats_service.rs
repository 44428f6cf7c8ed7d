//! Read-only review statistics.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::{PrAssignmentStat, ReviewStat};
use crate::store::StatsStore;

pub struct StatsService {
    stats: Arc<dyn StatsStore>,
}

impl StatsService {
    pub fn new(stats: Arc<dyn StatsStore>) -> Self {
        Self { stats }
    }

    pub async fn review_stats(&self) -> Result<Vec<ReviewStat>, AppError> {
        self.stats.review_counts_per_user().await
    }

    pub async fn pr_assignment_stats(&self) -> Result<Vec<PrAssignmentStat>, AppError> {
        self.stats.reviewer_counts_per_pr().await
    }
}
