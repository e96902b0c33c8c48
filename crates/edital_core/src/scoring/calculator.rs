//! Capped activity score calculator.
//!
//! # Responsibility
//! - Turn a notice catalog plus a project ledger into a point total.
//! - Produce per-activity progress for display.
//!
//! # Invariants
//! - `contribution = min(informed * points, limit)` for every activity.
//! - `total` is the sum of contributions across the whole catalog.
//! - Ledger records for ids missing from the catalog are ignored.
//! - An activity id repeated in an unvalidated catalog counts once; the
//!   first occurrence in display order wins.
//! - `progress_percent` is always finite and within `0.0..=100.0`.

use crate::model::catalog::{ActivityCatalog, ActivityCategory, ActivityDefinition, ActivityId};
use crate::model::project::ProjectActivityRecord;
use crate::scoring::ledger::informed_count;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Display state of one activity inside a score report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityProgress {
    /// Capped points this activity adds to the total.
    pub contribution: u64,
    pub progress_percent: f64,
    /// `"{contribution}/{limit}"`.
    pub label: String,
}

/// Result of one score computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub total: u64,
    pub per_activity: BTreeMap<ActivityId, ActivityProgress>,
}

impl ScoreReport {
    pub fn progress(&self, activity_id: ActivityId) -> Option<&ActivityProgress> {
        self.per_activity.get(&activity_id)
    }

    /// Sum of contributions of the activities in `category`.
    pub fn category_total(&self, category: &ActivityCategory) -> u64 {
        category
            .activities
            .iter()
            .filter_map(|activity| self.per_activity.get(&activity.id))
            .map(|progress| progress.contribution)
            .sum()
    }
}

/// Computes the capped total and per-activity progress.
///
/// Runs in `O(activities * records)`; catalogs hold tens of entries.
pub fn compute_score(catalog: &ActivityCatalog, records: &[ProjectActivityRecord]) -> ScoreReport {
    let mut report = ScoreReport::default();

    for activity in unique_activities(catalog) {
        let informed = informed_count(records, activity.id);
        let raw = raw_points(activity, informed);
        let contribution = raw.min(u64::from(activity.limit));

        report.total += contribution;
        report.per_activity.insert(
            activity.id,
            ActivityProgress {
                contribution,
                progress_percent: progress_percent(raw, activity.limit),
                label: format!("{contribution}/{}", activity.limit),
            },
        );
    }

    report
}

/// Capped contribution of one activity for a given reported count.
pub fn activity_contribution(activity: &ActivityDefinition, informed: u32) -> u64 {
    raw_points(activity, informed).min(u64::from(activity.limit))
}

/// Highest total reachable with `catalog` (sum of all limits).
pub fn max_total(catalog: &ActivityCatalog) -> u64 {
    unique_activities(catalog)
        .map(|activity| u64::from(activity.limit))
        .sum()
}

/// Percent of `limit` reached by `raw` points.
///
/// `raw > limit` saturates at 100. A zero limit with zero raw points
/// reports 0 instead of dividing by zero.
pub fn progress_percent(raw: u64, limit: u32) -> f64 {
    let limit = u64::from(limit);
    if raw > limit {
        return 100.0;
    }
    if limit == 0 {
        return 0.0;
    }
    raw as f64 / limit as f64 * 100.0
}

fn unique_activities(catalog: &ActivityCatalog) -> impl Iterator<Item = &ActivityDefinition> {
    let mut seen = HashSet::new();
    catalog
        .activities()
        .filter(move |activity| seen.insert(activity.id))
}

fn raw_points(activity: &ActivityDefinition, informed: u32) -> u64 {
    u64::from(informed) * u64::from(activity.points)
}
