//! Project ledger editing.
//!
//! # Responsibility
//! - Look up reported counts by activity id.
//! - Apply raw user input to a ledger snapshot.
//!
//! # Invariants
//! - Edits never mutate the caller's records; a new collection is returned.
//! - Invalid input is ignored: the returned ledger equals the input.
//! - A successful edit never introduces a second record for the same id.

use crate::model::catalog::ActivityId;
use crate::model::project::ProjectActivityRecord;
use log::debug;

/// Returns the reported count for `activity_id`, or 0 when absent.
///
/// With duplicate records the first match wins.
pub fn informed_count(records: &[ProjectActivityRecord], activity_id: ActivityId) -> u32 {
    records
        .iter()
        .find(|record| record.activity_id == activity_id)
        .map_or(0, |record| record.informed_activities)
}

/// Parses one count as typed by a user.
///
/// Accepts a non-negative decimal integer with optional surrounding
/// whitespace. Empty, negative, fractional, non-numeric and out-of-range
/// input yields `None`.
pub fn parse_informed_count(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

/// Applies `raw_value` as the reported count of `activity_id`.
///
/// Replaces the count of the first matching record, or appends a new
/// record when none exists. Rejected input returns an unchanged copy.
pub fn set_informed_count(
    records: &[ProjectActivityRecord],
    activity_id: ActivityId,
    raw_value: &str,
) -> Vec<ProjectActivityRecord> {
    let mut next = records.to_vec();

    let Some(count) = parse_informed_count(raw_value) else {
        debug!(
            "event=ledger_edit module=scoring status=rejected activity_id={} input_len={}",
            activity_id,
            raw_value.len()
        );
        return next;
    };

    match next
        .iter_mut()
        .find(|record| record.activity_id == activity_id)
    {
        Some(record) => record.informed_activities = count,
        None => next.push(ProjectActivityRecord::new(activity_id, count)),
    }

    next
}
