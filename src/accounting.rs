//! Blocked-time accounting per calendar day.

use crate::error::AppResult;
use crate::store::DailyTotalsRepository;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use log::{debug, warn};
use std::sync::Arc;

/// Adds finished block intervals to per-day buckets.
///
/// Accounting is additive and not idempotent: every finished interval must
/// be recorded exactly once by whoever ends the block.
pub struct TimeAccountant {
    repo: Arc<dyn DailyTotalsRepository>,
}

impl TimeAccountant {
    pub fn new(repo: Arc<dyn DailyTotalsRepository>) -> Self {
        Self { repo }
    }

    /// Record `[from, to)`, split at every midnight it crosses.
    pub fn record_interval(&self, from: NaiveDateTime, to: NaiveDateTime) -> AppResult<()> {
        if to <= from {
            debug!("Ignoring empty or reversed interval {from} -> {to}");
            return Ok(());
        }

        let mut cursor = from;
        while cursor.date() < to.date() {
            let Some(next_day) = cursor.date().succ_opt() else {
                warn!("Interval end {to} is past the last representable day");
                return Ok(());
            };
            let midnight = next_day.and_time(NaiveTime::MIN);
            self.repo.add_to_day(cursor.date(), midnight - cursor)?;
            cursor = midnight;
        }

        let rest = to - cursor;
        if rest > TimeDelta::zero() {
            self.repo.add_to_day(to.date(), rest)?;
        }

        debug!("Recorded {} of blocked time ({from} -> {to})", format_elapsed(to - from));
        Ok(())
    }

    pub fn day_total(&self, day: NaiveDate) -> AppResult<TimeDelta> {
        self.repo.day_total(day)
    }

    pub fn today_total(&self, now: NaiveDateTime) -> AppResult<TimeDelta> {
        self.repo.day_total(now.date())
    }

    /// Every recorded day, most recent first.
    pub fn all_day_totals(&self) -> AppResult<Vec<(NaiveDate, TimeDelta)>> {
        self.repo.all_totals()
    }

    /// Mean over the days that have any recorded time. Zero when none do.
    pub fn average(&self) -> AppResult<TimeDelta> {
        let recorded: Vec<TimeDelta> = self
            .repo
            .all_totals()?
            .into_iter()
            .map(|(_, total)| total)
            .filter(|total| *total > TimeDelta::zero())
            .collect();

        let Ok(days) = i32::try_from(recorded.len()) else {
            return Ok(TimeDelta::zero());
        };
        if days == 0 {
            return Ok(TimeDelta::zero());
        }

        let sum = recorded.into_iter().fold(TimeDelta::zero(), |acc, total| acc + total);
        Ok(sum / days)
    }
}

/// "Xh Ym Zs" with whole seconds. Negative durations show as zero.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
