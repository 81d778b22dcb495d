use chrono::NaiveDate;
use tracing::warn;

use crate::utils::percentage::Percentage;

use super::entities::{Goal, GoalId, TimeEntry};

/// Total hours logged for `goal_id`. An unknown goal simply sums to 0.
pub fn goal_time_spent(goal_id: &GoalId, entries: &[TimeEntry]) -> f64 {
    entries
        .iter()
        .filter(|v| &v.goal_id == goal_id)
        .map(|v| *v.time_spent)
        .sum()
}

/// Day of the most recently created entry of `goal_id`. Among entries created at the same moment
/// the earliest one in `entries` wins.
pub fn goal_last_updated(goal_id: &GoalId, entries: &[TimeEntry]) -> Option<NaiveDate> {
    entries
        .iter()
        .filter(|v| &v.goal_id == goal_id)
        .fold(None::<&TimeEntry>, |latest, next| match latest {
            Some(latest) if latest.created_at >= next.created_at => Some(latest),
            _ => Some(next),
        })
        .map(|v| v.date)
}

/// Progress towards a target, rounded and clamped to 100%. Spending more than the target is
/// common and still reads as 100%.
///
/// A non-positive target can't come from a valid [Goal], if one shows up anyway it's reported as
/// complete.
pub fn compute_progress(spent_time: f64, target_time: f64) -> Percentage {
    if !(target_time.is_finite() && target_time > 0.) {
        warn!("Computing progress against invalid target {target_time}");
        return Percentage::FULL;
    }
    let spent_time = if spent_time.is_finite() {
        spent_time.max(0.)
    } else {
        0.
    };
    Percentage::of(spent_time, target_time)
        .map(|v| v.min(Percentage::FULL).rounded())
        .unwrap_or(Percentage::FULL)
}

/// Everything a goal card shows.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalSummary {
    pub goal: Goal,
    pub spent_time: f64,
    pub progress: Percentage,
    pub remaining_time: f64,
    /// Day of the latest logged entry, or the goal's own update day when nothing was logged yet.
    pub last_activity: NaiveDate,
}

pub fn summarize_goal(goal: &Goal, entries: &[TimeEntry]) -> GoalSummary {
    let spent_time = goal_time_spent(&goal.id, entries);
    let target = *goal.target_time;
    GoalSummary {
        goal: goal.clone(),
        spent_time,
        progress: compute_progress(spent_time, target),
        remaining_time: (target - spent_time).max(0.),
        last_activity: goal_last_updated(&goal.id, entries)
            .unwrap_or_else(|| goal.updated_at.date_naive()),
    }
}

/// Recomputed on every call, summaries are never cached.
pub fn summarize_goals(goals: &[Goal], entries: &[TimeEntry]) -> Vec<GoalSummary> {
    goals.iter().map(|v| summarize_goal(v, entries)).collect()
}

/// Entries of one goal ordered by day, newest first. Entries of the same day keep their order.
pub fn entries_newest_first<'a>(goal_id: &GoalId, entries: &'a [TimeEntry]) -> Vec<&'a TimeEntry> {
    let mut history = entries
        .iter()
        .filter(|v| &v.goal_id == goal_id)
        .collect::<Vec<_>>();
    history.sort_by(|a, b| b.date.cmp(&a.date));
    history
}
