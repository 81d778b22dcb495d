use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::{
    storage::entry_store::EntryStore,
    utils::clock::{local_day, Clock},
};

use super::{
    aggregation::{entries_newest_first, summarize_goal, summarize_goals, GoalSummary},
    chart::{build_chart_series, palette_color, ChartSeries, SeriesPoint},
    entities::{EntryId, Goal, GoalId, Hours, TimeEntry},
    errors::{Result, ValidationError},
};

/// Overview of every goal, recomputed from the store on each call.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summaries: Vec<GoalSummary>,
    pub series: ChartSeries,
}

#[derive(Debug, Clone)]
pub struct GoalDetail {
    pub summary: GoalSummary,
    /// Newest day first.
    pub history: Vec<TimeEntry>,
    /// The goal's column of the overall series, zero on days only other goals were worked on.
    pub chart: Vec<SeriesPoint>,
}

/// Creates and removes goals and logs time against them. All input is validated here, so the
/// aggregation functions only ever see well formed values.
pub struct GoalService<S: EntryStore> {
    store: S,
    clock: Box<dyn Clock>,
}

impl<S: EntryStore> GoalService<S> {
    pub fn new(store: S, clock: Box<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    #[instrument(skip(self, description))]
    pub async fn create_goal(
        &self,
        title: &str,
        description: &str,
        target_time: f64,
    ) -> Result<Goal> {
        let title = validate_title(title)?;
        let target_time =
            Hours::new_opt(target_time).ok_or(ValidationError::InvalidTargetTime(target_time))?;
        let description = Some(description.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let existing = self.store.find_goals().await?.len();
        let now = self.clock.time();
        let goal = Goal {
            id: GoalId::generate(),
            title,
            description,
            target_time,
            color: Some(palette_color(existing).to_string()),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_goal(&goal).await?;
        info!("Created goal {} \"{}\"", goal.id, goal.title);
        Ok(goal)
    }

    /// Removes the goal together with all of its time entries. Entries go first, so an
    /// interrupted delete never leaves entries pointing at a missing goal.
    #[instrument(skip(self))]
    pub async fn delete_goal(&self, goal_id: &GoalId) -> Result<usize> {
        self.goal(goal_id).await?;
        let removed_entries = self.store.delete_entries_by_goal(goal_id).await?;
        self.store.delete_goal(goal_id).await?;
        info!("Deleted goal {goal_id} with {removed_entries} entries");
        Ok(removed_entries)
    }

    /// Appends a new entry. The goal's own `updated_at` stays as is, last activity is always
    /// derived from entries.
    #[instrument(skip(self))]
    pub async fn log_time(
        &self,
        goal_id: &GoalId,
        date: NaiveDate,
        time_spent: f64,
    ) -> Result<TimeEntry> {
        let time_spent =
            Hours::new_opt(time_spent).ok_or(ValidationError::InvalidTimeSpent(time_spent))?;
        let now = self.clock.time();
        let today = local_day(now);
        if date > today {
            return Err(ValidationError::FutureDate { date, today }.into());
        }
        self.goal(goal_id).await?;

        let entry = TimeEntry {
            id: EntryId::generate(),
            goal_id: goal_id.clone(),
            date,
            time_spent,
            created_at: now,
        };
        self.store.insert_entry(&entry).await?;
        info!("Logged {} for goal {goal_id} on {date}", entry.time_spent);
        Ok(entry)
    }

    pub async fn goal(&self, goal_id: &GoalId) -> Result<Goal> {
        self.store
            .find_goal(goal_id)
            .await?
            .ok_or_else(|| ValidationError::UnknownGoal(goal_id.clone()).into())
    }

    pub async fn goals(&self) -> Result<Vec<Goal>> {
        Ok(self.store.find_goals().await?)
    }

    pub async fn entries(&self) -> Result<Vec<TimeEntry>> {
        Ok(self.store.find_entries().await?)
    }

    pub async fn entries_for(&self, goal_id: &GoalId) -> Result<Vec<TimeEntry>> {
        Ok(self.store.find_entries_by_goal(goal_id).await?)
    }

    pub async fn dashboard(&self) -> Result<Dashboard> {
        let goals = self.store.find_goals().await?;
        let entries = self.store.find_entries().await?;
        debug!(
            "Building dashboard for {} goals and {} entries",
            goals.len(),
            entries.len()
        );
        Ok(Dashboard {
            summaries: summarize_goals(&goals, &entries),
            series: build_chart_series(&entries, &goals),
        })
    }

    /// Summary and history of one goal. The chart is the goal's view of the overall series, so
    /// it shares its dates with the dashboard.
    pub async fn goal_detail(&self, goal_id: &GoalId) -> Result<GoalDetail> {
        let goal = self.goal(goal_id).await?;
        let entries = self.entries_for(goal_id).await?;
        let series = build_chart_series(&self.entries().await?, &self.goals().await?);
        Ok(GoalDetail {
            summary: summarize_goal(&goal, &entries),
            history: entries_newest_first(goal_id, &entries)
                .into_iter()
                .cloned()
                .collect(),
            chart: series.goal_view(goal_id),
        })
    }
}

fn validate_title(title: &str) -> std::result::Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        Err(ValidationError::EmptyTitle)
    } else {
        Ok(title.to_string())
    }
}
