//! Date-indexed series used to draw progress over time. The overall view has a column per goal
//! plus a total, the single goal view is cut out of the same rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{ser::SerializeMap, Serialize, Serializer};
use tracing::instrument;

use super::entities::{Goal, GoalId, TimeEntry};

pub const DEFAULT_COLORS: [&str; 10] = [
    "#3498db", "#2ecc71", "#9b59b6", "#e67e22", "#f1c40f", "#1abc9c", "#e74c3c", "#34495e",
    "#16a085", "#d35400",
];

/// Palette colour for the goal at `index`. Wraps around the palette.
pub fn palette_color(index: usize) -> &'static str {
    DEFAULT_COLORS[index % DEFAULT_COLORS.len()]
}

/// Colour of every goal: the stored one, otherwise the palette colour of its position.
pub fn goal_colors(goals: &[Goal]) -> Vec<(GoalId, String)> {
    goals
        .iter()
        .enumerate()
        .map(|(index, goal)| {
            let color = goal
                .color
                .clone()
                .unwrap_or_else(|| palette_color(index).to_string());
            (goal.id.clone(), color)
        })
        .collect()
}

/// Column keys of a row that belong to the row itself rather than to a goal.
const ROW_KEYS: [&str; 2] = ["date", "total"];
const GOAL_KEY_PREFIX: &str = "goal:";

/// Hours of one date. Serializes as `{"date": .., "<goal id>": .., "total": ..}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub date: NaiveDate,
    pub values: BTreeMap<GoalId, f64>,
    pub total: f64,
}

/// Key of a goal's column. Ids that would shadow a row key, or look like an escaped one, get the
/// `goal:` prefix so every row keeps unique keys.
fn goal_column_key(goal_id: &GoalId) -> String {
    let id = goal_id.as_str();
    if ROW_KEYS.contains(&id) || id.starts_with(GOAL_KEY_PREFIX) {
        format!("{GOAL_KEY_PREFIX}{id}")
    } else {
        id.to_string()
    }
}

impl Serialize for ChartRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + ROW_KEYS.len()))?;
        map.serialize_entry("date", &self.date)?;
        for (goal_id, value) in &self.values {
            map.serialize_entry(&goal_column_key(goal_id), value)?;
        }
        map.serialize_entry("total", &self.total)?;
        map.end()
    }
}

impl ChartRow {
    pub fn value(&self, goal_id: &GoalId) -> f64 {
        self.values.get(goal_id).copied().unwrap_or(0.)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChartSeries {
    rows: Vec<ChartRow>,
}

impl ChartSeries {
    pub fn rows(&self) -> &[ChartRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Single goal view. A goal without a column reads as 0 on every date.
    pub fn goal_view(&self, goal_id: &GoalId) -> Vec<SeriesPoint> {
        self.rows
            .iter()
            .map(|row| SeriesPoint {
                date: row.date,
                value: row.value(goal_id),
            })
            .collect()
    }
}

/// Groups entries by day and sums them per goal. Rows are ordered by ascending day and carry a
/// column for every goal in `goals`.
///
/// `total` covers every entry of the day, including entries of goals missing from `goals`. It is
/// summed in column order, so with a complete goal list it is exactly the sum of the row's values.
#[instrument(skip_all, fields(entries = entries.len(), goals = goals.len()))]
pub fn build_chart_series(entries: &[TimeEntry], goals: &[Goal]) -> ChartSeries {
    let mut by_date = BTreeMap::<NaiveDate, BTreeMap<&GoalId, f64>>::new();
    for entry in entries {
        *by_date
            .entry(entry.date)
            .or_default()
            .entry(&entry.goal_id)
            .or_insert(0.) += *entry.time_spent;
    }

    let rows = by_date
        .into_iter()
        .map(|(date, per_goal)| {
            let values = goals
                .iter()
                .map(|goal| {
                    let value = per_goal.get(&goal.id).copied().unwrap_or(0.);
                    (goal.id.clone(), value)
                })
                .collect::<BTreeMap<_, _>>();
            let unlisted = per_goal
                .iter()
                .filter(|(goal_id, _)| !values.contains_key(**goal_id))
                .map(|(_, value)| value)
                .sum::<f64>();
            ChartRow {
                date,
                total: values.values().sum::<f64>() + unlisted,
                values,
            }
        })
        .collect();

    ChartSeries { rows }
}
