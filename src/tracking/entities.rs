use std::{fmt::Display, ops::Deref, str::FromStr, sync::Arc};

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a [Goal].
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Clone)]
#[serde(transparent)]
pub struct GoalId(Arc<str>);

impl GoalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GoalId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Clone)]
#[serde(transparent)]
pub struct EntryId(Arc<str>);

impl EntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Amount of time in hours. Always finite and strictly positive, which is what both a goal's
/// target and a logged entry require.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Hours(f64);

impl Hours {
    pub fn new_opt(value: f64) -> Option<Hours> {
        if value.is_finite() && value > 0. {
            Some(Hours(value))
        } else {
            None
        }
    }
}

impl Deref for Hours {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Hours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h", self.0)
    }
}

impl TryFrom<f64> for Hours {
    type Error = anyhow::Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Hours::new_opt(value).ok_or_else(|| anyhow!("{value} is not a positive amount of hours"))
    }
}

impl From<Hours> for f64 {
    fn from(value: Hours) -> Self {
        value.0
    }
}

impl FromStr for Hours {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches('h');
        let v = s.parse::<f64>()?;
        Hours::try_from(v)
    }
}

/// A user-defined target with a time budget.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target_time: Hours,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hours spent on a goal during one calendar day. `created_at` orders entries that share a day.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: EntryId,
    pub goal_id: GoalId,
    pub date: NaiveDate,
    pub time_spent: Hours,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{EntryId, GoalId, Hours, TimeEntry};

    #[test]
    fn test_hours_validation() {
        assert!(Hours::new_opt(1.5).is_some());
        assert!(Hours::new_opt(0.).is_none());
        assert!(Hours::new_opt(-5.).is_none());
        assert!(Hours::new_opt(f64::NAN).is_none());
        assert!(Hours::new_opt(f64::INFINITY).is_none());
    }

    #[test]
    fn test_hours_from_str() {
        assert_eq!(*"1.5".parse::<Hours>().unwrap(), 1.5);
        assert_eq!(*"2h".parse::<Hours>().unwrap(), 2.);
        assert!("abc".parse::<Hours>().is_err());
        assert!("-1".parse::<Hours>().is_err());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(GoalId::generate(), GoalId::generate());
        assert_ne!(EntryId::generate(), EntryId::generate());
    }

    #[test]
    fn test_time_entry_json_shape() {
        let entry = TimeEntry {
            id: "t1".into(),
            goal_id: "g1".into(),
            date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            time_spent: Hours::new_opt(2.).unwrap(),
            created_at: Utc.with_ymd_and_hms(2023, 6, 1, 18, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["goalId"], "g1");
        assert_eq!(value["date"], "2023-06-01");
        assert_eq!(value["timeSpent"], 2.0);
    }

    #[test]
    fn test_time_entry_rejects_non_positive_hours() {
        let json = r#"{"id":"t1","goalId":"g1","date":"2023-06-01","timeSpent":0,"createdAt":"2023-06-01T18:00:00Z"}"#;
        assert!(serde_json::from_str::<TimeEntry>(json).is_err());
    }
}
