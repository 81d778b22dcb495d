use chrono::NaiveDate;
use thiserror::Error;

use super::entities::GoalId;

/// Rejected user input. Never fatal, the message is meant to be shown as is.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Goal title can't be empty")]
    EmptyTitle,

    #[error("Target time must be a positive number of hours, got {0}")]
    InvalidTargetTime(f64),

    #[error("Time spent must be a positive number of hours, got {0}")]
    InvalidTimeSpent(f64),

    #[error("Date {date} is in the future (today is {today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },

    #[error("Can't read a calendar day from \"{0}\"")]
    InvalidDate(String),

    #[error("Goal {0} doesn't exist")]
    UnknownGoal(GoalId),
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store operation failed: {0}")]
    Store(#[from] anyhow::Error),
}

impl LifecycleError {
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            LifecycleError::Validation(e) => Some(e),
            LifecycleError::Store(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
