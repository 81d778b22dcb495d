use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::Parser;

use crate::{
    storage::entry_store::EntryStore,
    tracking::{aggregation::GoalSummary, entities::Hours, lifecycle::GoalService},
    utils::time::{format_calendar_day, parse_calendar_day},
};

use super::{chart::print_goal_view, invalid_value, resolve_goal_id, user_error, DateStyle};

#[derive(Debug, Parser)]
pub struct LogCommand {
    #[arg(help = "Goal id or a unique prefix of it")]
    goal: String,
    #[arg(
        help = "Hours spent, e.g. \"1.5\" or \"1.5h\"",
        allow_negative_numbers = true
    )]
    hours: Hours,
    #[arg(
        long,
        short,
        help = "Day the time was spent on. Examples are \"yesterday\", \"2025-03-15\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

pub async fn process_add_command<S: EntryStore>(
    service: &GoalService<S>,
    title: &str,
    description: &str,
    target: f64,
) -> Result<()> {
    let goal = service
        .create_goal(title, description, target)
        .await
        .map_err(user_error)?;
    println!("{}\t\"{}\" added", goal.id, goal.title);
    Ok(())
}

pub async fn process_list_command<S: EntryStore>(service: &GoalService<S>) -> Result<()> {
    let dashboard = service.dashboard().await.map_err(user_error)?;
    if dashboard.summaries.is_empty() {
        println!("No goals yet");
    }
    for summary in &dashboard.summaries {
        println!("{}", format_card(summary));
    }
    Ok(())
}

pub async fn process_show_command<S: EntryStore>(
    service: &GoalService<S>,
    goal: &str,
) -> Result<()> {
    let goal_id = resolve_goal_id(service, goal).await?;
    let detail = service.goal_detail(&goal_id).await.map_err(user_error)?;
    let goal = &detail.summary.goal;

    println!("{}", format_card(&detail.summary));
    if let Some(description) = &goal.description {
        println!("{description}");
    }
    println!(
        "Remaining\t{}",
        format_hours(detail.summary.remaining_time)
    );
    println!();
    if detail.history.is_empty() {
        println!("No time logged yet");
    }
    for entry in &detail.history {
        println!(
            "{}\t{}",
            format_calendar_day(entry.date),
            format_hours(*entry.time_spent)
        );
    }
    if !detail.history.is_empty() {
        println!();
        println!("Per day");
        print_goal_view(&detail.chart);
    }
    Ok(())
}

pub async fn process_log_command<S: EntryStore>(
    service: &GoalService<S>,
    LogCommand {
        goal,
        hours,
        date,
        date_style,
    }: LogCommand,
) -> Result<()> {
    let date = parse_log_date(date.as_deref(), date_style, Local::now())?;
    let goal_id = resolve_goal_id(service, &goal).await?;
    let entry = service
        .log_time(&goal_id, date, *hours)
        .await
        .map_err(user_error)?;
    println!(
        "Logged {} on {}",
        format_hours(*entry.time_spent),
        format_calendar_day(entry.date)
    );
    Ok(())
}

pub async fn process_delete_command<S: EntryStore>(
    service: &GoalService<S>,
    goal: &str,
    confirmed: bool,
) -> Result<()> {
    let goal_id = resolve_goal_id(service, goal).await?;
    let goal = service.goal(&goal_id).await.map_err(user_error)?;
    if !confirmed {
        println!(
            "This will permanently delete \"{}\" and all of its logged time. Run again with --yes to confirm",
            goal.title
        );
        return Ok(());
    }
    let removed = service.delete_goal(&goal_id).await.map_err(user_error)?;
    println!("\"{}\" deleted with {removed} time entries", goal.title);
    Ok(())
}

/// Calendar day to log time on. Plain dates and timestamps are read directly, everything else goes
/// through natural language parsing relative to `now`.
fn parse_log_date(
    value: Option<&str>,
    date_style: DateStyle,
    now: DateTime<Local>,
) -> Result<NaiveDate> {
    let Some(value) = value else {
        return Ok(now.date_naive());
    };
    if let Some(date) = parse_calendar_day(value) {
        return Ok(date);
    }
    parse_date_string(value, now, date_style.into())
        .map(|v| v.date_naive())
        .map_err(|e| invalid_value(format!("Failed to validate date \"{value}\": {e}")))
}

fn format_card(summary: &GoalSummary) -> String {
    format!(
        "{}\t{}\t{}/{}\t{}\t{}",
        summary.goal.id,
        summary.progress,
        format_hours(summary.spent_time),
        format_hours(*summary.goal.target_time),
        format_calendar_day(summary.last_activity),
        summary.goal.title
    )
}

/// Hours with at most two decimals, e.g. `1.5h`, `2h`, `0.33h`.
pub fn format_hours(v: f64) -> String {
    let formatted = format!("{v:.2}");
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{formatted}h")
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone};

    use crate::cli::DateStyle;

    use super::{format_hours, parse_log_date};

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(1.5), "1.5h");
        assert_eq!(format_hours(2.), "2h");
        assert_eq!(format_hours(0.), "0h");
        assert_eq!(format_hours(1. / 3.), "0.33h");
        assert_eq!(format_hours(10.), "10h");
    }

    #[test]
    fn test_parse_log_date() {
        let now = Local.with_ymd_and_hms(2025, 3, 16, 12, 0, 0).unwrap();

        assert_eq!(
            parse_log_date(None, DateStyle::Uk, now).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 16).unwrap()
        );
        assert_eq!(
            parse_log_date(Some("2025-03-10"), DateStyle::Uk, now).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert_eq!(
            parse_log_date(Some("yesterday"), DateStyle::Uk, now).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
        assert_eq!(
            parse_log_date(Some("02/03/2025"), DateStyle::Us, now).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
        );
        assert!(parse_log_date(Some("not a date at all"), DateStyle::Uk, now).is_err());
    }
}
