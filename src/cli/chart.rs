use anyhow::Result;
use clap::Parser;

use crate::{
    storage::entry_store::EntryStore,
    tracking::{
        chart::{goal_colors, ChartSeries, SeriesPoint},
        entities::Goal,
        lifecycle::GoalService,
    },
    utils::time::format_calendar_day,
};

use super::{goals::format_hours, resolve_goal_id, user_error};

#[derive(Debug, Parser)]
pub struct ChartCommand {
    #[arg(long, short, help = "Only show a single goal. Accepts a unique id prefix")]
    goal: Option<String>,
    #[arg(long, help = "Print the series as json")]
    json: bool,
}

/// Prints the overall series, one line per day, or the view of a single goal.
pub async fn process_chart_command<S: EntryStore>(
    service: &GoalService<S>,
    ChartCommand { goal, json }: ChartCommand,
) -> Result<()> {
    let dashboard = service.dashboard().await.map_err(user_error)?;
    let goals = dashboard
        .summaries
        .into_iter()
        .map(|v| v.goal)
        .collect::<Vec<_>>();

    match goal {
        Some(goal) => {
            let goal_id = resolve_goal_id(service, &goal).await?;
            // Fails for unknown goals instead of printing a line of zeroes.
            service.goal(&goal_id).await.map_err(user_error)?;
            let view = dashboard.series.goal_view(&goal_id);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_goal_view(&view);
            }
        }
        None if json => println!("{}", serde_json::to_string_pretty(&dashboard.series)?),
        None => print_overall(&dashboard.series, &goals),
    }
    Ok(())
}

fn print_overall(series: &ChartSeries, goals: &[Goal]) {
    if series.is_empty() {
        println!("No time logged yet");
        return;
    }

    let colors = goal_colors(goals);
    for (goal, (_, color)) in goals.iter().zip(&colors) {
        println!("{color}\t{}", goal.title);
    }
    println!();

    let header = goals
        .iter()
        .map(|v| v.title.as_str())
        .chain(["Total"])
        .collect::<Vec<_>>()
        .join("\t");
    println!("Date\t{header}");
    for row in series.rows() {
        let values = goals
            .iter()
            .map(|goal| format_hours(row.value(&goal.id)))
            .chain([format_hours(row.total)])
            .collect::<Vec<_>>()
            .join("\t");
        println!("{}\t{values}", format_calendar_day(row.date));
    }
}

/// One `date\thours` line per day of the series.
pub(crate) fn print_goal_view(view: &[SeriesPoint]) {
    if view.is_empty() {
        println!("No time logged yet");
    }
    for point in view {
        println!(
            "{}\t{}",
            format_calendar_day(point.date),
            format_hours(point.value)
        );
    }
}
