//! Event history handler

use anyhow::{Context, Result};
use colored::*;
use tributary_core::domain::event::{Event, EventStatus};
use tributary_core::domain::run::CorrelationId;
use tributary_runner::service::LineageQuery;

use crate::config::Config;

pub async fn handle_events_command(
    dataset: &str,
    correlation_id: &str,
    config: &Config,
) -> Result<()> {
    let query = LineageQuery::new(config.api());
    let correlation_id = CorrelationId::new(correlation_id);

    let events = query
        .events_for(dataset, &correlation_id)
        .await
        .context("Failed to fetch events")?;

    if events.is_empty() {
        println!(
            "{}",
            format!("No events recorded for run {}.", correlation_id).yellow()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("Events for run {} ({}):", correlation_id, dataset).bold()
    );
    println!("{}", "─".repeat(80).dimmed());
    for event in &events {
        print_event(event);
    }
    println!("{}", "─".repeat(80).dimmed());

    Ok(())
}

fn print_event(event: &Event) {
    println!(
        "{} {:<22} {}",
        event
            .timestamp
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string()
            .dimmed(),
        colorize_status(event.status),
        event.pipeline.dimmed()
    );
    for (key, value) in &event.details {
        println!("    {} = {}", key.cyan(), value);
    }
}

/// Colorize event status for display
fn colorize_status(status: EventStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        EventStatus::Start => status_str.cyan(),
        EventStatus::End => status_str.green(),
        EventStatus::Failed => status_str.red(),
        _ => status_str.normal(),
    }
}
