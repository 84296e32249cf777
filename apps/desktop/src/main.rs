use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use client_core::{
    grid::{CalendarGrid, GridColumn},
    window::{NavDirection, QuickFilter},
    CalendarBackend, CalendarClient, HttpCalendarBackend, SyncPhase,
};
use tracing::warn;

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the calendar server, e.g. http://localhost:8001
    #[arg(long)]
    server_url: String,
    /// Anchor date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    anchor: Option<NaiveDate>,
    /// Quick-filter preset: 1week, 2weeks, 3weeks, 1month, 2months, 3months.
    #[arg(long)]
    filter: Option<String>,
    /// Shift the window by whole weeks after anchoring (negative = back).
    #[arg(long, default_value_t = 0)]
    shift_weeks: i32,
    /// Only show dates that carry events.
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let today = Local::now().date_naive();
    let anchor = args.anchor.unwrap_or(today);

    let backend = Arc::new(HttpCalendarBackend::new(&args.server_url)?);
    let client = CalendarClient::new(backend as Arc<dyn CalendarBackend>, anchor, args.compact);

    match args.filter.as_deref().map(QuickFilter::parse) {
        Some(Some(filter)) => client.apply_quick_filter(filter, today).await?,
        Some(None) => {
            warn!("unknown quick filter {:?}, ignoring", args.filter);
            client.refresh().await?;
        }
        None => client.refresh().await?,
    }

    for _ in 0..args.shift_weeks.abs() {
        let direction = if args.shift_weeks < 0 {
            NavDirection::Prev
        } else {
            NavDirection::Next
        };
        client.navigate(direction).await?;
    }

    match client.phase().await {
        SyncPhase::Ready => {}
        SyncPhase::Failed(message) => anyhow::bail!("calendar fetch failed: {message}"),
        other => anyhow::bail!("unexpected controller phase {other:?}"),
    }

    let window = client.window().await;
    println!("Window {} .. {}", window.start, window.end);
    if let Some(grid) = client.grid().await {
        render_grid(&grid);
    }

    Ok(())
}

fn render_grid(grid: &CalendarGrid) {
    let header: Vec<String> = grid
        .columns
        .iter()
        .map(|column| match column {
            GridColumn::Inbox => "Inbox".to_string(),
            GridColumn::Employee { name, .. } => name.clone(),
            GridColumn::NewEmployee => "+".to_string(),
        })
        .collect();
    println!("{:<12} {}", "Date", header.join(" | "));

    for row in &grid.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| {
                let mut entries: Vec<String> = cell
                    .services
                    .iter()
                    .map(|service| {
                        format!(
                            "{} {} @ {}",
                            service.service.kind.display_name(),
                            service.service.time.format("%H:%M"),
                            service.church_name
                        )
                    })
                    .collect();
                entries.extend(
                    cell.absences
                        .iter()
                        .map(|absence| absence.kind.display_name().to_string()),
                );
                entries.join(", ")
            })
            .collect();
        println!("{:<12} {}", row.date.to_string(), cells.join(" | "));
    }
}
