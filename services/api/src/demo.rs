use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use fast_track::config::LeaderboardConfig;
use fast_track::error::AppError;
use fast_track::leaderboard::summary::leaderboard_view;
use fast_track::leaderboard::{
    recompute_ranks, AssociateId, ClientId, ClientProgress, InMemoryPopulationStore,
    LeaderboardEntry, LeaderboardService, LeaderboardServiceError, NewClient, PopulationScope,
    PopulationStore, PortfolioSummary, RankChange, ScheduleUpdate, SubmissionEvent,
};
use fast_track::roster::RosterImporter;
use std::path::PathBuf;
use std::sync::Arc;

const SAMPLE_ROSTER: &str = include_str!("../../../crates/fast-track/sample_roster.csv");

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional CSV roster. Defaults to the bundled sample population.
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Day the demo deliveries are due (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct LeaderboardArgs {
    /// CSV roster to rank
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Only show clients managed by this associate
    #[arg(long)]
    pub(crate) associate: Option<String>,
    /// Print portfolio counts under the table
    #[arg(long)]
    pub(crate) summary: bool,
}

pub(crate) fn run_leaderboard(args: LeaderboardArgs) -> Result<(), AppError> {
    let LeaderboardArgs {
        roster,
        associate,
        summary,
    } = args;

    let ranked = recompute_ranks(RosterImporter::from_path(&roster)?);
    let scope = PopulationScope::for_associate(associate.map(AssociateId));
    let visible: Vec<ClientProgress> = ranked
        .into_iter()
        .filter(|client| scope.includes(client))
        .collect();

    println!("Fast Track leaderboard ({} clients)", visible.len());
    render_leaderboard(&leaderboard_view(&visible));
    if summary {
        render_summary(&PortfolioSummary::from_clients(&visible));
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { roster, as_of } = args;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let deadline = due_at(as_of);

    let clients = match roster {
        Some(path) => RosterImporter::from_path(path)?,
        None => RosterImporter::from_reader(SAMPLE_ROSTER.as_bytes())?,
    };
    let store = InMemoryPopulationStore::seeded(clients);
    let service = LeaderboardService::new(Arc::new(store.clone()), &LeaderboardConfig::default());

    println!("Fast Track leaderboard demo (deliveries due {})", deadline);
    let board = service.recompute()?;
    println!("\nStarting standings");
    render_leaderboard(&board);

    let associate_id = board
        .first()
        .map(|entry| entry.associate_id.clone())
        .unwrap_or_else(|| AssociateId("guru-demo".to_string()));
    let newcomer = service.enroll(NewClient {
        id: ClientId("demo-newcomer".to_string()),
        name: "Demo Newcomer".to_string(),
        associate_id,
        start_date: as_of,
    })?;
    println!(
        "\nEnrolled {} -> rank {} ({})",
        newcomer.name,
        rank_label(newcomer.rank),
        newcomer.status_label
    );

    let population = store
        .fetch_population(&PopulationScope::All)
        .map_err(LeaderboardServiceError::from)?;
    let deliveries = planned_deliveries(&population.clients, deadline);

    println!("\nSprint deliveries");
    for event in &deliveries {
        let preview = service.preview(event)?;
        let entry = service.submit(event)?;
        println!(
            "- {} sprint {}: quality {}, {} | predicted rank {} -> recorded rank {} ({})",
            event.client_id,
            event.sprint_number,
            event.quality_score,
            if preview.on_time { "on time" } else { "late" },
            preview.predicted_rank,
            rank_label(entry.rank),
            change_marker(entry.rank_change)
        );
        if entry.graduation_date.is_some() {
            println!("  {} graduated", entry.name);
        }
    }

    if let Some(event) = deliveries.first() {
        match service.submit(event) {
            Ok(_) => println!("\nResubmission unexpectedly accepted"),
            Err(err) => println!("\nResubmission rejected: {}", err),
        }
    }

    if let Some(late) = deliveries.iter().find(|event| !event.is_on_time()) {
        let entry = service.update_schedule(
            &late.client_id,
            &ScheduleUpdate {
                current_deadline: deadline,
                paused: false,
            },
            deadline + Duration::days(1),
        )?;
        println!(
            "Schedule check for {}: {}",
            entry.client_id, entry.status_label
        );
    }

    println!("\nFinal standings");
    render_leaderboard(&service.leaderboard(&PopulationScope::All)?);
    render_summary(&service.summary(&PopulationScope::All)?);

    Ok(())
}

/// One delivery per client still in the program: every third one lands a day late.
fn planned_deliveries(clients: &[ClientProgress], deadline: DateTime<Utc>) -> Vec<SubmissionEvent> {
    clients
        .iter()
        .filter(|client| !client.is_graduated())
        .filter_map(|client| client.next_sprint().map(|sprint| (client, sprint)))
        .enumerate()
        .map(|(index, (client, sprint_number))| {
            let submitted_at = if index % 3 == 2 {
                deadline + Duration::hours(26)
            } else {
                deadline - Duration::hours(4)
            };
            SubmissionEvent {
                client_id: client.id.clone(),
                sprint_number,
                quality_score: 70 + ((index * 7) % 30) as u8,
                deadline,
                submitted_at,
                on_time_override: None,
            }
        })
        .collect()
}

fn due_at(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)) + Duration::hours(17)
}

fn rank_label(rank: Option<u32>) -> String {
    rank.map(|rank| rank.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn change_marker(change: RankChange) -> &'static str {
    match change {
        RankChange::Up => "up",
        RankChange::Down => "down",
        RankChange::Same => "same",
        RankChange::New => "new",
    }
}

fn render_leaderboard(entries: &[LeaderboardEntry]) {
    println!(
        "{:>4}  {:<5} {:<22} {:<10} {:<17} {:>5} {:>7} {:<9} {:>8}",
        "Rank", "Move", "Client", "Associate", "Status", "Speed", "Quality", "Trend", "Combined"
    );
    for entry in entries {
        println!(
            "{:>4}  {:<5} {:<22} {:<10} {:<17} {:>5} {:>7} {:<9} {:>8.1}",
            rank_label(entry.rank),
            change_marker(entry.rank_change),
            entry.name,
            entry.associate_id.0,
            entry.status_label,
            entry.speed_score,
            entry.quality_average,
            entry.quality_trend.label(),
            entry.combined_score
        );
    }
}

fn render_summary(summary: &PortfolioSummary) {
    println!(
        "\nPortfolio: {} clients | {} on time | {} delayed | {} graduated | {} in progress meetings | {} starting soon",
        summary.total_clients,
        summary.on_time,
        summary.delayed,
        summary.graduated,
        summary.progress_meeting,
        summary.starting_soon
    );
    println!("Average quality across all sprints: {}", summary.average_quality);
}
