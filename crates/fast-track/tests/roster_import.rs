use fast_track::leaderboard::{recompute_ranks, ClientStatus, QualityTrend, Scorecard};
use fast_track::roster::{RosterImportError, RosterImporter};

#[test]
fn sample_roster_imports_every_client() {
    let data = include_bytes!("../sample_roster.csv");
    let clients = RosterImporter::from_reader(&data[..]).expect("sample roster imports");

    assert_eq!(clients.len(), 5);
    let summit = clients
        .iter()
        .find(|client| client.id.0 == "summit")
        .expect("summit present");
    assert_eq!(summit.status, ClientStatus::Graduated);
    assert_eq!(summit.completed_sprints.len(), 30);
    assert!(summit.graduation_date.is_some());

    let harbor = clients
        .iter()
        .find(|client| client.id.0 == "harbor")
        .expect("harbor present");
    assert_eq!(harbor.status, ClientStatus::StartingSoon);
    assert!(harbor.rank.is_none());
}

#[test]
fn sample_roster_scores_match_the_leaderboard_formula() {
    let data = include_bytes!("../sample_roster.csv");
    let clients = RosterImporter::from_reader(&data[..]).expect("sample roster imports");

    let northwind = Scorecard::for_client(&clients[0]);
    assert_eq!(northwind.speed_score, 83);
    assert_eq!(northwind.quality_average, 86);
    assert_eq!(northwind.quality_trend, QualityTrend::Improving);
    assert_eq!(northwind.combined_score.hundredths(), 8420);
}

#[test]
fn imported_roster_reranks_by_combined_score() {
    let data = include_bytes!("../sample_roster.csv");
    let clients = RosterImporter::from_reader(&data[..]).expect("sample roster imports");

    let ranked = recompute_ranks(clients);
    let order: Vec<(&str, Option<u32>)> = ranked
        .iter()
        .map(|client| (client.id.0.as_str(), client.rank))
        .collect();
    assert_eq!(
        order,
        vec![
            ("northwind", Some(3)),
            ("lumen", Some(4)),
            ("atlas", Some(2)),
            ("harbor", Some(5)),
            ("summit", Some(1)),
        ]
    );
    assert_eq!(ranked[4].previous_rank, Some(4));
}

#[test]
fn missing_roster_file_reports_io_error() {
    match RosterImporter::from_path("does/not/exist.csv") {
        Err(RosterImportError::Io(_)) => {}
        other => panic!("expected io error, got {other:?}"),
    }
}

#[test]
fn graduated_status_requires_the_final_sprint() {
    let csv = "id,name,associate_id,start_date,on_time_completed,on_time_total,quality_scores,completed_sprints,status\n\
early,Early Bird,guru-1,2025-01-06,1,1,90,1,GRADUATED\n";
    let err = RosterImporter::from_reader(csv.as_bytes()).expect_err("row is invalid");
    assert_eq!(
        err.to_string(),
        "roster line 2: GRADUATED without sprint 30"
    );
}
