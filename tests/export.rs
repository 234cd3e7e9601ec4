mod common;

use common::{event, fixed_now, hours};
use odds_board::export::{EXPORT_COLUMNS, picks_to_csv, write_csv, write_xlsx};
use odds_board::flatten::flatten_event;
use odds_board::pipeline::{Board, RunStatus};

#[test]
fn csv_has_fixed_header_and_one_line_per_pick() {
    let ev = event(
        "m1",
        fixed_now() + hours(3),
        vec![
            ("h2h", vec![("Home", 1.85, None), ("Away", 4.2, None)]),
            ("totals", vec![("Over", 1.9, Some(2.5)), ("Under", 1.95, Some(3.0))]),
        ],
    );
    let picks = flatten_event(&ev, "soccer_epl").picks;
    let csv = picks_to_csv(&picks);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], EXPORT_COLUMNS.join(","));
    assert!(lines[1].starts_with(
        "soccer_epl,m1 Home vs m1 Away,2026-10-16T15:00:00Z,book,moneyline,,Home,1.85,0.5405,0.5405,"
    ));
    assert!(lines[4].contains(",totals,2.5,Under,1.95,"));
}

#[test]
fn csv_quotes_team_names_with_commas() {
    let mut ev = event("m2", fixed_now() + hours(1), vec![("h2h", vec![("Home", 2.0, None)])]);
    ev.home_team = "Brighton, Hove".to_string();
    let picks = flatten_event(&ev, "soccer_epl").picks;
    let csv = picks_to_csv(&picks);
    assert!(csv.contains("\"Brighton, Hove vs m2 Away\""));
}

#[test]
fn writes_csv_file() {
    let ev = event("m3", fixed_now() + hours(1), vec![("h2h", vec![("Home", 2.0, None)])]);
    let picks = flatten_event(&ev, "soccer_epl").picks;
    let path = std::env::temp_dir().join(format!("odds_board_export_{}.csv", std::process::id()));
    let rows = write_csv(&path, &picks).expect("csv written");
    assert_eq!(rows, 1);
    let raw = std::fs::read_to_string(&path).expect("csv readable");
    assert!(raw.starts_with("sport,match,kickoff_utc"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn writes_workbook_file() {
    let ev = event(
        "m4",
        fixed_now() + hours(2),
        vec![
            ("h2h", vec![("Home", 1.55, None), ("Away", 3.4, None)]),
            ("totals", vec![("Over", 1.9, Some(2.5))]),
        ],
    );
    let picks = flatten_event(&ev, "soccer_epl").picks;
    let mut board = Board::empty(RunStatus::Ready, fixed_now());
    board.safe = picks.iter().filter(|p| p.price >= 1.40).cloned().collect();
    board.longshots = picks.iter().filter(|p| p.price >= 2.0).cloned().collect();
    board.table = picks;

    let path = std::env::temp_dir().join(format!("odds_board_export_{}.xlsx", std::process::id()));
    let rows = write_xlsx(&path, &board).expect("workbook written");
    assert_eq!(rows, 3);
    let bytes = std::fs::read(&path).expect("workbook readable");
    // xlsx is a zip container.
    assert!(bytes.starts_with(b"PK"));
    let _ = std::fs::remove_file(&path);
}
