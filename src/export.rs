use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::model::Pick;
use crate::pipeline::Board;

pub const DEFAULT_CSV_PATH: &str = "odds_board.csv";
pub const DEFAULT_XLSX_PATH: &str = "odds_board.xlsx";

pub const EXPORT_COLUMNS: [&str; 11] = [
    "sport",
    "match",
    "kickoff_utc",
    "bookmaker",
    "market",
    "line",
    "outcome",
    "price",
    "implied_probability",
    "estimated_probability",
    "value",
];

pub fn pick_row(pick: &Pick) -> Vec<String> {
    vec![
        pick.sport.clone(),
        pick.match_label.clone(),
        pick.kickoff_utc.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        pick.bookmaker.clone(),
        pick.market_type.label().to_string(),
        pick.line.map(|l| l.to_string()).unwrap_or_default(),
        pick.outcome_name.clone(),
        format!("{:.2}", pick.price),
        format!("{:.4}", pick.implied_probability),
        format!("{:.4}", pick.estimated_probability),
        format!("{:.4}", pick.value),
    ]
}

pub fn picks_to_csv(picks: &[Pick]) -> String {
    let mut out = String::new();
    out.push_str(&EXPORT_COLUMNS.join(","));
    out.push('\n');
    for pick in picks {
        let fields: Vec<String> = pick_row(pick).iter().map(|f| csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

pub fn write_csv(path: &Path, picks: &[Pick]) -> Result<usize> {
    fs::write(path, picks_to_csv(picks))
        .with_context(|| format!("failed writing csv to {}", path.display()))?;
    Ok(picks.len())
}

/// Writes the full table and both sets as separate sheets.
pub fn write_xlsx(path: &Path, board: &Board) -> Result<usize> {
    let mut workbook = Workbook::new();
    for (name, picks) in [
        ("Table", &board.table),
        ("Safe", &board.safe),
        ("Longshots", &board.longshots),
    ] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_rows(sheet, picks)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(board.table.len())
}

fn write_rows(worksheet: &mut Worksheet, picks: &[Pick]) -> Result<()> {
    for (col_idx, title) in EXPORT_COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, *title)
            .with_context(|| format!("write header ({col_idx})"))?;
    }
    for (idx, pick) in picks.iter().enumerate() {
        let row_idx = (idx + 1) as u32;
        for (col_idx, value) in pick_row(pick).iter().enumerate() {
            worksheet
                .write_string(row_idx, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
        // Keep the numeric columns numeric so they sort in a spreadsheet.
        worksheet
            .write_number(row_idx, 7, pick.price)
            .with_context(|| format!("write price ({row_idx})"))?;
        worksheet
            .write_number(row_idx, 10, pick.value)
            .with_context(|| format!("write value ({row_idx})"))?;
    }
    Ok(())
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
