use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;

use odds_board::config::{ApiKey, Provider, Settings};
use odds_board::export::{write_csv, write_xlsx};
use odds_board::model::Pick;
use odds_board::pipeline::{RunStatus, batch_log_lines, build_source, run};

fn main() -> Result<()> {
    let mut settings = Settings::from_env();
    if let Some(warning) = &settings.config_warning {
        eprintln!("[WARN] Settings file ignored: {warning}");
    }
    if has_flag("--demo") {
        settings.provider = Provider::Demo;
        settings.api_key = settings.api_key.or_else(|| ApiKey::new("demo"));
    }
    if settings.api_key.is_none() {
        settings.api_key = prompt_api_key()?;
    }

    let source = build_source(&settings)?;
    let report = run(&settings, source.as_ref(), Utc::now());

    for line in batch_log_lines(&report.batch) {
        if line.starts_with("[WARN]") {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    let board = &report.board;
    match board.status {
        RunStatus::MissingCredential => {
            return Err(anyhow!(
                "no API key: set ODDS_API_KEY or add API_KEY to {}",
                settings.config_path.display()
            ));
        }
        RunStatus::NoData => {
            println!("No data available.");
            return Ok(());
        }
        RunStatus::Ready => {}
    }

    println!();
    print_picks("SAFE", &board.safe);
    println!();
    print_picks("LONGSHOTS", &board.longshots);
    if board.dropped_records > 0 {
        println!("\nDropped {} malformed records", board.dropped_records);
    }

    if let Some(path) = path_arg("--csv") {
        let rows = write_csv(&path, &board.table)?;
        println!("Wrote {rows} rows to {}", path.display());
    }
    if let Some(path) = path_arg("--xlsx") {
        let rows = write_xlsx(&path, board)?;
        println!("Wrote {rows} rows to {}", path.display());
    }
    Ok(())
}

fn print_picks(title: &str, picks: &[Pick]) {
    println!("{title} ({})", picks.len());
    for (idx, pick) in picks.iter().enumerate() {
        println!(
            "{:>3}. {} | {:<36} | {:<18} | {:<20} | {:>5.2} | value {:+.3}",
            idx + 1,
            pick.kickoff_utc.format("%Y-%m-%d %H:%M"),
            pick.match_label,
            pick.market_label(),
            pick.outcome_name,
            pick.price,
            pick.value
        );
    }
}

fn prompt_api_key() -> Result<Option<ApiKey>> {
    print!("API key: ");
    io::stdout().flush().context("flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed reading API key")?;
    Ok(ApiKey::new(&line))
}

fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}

fn path_arg(flag: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}
