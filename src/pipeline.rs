use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::config::{Provider, Settings};
use crate::dedup::{DedupKey, dedup_best_price};
use crate::demo_feed::DemoOddsSource;
use crate::flatten::flatten_event;
use crate::model::{MatchEvent, Pick};
use crate::odds_fetch::{HttpOddsSource, OddsSource, Quota};
use crate::scoring::{DEFAULT_TOTALS_BONUS_PCT, MAX_TOTALS_BONUS_PCT, ScoringConfig, score_picks};
use crate::selection::{
    DEFAULT_LONGSHOT_COUNT, DEFAULT_SAFE_COUNT, MAX_SET_COUNT, MIN_SET_COUNT, SafePolicy,
    SelectionConfig, select_longshots, select_safe,
};
use crate::sports::enumerate_sports;
use crate::window::retain_within_horizon;

pub const DEFAULT_HORIZON_HOURS: u32 = 24;
pub const MIN_HORIZON_HOURS: u32 = 6;
pub const MAX_HORIZON_HOURS: u32 = 48;

/// User-adjustable knobs applied after the fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardParams {
    pub safe_count: usize,
    pub longshot_count: usize,
    pub totals_bonus_pct: u32,
    pub horizon_hours: u32,
    pub safe_policy: SafePolicy,
    pub dedup_key: DedupKey,
}

impl Default for BoardParams {
    fn default() -> Self {
        Self {
            safe_count: DEFAULT_SAFE_COUNT,
            longshot_count: DEFAULT_LONGSHOT_COUNT,
            totals_bonus_pct: DEFAULT_TOTALS_BONUS_PCT,
            horizon_hours: DEFAULT_HORIZON_HOURS,
            safe_policy: SafePolicy::PriceAscending,
            dedup_key: DedupKey::Selection,
        }
    }
}

impl BoardParams {
    pub fn clamped(self) -> Self {
        Self {
            safe_count: self.safe_count.clamp(MIN_SET_COUNT, MAX_SET_COUNT),
            longshot_count: self.longshot_count.clamp(MIN_SET_COUNT, MAX_SET_COUNT),
            totals_bonus_pct: self.totals_bonus_pct.min(MAX_TOTALS_BONUS_PCT),
            horizon_hours: self.horizon_hours.clamp(MIN_HORIZON_HOURS, MAX_HORIZON_HOURS),
            ..self
        }
    }

    pub fn horizon(&self) -> Duration {
        Duration::hours(i64::from(self.horizon_hours))
    }

    pub fn scoring(&self) -> ScoringConfig {
        ScoringConfig::from_percent(self.totals_bonus_pct)
    }

    pub fn selection(&self) -> SelectionConfig {
        SelectionConfig {
            safe_count: self.safe_count,
            longshot_count: self.longshot_count,
            safe_policy: self.safe_policy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// No credential; nothing was requested.
    MissingCredential,
    /// Run completed but no pick survived.
    NoData,
    Ready,
}

/// Result of one per-sport request.
#[derive(Debug, Clone)]
pub struct SportFetch {
    pub sport: String,
    pub events: Vec<MatchEvent>,
    pub dropped: usize,
    pub error: Option<String>,
}

impl SportFetch {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything the network stage produced.
#[derive(Debug, Clone)]
pub struct FetchBatch {
    pub fetched_at: DateTime<Utc>,
    pub missing_credential: bool,
    /// Sport enumeration or source setup failed; no sport was requested.
    pub source_error: Option<String>,
    pub fetches: Vec<SportFetch>,
    pub quota: Option<Quota>,
}

impl FetchBatch {
    pub fn missing_credential(now: DateTime<Utc>) -> Self {
        Self {
            fetched_at: now,
            missing_credential: true,
            source_error: None,
            fetches: Vec::new(),
            quota: None,
        }
    }

    pub fn source_failed(now: DateTime<Utc>, message: String) -> Self {
        Self {
            fetched_at: now,
            missing_credential: false,
            source_error: Some(message),
            fetches: Vec::new(),
            quota: None,
        }
    }

    pub fn event_count(&self) -> usize {
        self.fetches.iter().map(|f| f.events.len()).sum()
    }

    pub fn failed_sports(&self) -> usize {
        self.fetches.iter().filter(|f| !f.is_ok()).count()
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    pub status: RunStatus,
    pub evaluated_at: DateTime<Utc>,
    /// Full deduplicated table, ordered by kickoff.
    pub table: Vec<Pick>,
    pub safe: Vec<Pick>,
    pub longshots: Vec<Pick>,
    pub dropped_records: usize,
}

impl Board {
    pub fn empty(status: RunStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            evaluated_at: now,
            table: Vec::new(),
            safe: Vec::new(),
            longshots: Vec::new(),
            dropped_records: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub batch: FetchBatch,
    pub board: Board,
}

pub fn build_source(settings: &Settings) -> Result<Box<dyn OddsSource + Send>> {
    Ok(match settings.provider {
        Provider::TheOddsApi => Box::new(HttpOddsSource::new(&settings.api_base, settings.timeout)?),
        Provider::Demo => Box::new(DemoOddsSource::new()),
    })
}

/// Network stage: enumerate sports, then one sequential request per sport.
/// A failed sport is recorded and the fold moves on.
pub fn collect(settings: &Settings, source: &dyn OddsSource, now: DateTime<Utc>) -> FetchBatch {
    let Some(api_key) = settings.api_key.as_ref() else {
        return FetchBatch::missing_credential(now);
    };

    let sports = match enumerate_sports(&settings.sports, source, api_key) {
        Ok(sports) => sports,
        Err(err) => return FetchBatch::source_failed(now, format!("{err:#}")),
    };

    let mut batch = FetchBatch {
        fetched_at: now,
        missing_credential: false,
        source_error: None,
        fetches: Vec::new(),
        quota: None,
    };

    for sport in sports {
        let fetch = match source.fetch_odds(api_key, &sport, &settings.query) {
            Ok(page) => {
                if page.quota.is_some() {
                    batch.quota = page.quota;
                }
                SportFetch {
                    sport,
                    events: page.events,
                    dropped: page.dropped,
                    error: None,
                }
            }
            Err(err) => SportFetch {
                sport,
                events: Vec::new(),
                dropped: 0,
                error: Some(format!("{err:#}")),
            },
        };
        batch.fetches.push(fetch);
    }
    batch
}

/// Pure stage: flatten, time filter, dedup, score and select.
pub fn evaluate(batch: &FetchBatch, params: &BoardParams, now: DateTime<Utc>) -> Board {
    if batch.missing_credential {
        return Board::empty(RunStatus::MissingCredential, now);
    }

    let mut picks = Vec::new();
    let mut dropped = 0usize;
    for fetch in &batch.fetches {
        dropped += fetch.dropped;
        for event in &fetch.events {
            let flat = flatten_event(event, &fetch.sport);
            dropped += flat.dropped;
            picks.extend(flat.picks);
        }
    }

    retain_within_horizon(&mut picks, now, params.horizon());
    let mut table = dedup_best_price(picks, params.dedup_key);
    score_picks(&mut table, &params.scoring());

    let selection = params.selection();
    let safe = select_safe(&table, &selection);
    let longshots = select_longshots(&table, &selection);

    Board {
        status: if table.is_empty() {
            RunStatus::NoData
        } else {
            RunStatus::Ready
        },
        evaluated_at: now,
        table,
        safe,
        longshots,
        dropped_records: dropped,
    }
}

pub fn run(
    settings: &Settings,
    source: &dyn OddsSource,
    now: DateTime<Utc>,
) -> PipelineReport {
    let batch = collect(settings, source, now);
    let board = evaluate(&batch, &settings.params, now);
    PipelineReport { batch, board }
}

/// Console lines describing a batch, one per sport plus a summary.
pub fn batch_log_lines(batch: &FetchBatch) -> Vec<String> {
    if batch.missing_credential {
        return vec!["[WARN] No API key configured".to_string()];
    }
    let mut lines = Vec::new();
    if let Some(err) = &batch.source_error {
        lines.push(format!("[WARN] Odds source failed: {err}"));
    }
    for fetch in &batch.fetches {
        match &fetch.error {
            None if fetch.dropped > 0 => lines.push(format!(
                "[INFO] {}: {} events ({} malformed skipped)",
                fetch.sport,
                fetch.events.len(),
                fetch.dropped
            )),
            None => lines.push(format!("[INFO] {}: {} events", fetch.sport, fetch.events.len())),
            Some(err) => lines.push(format!("[WARN] {}: unavailable ({err})", fetch.sport)),
        }
    }
    if let Some(quota) = batch.quota {
        lines.push(format!(
            "[INFO] Quota: {} remaining, {} used",
            quota
                .remaining
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string()),
            quota
                .used
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string())
        ));
    }
    lines.push(format!(
        "[INFO] Fetched {} events from {} sports ({} unavailable)",
        batch.event_count(),
        batch.fetches.len(),
        batch.failed_sports()
    ));
    lines
}
