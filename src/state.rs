use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::model::Pick;
use crate::pipeline::{Board, BoardParams, FetchBatch, RunStatus, batch_log_lines, evaluate};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Safe,
    Longshots,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    SafeCount,
    LongshotCount,
    TotalsBonus,
    Horizon,
}

impl Param {
    pub const ALL: [Param; 4] = [
        Param::SafeCount,
        Param::LongshotCount,
        Param::TotalsBonus,
        Param::Horizon,
    ];

    pub fn next(self) -> Self {
        match self {
            Param::SafeCount => Param::LongshotCount,
            Param::LongshotCount => Param::TotalsBonus,
            Param::TotalsBonus => Param::Horizon,
            Param::Horizon => Param::SafeCount,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Param::SafeCount => "Safe N",
            Param::LongshotCount => "Longshot M",
            Param::TotalsBonus => "Totals bonus",
            Param::Horizon => "Horizon",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    ApiKey { buffer: String },
}

pub enum ProviderCommand {
    Refresh(Box<Settings>),
}

pub enum Delta {
    FetchStarted,
    BatchLoaded(FetchBatch),
    Log(String),
}

pub struct AppState {
    pub params: BoardParams,
    pub batch: Option<FetchBatch>,
    pub board: Option<Board>,
    pub view: View,
    pub focus_param: Param,
    pub scroll: usize,
    pub loading: bool,
    pub input: InputMode,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(params: BoardParams) -> Self {
        Self {
            params: params.clamped(),
            batch: None,
            board: None,
            view: View::Safe,
            focus_param: Param::SafeCount,
            scroll: 0,
            loading: false,
            input: InputMode::Normal,
            help_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn set_view(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.scroll = 0;
        }
    }

    pub fn visible_picks(&self) -> &[Pick] {
        let Some(board) = &self.board else {
            return &[];
        };
        match self.view {
            View::Safe => &board.safe,
            View::Longshots => &board.longshots,
            View::Table => &board.table,
        }
    }

    pub fn scroll_down(&mut self) {
        let total = self.visible_picks().len();
        if self.scroll + 1 < total {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn param_value(&self, param: Param) -> String {
        match param {
            Param::SafeCount => self.params.safe_count.to_string(),
            Param::LongshotCount => self.params.longshot_count.to_string(),
            Param::TotalsBonus => format!("{}%", self.params.totals_bonus_pct),
            Param::Horizon => format!("{}h", self.params.horizon_hours),
        }
    }

    /// Moves the focused parameter by `step`, clamped to its bounds, and
    /// re-evaluates the board from the last fetch.
    pub fn adjust_param(&mut self, step: i32, now: DateTime<Utc>) {
        let mut params = self.params;
        match self.focus_param {
            Param::SafeCount => params.safe_count = step_usize(params.safe_count, step),
            Param::LongshotCount => {
                params.longshot_count = step_usize(params.longshot_count, step)
            }
            Param::TotalsBonus => {
                params.totals_bonus_pct = step_u32(params.totals_bonus_pct, step)
            }
            Param::Horizon => params.horizon_hours = step_u32(params.horizon_hours, step),
        }
        let params = params.clamped();
        if params != self.params {
            self.params = params;
            self.reevaluate(now);
        }
    }

    pub fn reevaluate(&mut self, now: DateTime<Utc>) {
        let Some(batch) = &self.batch else {
            return;
        };
        self.board = Some(evaluate(batch, &self.params, now));
        let total = self.visible_picks().len();
        self.scroll = self.scroll.min(total.saturating_sub(1));
    }

    pub fn status_line(&self) -> String {
        if self.loading {
            return "Fetching odds...".to_string();
        }
        let Some(board) = &self.board else {
            return "Press r to fetch odds".to_string();
        };
        match board.status {
            RunStatus::MissingCredential => "No API key: press K to enter one".to_string(),
            RunStatus::NoData => "No data available for the current window".to_string(),
            RunStatus::Ready => format!(
                "{} rows | {} safe | {} longshots | updated {}",
                board.table.len(),
                board.safe.len(),
                board.longshots.len(),
                board.evaluated_at.format("%H:%M:%S UTC")
            ),
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    apply_delta_at(state, delta, Utc::now());
}

pub fn apply_delta_at(state: &mut AppState, delta: Delta, now: DateTime<Utc>) {
    match delta {
        Delta::FetchStarted => {
            state.loading = true;
            state.push_log("[INFO] Refresh started");
        }
        Delta::BatchLoaded(batch) => {
            state.loading = false;
            for line in batch_log_lines(&batch) {
                state.push_log(line);
            }
            state.batch = Some(batch);
            state.reevaluate(now);
            let Some((dropped, status)) = state
                .board
                .as_ref()
                .map(|b| (b.dropped_records, b.status))
            else {
                return;
            };
            if dropped > 0 {
                state.push_log(format!("[INFO] Dropped {dropped} malformed records"));
            }
            if status == RunStatus::NoData {
                state.push_log("[INFO] No data available");
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

fn step_usize(value: usize, step: i32) -> usize {
    if step < 0 {
        value.saturating_sub(step.unsigned_abs() as usize)
    } else {
        value.saturating_add(step as usize)
    }
}

fn step_u32(value: u32, step: i32) -> u32 {
    value.saturating_add_signed(step)
}
