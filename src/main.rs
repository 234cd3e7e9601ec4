use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

use odds_board::config::{ApiKey, Settings};
use odds_board::export::{DEFAULT_CSV_PATH, DEFAULT_XLSX_PATH, write_csv, write_xlsx};
use odds_board::model::Pick;
use odds_board::provider::spawn_provider;
use odds_board::state::{
    AppState, Delta, InputMode, Param, ProviderCommand, View, apply_delta,
};

const WINDOW_CHECK_EVERY: Duration = Duration::from_secs(60);

const DISCLAIMER: &str =
    "Value = est. probability x price - 1. Static heuristic re-weighting, not a predictive model.";

struct App {
    state: AppState,
    settings: Settings,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(settings: Settings, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(settings.params),
            settings,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if let InputMode::ApiKey { buffer } = &mut self.state.input {
            match key.code {
                KeyCode::Enter => {
                    let entered = ApiKey::new(buffer);
                    self.state.input = InputMode::Normal;
                    match entered {
                        Some(api_key) => {
                            self.settings.api_key = Some(api_key);
                            self.state.push_log("[INFO] API key set for this session");
                            self.request_refresh();
                        }
                        None => self.state.push_log("[WARN] Empty API key ignored"),
                    }
                }
                KeyCode::Esc => self.state.input = InputMode::Normal,
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_refresh(),
            KeyCode::Char('1') => self.state.set_view(View::Safe),
            KeyCode::Char('2') => self.state.set_view(View::Longshots),
            KeyCode::Char('3') => self.state.set_view(View::Table),
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_up(),
            KeyCode::Tab => self.state.focus_param = self.state.focus_param.next(),
            KeyCode::Left | KeyCode::Char('h') => self.state.adjust_param(-1, Utc::now()),
            KeyCode::Right | KeyCode::Char('l') => self.state.adjust_param(1, Utc::now()),
            KeyCode::Char('e') => self.export_csv(),
            KeyCode::Char('x') => self.export_xlsx(),
            KeyCode::Char('K') => {
                self.state.input = InputMode::ApiKey {
                    buffer: String::new(),
                }
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn request_refresh(&mut self) {
        if self.state.loading {
            self.state.push_log("[INFO] Refresh already running");
            return;
        }
        if self.settings.api_key.is_none() {
            self.state
                .push_log("[WARN] No API key: set ODDS_API_KEY, add config.json or press K");
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Odds fetch unavailable");
            return;
        };
        if tx
            .send(ProviderCommand::Refresh(Box::new(self.settings.clone())))
            .is_err()
        {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            self.state.loading = true;
        }
    }

    fn export_csv(&mut self) {
        let Some(board) = &self.state.board else {
            self.state.push_log("[INFO] Nothing to export yet");
            return;
        };
        let msg = match write_csv(Path::new(DEFAULT_CSV_PATH), &board.table) {
            Ok(rows) => format!("[INFO] Exported {rows} rows to {DEFAULT_CSV_PATH}"),
            Err(err) => format!("[WARN] CSV export failed: {err:#}"),
        };
        self.state.push_log(msg);
    }

    fn export_xlsx(&mut self) {
        let Some(board) = &self.state.board else {
            self.state.push_log("[INFO] Nothing to export yet");
            return;
        };
        let msg = match write_xlsx(Path::new(DEFAULT_XLSX_PATH), board) {
            Ok(rows) => format!("[INFO] Exported {rows} rows to {DEFAULT_XLSX_PATH}"),
            Err(err) => format!("[WARN] XLSX export failed: {err:#}"),
        };
        self.state.push_log(msg);
    }
}

fn main() -> io::Result<()> {
    let settings = Settings::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(tx, cmd_rx);

    let mut app = App::new(settings, Some(cmd_tx));
    app.state.push_log(format!(
        "[INFO] Provider: {} | sports: {} | regions: {} | markets: {}",
        app.settings.provider.label(),
        app.settings.sports.label(),
        app.settings.query.regions,
        app.settings.query.markets
    ));
    if let Some(warning) = app.settings.config_warning.clone() {
        app.state.push_log(format!("[WARN] Settings file ignored: {warning}"));
    }
    if app.settings.api_key.is_some() {
        app.request_refresh();
    } else {
        app.state
            .push_log("[WARN] No API key: set ODDS_API_KEY, add config.json or press K");
    }
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();
    let mut last_window_check = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        // Drop matches that kicked off since the last evaluation.
        if last_window_check.elapsed() >= WINDOW_CHECK_EVERY {
            app.state.reevaluate(Utc::now());
            last_window_check = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_params(frame, chunks[1], &app.state);
    render_picks(frame, chunks[2], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(format!("{}\n{}", footer_text(), DISCLAIMER))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);

    if let InputMode::ApiKey { buffer } = &app.state.input {
        render_key_prompt(frame, frame.size(), buffer);
    } else if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let title = format!(
        "ODDS BOARD | {} | {} | {}",
        view_label(app.state.view),
        app.settings.sports.label(),
        app.state.status_line()
    );
    let line2 = format!(
        "   safe >= 1.40 | longshots 2.00-5.50 | dedup: {} | safe policy: {}",
        app.state.params.dedup_key.label(),
        app.state.params.safe_policy.label()
    );
    format!(" $ {title}\n{line2}")
}

fn footer_text() -> &'static str {
    "r Refresh | 1 Safe | 2 Longshots | 3 Table | j/k Scroll | Tab/←/→ Params | e CSV | x XLSX | K Key | ? Help | q Quit"
}

fn render_params(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Parameters").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(inner);
    for (idx, param) in Param::ALL.iter().enumerate() {
        let focused = *param == state.focus_param;
        let style = if focused {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let text = format!(" {}: {} ", param.label(), state.param_value(*param));
        frame.render_widget(Paragraph::new(text).style(style), cols[idx]);
    }
}

fn render_picks(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(view_label(state.view))
        .borders(Borders::ALL);
    let picks = state.visible_picks();
    if picks.is_empty() {
        let msg = if state.loading {
            "Fetching odds..."
        } else if state.board.is_some() {
            "No picks match the current filters"
        } else {
            "No data yet"
        };
        let empty = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let visible = area.height.saturating_sub(3) as usize;
    let start = state.scroll.min(picks.len().saturating_sub(1));
    let end = (start + visible).min(picks.len());

    let header = Row::new(
        [
            "#", "Kickoff", "Sport", "Match", "Market", "Pick", "Price", "Impl", "Est", "Value",
            "Book",
        ]
        .map(Cell::from),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = picks[start..end]
        .iter()
        .enumerate()
        .map(|(offset, pick)| pick_row(start + offset + 1, pick));

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(11),
            Constraint::Length(18),
            Constraint::Min(24),
            Constraint::Length(16),
            Constraint::Length(18),
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}

fn pick_row(rank: usize, pick: &Pick) -> Row<'static> {
    let value_style = if pick.value > 0.0 {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };
    Row::new(vec![
        Cell::from(rank.to_string()),
        Cell::from(pick.kickoff_utc.format("%d.%m %H:%M").to_string()),
        Cell::from(pick.sport.clone()),
        Cell::from(pick.match_label.clone()),
        Cell::from(pick.market_label()),
        Cell::from(pick.outcome_name.clone()),
        Cell::from(format!("{:.2}", pick.price)),
        Cell::from(format!("{:.0}%", pick.implied_probability * 100.0)),
        Cell::from(format!("{:.0}%", pick.estimated_probability * 100.0)),
        Cell::from(format!("{:+.2}", pick.value)).style(value_style),
        Cell::from(pick.bookmaker.clone()),
    ])
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn view_label(view: View) -> &'static str {
    match view {
        View::Safe => "SAFE",
        View::Longshots => "LONGSHOTS",
        View::Table => "ALL ROWS",
    }
}

fn render_key_prompt(frame: &mut Frame, area: Rect, buffer: &str) {
    let popup_area = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup_area);
    let masked = "*".repeat(buffer.chars().count());
    let text = format!("API key: {masked}\n\nEnter to confirm, Esc to cancel");
    let prompt = Paragraph::new(text)
        .block(Block::default().title("Credential").borders(Borders::ALL));
    frame.render_widget(prompt, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Odds Board - Help",
        "",
        "  r            Refresh odds",
        "  1 / 2 / 3    Safe / Longshots / All rows",
        "  j/k or ↑/↓   Scroll",
        "  Tab          Select parameter",
        "  ←/→ or h/l   Adjust parameter",
        "  e            Export table to CSV",
        "  x            Export workbook (XLSX)",
        "  K            Enter API key",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Safe: price >= 1.40, cheapest first.",
        "Longshots: price 2.00-5.50, cheapest first.",
        "Totals picks get the bonus on their implied probability.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
