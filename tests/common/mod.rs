#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};

use odds_board::config::ApiKey;
use odds_board::model::{BookmakerBlock, MarketBlock, MatchEvent, RawOutcome};
use odds_board::odds_fetch::{OddsPage, OddsQuery, OddsSource, parse_odds_json};
use odds_board::sports::{SportInfo, parse_sports_json};

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Serves canned response bodies per sport and counts every call.
#[derive(Default)]
pub struct StubSource {
    pub sports_body: Option<String>,
    pub bodies: HashMap<String, Result<String, String>>,
    pub calls: Cell<usize>,
}

impl StubSource {
    pub fn with_body(mut self, sport: &str, body: &str) -> Self {
        self.bodies.insert(sport.to_string(), Ok(body.to_string()));
        self
    }

    pub fn with_events(self, sport: &str, events: &[serde_json::Value]) -> Self {
        let body = serde_json::Value::Array(events.to_vec()).to_string();
        self.with_body(sport, &body)
    }

    pub fn with_error(mut self, sport: &str, message: &str) -> Self {
        self.bodies.insert(sport.to_string(), Err(message.to_string()));
        self
    }
}

impl OddsSource for StubSource {
    fn list_sports(&self, _api_key: &ApiKey) -> Result<Vec<SportInfo>> {
        self.calls.set(self.calls.get() + 1);
        let body = self
            .sports_body
            .as_deref()
            .ok_or_else(|| anyhow!("http 500 Internal Server Error: down"))?;
        parse_sports_json(body)
    }

    fn fetch_odds(&self, _api_key: &ApiKey, sport: &str, _query: &OddsQuery) -> Result<OddsPage> {
        self.calls.set(self.calls.get() + 1);
        match self.bodies.get(sport) {
            Some(Ok(body)) => parse_odds_json(body),
            Some(Err(message)) => Err(anyhow!("{message}")),
            None => Ok(OddsPage::default()),
        }
    }
}

pub fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// JSON for a match with one h2h market per `(bookmaker, [(outcome, price)])`.
pub fn h2h_event_json(
    id: &str,
    home: &str,
    away: &str,
    kickoff: DateTime<Utc>,
    books: Vec<(&str, Vec<(&str, f64)>)>,
) -> serde_json::Value {
    let bookmakers: Vec<serde_json::Value> = books
        .into_iter()
        .map(|(book, outcomes)| {
            let outcomes: Vec<serde_json::Value> = outcomes
                .into_iter()
                .map(|(name, price)| serde_json::json!({ "name": name, "price": price }))
                .collect();
            serde_json::json!({
                "key": book,
                "title": book,
                "markets": [ { "key": "h2h", "outcomes": outcomes } ]
            })
        })
        .collect();
    serde_json::json!({
        "id": id,
        "home_team": home,
        "away_team": away,
        "commence_time": iso(kickoff),
        "bookmakers": bookmakers
    })
}

/// A match whose single bookmaker quotes the given markets.
pub fn event(
    id: &str,
    kickoff: DateTime<Utc>,
    markets: Vec<(&str, Vec<(&str, f64, Option<f64>)>)>,
) -> MatchEvent {
    MatchEvent {
        id: id.to_string(),
        sport_key: Some("soccer_epl".to_string()),
        home_team: format!("{id} Home"),
        away_team: format!("{id} Away"),
        commence_time: iso(kickoff),
        bookmakers: vec![BookmakerBlock {
            key: "book".to_string(),
            title: "Book".to_string(),
            markets: markets
                .into_iter()
                .map(|(key, outcomes)| MarketBlock {
                    key: key.to_string(),
                    outcomes: outcomes
                        .into_iter()
                        .map(|(name, price, point)| RawOutcome {
                            name: name.to_string(),
                            price: Some(price),
                            point,
                        })
                        .collect(),
                })
                .collect(),
        }],
    }
}

pub fn hours(h: i64) -> Duration {
    Duration::hours(h)
}
