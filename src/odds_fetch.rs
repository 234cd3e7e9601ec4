use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, USER_AGENT};
use serde_json::Value;

use crate::config::ApiKey;
use crate::http_client::http_client;
use crate::model::MatchEvent;
use crate::sports::{SportInfo, parse_sports_json};

pub const DEFAULT_API_BASE: &str = "https://api.the-odds-api.com/v4";
pub const DEFAULT_REGIONS: &str = "eu";
pub const DEFAULT_MARKETS: &str = "h2h,totals";

const USER_AGENT_VALUE: &str = "odds-board/0.1";
const SNIPPET_CHARS: usize = 220;

/// Request quota reported by the provider on each response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quota {
    pub remaining: Option<u32>,
    pub used: Option<u32>,
}

impl Quota {
    fn is_empty(&self) -> bool {
        self.remaining.is_none() && self.used.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OddsPage {
    pub events: Vec<MatchEvent>,
    /// Elements of the response list that did not decode as a match.
    pub dropped: usize,
    pub quota: Option<Quota>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OddsQuery {
    pub regions: String,
    pub markets: String,
}

impl Default for OddsQuery {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS.to_string(),
            markets: DEFAULT_MARKETS.to_string(),
        }
    }
}

/// Where match odds come from. One call per sport, no retries.
pub trait OddsSource {
    fn list_sports(&self, api_key: &ApiKey) -> Result<Vec<SportInfo>>;
    fn fetch_odds(&self, api_key: &ApiKey, sport: &str, query: &OddsQuery) -> Result<OddsPage>;
}

pub struct HttpOddsSource {
    client: Client,
    base_url: String,
}

impl HttpOddsSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<(String, Quota)> {
        let url = format!("{}/{}", self.base_url, path);
        // Strip the URL from transport errors: it carries the api key.
        let resp = self
            .client
            .get(&url)
            .query(params)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .map_err(|err| anyhow!("request failed: {}", err.without_url()))?;
        let status = resp.status();
        let quota = quota_from_headers(resp.headers());
        let body = resp
            .text()
            .map_err(|err| anyhow!("failed reading body: {}", err.without_url()))?;
        if !status.is_success() {
            return Err(anyhow!("http {}: {}", status, body_snippet(&body)));
        }
        Ok((body, quota))
    }
}

impl OddsSource for HttpOddsSource {
    fn list_sports(&self, api_key: &ApiKey) -> Result<Vec<SportInfo>> {
        let (body, _) = self.get("sports", &[("apiKey", api_key.expose())])?;
        parse_sports_json(&body)
    }

    fn fetch_odds(&self, api_key: &ApiKey, sport: &str, query: &OddsQuery) -> Result<OddsPage> {
        let path = format!("sports/{}/odds", sport.trim());
        let (body, quota) = self.get(
            &path,
            &[
                ("apiKey", api_key.expose()),
                ("regions", query.regions.as_str()),
                ("markets", query.markets.as_str()),
                ("oddsFormat", "decimal"),
                ("dateFormat", "iso"),
            ],
        )?;
        let mut page = parse_odds_json(&body)?;
        page.quota = (!quota.is_empty()).then_some(quota);
        Ok(page)
    }
}

/// Decodes an odds body. Anything but a JSON list is an error; list elements
/// that do not decode as a match are counted and skipped.
pub fn parse_odds_json(raw: &str) -> Result<OddsPage> {
    let value: Value = serde_json::from_str(raw).context("invalid odds json")?;
    let Value::Array(items) = value else {
        bail!("odds response is not a list");
    };
    let mut page = OddsPage::default();
    for item in items {
        match serde_json::from_value::<MatchEvent>(item) {
            Ok(event) => page.events.push(event),
            Err(_) => page.dropped += 1,
        }
    }
    Ok(page)
}

fn quota_from_headers(headers: &HeaderMap) -> Quota {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u32)
    };
    Quota {
        remaining: read("x-requests-remaining"),
        used: read("x-requests-used"),
    }
}

fn body_snippet(body: &str) -> String {
    body.trim()
        .replace(['\n', '\r'], " ")
        .chars()
        .take(SNIPPET_CHARS)
        .collect()
}
