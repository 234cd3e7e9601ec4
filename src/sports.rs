use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ApiKey;
use crate::odds_fetch::OddsSource;

/// Pseudo sport key the provider uses for "next matches across all sports".
pub const UPCOMING_SPORT_KEY: &str = "upcoming";

pub const STATIC_SPORT_KEYS: &[&str] = &[
    "soccer_epl",
    "soccer_uefa_champs_league",
    "basketball_nba",
    "icehockey_nhl",
    "baseball_mlb",
    "americanfootball_nfl",
    "tennis_atp_us_open",
    "basketball_euroleague",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SportSelection {
    Static,
    Active,
    Upcoming,
    Keys(Vec<String>),
}

impl SportSelection {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "static" => SportSelection::Static,
            "active" => SportSelection::Active,
            "upcoming" => SportSelection::Upcoming,
            _ => {
                let keys: Vec<String> = trimmed
                    .split(',')
                    .map(|k| k.trim().to_ascii_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                if keys.is_empty() {
                    SportSelection::Static
                } else {
                    SportSelection::Keys(keys)
                }
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            SportSelection::Static => "static".to_string(),
            SportSelection::Active => "active".to_string(),
            SportSelection::Upcoming => "upcoming".to_string(),
            SportSelection::Keys(keys) => keys.join(","),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SportInfo {
    pub key: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub has_outrights: bool,
}

/// Decodes a list-sports body. A body that is not a JSON list is an error;
/// individual entries that fail to decode are skipped.
pub fn parse_sports_json(raw: &str) -> Result<Vec<SportInfo>> {
    let value: Value = serde_json::from_str(raw).context("invalid sports json")?;
    let Value::Array(items) = value else {
        bail!("sports response is not a list");
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<SportInfo>(item).ok())
        .collect())
}

/// Active sports that carry match markets. Outright-only sports have no h2h
/// or totals and would only produce provider errors.
pub fn active_match_sports(sports: &[SportInfo]) -> Vec<String> {
    sports
        .iter()
        .filter(|s| s.active && !s.has_outrights)
        .map(|s| s.key.clone())
        .collect()
}

pub fn enumerate_sports(
    selection: &SportSelection,
    source: &dyn OddsSource,
    api_key: &ApiKey,
) -> Result<Vec<String>> {
    match selection {
        SportSelection::Static => Ok(STATIC_SPORT_KEYS.iter().map(|k| k.to_string()).collect()),
        SportSelection::Upcoming => Ok(vec![UPCOMING_SPORT_KEY.to_string()]),
        SportSelection::Keys(keys) => Ok(keys.clone()),
        SportSelection::Active => {
            let sports = source
                .list_sports(api_key)
                .context("sports list unavailable")?;
            Ok(active_match_sports(&sports))
        }
    }
}
