use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::dedup::DedupKey;
use crate::http_client::{DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS};
use crate::odds_fetch::{DEFAULT_API_BASE, DEFAULT_MARKETS, DEFAULT_REGIONS, OddsQuery};
use crate::pipeline::BoardParams;
use crate::selection::{DEFAULT_TOTALS_SHARE, SafePolicy};
use crate::sports::SportSelection;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
const DEMO_API_KEY: &str = "demo";

/// Provider credential. Formatting never reveals the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    TheOddsApi,
    Demo,
}

impl Provider {
    pub fn label(self) -> &'static str {
        match self {
            Provider::TheOddsApi => "theoddsapi",
            Provider::Demo => "demo",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: Provider,
    pub api_key: Option<ApiKey>,
    pub api_base: String,
    pub config_path: PathBuf,
    /// Why the settings file was ignored, when it exists but cannot be used.
    pub config_warning: Option<String>,
    pub sports: SportSelection,
    pub query: OddsQuery,
    pub timeout: Duration,
    pub params: BoardParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::TheOddsApi,
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            config_warning: None,
            sports: SportSelection::Static,
            query: OddsQuery::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            params: BoardParams::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(rename = "API_KEY", alias = "api_key", default)]
    api_key: Option<String>,
}

impl Settings {
    /// Loads `.env.local` and `.env`, then reads the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = BoardParams::default();

        let provider = match get("ODDS_PROVIDER")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("demo") => Provider::Demo,
            _ => Provider::TheOddsApi,
        };
        let config_path = get("ODDS_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config_warning = None;
        let api_key = get("ODDS_API_KEY")
            .and_then(|v| ApiKey::new(&v))
            .or_else(|| match load_key_file(&config_path) {
                Ok(key) => key,
                Err(err) => {
                    config_warning = Some(format!("{err:#}"));
                    None
                }
            })
            .or_else(|| match provider {
                Provider::Demo => ApiKey::new(DEMO_API_KEY),
                Provider::TheOddsApi => None,
            });

        let safe_policy = match get("ODDS_SAFE_POLICY")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("quota") => SafePolicy::MarketQuota {
                totals_share: parse_num(get("ODDS_TOTALS_SHARE_PCT"), DEFAULT_TOTALS_SHARE * 100.0)
                    .clamp(0.0, 100.0)
                    / 100.0,
            },
            _ => SafePolicy::PriceAscending,
        };

        let params = BoardParams {
            safe_count: parse_num(get("ODDS_SAFE_COUNT"), defaults.safe_count),
            longshot_count: parse_num(get("ODDS_LONGSHOT_COUNT"), defaults.longshot_count),
            totals_bonus_pct: parse_num(get("ODDS_TOTALS_BONUS_PCT"), defaults.totals_bonus_pct),
            horizon_hours: parse_num(get("ODDS_HORIZON_HOURS"), defaults.horizon_hours),
            safe_policy,
            dedup_key: get("ODDS_DEDUP_KEY")
                .and_then(|v| DedupKey::parse(&v))
                .unwrap_or_default(),
        }
        .clamped();

        Self {
            provider,
            api_key,
            api_base: get("ODDS_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            config_path,
            config_warning,
            sports: get("ODDS_SPORTS")
                .map(|v| SportSelection::parse(&v))
                .unwrap_or(SportSelection::Static),
            query: OddsQuery {
                regions: get("ODDS_REGIONS")
                    .map(|v| v.to_ascii_lowercase())
                    .unwrap_or_else(|| DEFAULT_REGIONS.to_string()),
                markets: get("ODDS_MARKETS")
                    .map(|v| v.to_ascii_lowercase())
                    .unwrap_or_else(|| DEFAULT_MARKETS.to_string()),
            },
            timeout: Duration::from_secs(
                parse_num(get("ODDS_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS).clamp(1, MAX_TIMEOUT_SECS),
            ),
            params,
        }
    }
}

/// Reads `{"API_KEY": "..."}` from a settings file. A missing file is not an error.
pub fn load_key_file(path: &Path) -> Result<Option<ApiKey>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let file: SettingsFile = serde_json::from_str(&raw)
        .with_context(|| format!("invalid settings file {}", path.display()))?;
    Ok(file.api_key.as_deref().and_then(ApiKey::new))
}

fn parse_num<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}
