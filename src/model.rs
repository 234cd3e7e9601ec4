use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One match as returned by the odds provider.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchEvent {
    pub id: String,
    #[serde(default)]
    pub sport_key: Option<String>,
    pub home_team: String,
    pub away_team: String,
    /// Kept raw; a record with an unparseable kickoff is dropped during flattening.
    pub commence_time: String,
    #[serde(default)]
    pub bookmakers: Vec<BookmakerBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookmakerBlock {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<MarketBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketBlock {
    #[serde(default)]
    pub key: String,
    /// Elements that are not outcome objects decode as blank outcomes, which
    /// flattening drops one by one.
    #[serde(default, deserialize_with = "lenient_outcomes")]
    pub outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOutcome {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub point: Option<f64>,
}

fn lenient_outcomes<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RawOutcome>, D::Error> {
    let items = Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

/// Anything but a JSON number reads as absent.
fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.and_then(|v| v.as_f64()))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarketType {
    Moneyline,
    Totals,
    Other(String),
}

impl MarketType {
    pub fn classify(key: &str) -> Self {
        let lowered = key.trim().to_ascii_lowercase();
        if lowered.contains("h2h") {
            MarketType::Moneyline
        } else if lowered.contains("totals") {
            MarketType::Totals
        } else {
            MarketType::Other(lowered)
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MarketType::Moneyline => "moneyline",
            MarketType::Totals => "totals",
            MarketType::Other(key) => key.as_str(),
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A flattened, priced selection. Created fresh on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub event_id: String,
    pub sport: String,
    pub match_label: String,
    pub kickoff_utc: DateTime<Utc>,
    pub bookmaker: String,
    pub market_type: MarketType,
    /// Only set for totals picks.
    pub line: Option<f64>,
    pub outcome_name: String,
    pub price: f64,
    pub implied_probability: f64,
    pub estimated_probability: f64,
    pub value: f64,
}

impl Pick {
    /// Builds an unscored pick; estimated probability starts at the implied one.
    /// Returns `None` for prices that are not valid decimal odds.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_id: &str,
        sport: &str,
        match_label: &str,
        kickoff_utc: DateTime<Utc>,
        bookmaker: &str,
        market_type: MarketType,
        line: Option<f64>,
        outcome_name: &str,
        price: f64,
    ) -> Option<Self> {
        if !is_valid_price(price) {
            return None;
        }
        let implied = 1.0 / price;
        Some(Self {
            event_id: event_id.to_string(),
            sport: sport.to_string(),
            match_label: match_label.to_string(),
            kickoff_utc,
            bookmaker: bookmaker.to_string(),
            market_type,
            line,
            outcome_name: outcome_name.to_string(),
            price,
            implied_probability: implied,
            estimated_probability: implied,
            value: implied * price - 1.0,
        })
    }

    pub fn market_label(&self) -> String {
        match (&self.market_type, self.line) {
            (MarketType::Totals, Some(line)) => format!("Over/Under {line}"),
            (market, _) => market.label().to_string(),
        }
    }
}

pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 1.0
}

pub fn match_label(home: &str, away: &str) -> String {
    format!("{} vs {}", home.trim(), away.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_market_keys() {
        assert_eq!(MarketType::classify("h2h"), MarketType::Moneyline);
        assert_eq!(MarketType::classify("h2h_lay"), MarketType::Moneyline);
        assert_eq!(MarketType::classify("totals"), MarketType::Totals);
        assert_eq!(MarketType::classify("alternate_totals"), MarketType::Totals);
        assert_eq!(
            MarketType::classify("spreads"),
            MarketType::Other("spreads".to_string())
        );
    }

    #[test]
    fn rejects_non_decimal_prices() {
        let kickoff = Utc::now();
        let mk = |price| {
            Pick::new(
                "e",
                "s",
                "A vs B",
                kickoff,
                "book",
                MarketType::Moneyline,
                None,
                "A",
                price,
            )
        };
        assert!(mk(0.0).is_none());
        assert!(mk(-1.5).is_none());
        assert!(mk(0.5).is_none());
        assert!(mk(f64::NAN).is_none());
        assert!(mk(f64::INFINITY).is_none());
        let pick = mk(1.0).expect("evens-or-better price is valid");
        assert!((pick.implied_probability - 1.0).abs() < 1e-12);
    }
}
