//! Static heuristic re-weighting of market prices.
//!
//! This is not a predictive model: there is no calibration and no historical
//! data. Totals picks get a flat additive bonus on their implied probability
//! and everything else is scored at the price the market quotes.

use crate::model::{MarketType, Pick};

pub const MAX_ESTIMATED_PROBABILITY: f64 = 0.99;
pub const DEFAULT_TOTALS_BONUS_PCT: u32 = 10;
pub const MAX_TOTALS_BONUS_PCT: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Fraction, e.g. `0.10` for a 10% bonus.
    pub totals_bonus: f64,
}

impl ScoringConfig {
    pub fn from_percent(pct: u32) -> Self {
        Self {
            totals_bonus: f64::from(pct.min(MAX_TOTALS_BONUS_PCT)) / 100.0,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::from_percent(DEFAULT_TOTALS_BONUS_PCT)
    }
}

pub fn score_pick(pick: &mut Pick, cfg: &ScoringConfig) {
    let implied = 1.0 / pick.price;
    let boosted = match pick.market_type {
        MarketType::Totals => implied * (1.0 + cfg.totals_bonus),
        _ => implied,
    };
    let estimated = boosted.min(MAX_ESTIMATED_PROBABILITY);
    pick.implied_probability = implied;
    pick.estimated_probability = estimated;
    pick.value = estimated * pick.price - 1.0;
}

pub fn score_picks(picks: &mut [Pick], cfg: &ScoringConfig) {
    for pick in picks {
        score_pick(pick, cfg);
    }
}
