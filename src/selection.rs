use std::cmp::Ordering;

use crate::model::{MarketType, Pick};

pub const SAFE_MIN_PRICE: f64 = 1.40;
pub const LONGSHOT_MIN_PRICE: f64 = 2.00;
pub const LONGSHOT_MAX_PRICE: f64 = 5.50;

pub const DEFAULT_SAFE_COUNT: usize = 20;
pub const DEFAULT_LONGSHOT_COUNT: usize = 10;
pub const MIN_SET_COUNT: usize = 5;
pub const MAX_SET_COUNT: usize = 50;
pub const DEFAULT_TOTALS_SHARE: f64 = 0.60;

/// How the safe set is filled before its final price ordering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SafePolicy {
    /// Cheapest qualifying prices first.
    #[default]
    PriceAscending,
    /// Reserve `totals_share` of the slots for totals picks ranked by value,
    /// fill the rest from moneyline picks ranked by value. Other markets never
    /// enter the safe set under this policy.
    MarketQuota { totals_share: f64 },
}

impl SafePolicy {
    pub fn label(self) -> &'static str {
        match self {
            SafePolicy::PriceAscending => "price",
            SafePolicy::MarketQuota { .. } => "quota",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    pub safe_count: usize,
    pub longshot_count: usize,
    pub safe_policy: SafePolicy,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            safe_count: DEFAULT_SAFE_COUNT,
            longshot_count: DEFAULT_LONGSHOT_COUNT,
            safe_policy: SafePolicy::PriceAscending,
        }
    }
}

pub fn is_safe(pick: &Pick) -> bool {
    pick.price >= SAFE_MIN_PRICE
}

pub fn is_longshot(pick: &Pick) -> bool {
    (LONGSHOT_MIN_PRICE..=LONGSHOT_MAX_PRICE).contains(&pick.price)
}

/// Safe picks, at most `cfg.safe_count`, ordered by ascending price.
pub fn select_safe(picks: &[Pick], cfg: &SelectionConfig) -> Vec<Pick> {
    let eligible: Vec<&Pick> = picks.iter().filter(|p| is_safe(p)).collect();
    let mut chosen = match cfg.safe_policy {
        SafePolicy::PriceAscending => {
            let mut sorted = eligible;
            sorted.sort_by(|a, b| by_price(a, b));
            sorted.truncate(cfg.safe_count);
            sorted
        }
        SafePolicy::MarketQuota { totals_share } => {
            quota_fill(eligible, cfg.safe_count, totals_share)
        }
    };
    chosen.sort_by(|a, b| by_price(a, b));
    chosen.into_iter().cloned().collect()
}

/// Longshot picks priced inside the band, at most `cfg.longshot_count`.
pub fn select_longshots(picks: &[Pick], cfg: &SelectionConfig) -> Vec<Pick> {
    let mut eligible: Vec<&Pick> = picks.iter().filter(|p| is_longshot(p)).collect();
    eligible.sort_by(|a, b| by_price(a, b));
    eligible
        .into_iter()
        .take(cfg.longshot_count)
        .cloned()
        .collect()
}

fn quota_fill(eligible: Vec<&Pick>, count: usize, totals_share: f64) -> Vec<&Pick> {
    let share = if totals_share.is_finite() {
        totals_share.clamp(0.0, 1.0)
    } else {
        DEFAULT_TOTALS_SHARE
    };
    let totals_quota = ((count as f64) * share).round() as usize;

    let market_ranked = |market: MarketType| {
        let mut ranked: Vec<&Pick> = eligible
            .iter()
            .copied()
            .filter(|p| p.market_type == market)
            .collect();
        ranked.sort_by(|a, b| by_value_desc(a, b));
        ranked
    };
    let mut totals = market_ranked(MarketType::Totals).into_iter();
    let moneyline = market_ranked(MarketType::Moneyline);

    let mut chosen: Vec<&Pick> = totals.by_ref().take(totals_quota.min(count)).collect();
    let remaining = count - chosen.len();
    chosen.extend(moneyline.into_iter().take(remaining));
    // Top up from leftover totals when moneyline runs short.
    let missing = count - chosen.len();
    chosen.extend(totals.take(missing));
    chosen
}

fn by_price(a: &Pick, b: &Pick) -> Ordering {
    a.price
        .total_cmp(&b.price)
        .then_with(|| a.kickoff_utc.cmp(&b.kickoff_utc))
        .then_with(|| a.match_label.cmp(&b.match_label))
}

fn by_value_desc(a: &Pick, b: &Pick) -> Ordering {
    b.value.total_cmp(&a.value).then_with(|| by_price(a, b))
}
