use std::collections::HashSet;

use crate::model::Pick;

/// Which fields make two picks the same selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupKey {
    /// Event id, market, line and outcome name.
    #[default]
    Selection,
    /// Event id and outcome name only; collapses across markets and lines.
    MatchOutcome,
}

impl DedupKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "selection" => Some(DedupKey::Selection),
            "match_outcome" | "match-outcome" => Some(DedupKey::MatchOutcome),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DedupKey::Selection => "selection",
            DedupKey::MatchOutcome => "match_outcome",
        }
    }

    fn key_of(self, pick: &Pick) -> (String, String, Option<u64>, String) {
        match self {
            DedupKey::Selection => (
                pick.event_id.clone(),
                pick.market_type.label().to_string(),
                pick.line.map(f64::to_bits),
                pick.outcome_name.to_ascii_lowercase(),
            ),
            DedupKey::MatchOutcome => (
                pick.event_id.clone(),
                String::new(),
                None,
                pick.outcome_name.to_ascii_lowercase(),
            ),
        }
    }
}

/// Collapses picks sharing `key`, keeping the highest price.
///
/// Ties on price keep the earliest input row. The result is ordered by
/// kickoff, then match, market and outcome.
pub fn dedup_best_price(picks: Vec<Pick>, key: DedupKey) -> Vec<Pick> {
    let mut ranked = picks;
    // Stable sort keeps input order among equal prices.
    ranked.sort_by(|a, b| b.price.total_cmp(&a.price));

    let mut seen = HashSet::new();
    let mut out: Vec<Pick> = ranked
        .into_iter()
        .filter(|p| seen.insert(key.key_of(p)))
        .collect();

    out.sort_by(|a, b| {
        a.kickoff_utc
            .cmp(&b.kickoff_utc)
            .then_with(|| a.match_label.cmp(&b.match_label))
            .then_with(|| a.market_type.label().cmp(b.market_type.label()))
            .then_with(|| a.outcome_name.cmp(&b.outcome_name))
    });
    out
}
