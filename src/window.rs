use chrono::{DateTime, Duration, Utc};

use crate::model::Pick;

/// True when `kickoff` lies in `[now, now + horizon]`, both ends inclusive.
pub fn within_horizon(kickoff: DateTime<Utc>, now: DateTime<Utc>, horizon: Duration) -> bool {
    kickoff >= now && kickoff <= now + horizon
}

pub fn retain_within_horizon(picks: &mut Vec<Pick>, now: DateTime<Utc>, horizon: Duration) {
    picks.retain(|p| within_horizon(p.kickoff_utc, now, horizon));
}
