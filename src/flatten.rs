use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::model::{MarketType, MatchEvent, Pick, match_label};

/// Output of flattening a batch: the picks plus how many records were discarded.
#[derive(Debug, Clone, Default)]
pub struct Flattened {
    pub picks: Vec<Pick>,
    pub dropped: usize,
}

/// Walks `event -> bookmaker -> market -> outcome` into one pick per outcome.
///
/// The sport is taken from the event when the provider reports one, else from
/// `fallback_sport`. An event whose kickoff cannot be parsed yields nothing and
/// counts as a single dropped record; outcomes without a name or a usable
/// price are dropped individually.
pub fn flatten_event(event: &MatchEvent, fallback_sport: &str) -> Flattened {
    let mut out = Flattened::default();
    let Some(kickoff) = parse_kickoff(&event.commence_time) else {
        out.dropped = 1;
        return out;
    };
    let sport = event
        .sport_key
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback_sport);
    let label = match_label(&event.home_team, &event.away_team);

    for bookmaker in &event.bookmakers {
        for market in &bookmaker.markets {
            let market_type = MarketType::classify(&market.key);
            // Totals carry the first outcome's point for the whole market.
            let line = match market_type {
                MarketType::Totals => market.outcomes.first().and_then(|o| o.point),
                _ => None,
            };
            for outcome in &market.outcomes {
                let name = outcome.name.trim();
                let Some(price) = outcome.price.filter(|_| !name.is_empty()) else {
                    out.dropped += 1;
                    continue;
                };
                match Pick::new(
                    &event.id,
                    sport,
                    &label,
                    kickoff,
                    &bookmaker.key,
                    market_type.clone(),
                    line,
                    name,
                    price,
                ) {
                    Some(pick) => out.picks.push(pick),
                    None => out.dropped += 1,
                }
            }
        }
    }
    out
}

pub fn flatten_events<'a>(
    events: impl IntoIterator<Item = &'a MatchEvent>,
    fallback_sport: &str,
) -> Flattened {
    let mut out = Flattened::default();
    for event in events {
        let part = flatten_event(event, fallback_sport);
        out.picks.extend(part.picks);
        out.dropped += part.dropped;
    }
    out
}

/// Parses a provider kickoff into UTC. Offsets are honoured; naive timestamps
/// are read as UTC.
pub fn parse_kickoff(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}
