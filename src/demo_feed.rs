use anyhow::{Result, anyhow};
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::ApiKey;
use crate::model::{BookmakerBlock, MarketBlock, MatchEvent, RawOutcome};
use crate::odds_fetch::{OddsPage, OddsQuery, OddsSource, Quota};
use crate::sports::{SportInfo, UPCOMING_SPORT_KEY};

const DEMO_BOOKMAKERS: &[&str] = &["pinnacle", "betfair_ex_eu", "unibet_eu", "williamhill"];

struct DemoSport {
    key: &'static str,
    group: &'static str,
    title: &'static str,
    teams: &'static [&'static str],
    draws: bool,
    totals_line: f64,
}

const DEMO_SPORTS: &[DemoSport] = &[
    DemoSport {
        key: "soccer_epl",
        group: "Soccer",
        title: "EPL",
        teams: &[
            "Arsenal",
            "Chelsea",
            "Liverpool",
            "Manchester City",
            "Newcastle United",
            "Tottenham Hotspur",
            "Aston Villa",
            "Brighton and Hove Albion",
        ],
        draws: true,
        totals_line: 2.5,
    },
    DemoSport {
        key: "basketball_nba",
        group: "Basketball",
        title: "NBA",
        teams: &[
            "Boston Celtics",
            "Denver Nuggets",
            "Golden State Warriors",
            "Los Angeles Lakers",
            "Miami Heat",
            "Milwaukee Bucks",
        ],
        draws: false,
        totals_line: 224.5,
    },
    DemoSport {
        key: "icehockey_nhl",
        group: "Ice Hockey",
        title: "NHL",
        teams: &[
            "Boston Bruins",
            "Colorado Avalanche",
            "Edmonton Oilers",
            "New York Rangers",
            "Toronto Maple Leafs",
            "Vegas Golden Knights",
        ],
        draws: false,
        totals_line: 6.0,
    },
];

/// Offline odds source producing plausible random matches around "now".
#[derive(Debug, Default)]
pub struct DemoOddsSource;

impl DemoOddsSource {
    pub fn new() -> Self {
        Self
    }
}

impl OddsSource for DemoOddsSource {
    fn list_sports(&self, _api_key: &ApiKey) -> Result<Vec<SportInfo>> {
        Ok(DEMO_SPORTS
            .iter()
            .map(|s| SportInfo {
                key: s.key.to_string(),
                group: s.group.to_string(),
                title: s.title.to_string(),
                active: true,
                has_outrights: false,
            })
            .collect())
    }

    fn fetch_odds(&self, _api_key: &ApiKey, sport: &str, query: &OddsQuery) -> Result<OddsPage> {
        let mut rng = rand::thread_rng();
        let sports: Vec<&DemoSport> = if sport == UPCOMING_SPORT_KEY {
            DEMO_SPORTS.iter().collect()
        } else {
            DEMO_SPORTS.iter().filter(|s| s.key == sport).collect()
        };
        if sports.is_empty() {
            return Err(anyhow!("http 404 Not Found: unknown sport {sport}"));
        }

        let want_totals = query.markets.contains("totals");
        let mut events = Vec::new();
        for demo in sports {
            let mut teams = demo.teams.to_vec();
            teams.shuffle(&mut rng);
            for (idx, pair) in teams.chunks_exact(2).enumerate() {
                events.push(demo_event(&mut rng, demo, idx, pair[0], pair[1], want_totals));
            }
        }

        Ok(OddsPage {
            events,
            dropped: 0,
            quota: Some(Quota {
                remaining: Some(rng.gen_range(100..500)),
                used: Some(rng.gen_range(1..100)),
            }),
        })
    }
}

fn demo_event(
    rng: &mut impl Rng,
    demo: &DemoSport,
    idx: usize,
    home: &str,
    away: &str,
    want_totals: bool,
) -> MatchEvent {
    let kickoff = Utc::now() + ChronoDuration::minutes(rng.gen_range(-180..(40 * 60)));
    let home_strength: f64 = rng.gen_range(0.25..0.65);
    let draw_share = if demo.draws { rng.gen_range(0.18..0.30) } else { 0.0 };

    let bookmakers = DEMO_BOOKMAKERS
        .iter()
        .take(rng.gen_range(2..=DEMO_BOOKMAKERS.len()))
        .map(|book| {
            let margin = rng.gen_range(1.02..1.08);
            let jitter = |rng: &mut dyn rand::RngCore, p: f64| {
                let noisy = (p * rng.gen_range(0.97..1.03)).clamp(0.02, 0.98);
                round_price(1.0 / (noisy * margin))
            };
            let p_home = home_strength * (1.0 - draw_share);
            let p_away = (1.0 - home_strength) * (1.0 - draw_share);

            let mut h2h = vec![
                price_outcome(home, jitter(&mut *rng, p_home), None),
                price_outcome(away, jitter(&mut *rng, p_away), None),
            ];
            if demo.draws {
                h2h.push(price_outcome("Draw", jitter(&mut *rng, draw_share), None));
            }
            let mut markets = vec![MarketBlock {
                key: "h2h".to_string(),
                outcomes: h2h,
            }];
            if want_totals {
                let p_over = rng.gen_range(0.40..0.60);
                let line = Some(demo.totals_line);
                markets.push(MarketBlock {
                    key: "totals".to_string(),
                    outcomes: vec![
                        price_outcome("Over", jitter(&mut *rng, p_over), line),
                        price_outcome("Under", jitter(&mut *rng, 1.0 - p_over), line),
                    ],
                });
            }
            BookmakerBlock {
                key: book.to_string(),
                title: book.to_string(),
                markets,
            }
        })
        .collect();

    MatchEvent {
        id: format!("demo-{}-{idx}-{}", demo.key, kickoff.timestamp()),
        sport_key: Some(demo.key.to_string()),
        home_team: home.to_string(),
        away_team: away.to_string(),
        commence_time: kickoff.to_rfc3339_opts(SecondsFormat::Secs, true),
        bookmakers,
    }
}

fn price_outcome(name: &str, price: f64, point: Option<f64>) -> RawOutcome {
    RawOutcome {
        name: name.to_string(),
        price: Some(price),
        point,
    }
}

fn round_price(price: f64) -> f64 {
    (price.max(1.01) * 100.0).round() / 100.0
}
