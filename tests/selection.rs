mod common;

use chrono::Duration;

use common::fixed_now;
use odds_board::dedup::{DedupKey, dedup_best_price};
use odds_board::model::{MarketType, Pick};
use odds_board::scoring::{MAX_ESTIMATED_PROBABILITY, ScoringConfig, score_pick, score_picks};
use odds_board::selection::{
    LONGSHOT_MAX_PRICE, LONGSHOT_MIN_PRICE, SAFE_MIN_PRICE, SafePolicy, SelectionConfig,
    select_longshots, select_safe,
};

fn pick(id: &str, market: MarketType, outcome: &str, price: f64) -> Pick {
    let line = (market == MarketType::Totals).then_some(2.5);
    Pick::new(
        id,
        "soccer_epl",
        &format!("{id} Home vs {id} Away"),
        fixed_now() + Duration::hours(2),
        "book",
        market,
        line,
        outcome,
        price,
    )
    .expect("valid price")
}

fn ladder(prices: &[f64]) -> Vec<Pick> {
    prices
        .iter()
        .enumerate()
        .map(|(idx, price)| pick(&format!("m{idx}"), MarketType::Moneyline, "Home", *price))
        .collect()
}

fn config(safe: usize, longshots: usize) -> SelectionConfig {
    SelectionConfig {
        safe_count: safe,
        longshot_count: longshots,
        safe_policy: SafePolicy::PriceAscending,
    }
}

#[test]
fn scores_totals_with_bonus() {
    let mut p = pick("m1", MarketType::Totals, "Over", 2.0);
    score_pick(&mut p, &ScoringConfig { totals_bonus: 0.10 });
    assert!((p.implied_probability - 0.50).abs() < 1e-12);
    assert!((p.estimated_probability - 0.55).abs() < 1e-12);
    assert!((p.value - 0.10).abs() < 1e-12);
}

#[test]
fn bonus_only_applies_to_totals_and_estimate_is_capped() {
    let mut moneyline = pick("m1", MarketType::Moneyline, "Home", 2.0);
    let mut heavy_favourite = pick("m2", MarketType::Totals, "Under", 1.05);
    let cfg = ScoringConfig::from_percent(30);
    score_pick(&mut moneyline, &cfg);
    score_pick(&mut heavy_favourite, &cfg);

    assert!((moneyline.estimated_probability - 0.5).abs() < 1e-12);
    assert!(moneyline.value.abs() < 1e-12);
    assert_eq!(heavy_favourite.estimated_probability, MAX_ESTIMATED_PROBABILITY);
    assert!((heavy_favourite.value - (0.99 * 1.05 - 1.0)).abs() < 1e-12);
}

#[test]
fn bonus_percent_is_capped_at_thirty() {
    assert!((ScoringConfig::from_percent(80).totals_bonus - 0.30).abs() < 1e-12);
    assert!((ScoringConfig::default().totals_bonus - 0.10).abs() < 1e-12);
}

#[test]
fn safe_set_respects_floor_order_and_count() {
    let picks = ladder(&[1.10, 3.00, 1.39, 1.40, 2.10, 1.75, 1.55]);
    let safe = select_safe(&picks, &config(3, 10));
    let prices: Vec<f64> = safe.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![1.40, 1.55, 1.75]);
    assert!(safe.iter().all(|p| p.price >= SAFE_MIN_PRICE));
}

#[test]
fn short_sets_return_everything_that_qualifies() {
    let picks = ladder(&[1.20, 1.45, 6.00, 2.00]);
    let cfg = config(20, 10);
    assert_eq!(select_safe(&picks, &cfg).len(), 3);
    let longshots = select_longshots(&picks, &cfg);
    assert_eq!(longshots.len(), 1);
    assert!(select_safe(&[], &cfg).is_empty());
}

#[test]
fn longshot_band_is_inclusive() {
    let picks = ladder(&[1.99, 2.00, 3.25, 5.50, 5.51, 2.75]);
    let longshots = select_longshots(&picks, &config(5, 5));
    let prices: Vec<f64> = longshots.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![2.00, 2.75, 3.25, 5.50]);
    assert!(
        longshots
            .iter()
            .all(|p| (LONGSHOT_MIN_PRICE..=LONGSHOT_MAX_PRICE).contains(&p.price))
    );
}

#[test]
fn sets_fill_exactly_when_enough_rows_qualify() {
    let prices: Vec<f64> = (0..60).map(|i| 1.40 + f64::from(i) * 0.07).collect();
    let picks = ladder(&prices);
    let cfg = config(20, 10);
    let safe = select_safe(&picks, &cfg);
    let longshots = select_longshots(&picks, &cfg);
    assert_eq!(safe.len(), 20);
    assert_eq!(longshots.len(), 10);
    assert!(safe.windows(2).all(|w| w[0].price <= w[1].price));
    assert!(longshots.windows(2).all(|w| w[0].price <= w[1].price));
}

#[test]
fn quota_policy_reserves_totals_slots_by_value() {
    let mut picks = vec![
        pick("t1", MarketType::Totals, "Over", 1.90),
        pick("t2", MarketType::Totals, "Under", 1.50),
        pick("t3", MarketType::Totals, "Over", 2.20),
        pick("t4", MarketType::Totals, "Under", 1.45),
        pick("h1", MarketType::Moneyline, "Home", 1.41),
        pick("h2", MarketType::Moneyline, "Away", 1.60),
        pick("h3", MarketType::Moneyline, "Home", 2.50),
    ];
    for (p, value) in picks.iter_mut().zip([0.30, 0.05, 0.20, 0.01, 0.02, 0.10, 0.50]) {
        p.value = value;
    }
    let cfg = SelectionConfig {
        safe_count: 5,
        longshot_count: 5,
        safe_policy: SafePolicy::MarketQuota { totals_share: 0.6 },
    };
    let safe = select_safe(&picks, &cfg);

    let ids: Vec<&str> = safe.iter().map(|p| p.event_id.as_str()).collect();
    assert_eq!(ids, vec!["t2", "h2", "t1", "t3", "h3"]);
    let totals = safe
        .iter()
        .filter(|p| p.market_type == MarketType::Totals)
        .count();
    assert_eq!(totals, 3);
}

#[test]
fn quota_policy_tops_up_when_one_side_runs_short() {
    let mut picks = vec![
        pick("t1", MarketType::Totals, "Over", 1.90),
        pick("t2", MarketType::Totals, "Under", 1.80),
        pick("t3", MarketType::Totals, "Over", 1.70),
        pick("t4", MarketType::Totals, "Under", 1.60),
        pick("t5", MarketType::Totals, "Over", 1.50),
        pick("h1", MarketType::Moneyline, "Home", 1.55),
    ];
    score_picks(&mut picks, &ScoringConfig::default());
    let cfg = SelectionConfig {
        safe_count: 5,
        longshot_count: 5,
        safe_policy: SafePolicy::MarketQuota { totals_share: 0.6 },
    };
    assert_eq!(select_safe(&picks, &cfg).len(), 5);
}

#[test]
fn dedup_keeps_the_highest_price_per_key() {
    let mut low = pick("m1", MarketType::Moneyline, "Home", 1.50);
    low.bookmaker = "pinnacle".to_string();
    let mut high = pick("m1", MarketType::Moneyline, "Home", 1.60);
    high.bookmaker = "unibet_eu".to_string();
    let other = pick("m1", MarketType::Moneyline, "Away", 2.40);

    for input in [
        vec![low.clone(), high.clone(), other.clone()],
        vec![high.clone(), other.clone(), low.clone()],
    ] {
        let out = dedup_best_price(input, DedupKey::Selection);
        assert_eq!(out.len(), 2);
        let home = out
            .iter()
            .find(|p| p.outcome_name == "Home")
            .expect("home survives");
        assert_eq!(home.bookmaker, "unibet_eu");
    }
}

#[test]
fn quota_policy_fills_from_moneyline_only() {
    let mut picks = vec![
        pick("t1", MarketType::Totals, "Over", 1.90),
        pick("s1", MarketType::Other("spreads".to_string()), "Home", 1.45),
        pick("s2", MarketType::Other("spreads".to_string()), "Away", 1.50),
        pick("h1", MarketType::Moneyline, "Home", 1.70),
    ];
    for (p, value) in picks.iter_mut().zip([0.05, 0.90, 0.80, 0.01]) {
        p.value = value;
    }
    let cfg = SelectionConfig {
        safe_count: 5,
        longshot_count: 5,
        safe_policy: SafePolicy::MarketQuota { totals_share: 0.6 },
    };
    let ids: Vec<String> = select_safe(&picks, &cfg)
        .into_iter()
        .map(|p| p.event_id)
        .collect();
    assert_eq!(ids, vec!["h1".to_string(), "t1".to_string()]);

    let by_price = select_safe(&picks, &config(5, 5));
    assert_eq!(by_price.len(), 4);
}
