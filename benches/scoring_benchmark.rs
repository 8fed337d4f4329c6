use chrono::{Duration, NaiveDate};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::collections::HashMap;
use std::hint::black_box;
use streakboard::models::{InboundActivity, RuleRecord, RuleSet, ScoredActivity};
use streakboard::services::{bonus, standings};

fn rule_set() -> RuleSet {
    let record = |id: &str, rule_type: &str, config: serde_json::Value| RuleRecord {
        id: id.to_string(),
        rule_type: rule_type.to_string(),
        config,
    };
    RuleSet::load(&[
        record("min", "min_distance", json!({ "minKm": 1.0 })),
        record("pace", "pace_range", json!({ "minPace": 3.0, "maxPace": 15.0 })),
        record(
            "tet",
            "tet_bonus",
            json!({
                "tetDate": "2024-02-10",
                "timeRange": { "start": "05:00", "end": "09:00" },
                "minKm": 3.0,
                "multiplier": 3.0
            }),
        ),
        record(
            "lucky",
            "lucky_distance",
            json!({
                "luckyDistances": [
                    { "distance": 5.0, "multiplier": 2.0 },
                    { "distance": 8.0, "multiplier": 2.5 }
                ],
                "tolerance": 0.1
            }),
        ),
        record("sunday", "multiplier_day", json!({ "multiplierDay": 0, "multiplier": 2.0 })),
    ])
}

/// One activity per day for `days` days, for one user.
fn season(user: &str, days: i64) -> Vec<ScoredActivity> {
    let rules = rule_set();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..days)
        .filter(|d| d % 7 != 3)
        .map(|d| {
            let meters = 3000.0 + (d % 6) as f64 * 1000.0;
            let inbound = InboundActivity {
                source_activity_id: d as u64,
                user_id: user.to_string(),
                sport_type: "Run".to_string(),
                distance_meters: meters,
                moving_time_seconds: meters * 0.36,
                start_local: format!("{}T06:00:00", start + Duration::days(d)),
            };
            let activity = inbound.canonicalize("bench").unwrap();
            bonus::score(&activity, &rules)
        })
        .collect()
}

fn benchmark_scoring(c: &mut Criterion) {
    let rules = rule_set();
    let activity = InboundActivity {
        source_activity_id: 1,
        user_id: "u1".to_string(),
        sport_type: "Run".to_string(),
        distance_meters: 5040.0,
        moving_time_seconds: 1800.0,
        start_local: "2024-02-10T06:30:00".to_string(),
    }
    .canonicalize("bench")
    .unwrap();

    c.bench_function("score_activity_all_bonuses", |b| {
        b.iter(|| bonus::score(black_box(&activity), black_box(&rules)))
    });
}

fn benchmark_standings(c: &mut Criterion) {
    let mut group = c.benchmark_group("standings");

    let one_season = season("u1", 90);
    group.bench_function("aggregate_90_days", |b| {
        b.iter(|| standings::aggregate("u1", "bench", black_box(&one_season)))
    });
    group.bench_function("streak_90_days", |b| {
        b.iter(|| standings::streak_state("u1", "bench", black_box(&one_season)))
    });

    let users: Vec<String> = (0..500).map(|i| format!("user{:03}", i)).collect();
    let (rows, streaks): (Vec<_>, Vec<_>) = users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let activities = season(user, 20 + (i % 40) as i64);
            (
                standings::aggregate(user, "bench", &activities),
                standings::streak_state(user, "bench", &activities),
            )
        })
        .unzip();
    let names: HashMap<String, String> = users.iter().map(|u| (u.clone(), u.clone())).collect();

    group.bench_function("rank_500_participants", |b| {
        b.iter(|| standings::rank(black_box(&rows), black_box(&streaks), &names))
    });

    group.finish();
}

criterion_group!(benches, benchmark_scoring, benchmark_standings);
criterion_main!(benches);
