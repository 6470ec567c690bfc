use chrono::{Duration, NaiveDate};
use feedplan::core::age::age_in_days;
use feedplan::core::quantity::{resolution_total, total_quantity};
use feedplan::core::resolver::match_stages;
use feedplan::domain::model::{Frequency, ProductRef, Stage};
use feedplan::{resolve, FallbackPolicy};
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn stage(start: u32, end: u32, product: &str, qty: &str) -> Stage {
    Stage::new(
        start,
        end,
        ProductRef {
            id: product.to_string(),
            name: Some(product.to_string()),
        },
        dec(qty),
        Frequency::Daily,
    )
    .unwrap()
}

fn broiler_plan() -> Vec<Stage> {
    vec![
        stage(1, 20, "Iniciador", "0.12"),
        stage(21, 38, "Crecimiento", "0.20"),
        stage(81, 400, "Engorde", "0.66"),
    ]
}

#[test]
fn test_matcher_returns_exactly_the_containing_stages() {
    let stages = vec![
        stage(1, 20, "A", "0.10"),
        stage(15, 30, "B", "0.20"),
        stage(15, 30, "C", "0.05"),
        stage(25, 25, "D", "0.01"),
        stage(60, 90, "E", "0.50"),
    ];

    for age in 0..=100 {
        let matched = match_stages(age, &stages);
        for s in &stages {
            let inside = s.day_start <= age && age <= s.day_end;
            let found = matched.iter().any(|m| std::ptr::eq(*m, s));
            assert_eq!(inside, found, "day {} stage {:?}", age, s.range());
        }
    }
}

#[test]
fn test_day_25_matches_growth_stage_only() {
    let resolution = resolve(25, &broiler_plan(), FallbackPolicy::None);

    assert!(resolution.exact);
    assert_eq!(resolution.groups.len(), 1);
    assert_eq!(resolution.groups[0].range_label(), "21-38");
    assert_eq!(resolution_total(&resolution, 150).unwrap(), dec("30.00"));
    assert_eq!(resolution_total(&resolution, 1).unwrap(), dec("0.20"));
}

#[test]
fn test_day_50_gap_depends_on_policy() {
    let stages = broiler_plan();

    let strict = resolve(50, &stages, FallbackPolicy::None);
    assert!(strict.is_empty());
    assert_eq!(resolution_total(&strict, 100).unwrap(), Decimal::ZERO);

    // 12 days past 38, 31 days before 81.
    let nearest = resolve(50, &stages, FallbackPolicy::Nearest);
    assert!(!nearest.exact);
    assert_eq!(nearest.groups[0].range_label(), "21-38");
}

#[test]
fn test_total_is_independent_of_stage_order() {
    let quantities = [dec("0.12"), dec("0.20"), dec("0.66"), dec("0.333")];
    let expected = total_quantity(quantities, 41).unwrap();

    let mut reversed = quantities;
    reversed.reverse();
    assert_eq!(total_quantity(reversed, 41).unwrap(), expected);

    let rotated = [quantities[2], quantities[3], quantities[0], quantities[1]];
    assert_eq!(total_quantity(rotated, 41).unwrap(), expected);
}

#[test]
fn test_age_is_stable_and_monotonic() {
    let birth = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
    let now = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

    assert_eq!(age_in_days(birth, now), age_in_days(birth, now));

    let mut previous = 0;
    for offset in -5..60 {
        let age = age_in_days(birth, now + Duration::days(offset));
        assert!(age >= previous);
        previous = age;
    }
}
