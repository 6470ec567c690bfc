//! Feeding-stage resolution: which stages of a plan apply to a lot of a
//! given age.

use crate::domain::model::{GroupItem, Resolution, Stage, StageGroup};
use serde::{Deserialize, Serialize};

/// What to do when no stage contains the age.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Report no stage.
    #[default]
    None,
    /// Use the stage whose range lies closest to the age.
    Nearest,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(FallbackPolicy::None),
            "nearest" => Ok(FallbackPolicy::Nearest),
            other => Err(format!("unknown fallback policy '{other}' (expected none or nearest)")),
        }
    }
}

/// Every stage whose inclusive range contains `age`, in input order.
pub fn match_stages(age: u32, stages: &[Stage]) -> Vec<&Stage> {
    stages.iter().filter(|stage| stage.contains(age)).collect()
}

/// The stage with the smallest distance from `age` to either of its
/// boundaries. Ties go to the lower `day_start`, then to input order.
pub fn nearest_stage(age: u32, stages: &[Stage]) -> Option<&Stage> {
    stages
        .iter()
        .min_by_key(|stage| (stage.distance_to(age), stage.day_start))
}

/// Merges stages with an identical day range into one group, keeping the
/// order in which each range first appears.
pub fn group_by_range<'a, I>(stages: I) -> Vec<StageGroup>
where
    I: IntoIterator<Item = &'a Stage>,
{
    let mut groups: Vec<StageGroup> = Vec::new();

    for stage in stages {
        let item = GroupItem {
            product: stage.product.clone(),
            quantity_per_animal: stage.quantity_per_animal,
        };

        match groups
            .iter_mut()
            .find(|g| g.day_start == stage.day_start && g.day_end == stage.day_end)
        {
            Some(group) => {
                if group.frequency != stage.frequency {
                    tracing::debug!(
                        "Stage {}-{} mixes frequencies {} and {}, keeping {}",
                        stage.day_start,
                        stage.day_end,
                        group.frequency,
                        stage.frequency,
                        group.frequency
                    );
                }
                group.items.push(item);
                if let Some(text) = &stage.instructions {
                    group.instructions.push(text.clone());
                }
            }
            None => groups.push(StageGroup {
                day_start: stage.day_start,
                day_end: stage.day_end,
                frequency: stage.frequency,
                items: vec![item],
                instructions: stage.instructions.iter().cloned().collect(),
            }),
        }
    }

    groups
}

pub fn resolve(age: u32, stages: &[Stage], policy: FallbackPolicy) -> Resolution {
    let matched = match_stages(age, stages);
    if !matched.is_empty() {
        return Resolution {
            age,
            groups: group_by_range(matched),
            exact: true,
        };
    }

    let fallback = match policy {
        FallbackPolicy::None => None,
        FallbackPolicy::Nearest => nearest_stage(age, stages),
    };

    match fallback {
        Some(nearest) => {
            tracing::debug!(
                "No stage contains day {}, falling back to {}-{}",
                age,
                nearest.day_start,
                nearest.day_end
            );
            // Siblings sharing the nearest range are part of the same stage.
            let siblings = stages.iter().filter(|s| s.range() == nearest.range());
            Resolution {
                age,
                groups: group_by_range(siblings),
                exact: false,
            }
        }
        None => Resolution {
            age,
            groups: Vec::new(),
            exact: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Frequency, ProductRef};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn stage(start: u32, end: u32, product: &str, qty: &str) -> Stage {
        Stage::new(
            start,
            end,
            ProductRef {
                id: product.to_string(),
                name: Some(product.to_string()),
            },
            Decimal::from_str(qty).unwrap(),
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
    fn test_match_inside_range() {
        let stages = broiler_plan();
        let matched = match_stages(25, &stages);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].range(), (21, 38));
    }

    #[test]
    fn test_match_is_inclusive_on_both_ends() {
        let stages = broiler_plan();
        assert_eq!(match_stages(1, &stages)[0].range(), (1, 20));
        assert_eq!(match_stages(20, &stages)[0].range(), (1, 20));
        assert_eq!(match_stages(21, &stages)[0].range(), (21, 38));
        assert_eq!(match_stages(400, &stages)[0].range(), (81, 400));
        assert!(match_stages(0, &stages).is_empty());
        assert!(match_stages(401, &stages).is_empty());
    }

    #[test]
    fn test_gap_has_no_exact_match() {
        let stages = broiler_plan();
        let resolution = resolve(50, &stages, FallbackPolicy::None);
        assert!(resolution.is_empty());
        assert!(!resolution.exact);
    }

    #[test]
    fn test_nearest_fallback() {
        let stages = broiler_plan();
        let resolution = resolve(50, &stages, FallbackPolicy::Nearest);
        assert!(!resolution.exact);
        assert_eq!(resolution.groups.len(), 1);
        assert_eq!(resolution.groups[0].range_label(), "21-38");

        let resolution = resolve(75, &stages, FallbackPolicy::Nearest);
        assert_eq!(resolution.groups[0].range_label(), "81-400");
    }

    #[test]
    fn test_nearest_tie_prefers_lower_start() {
        // Day 10 is 5 days from both ranges.
        let stages = vec![stage(15, 20, "B", "1"), stage(1, 5, "A", "1")];
        assert_eq!(nearest_stage(10, &stages).unwrap().range(), (1, 5));
        assert!(nearest_stage(10, &[]).is_none());
    }

    #[test]
    fn test_identical_ranges_are_merged() {
        let stages = vec![
            stage(1, 20, "Maiz", "0.10"),
            stage(1, 20, "Soya", "0.05"),
            stage(21, 38, "Crecimiento", "0.20"),
        ];
        let resolution = resolve(10, &stages, FallbackPolicy::None);
        assert!(resolution.exact);
        assert_eq!(resolution.groups.len(), 1);

        let group = &resolution.groups[0];
        assert_eq!(group.product_names(), "Maiz, Soya");
        assert_eq!(group.quantity_per_animal(), Decimal::from_str("0.15").unwrap());
    }

    #[test]
    fn test_overlapping_distinct_ranges_stay_separate() {
        let stages = vec![stage(1, 20, "A", "0.10"), stage(15, 30, "B", "0.30")];
        let resolution = resolve(17, &stages, FallbackPolicy::None);
        assert_eq!(resolution.groups.len(), 2);
        assert_eq!(resolution.quantity_per_animal(), Decimal::from_str("0.40").unwrap());
    }

    #[test]
    fn test_fallback_policy_from_str() {
        assert_eq!(FallbackPolicy::from_str("Nearest").unwrap(), FallbackPolicy::Nearest);
        assert_eq!(FallbackPolicy::from_str("none").unwrap(), FallbackPolicy::None);
        assert!(FallbackPolicy::from_str("first").is_err());
    }
}
