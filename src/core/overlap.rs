use crate::domain::model::{Plan, Stage};
use std::fmt;

/// Two stages of the same plan whose day ranges intersect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOverlap {
    pub first: (u32, u32),
    pub second: (u32, u32),
    pub first_product: String,
    pub second_product: String,
}

impl fmt::Display for StageOverlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "days {}-{} ({}) overlap days {}-{} ({})",
            self.first.0,
            self.first.1,
            self.first_product,
            self.second.0,
            self.second.1,
            self.second_product
        )
    }
}

fn intersects(a: &Stage, b: &Stage) -> bool {
    a.day_start <= b.day_end && b.day_start <= a.day_end
}

fn overlap_between(a: &Stage, b: &Stage) -> Option<StageOverlap> {
    // Identical ranges are one stage split per product, not a conflict.
    if a.range() == b.range() || !intersects(a, b) {
        return None;
    }
    Some(StageOverlap {
        first: a.range(),
        second: b.range(),
        first_product: a.product.display_name().to_string(),
        second_product: b.product.display_name().to_string(),
    })
}

pub fn find_overlaps(stages: &[Stage]) -> Vec<StageOverlap> {
    let mut overlaps = Vec::new();
    for (i, a) in stages.iter().enumerate() {
        for b in &stages[i + 1..] {
            if let Some(overlap) = overlap_between(a, b) {
                overlaps.push(overlap);
            }
        }
    }
    overlaps
}

/// Overlaps `candidate` would introduce if added to `plan`. Stages with the
/// same id as the candidate are ignored so updates do not conflict with
/// themselves.
pub fn overlaps_with(plan: &Plan, candidate: &Stage) -> Vec<StageOverlap> {
    plan.stages
        .iter()
        .filter(|existing| candidate.id.is_none() || existing.id != candidate.id)
        .filter_map(|existing| overlap_between(existing, candidate))
        .collect()
}

/// Logs every overlap in the plan. Overlaps never block anything.
pub fn warn_overlaps(plan: &Plan) -> usize {
    let overlaps = find_overlaps(&plan.stages);
    for overlap in &overlaps {
        tracing::warn!("⚠️ Plan '{}': {}", plan.name, overlap);
    }
    overlaps.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Frequency, ProductRef};
    use rust_decimal::Decimal;

    fn stage(start: u32, end: u32, product: &str) -> Stage {
        Stage::new(
            start,
            end,
            ProductRef {
                id: product.to_string(),
                name: None,
            },
            Decimal::ONE,
            Frequency::Daily,
        )
        .unwrap()
    }

    fn plan(stages: Vec<Stage>) -> Plan {
        Plan {
            id: "1".to_string(),
            name: "Pollos de engorde".to_string(),
            description: None,
            animal_id: "2".to_string(),
            animal_name: None,
            stages,
        }
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        let stages = vec![stage(1, 20, "a"), stage(21, 38, "b"), stage(81, 400, "c")];
        assert!(find_overlaps(&stages).is_empty());
    }

    #[test]
    fn test_shared_boundary_overlaps() {
        let stages = vec![stage(1, 20, "a"), stage(20, 38, "b")];
        let overlaps = find_overlaps(&stages);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].first, (1, 20));
        assert_eq!(overlaps[0].second, (20, 38));
        assert_eq!(overlaps[0].to_string(), "days 1-20 (a) overlap days 20-38 (b)");
    }

    #[test]
    fn test_identical_ranges_are_not_reported() {
        let stages = vec![stage(1, 20, "maiz"), stage(1, 20, "soya")];
        assert!(find_overlaps(&stages).is_empty());
    }

    #[test]
    fn test_candidate_overlaps() {
        let p = plan(vec![
            stage(1, 20, "a").with_id("10"),
            stage(21, 38, "b").with_id("11"),
        ]);

        let new_stage = stage(30, 50, "c");
        assert_eq!(overlaps_with(&p, &new_stage).len(), 1);

        // Widening stage 11 must not be reported against itself.
        let updated = stage(21, 45, "b").with_id("11");
        assert!(overlaps_with(&p, &updated).is_empty());

        assert_eq!(warn_overlaps(&p), 0);
    }
}
