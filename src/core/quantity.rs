use crate::domain::model::{Product, Resolution, StageGroup};
use crate::utils::error::{FeedError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

/// Rounds half-up to 2 places and pads so `0.2` prints as `0.20`.
fn round_half_up(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn overflow(what: &str) -> FeedError {
    FeedError::QuantityOverflow {
        message: what.to_string(),
    }
}

/// Sum of per-animal quantities times the live count, to 2 decimal places.
/// A zero or negative count yields zero.
pub fn total_quantity<I>(per_animal: I, live_count: i64) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    if live_count <= 0 {
        return Ok(round_half_up(Decimal::ZERO));
    }

    let per_animal = per_animal
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, q| acc.checked_add(q))
        .ok_or_else(|| overflow("sum of per-animal quantities"))?;
    let total = per_animal
        .checked_mul(Decimal::from(live_count))
        .ok_or_else(|| overflow(&format!("{per_animal} x {live_count} animals")))?;

    Ok(round_half_up(total))
}

pub fn resolution_total(resolution: &Resolution, live_count: i64) -> Result<Decimal> {
    total_quantity(
        resolution.groups.iter().map(StageGroup::quantity_per_animal),
        live_count,
    )
}

/// Cost of feeding `live_count` animals for one ration. `None` when any
/// product in the resolution has no known price.
pub fn ration_cost(
    resolution: &Resolution,
    live_count: i64,
    products: &HashMap<String, Product>,
) -> Result<Option<Decimal>> {
    if resolution.is_empty() {
        return Ok(None);
    }

    let mut cost = Decimal::ZERO;
    for item in resolution.groups.iter().flat_map(|g| g.items.iter()) {
        let Some(price) = products
            .get(&item.product.id)
            .and_then(|p| p.price_per_unit)
        else {
            return Ok(None);
        };

        let quantity = total_quantity([item.quantity_per_animal], live_count)?;
        cost = quantity
            .checked_mul(price)
            .and_then(|line| cost.checked_add(line))
            .ok_or_else(|| overflow(&format!("cost of {}", item.product.display_name())))?;
    }
    Ok(Some(round_half_up(cost)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{GroupItem, ProductRef};
    use crate::domain::model::Frequency;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn resolution(items: &[(&str, &str)]) -> Resolution {
        Resolution {
            age: 25,
            exact: true,
            groups: vec![StageGroup {
                day_start: 21,
                day_end: 38,
                frequency: Frequency::Daily,
                items: items
                    .iter()
                    .map(|(id, qty)| GroupItem {
                        product: ProductRef { id: id.to_string(), name: None },
                        quantity_per_animal: dec(qty),
                    })
                    .collect(),
                instructions: vec![],
            }],
        }
    }

    fn priced(id: &str, price: Option<Decimal>) -> (String, Product) {
        (
            id.to_string(),
            Product {
                id: id.to_string(),
                name: id.to_string(),
                unit: Some("kg".to_string()),
                price_per_unit: price,
            },
        )
    }

    #[test]
    fn test_total_quantity() {
        assert_eq!(total_quantity([dec("0.20")], 150).unwrap(), dec("30.00"));
        assert_eq!(total_quantity([dec("0.2")], 150).unwrap().to_string(), "30.00");
        assert_eq!(total_quantity([dec("0.12"), dec("0.05")], 3).unwrap(), dec("0.51"));
    }

    #[test]
    fn test_rounds_half_up() {
        assert_eq!(total_quantity([dec("0.125")], 1).unwrap(), dec("0.13"));
        assert_eq!(total_quantity([dec("0.0049")], 1).unwrap(), dec("0.00"));
        assert_eq!(total_quantity([dec("0.3333")], 3).unwrap(), dec("1.00"));
    }

    #[test]
    fn test_zero_and_negative_counts() {
        assert_eq!(total_quantity([dec("0.66")], 0).unwrap(), Decimal::ZERO);
        assert_eq!(total_quantity([dec("0.66")], -4).unwrap(), Decimal::ZERO);
        assert_eq!(total_quantity(Vec::new(), 10).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_order_independent() {
        let a = [dec("0.12"), dec("0.20"), dec("0.66")];
        let b = [dec("0.66"), dec("0.12"), dec("0.20")];
        assert_eq!(total_quantity(a, 37).unwrap(), total_quantity(b, 37).unwrap());
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(matches!(
            total_quantity([Decimal::MAX], 2),
            Err(FeedError::QuantityOverflow { .. })
        ));
        assert!(matches!(
            total_quantity([Decimal::MAX, Decimal::ONE], 1),
            Err(FeedError::QuantityOverflow { .. })
        ));
        assert!(matches!(
            total_quantity([dec("100000000000000000000")], 1_000_000_000),
            Err(FeedError::QuantityOverflow { .. })
        ));

        let products = HashMap::from([priced("maiz", Some(Decimal::MAX))]);
        assert!(matches!(
            ration_cost(&resolution(&[("maiz", "2")]), 10, &products),
            Err(FeedError::QuantityOverflow { .. })
        ));
    }

    #[test]
    fn test_ration_cost() {
        let products = HashMap::from([
            priced("maiz", Some(dec("1.50"))),
            priced("soya", None),
        ]);

        let maiz_only = resolution(&[("maiz", "0.20")]);
        assert_eq!(resolution_total(&maiz_only, 100).unwrap(), dec("20.00"));
        assert_eq!(ration_cost(&maiz_only, 100, &products).unwrap(), Some(dec("30.00")));

        let unpriced = resolution(&[("maiz", "0.20"), ("soya", "0.10")]);
        assert_eq!(ration_cost(&unpriced, 100, &products).unwrap(), None);
    }
}
