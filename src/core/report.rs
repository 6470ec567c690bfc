use crate::core::age::age_in_days;
use crate::core::export::rations_to_csv;
use crate::core::overlap::warn_overlaps;
use crate::core::quantity::{ration_cost, resolution_total};
use crate::core::resolver::resolve;
use crate::core::{ConfigProvider, Pipeline, PlanSource, Storage};
use crate::domain::model::{FarmSnapshot, Lot, Plan, RationLine, RationReport, StageGroup};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Daily ration report: fetch lots and plans, resolve each lot's stage and
/// write the result as CSV.
pub struct FeedingReportPipeline<S: Storage, P: PlanSource, C: ConfigProvider> {
    storage: S,
    source: P,
    config: C,
    today: NaiveDate,
}

impl<S: Storage, P: PlanSource, C: ConfigProvider> FeedingReportPipeline<S, P, C> {
    pub fn new(storage: S, source: P, config: C, today: NaiveDate) -> Self {
        Self {
            storage,
            source,
            config,
            today,
        }
    }

    fn ration_line(&self, lot: &Lot, plan: &Plan, snapshot: &FarmSnapshot) -> Result<RationLine> {
        let age = age_in_days(lot.birth_date, self.today);
        let resolution = resolve(age, &plan.stages, self.config.fallback_policy());

        if resolution.is_empty() {
            tracing::warn!(
                "⚠️ Lot {} (day {}) has no stage in plan '{}'",
                lot.code,
                age,
                plan.name
            );
        } else if !resolution.exact {
            tracing::info!(
                "Lot {} (day {}) uses nearest stage {}",
                lot.code,
                age,
                resolution.groups[0].range_label()
            );
        }

        let join = |f: fn(&StageGroup) -> String| {
            resolution.groups.iter().map(f).collect::<Vec<_>>().join(" | ")
        };
        let stage = if resolution.is_empty() {
            "-".to_string()
        } else {
            join(|g| g.range_label())
        };

        Ok(RationLine {
            lot_code: lot.code.clone(),
            animal_id: lot.animal_id.clone(),
            plan_name: plan.name.clone(),
            age_days: age,
            live_count: lot.quantity,
            stage,
            products: join(|g| g.product_names()),
            frequency: join(|g| g.frequency.to_string()),
            quantity_per_animal: resolution.quantity_per_animal(),
            total_quantity: resolution_total(&resolution, lot.quantity)?,
            cost: ration_cost(&resolution, lot.quantity, &snapshot.products)?,
            exact: resolution.exact,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, P: PlanSource, C: ConfigProvider> Pipeline for FeedingReportPipeline<S, P, C> {
    async fn extract(&self) -> Result<FarmSnapshot> {
        let lots = self.source.fetch_lots().await?;
        tracing::debug!("Fetched {} lots", lots.len());

        let animal_ids: BTreeSet<&str> = lots.iter().map(|l| l.animal_id.as_str()).collect();
        let mut plans = HashMap::new();
        for animal_id in animal_ids {
            match self.source.fetch_plan_for_animal(animal_id).await? {
                Some(plan) => {
                    warn_overlaps(&plan);
                    plans.insert(animal_id.to_string(), plan);
                }
                None => tracing::warn!("⚠️ No nutrition plan for animal {}", animal_id),
            }
        }

        // Prices only feed the cost column, so a failure here is not fatal.
        let products = match self.source.fetch_products().await {
            Ok(products) => products.into_iter().map(|p| (p.id.clone(), p)).collect(),
            Err(e) => {
                tracing::warn!("⚠️ Could not fetch products, costs will be empty: {}", e);
                HashMap::new()
            }
        };

        Ok(FarmSnapshot {
            lots,
            plans,
            products,
        })
    }

    async fn transform(&self, snapshot: FarmSnapshot) -> Result<RationReport> {
        let mut report = RationReport::default();

        for lot in &snapshot.lots {
            match snapshot.plans.get(&lot.animal_id) {
                Some(plan) => match self.ration_line(lot, plan, &snapshot) {
                    Ok(line) => report.lines.push(line),
                    Err(e) => {
                        tracing::warn!("⚠️ Lot {} left out of the report: {}", lot.code, e);
                        report.skipped.push(lot.code.clone());
                    }
                },
                None => report.skipped.push(lot.code.clone()),
            }
        }

        Ok(report)
    }

    async fn load(&self, report: RationReport) -> Result<String> {
        let filename = self.config.report_filename();
        let csv = rations_to_csv(&report.lines)?;

        tracing::debug!("Writing {} bytes to {}", csv.len(), filename);
        self.storage.write_file(filename, csv.as_bytes()).await?;

        Ok(format!("{}/{}", self.config.output_path(), filename))
    }
}
