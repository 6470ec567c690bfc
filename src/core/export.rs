use crate::domain::model::{Plan, RationLine};
use crate::utils::error::{FeedError, Result};
use csv::{QuoteStyle, WriterBuilder};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StageRow<'a> {
    plan: &'a str,
    day_start: u32,
    day_end: u32,
    product: &'a str,
    quantity_per_animal: Decimal,
    frequency: String,
    instructions: &'a str,
}

/// Serializes rows with every field quoted and a header row first.
fn write_quoted<T: Serialize>(rows: impl IntoIterator<Item = T>, headers: &[&str]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .has_headers(false)
        .from_writer(Vec::new());

    // Written by hand so an empty export still has a header row.
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FeedError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| FeedError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

pub const RATION_HEADERS: [&str; 12] = [
    "lot",
    "animal",
    "plan",
    "age_days",
    "live_count",
    "stage",
    "products",
    "frequency",
    "quantity_per_animal",
    "total_quantity",
    "cost",
    "exact_match",
];

pub const STAGE_HEADERS: [&str; 7] = [
    "plan",
    "day_start",
    "day_end",
    "product",
    "quantity_per_animal",
    "frequency",
    "instructions",
];

pub fn rations_to_csv(lines: &[RationLine]) -> Result<String> {
    write_quoted(lines, &RATION_HEADERS)
}

pub fn stages_to_csv(plan: &Plan) -> Result<String> {
    let mut stages: Vec<_> = plan.stages.iter().collect();
    stages.sort_by_key(|s| s.range());

    let rows = stages.into_iter().map(|stage| StageRow {
        plan: &plan.name,
        day_start: stage.day_start,
        day_end: stage.day_end,
        product: stage.product.display_name(),
        quantity_per_animal: stage.quantity_per_animal,
        frequency: stage.frequency.to_string(),
        instructions: stage.instructions.as_deref().unwrap_or(""),
    });
    write_quoted(rows, &STAGE_HEADERS)
}
