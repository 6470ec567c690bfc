use crate::utils::error::{FeedError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Backend ids arrive either as JSON numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(i64),
    Str(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Num(n) => n.to_string(),
            RawId::Str(s) => s,
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(d).map(|id| id.map(String::from))
}

fn de_birth_date<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

/// Parses a calendar date from the formats the backend uses. Any time of day
/// is discarded.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date());
        }
    }
    Err(FeedError::InvalidDate {
        value: value.to_string(),
        message: "expected YYYY-MM-DD or an ISO-8601 date-time".to_string(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    #[default]
    #[serde(alias = "daily", alias = "Daily")]
    Daily,
    #[serde(
        alias = "every_other_day",
        alias = "every-other-day",
        alias = "EVERY-OTHER-DAY",
        alias = "everyOtherDay",
        alias = "EveryOtherDay"
    )]
    EveryOtherDay,
    #[serde(alias = "weekly", alias = "Weekly")]
    Weekly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "DAILY",
            Frequency::EveryOtherDay => "EVERY_OTHER_DAY",
            Frequency::Weekly => "WEEKLY",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Frequency {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "EVERY_OTHER_DAY" => Ok(Frequency::EveryOtherDay),
            "WEEKLY" => Ok(Frequency::Weekly),
            other => Err(FeedError::InvalidStage {
                message: format!("unknown frequency '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
    pub name: Option<String>,
}

impl ProductRef {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Upper bound on a stage's per-animal quantity, in product units per day.
pub const MAX_QUANTITY_PER_ANIMAL: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// A day-range segment of a plan. Constructed only through [`Stage::new`] or
/// deserialization, both of which enforce `day_end >= day_start` and a
/// quantity between 0 and [`MAX_QUANTITY_PER_ANIMAL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StageRecord", into = "StageRecord")]
pub struct Stage {
    pub id: Option<String>,
    pub day_start: u32,
    pub day_end: u32,
    pub product: ProductRef,
    pub quantity_per_animal: Decimal,
    pub frequency: Frequency,
    pub instructions: Option<String>,
}

impl Stage {
    pub fn new(
        day_start: u32,
        day_end: u32,
        product: ProductRef,
        quantity_per_animal: Decimal,
        frequency: Frequency,
    ) -> Result<Self> {
        if day_end < day_start {
            return Err(FeedError::InvalidStage {
                message: format!("day range {day_start}-{day_end} ends before it starts"),
            });
        }
        if quantity_per_animal < Decimal::ZERO {
            return Err(FeedError::InvalidStage {
                message: format!("quantity per animal {quantity_per_animal} is negative"),
            });
        }
        if quantity_per_animal > MAX_QUANTITY_PER_ANIMAL {
            return Err(FeedError::InvalidStage {
                message: format!(
                    "quantity per animal {quantity_per_animal} exceeds {MAX_QUANTITY_PER_ANIMAL}"
                ),
            });
        }
        if product.id.trim().is_empty() {
            return Err(FeedError::InvalidStage {
                message: "stage has no product".to_string(),
            });
        }
        Ok(Self {
            id: None,
            day_start,
            day_end,
            product,
            quantity_per_animal,
            frequency,
            instructions: None,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn range(&self) -> (u32, u32) {
        (self.day_start, self.day_end)
    }

    pub fn contains(&self, day: u32) -> bool {
        self.day_start <= day && day <= self.day_end
    }

    /// Distance in days from `day` to the closest boundary, 0 when inside.
    pub fn distance_to(&self, day: u32) -> u32 {
        if day < self.day_start {
            self.day_start - day
        } else if day > self.day_end {
            day - self.day_end
        } else {
            0
        }
    }
}

/// Wire shape of a stage as the backend sends and accepts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    #[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub day_start: i64,
    pub day_end: i64,
    #[serde(deserialize_with = "de_id")]
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub quantity_per_animal: Decimal,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl TryFrom<StageRecord> for Stage {
    type Error = FeedError;

    fn try_from(record: StageRecord) -> Result<Self> {
        let to_day = |field: &str, value: i64| {
            u32::try_from(value).map_err(|_| FeedError::InvalidStage {
                message: format!("{field} {value} is out of range"),
            })
        };
        let day_start = to_day("dayStart", record.day_start)?;
        let day_end = to_day("dayEnd", record.day_end)?;

        let mut stage = Stage::new(
            day_start,
            day_end,
            ProductRef {
                id: record.product_id,
                name: record.product_name,
            },
            record.quantity_per_animal,
            record.frequency,
        )?;
        stage.id = record.id;
        stage.instructions = record.instructions.filter(|s| !s.trim().is_empty());
        Ok(stage)
    }
}

impl From<Stage> for StageRecord {
    fn from(stage: Stage) -> Self {
        Self {
            id: stage.id,
            day_start: i64::from(stage.day_start),
            day_end: i64::from(stage.day_end),
            product_id: stage.product.id,
            product_name: stage.product.name,
            quantity_per_animal: stage.quantity_per_animal,
            frequency: stage.frequency,
            instructions: stage.instructions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "de_id")]
    pub animal_id: String,
    #[serde(default)]
    pub animal_name: Option<String>,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

/// A tracked group of animals. Owned by the inventory side, read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub code: String,
    pub quantity: i64,
    #[serde(deserialize_with = "de_birth_date")]
    pub birth_date: NaiveDate,
    #[serde(deserialize_with = "de_id")]
    pub animal_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, alias = "price")]
    pub price_per_unit: Option<Decimal>,
}

/// One product and quantity inside a [`StageGroup`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupItem {
    pub product: ProductRef,
    pub quantity_per_animal: Decimal,
}

/// Stages sharing an identical day range, merged into a single entry.
#[derive(Debug, Clone, PartialEq)]
pub struct StageGroup {
    pub day_start: u32,
    pub day_end: u32,
    pub frequency: Frequency,
    pub items: Vec<GroupItem>,
    pub instructions: Vec<String>,
}

impl StageGroup {
    pub fn quantity_per_animal(&self) -> Decimal {
        self.items.iter().map(|i| i.quantity_per_animal).sum()
    }

    pub fn product_names(&self) -> String {
        self.items
            .iter()
            .map(|i| i.product.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn range_label(&self) -> String {
        format!("{}-{}", self.day_start, self.day_end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub age: u32,
    pub groups: Vec<StageGroup>,
    /// False when the groups come from the nearest-stage fallback.
    pub exact: bool,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn quantity_per_animal(&self) -> Decimal {
        self.groups.iter().map(StageGroup::quantity_per_animal).sum()
    }
}

/// Everything a report run needs, fetched once and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct FarmSnapshot {
    pub lots: Vec<Lot>,
    /// Keyed by animal id.
    pub plans: HashMap<String, Plan>,
    /// Keyed by product id.
    pub products: HashMap<String, Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RationLine {
    #[serde(rename = "lot")]
    pub lot_code: String,
    #[serde(rename = "animal")]
    pub animal_id: String,
    #[serde(rename = "plan")]
    pub plan_name: String,
    pub age_days: u32,
    pub live_count: i64,
    pub stage: String,
    pub products: String,
    pub frequency: String,
    pub quantity_per_animal: Decimal,
    pub total_quantity: Decimal,
    pub cost: Option<Decimal>,
    #[serde(rename = "exact_match")]
    pub exact: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RationReport {
    pub lines: Vec<RationLine>,
    /// Codes of lots left out: no plan for their animal, or a ration that
    /// could not be computed.
    pub skipped: Vec<String>,
}
