pub mod age;
pub mod engine;
pub mod export;
pub mod overlap;
pub mod quantity;
pub mod report;
pub mod resolver;

pub use crate::domain::model::{FarmSnapshot, RationReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, PlanSource, Storage};
pub use crate::utils::error::Result;
