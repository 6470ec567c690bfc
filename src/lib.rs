pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{http::ApiClient, session::SessionStore, storage::LocalStorage};
pub use config::toml_config::FeedConfig;
pub use core::{engine::ReportEngine, report::FeedingReportPipeline};
pub use core::resolver::{resolve, FallbackPolicy};
pub use utils::error::{FeedError, Result};
