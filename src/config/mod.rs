pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::resolver::FallbackPolicy;
#[cfg(feature = "cli")]
use crate::domain::model::Frequency;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use rust_decimal::Decimal;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "feedplan")]
#[command(about = "Resolve feeding stages and rations for farm lots")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "feedplan.toml", global = true)]
    pub config: String,

    /// Override api.base_url from the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        /// Falls back to FEEDPLAN_PASSWORD
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// List nutrition plans and warn about overlapping stages
    Plans,
    /// Show the feeding stage and ration for one lot
    Resolve {
        #[arg(long)]
        lot: String,
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// none | nearest
        #[arg(long)]
        fallback: Option<FallbackPolicy>,
    },
    /// Write the ration report for every lot as CSV
    Report {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        fallback: Option<FallbackPolicy>,
    },
    /// Export the stages of a plan as CSV
    ExportPlan {
        #[arg(long)]
        plan: String,
        /// File name under report.output_path
        #[arg(long)]
        output: Option<String>,
    },
    /// Add a stage to a plan
    AddStage {
        #[arg(long)]
        plan: String,
        #[arg(long)]
        start: u32,
        #[arg(long)]
        end: u32,
        #[arg(long)]
        product: String,
        #[arg(long)]
        quantity: Decimal,
        #[arg(long, default_value = "DAILY")]
        frequency: Frequency,
        #[arg(long)]
        instructions: Option<String>,
    },
    /// Delete a stage
    RemoveStage {
        #[arg(long)]
        stage: String,
    },
}
