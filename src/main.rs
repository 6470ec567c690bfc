use clap::Parser;
use feedplan::core::age::{age_in_days, today};
use feedplan::core::export::stages_to_csv;
use feedplan::core::overlap::{overlaps_with, warn_overlaps};
use feedplan::core::quantity::{ration_cost, resolution_total};
use feedplan::core::Storage;
use feedplan::domain::model::{parse_date, ProductRef, Stage};
use feedplan::utils::error::ErrorSeverity;
use feedplan::utils::{logger, validation::Validate};
use feedplan::{
    resolve, ApiClient, CliConfig, Command, FeedConfig, FeedError, FeedingReportPipeline,
    LocalStorage, ReportEngine, SessionStore,
};
use std::collections::HashMap;
use std::path::Path;

fn load_config(cli: &CliConfig) -> feedplan::Result<FeedConfig> {
    let mut config = if Path::new(&cli.config).exists() {
        FeedConfig::from_file(&cli.config)?
    } else if let Some(base_url) = &cli.base_url {
        tracing::info!("No config file at {}, using defaults", cli.config);
        FeedConfig::new(base_url.clone())
    } else {
        return Err(FeedError::MissingConfigError {
            field: format!("{} (or --base-url)", cli.config),
        });
    };

    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    Ok(config)
}

fn reference_date(date: Option<&str>) -> feedplan::Result<chrono::NaiveDate> {
    date.map(parse_date).transpose().map(|d| d.unwrap_or_else(today))
}

async fn run(command: Command, mut config: FeedConfig) -> feedplan::Result<()> {
    let sessions = SessionStore::new(LocalStorage::new(config.session.path.clone()));
    let client = ApiClient::new(&config.api, sessions)?;

    match command {
        Command::Login { username, password } => {
            let password = match password.or_else(|| std::env::var("FEEDPLAN_PASSWORD").ok()) {
                Some(p) => p,
                None => {
                    return Err(FeedError::MissingConfigError {
                        field: "--password (or FEEDPLAN_PASSWORD)".to_string(),
                    })
                }
            };
            let session = client.login(&username, &password).await?;
            println!("✅ Logged in as {}", session.username);
        }
        Command::Logout => {
            client.logout().await?;
            println!("👋 Session cleared");
        }
        Command::Plans => {
            for plan in client.list_plans().await? {
                println!(
                    "📋 {} [{}] animal {} - {} stages",
                    plan.name,
                    plan.id,
                    plan.animal_name.as_deref().unwrap_or(&plan.animal_id),
                    plan.stages.len()
                );
                let mut stages: Vec<_> = plan.stages.iter().collect();
                stages.sort_by_key(|s| s.range());
                for stage in stages {
                    println!(
                        "   days {:>3}-{:<3}  {:<24} {} per animal, {}",
                        stage.day_start,
                        stage.day_end,
                        stage.product.display_name(),
                        stage.quantity_per_animal,
                        stage.frequency
                    );
                }
                warn_overlaps(&plan);
            }
        }
        Command::Resolve {
            lot,
            date,
            fallback,
        } => {
            let today = reference_date(date.as_deref())?;
            let lot = client.get_lot(&lot).await?;
            let plan = client
                .plan_for_animal(&lot.animal_id)
                .await?
                .ok_or_else(|| FeedError::PlanNotFound {
                    animal_id: lot.animal_id.clone(),
                })?;

            let age = age_in_days(lot.birth_date, today);
            let policy = fallback.unwrap_or(config.report.fallback);
            let resolution = resolve(age, &plan.stages, policy);

            println!("🐣 Lot {} - day {} - {} live animals", lot.code, age, lot.quantity);
            if resolution.is_empty() {
                println!("⚠️ No stage of '{}' covers day {}", plan.name, age);
                return Ok(());
            }
            if !resolution.exact {
                println!("ℹ️ No exact stage, using the nearest one");
            }
            for group in &resolution.groups {
                println!(
                    "   days {}: {} ({} per animal, {})",
                    group.range_label(),
                    group.product_names(),
                    group.quantity_per_animal(),
                    group.frequency
                );
                for text in &group.instructions {
                    println!("      {}", text);
                }
            }

            let products: HashMap<_, _> = match client.list_products().await {
                Ok(products) => products.into_iter().map(|p| (p.id.clone(), p)).collect(),
                Err(e) => {
                    tracing::warn!("⚠️ Could not fetch products: {}", e);
                    HashMap::new()
                }
            };
            println!("   Total: {}", resolution_total(&resolution, lot.quantity)?);
            if let Some(cost) = ration_cost(&resolution, lot.quantity, &products)? {
                println!("   Cost: {}", cost);
            }
        }
        Command::Report { date, fallback } => {
            let today = reference_date(date.as_deref())?;
            if let Some(policy) = fallback {
                config.report.fallback = policy;
            }

            let storage = LocalStorage::new(config.report.output_path.clone());
            let pipeline = FeedingReportPipeline::new(storage, client, config, today);
            let output_path = ReportEngine::new(pipeline).run().await?;
            println!("✅ Report saved to: {}", output_path);
        }
        Command::ExportPlan { plan, output } => {
            let plan = client.get_plan(&plan).await?;
            let csv = stages_to_csv(&plan)?;
            let filename = output.unwrap_or_else(|| format!("plan_{}.csv", plan.id));

            let storage = LocalStorage::new(config.report.output_path.clone());
            storage.write_file(&filename, csv.as_bytes()).await?;
            println!("📁 Plan exported to: {}/{}", storage.base_path(), filename);
        }
        Command::AddStage {
            plan,
            start,
            end,
            product,
            quantity,
            frequency,
            instructions,
        } => {
            let plan = client.get_plan(&plan).await?;
            let mut stage = Stage::new(
                start,
                end,
                ProductRef {
                    id: product,
                    name: None,
                },
                quantity,
                frequency,
            )?;
            if let Some(text) = instructions {
                stage = stage.with_instructions(text);
            }

            for overlap in overlaps_with(&plan, &stage) {
                tracing::warn!("⚠️ New stage overlaps: {}", overlap);
            }

            let created = client.create_stage(&plan.id, &stage).await?;
            println!(
                "✅ Stage {}-{} added to '{}'{}",
                created.day_start,
                created.day_end,
                plan.name,
                created.id.map(|id| format!(" (id {id})")).unwrap_or_default()
            );
        }
        Command::RemoveStage { stage } => {
            client.delete_stage(&stage).await?;
            println!("🗑️ Stage {} removed", stage);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting feedplan");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
