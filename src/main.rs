use anyhow::Context;
use clap::Parser;
use std::path::Path;
use turf_engine::adapters::csv_source::load_voters;
use turf_engine::config::cli::Command;
use turf_engine::domain::ports::SettingsProvider;
use turf_engine::utils::error::ErrorSeverity;
use turf_engine::utils::monitor::SystemMonitor;
use turf_engine::utils::{logger, validation::Validate};
use turf_engine::{CliConfig, InMemoryStore, Route, Turf, TurfConfig, TurfEngine, TurfError};

#[derive(serde::Serialize)]
struct TurfReport {
    turf: Turf,
    route: Option<Route>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 載入 TOML 配置
    let mut config = match TurfConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(voters) = &args.voters {
        config.source.voters_csv = voters.clone();
    }
    if let Some(output) = &args.output {
        config.output = Some(turf_engine::config::toml_config::OutputConfig {
            path: output.clone(),
            pretty: config.output.as_ref().and_then(|o| o.pretty),
        });
    }

    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("🚀 Starting turf-engine for list {}", args.list_id());

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let monitor = SystemMonitor::new(args.monitor.unwrap_or_else(|| config.monitoring_enabled()));
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let rows = load_voters(&config.source.voters_csv)
        .with_context(|| format!("loading voters from {}", config.source.voters_csv))?;
    tracing::info!("📥 Loaded {} voter rows", rows.len());
    monitor.log_phase("load");

    let output_dir = config.output_path().to_string();
    let pretty = config.pretty_output();
    let engine = TurfEngine::new(InMemoryStore::from_rows(rows), config.engine.clone());

    let outcome = run(&engine, &args.command).await;
    monitor.log_phase("turfs");

    match outcome {
        Ok(reports) => {
            let path = write_reports(&output_dir, args.list_id(), &reports, pretty)?;
            println!("✅ {} turfs written to {}", reports.len(), path);
            for report in &reports {
                println!(
                    "  #{} {}: {} voters, {} doors, ~{} min",
                    report.turf.id,
                    report.turf.name,
                    report.turf.voter_count,
                    report.turf.door_count,
                    report.turf.estimated_time_minutes
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Turf run failed: {} (Category: {:?}, Severity: {:?})",
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
            Ok(())
        }
    }
}

async fn run(
    engine: &TurfEngine<InMemoryStore, turf_engine::EngineSettings>,
    command: &Command,
) -> Result<Vec<TurfReport>, TurfError> {
    let (turfs, with_routes) = match command {
        Command::Cut {
            list,
            doors_per_turf,
            method,
            routes,
        } => {
            let doors = doors_per_turf.unwrap_or_else(|| engine.settings().doors_per_turf());
            let method = method.unwrap_or(engine.settings().method);
            let summary = engine.auto_cut(list, doors, method).await?;
            for failed in &summary.failed {
                eprintln!("⚠️ Turf '{}' was not created: {}", failed.name, failed.error);
            }
            (summary.created, *routes)
        }
        Command::Draw {
            list,
            polygon,
            name,
            route,
        } => {
            let geometry: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(polygon)?)?;
            (vec![engine.create_manual(list, &geometry, name).await?], *route)
        }
    };

    let mut reports = Vec::with_capacity(turfs.len());
    for turf in turfs {
        let route = if with_routes {
            Some(engine.get_route(turf.id).await?)
        } else {
            None
        };
        reports.push(TurfReport { turf, route });
    }
    Ok(reports)
}

fn write_reports(
    output_dir: &str,
    list_id: &str,
    reports: &[TurfReport],
    pretty: bool,
) -> anyhow::Result<String> {
    std::fs::create_dir_all(output_dir)?;
    let path = Path::new(output_dir).join(format!(
        "turfs_{}_{}.json",
        list_id,
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ));
    let json = if pretty {
        serde_json::to_string_pretty(reports)?
    } else {
        serde_json::to_string(reports)?
    };
    std::fs::write(&path, json)?;
    Ok(path.display().to_string())
}
