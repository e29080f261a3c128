//! parkpulse - park activity status from the command line.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid input, bad configuration or unusable storage

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command, HazardCommand, ParkingCommand};
use parkpulse_core::config::DEFAULT_CONFIG_FILE;
use parkpulse_core::geo::GeoPoint;
use parkpulse_core::hazards::{AreaAlert, HazardReport};
use parkpulse_core::parking::LotSnapshot;
use parkpulse_core::{AreaKind, AreaStatusView, Config, ParkPulse, ParkPulseBuilder};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    if args.command == Command::InitConfig {
        print!("{}", Config::default_toml());
        return Ok(());
    }

    let config = load_config(&args)?;
    let app = ParkPulseBuilder::new()
        .config(config)
        .build()
        .await
        .context("Failed to start parkpulse")?;

    let result = run(&app, args.command).await;

    let abandoned = app.shutdown(Duration::from_secs(args.grace_secs)).await;
    debug!(abandoned, "shutdown complete");

    result
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    if let Some(path) = &args.config {
        info!("Loading config from {}", path.display());
        return Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match Config::load_default().with_context(|| format!("Failed to load {DEFAULT_CONFIG_FILE}"))? {
        Some(config) => {
            info!("Loaded config from {DEFAULT_CONFIG_FILE}");
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

async fn run(app: &ParkPulse, command: Command) -> Result<()> {
    match command {
        Command::Report { area, level } => {
            let id = app.submit_activity_report(&area, &level).await?;
            println!(
                "Recorded {} for {} ({id}). Now: {}",
                level.trim(),
                area,
                app.current_status(&area)
            );
        }
        Command::Status { area, json } => {
            let views = match area {
                Some(name) => vec![app.explain(name.parse::<AreaKind>()?)],
                None => app.status_board(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                print_status(&views);
            }
        }
        Command::Parking(ParkingCommand::Show { json }) => {
            let lots = app.parking();
            if json {
                println!("{}", serde_json::to_string_pretty(&lots)?);
            } else {
                lots.iter().for_each(print_lot);
            }
        }
        Command::Parking(ParkingCommand::Adjust { lot, delta }) => {
            let snapshot = app.adjust_parking(&lot, delta).await?;
            print_lot(&snapshot);
        }
        Command::Hazard(HazardCommand::Report {
            kind,
            description,
            location,
            area,
        }) => {
            let report = app
                .submit_hazard_report(&kind, &description, location.as_deref(), area.as_deref())
                .await?;
            println!("Thank you for your report. It has been logged and will be reviewed.");
            print_hazard(&report);
        }
        Command::Hazard(HazardCommand::Alert { area, alert }) => {
            let report = app.raise_alert(&area, &alert).await?;
            println!("Thank you for reporting: {}", report.description);
        }
        Command::Hazard(HazardCommand::Alerts { area, json }) => {
            let alerts = app.area_alerts(area.parse::<AreaKind>()?);
            if json {
                println!("{}", serde_json::to_string_pretty(&alerts)?);
            } else if alerts.is_empty() {
                println!("No alerts for {area} in the last day.");
            } else {
                alerts.iter().for_each(print_alert);
            }
        }
        Command::Hazard(HazardCommand::List { json }) => {
            let reports = app.hazard_reports();
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                reports.iter().for_each(print_hazard);
            }
        }
        Command::CheckIn { lat, lng } => match app.check_in(GeoPoint::new(lat, lng)).await? {
            Some(snapshot) => {
                println!("Welcome to the park.");
                print_lot(&snapshot);
            }
            None => println!("Not inside the park; nothing recorded."),
        },
        Command::InitConfig => print!("{}", Config::default_toml()),
    }
    Ok(())
}

fn print_status(views: &[AreaStatusView]) {
    println!("{:<12} {:<8} {:>7} {:>9}", "AREA", "STATUS", "REPORTS", "WEIGHTED");
    for view in views {
        let avg = view
            .weighted_average
            .map_or_else(|| "-".to_string(), |avg| format!("{avg:.2}"));
        println!(
            "{:<12} {:<8} {:>7} {:>9}",
            view.area.as_str(),
            view.status.to_string(),
            view.reports,
            avg
        );
    }
}

fn print_lot(lot: &LotSnapshot) {
    println!(
        "{} ({}): {}/{} occupied, {} available, {:.0}% [{}]",
        lot.name, lot.lot_id, lot.occupied, lot.total_spots, lot.available, lot.percentage, lot.level
    );
}

fn print_hazard(report: &HazardReport) {
    let area = report.area.map_or("-", |a| a.as_str());
    println!(
        "[{}] {} @ {} (area: {}) {}",
        report.kind, report.description, report.location, area, report.id
    );
}

fn print_alert(alert: &AreaAlert) {
    let when = chrono::DateTime::from_timestamp_millis(alert.latest_ms)
        .map_or_else(|| alert.latest_ms.to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string());
    println!("{} x{} (latest {when})", alert.name, alert.count);
}
