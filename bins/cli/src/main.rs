//! ICP batch commands.
//!
//! ```text
//! icp monthly                      # every duty party, current month
//! icp monthly --offset 1           # previous month
//! icp monthly --month 2022-01
//! icp vat --vat NL123456789B01     # full history of one importer VAT number
//! icp audit --month 2022-09
//! ```

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sea_orm::DatabaseConnection;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use icp_core::archive::VatNoteArchiver;
use icp_core::audit::{AuditService, AuditSettings};
use icp_core::icp::{IcpReport, IcpService, IcpSettings};
use icp_core::storage::{StorageConfig, StorageService};
use icp_core::vat::VatService;
use icp_db::{
    AuditRecordRepository, DeclarationStore, GenerationStore, VatHistoryRepository, connect,
};
use icp_shared::{AppConfig, ReportMonth};

#[derive(Parser)]
#[command(name = "icp")]
#[command(about = "Customs ICP and audit workbook generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// One ICP file for every duty party that filed tax in the month.
    Monthly(PeriodArgs),
    /// One ICP file covering every declaration of an importer VAT number.
    Vat(VatArgs),
    /// The audit workbook of declarations submitted in the month.
    Audit(PeriodArgs),
}

#[derive(Args)]
struct PeriodArgs {
    /// Month to generate (YYYY-MM), defaults to the current month.
    #[arg(long, value_parser = ReportMonth::parse)]
    month: Option<ReportMonth>,
    /// Months to step back from --month.
    #[arg(long, default_value_t = 0)]
    offset: u32,
}

impl PeriodArgs {
    fn resolve(&self) -> ReportMonth {
        self.month
            .unwrap_or_else(ReportMonth::current)
            .minus_months(self.offset)
    }
}

#[derive(Args)]
struct VatArgs {
    /// Importer VAT number.
    #[arg(long)]
    vat: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "icp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate()?;
    let db = Arc::new(connect(&config.database).await?);
    info!("Connected to database");

    let started = Instant::now();
    let errors = match cli.command {
        Command::Monthly(args) => monthly(db, &config, args.resolve()).await?,
        Command::Vat(args) => vat(db, &config, &args.vat).await?,
        Command::Audit(args) => audit(db, &config, args.resolve()).await?,
    };

    if errors.is_empty() {
        println!("Finished without errors");
    } else {
        println!("Finished with {} error(s):", errors.len());
        for error in &errors {
            println!("  - {error}");
        }
    }
    println!("**** Generate time costs: {} ms ****", started.elapsed().as_millis());
    Ok(())
}

fn report_lines(report: &IcpReport) -> Vec<String> {
    println!(
        "{}: {} declarations, {} rows, written: {}",
        report.path.display(),
        report.declarations,
        report.rows,
        report.written
    );
    if let Some(archive) = &report.vat_note {
        println!("  VAT notes: {archive}");
    }
    report
        .errors
        .iter()
        .map(|e| format!("{}: {e}", report.file_name))
        .collect()
}

async fn monthly(
    db: Arc<DatabaseConnection>,
    config: &AppConfig,
    month: ReportMonth,
) -> anyhow::Result<Vec<String>> {
    let mut service = IcpService::new(
        Arc::new(DeclarationStore::new(Arc::clone(&db))),
        Arc::new(GenerationStore::new(db)),
        IcpSettings::from_config(&config.icp),
    );
    if let Some(archiver) = VatNoteArchiver::from_config(&config.vat_note)? {
        service = service.with_vat_notes(archiver);
    }

    let outcome = service.generate_monthly(month).await?;
    let mut errors: Vec<String> = outcome.errors.iter().map(ToString::to_string).collect();
    for report in &outcome.value {
        errors.extend(report_lines(report));
    }
    Ok(errors)
}

async fn vat(
    db: Arc<DatabaseConnection>,
    config: &AppConfig,
    vat_no: &str,
) -> anyhow::Result<Vec<String>> {
    let service = VatService::new(
        Arc::new(VatHistoryRepository::new(Arc::clone(&db))),
        Arc::new(DeclarationStore::new(Arc::clone(&db))),
        Arc::new(GenerationStore::new(db)),
        IcpSettings::from_config(&config.icp),
    );
    let report = service.generate(vat_no).await?;
    Ok(report_lines(&report))
}

async fn audit(
    db: Arc<DatabaseConnection>,
    config: &AppConfig,
    month: ReportMonth,
) -> anyhow::Result<Vec<String>> {
    let storage = config
        .oss
        .as_ref()
        .map(|oss| StorageService::from_config(StorageConfig::from(oss)))
        .transpose()?;
    let service = AuditService::new(
        Arc::new(AuditRecordRepository::new(db)),
        storage,
        AuditSettings::from(&config.audit),
    );

    let report = service.generate(month).await?;
    println!(
        "{}: {} rows, {} screenshots",
        report.path.display(),
        report.rows,
        report.screenshots
    );
    Ok(report.errors.iter().map(ToString::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_period_offset() {
        let cli = Cli::parse_from(["icp", "monthly", "--month", "2022-01", "--offset", "2"]);
        let Command::Monthly(args) = cli.command else {
            panic!("expected monthly");
        };
        assert_eq!(args.resolve(), ReportMonth::parse("2021-11").unwrap());
    }

    #[test]
    fn test_rejects_bad_month() {
        assert!(Cli::try_parse_from(["icp", "audit", "--month", "2022/01"]).is_err());
    }

    #[test]
    fn test_vat_requires_number() {
        assert!(Cli::try_parse_from(["icp", "vat"]).is_err());
        let cli = Cli::parse_from(["icp", "vat", "--vat", "NL123"]);
        assert!(matches!(cli.command, Command::Vat(VatArgs { ref vat }) if vat == "NL123"));
    }
}
