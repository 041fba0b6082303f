use clap::Parser;
use drlcheck_core::cli::{Cli, OutputFormat};
use drlcheck_core::ingest::{read_records, StudyDateRange};
use drlcheck_core::{
    ComplianceReport, DrlComparison, Modality, ProtocolStore, StoreConfig, TextReport,
};
use log::{error, info, warn};
use std::process;

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let modality: Modality = cli.modality.into();

    if !cli.records.is_file() {
        eprintln!("Error: {} is not a file", cli.records.display());
        process::exit(1);
    }

    // Only the selected modality is needed for a run
    let config = StoreConfig::default().with_config_dir(&cli.config_dir);
    let mut store = ProtocolStore::new(config);
    if let Err(e) = store.load(modality) {
        error!("Failed to load {} configuration: {}", modality, e);
        eprintln!("Error: Failed to load {} configuration: {}", modality, e);
        process::exit(1);
    }
    if store.list_all(modality).is_empty() {
        warn!(
            "No {} protocols configured in {}",
            modality,
            cli.config_dir.display()
        );
    }

    let records = match read_records(&cli.records, modality) {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to read exam records: {}", e);
            eprintln!("Error: Failed to read exam records: {}", e);
            process::exit(1);
        }
    };

    let mut range = StudyDateRange::default();
    if let Some(from) = cli.from {
        range = range.with_from(from);
    }
    if let Some(to) = cli.to {
        range = range.with_to(to);
    }
    let records = range.filter(records);

    if records.is_empty() {
        eprintln!("Error: No {} exam records to compare", modality);
        process::exit(1);
    }

    info!("Comparing {} {} records", records.len(), modality);

    let report = DrlComparison::new(&store, modality).run(&records);

    output_report(&report, cli.format);
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn output_report(report: &ComplianceReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("{}", TextReport::new(report));
        }
        OutputFormat::Json => match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize to JSON: {}", e);
                eprintln!("Error: Failed to serialize to JSON: {}", e);
                process::exit(1);
            }
        },
    }
}
