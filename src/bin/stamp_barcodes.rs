//! Stamp barcodes onto every PDF in a folder
//!
//! Usage:
//!   cargo run --release --bin stamp_barcodes -- <folder>
//!   cargo run --release --bin stamp_barcodes -- <folder> --store codeabar.db --export-json records.json
//!
//! Options:
//!   --store PATH         record store file (default: codeabar.db)
//!   --config FILE        JSON configuration file
//!   --output-dir NAME    output subdirectory name (default: processed)
//!   --export-json FILE   after the run, export all stored records as JSON
//!   --verbose, -v        debug logging

use pdf_barcode_stamper::batch::{spawn_batch, BatchEvent, BatchOrchestrator};
use pdf_barcode_stamper::config::BatchConfig;
use pdf_barcode_stamper::records::SqliteRecordSink;
use std::path::PathBuf;
use std::process::ExitCode;

struct CliConfig {
    source_dir: Option<PathBuf>,
    store_path: Option<PathBuf>,
    config_file: Option<PathBuf>,
    output_dir: Option<String>,
    export_json: Option<PathBuf>,
    verbose: bool,
}

impl CliConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut cli = Self {
            source_dir: None,
            store_path: None,
            config_file: None,
            output_dir: None,
            export_json: None,
            verbose: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--store" => {
                    i += 1;
                    cli.store_path = args.get(i).map(PathBuf::from);
                },
                "--config" => {
                    i += 1;
                    cli.config_file = args.get(i).map(PathBuf::from);
                },
                "--output-dir" => {
                    i += 1;
                    cli.output_dir = args.get(i).cloned();
                },
                "--export-json" => {
                    i += 1;
                    cli.export_json = args.get(i).map(PathBuf::from);
                },
                "--verbose" | "-v" => {
                    cli.verbose = true;
                },
                other if !other.starts_with('-') && cli.source_dir.is_none() => {
                    cli.source_dir = Some(PathBuf::from(other));
                },
                other => eprintln!("Ignoring unknown argument: {}", other),
            }
            i += 1;
        }

        cli
    }

    fn batch_config(&self) -> pdf_barcode_stamper::Result<BatchConfig> {
        let mut config = match &self.config_file {
            Some(path) => BatchConfig::from_json_file(path)?,
            None => BatchConfig::default(),
        };
        if let Some(store) = &self.store_path {
            config = config.with_store_path(store);
        }
        if let Some(name) = &self.output_dir {
            config = config.with_output_dir_name(name);
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = CliConfig::from_args();
    let default_filter = if cli.verbose { "debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let Some(source_dir) = cli.source_dir.clone() else {
        eprintln!("Usage: stamp_barcodes <folder> [--store PATH] [--config FILE] [--output-dir NAME] [--export-json FILE] [--verbose]");
        return ExitCode::from(2);
    };
    if !source_dir.is_dir() {
        eprintln!("Error: {} is not a folder", source_dir.display());
        return ExitCode::from(2);
    }

    let config = match cli.batch_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        },
    };
    let store_path = config.store_path.clone();

    println!("PDF Barcode Stamper");
    println!("===================");
    println!("Source folder: {}", source_dir.display());
    println!("Record store: {}", store_path.display());
    println!();

    let orchestrator = match BatchOrchestrator::new(config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        },
    };

    let (worker, events) = match spawn_batch(orchestrator, source_dir) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Error: could not start worker: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let mut succeeded = true;
    for event in events {
        match event {
            BatchEvent::Log(line) => println!("{}", line),
            progress @ BatchEvent::Progress { current, total } => {
                let percent = progress.fraction().unwrap_or(1.0) * 100.0;
                println!("Progress: {}/{} ({:.0}%)", current, total, percent);
            },
            BatchEvent::Finished(result) => {
                println!();
                println!("{}", result);
                for issue in &result.issues {
                    println!("  ✗ {}", issue);
                }
            },
            BatchEvent::Aborted(reason) => {
                eprintln!("Aborted: {}", reason);
                succeeded = false;
            },
        }
    }

    if worker.join().is_err() {
        eprintln!("Error: worker thread panicked");
        return ExitCode::FAILURE;
    }

    if let Some(export_path) = &cli.export_json {
        let exported = SqliteRecordSink::open(&store_path)
            .and_then(|store| store.export_json(export_path));
        match exported {
            Ok(count) => println!("Exported {} record(s) to {}", count, export_path.display()),
            Err(e) => {
                eprintln!("Error exporting records: {}", e);
                succeeded = false;
            },
        }
    }

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
