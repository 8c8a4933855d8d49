//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::adapters::console_report_adapter::ConsoleReportAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::{ScreenConfig, build_screen_config};
use crate::domain::display::format_krw;
use crate::domain::error::ScreenerError;
use crate::domain::scan::run_scan;
use crate::domain::strategy::{StrategyId, StrategySet};
use crate::domain::strategy_eval::StrategyRegistry;
use crate::domain::universe::load_universe;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "screener", about = "Daily-bar stock screener for KOSPI/KOSDAQ/KONEX")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the universe and print ranked recommendations
    Scan {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory holding instruments.csv and per-code bar files
        #[arg(short, long)]
        data: PathBuf,
        /// Also write CSV tables into this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override a config value, e.g. scan.strategy_set=swing8
        #[arg(long = "set", value_name = "SECTION.KEY=VALUE")]
        overrides: Vec<String>,
        /// Last bar date to scan (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        sequential: bool,
        /// Stop the scan once this file exists
        #[arg(long)]
        stop_file: Option<PathBuf>,
        #[arg(long)]
        show_skipped: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long = "set", value_name = "SECTION.KEY=VALUE")]
        overrides: Vec<String>,
    },
    /// List the instruments that pass the universe filter
    ListUniverse {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Show the strategy catalogue
    Strategies {
        /// Only show strategies enabled by this set
        #[arg(long)]
        set: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Scan {
            config,
            data,
            output,
            overrides,
            end_date,
            sequential,
            stop_file,
            show_skipped,
        } => {
            let mut overrides = overrides;
            if let Some(date) = end_date {
                overrides.push(format!("scan.end_date={}", date));
            }
            if sequential {
                overrides.push("scan.parallel=false".to_string());
            }
            run_scan_command(
                config.as_deref(),
                &overrides,
                &data,
                output.as_deref(),
                stop_file,
                show_skipped,
            )
        }
        Command::Validate { config, overrides } => run_validate(&config, &overrides),
        Command::ListUniverse { config, data } => run_list_universe(config.as_deref(), &data),
        Command::Strategies { set } => run_strategies(set.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load `path` (or nothing) and layer `section.key=value` overrides on top.
pub fn load_config(
    path: Option<&Path>,
    overrides: &[String],
) -> Result<FileConfigAdapter, ScreenerError> {
    let mut adapter = match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p)?
        }
        None => FileConfigAdapter::empty(),
    };
    for assignment in overrides {
        adapter.apply_override(assignment)?;
    }
    Ok(adapter)
}

/// Resolve a [`ScreenConfig`] with today's local date as the default end date.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &[String],
) -> Result<ScreenConfig, ScreenerError> {
    let adapter = load_config(path, overrides)?;
    build_screen_config(&adapter, today())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Raise `cancel` once `stop_file` appears. The watcher exits when `done` is set.
fn watch_stop_file(stop_file: PathBuf, cancel: Arc<AtomicBool>, done: Arc<AtomicBool>) {
    thread::spawn(move || {
        while !done.load(Ordering::Relaxed) {
            if stop_file.exists() {
                eprintln!("Stop file {} found, cancelling scan", stop_file.display());
                cancel.store(true, Ordering::Relaxed);
                return;
            }
            thread::sleep(Duration::from_millis(200));
        }
    });
}

fn run_scan_command(
    config_path: Option<&Path>,
    overrides: &[String],
    data_dir: &Path,
    output_dir: Option<&Path>,
    stop_file: Option<PathBuf>,
    show_skipped: bool,
) -> Result<(), ScreenerError> {
    let config = resolve_config(config_path, overrides)?;
    eprintln!(
        "Strategy set {} ({} strategies), bars {} to {}",
        config.strategy_set,
        config.enabled.len(),
        config.start_date(),
        config.end_date
    );

    let port: Arc<dyn DataPort> = Arc::new(CsvAdapter::new(data_dir.to_path_buf()));
    let universe = load_universe(port.as_ref(), &config.universe)?;
    if universe.is_empty() {
        eprintln!("No instruments passed the universe filter");
    } else {
        eprintln!("Scanning {} instruments...", universe.len());
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let done = Arc::new(AtomicBool::new(false));
    if let Some(path) = stop_file {
        watch_stop_file(path, Arc::clone(&cancel), Arc::clone(&done));
    }

    let report = run_scan(port, &universe, &config, &cancel, |finished, total, _code| {
        if finished % 100 == 0 || finished == total {
            eprintln!("  {}/{} instruments", finished, total);
        }
    });
    done.store(true, Ordering::Relaxed);
    let report = report?;

    if report.cancelled {
        eprintln!("Scan cancelled: reporting {} finished instruments", report.scanned);
    }

    ConsoleReportAdapter::new(show_skipped).write(&report)?;
    if let Some(dir) = output_dir {
        CsvReportAdapter::new(dir.to_path_buf()).write(&report)?;
        eprintln!("\nCSV tables written to: {}", dir.display());
    }
    Ok(())
}

fn run_validate(config_path: &Path, overrides: &[String]) -> Result<(), ScreenerError> {
    let config = resolve_config(Some(config_path), overrides)?;
    StrategyRegistry::standard().validate()?;

    eprintln!("Config validated successfully");
    eprintln!("\nScan:");
    eprintln!("  strategy set:  {}", config.strategy_set);
    eprintln!("  window:        {} to {}", config.start_date(), config.end_date);
    eprintln!("  min bars:      {}", config.min_bars);
    eprintln!("  parallel:      {}", config.parallel);
    eprintln!("\nUniverse:");
    eprintln!("  min market cap: {}", format_krw(config.universe.min_market_cap));
    if let Some(codes) = &config.universe.codes {
        eprintln!("  codes: {}", codes.join(", "));
    }
    eprintln!("\nSynergy combos:");
    if config.synergies.is_empty() {
        eprintln!("  (none)");
    }
    for combo in &config.synergies {
        let members: Vec<String> = combo.members.iter().map(|id| id.number().to_string()).collect();
        eprintln!("  {} [{}]: {}", combo.name, members.join("+"), combo.description);
    }
    Ok(())
}

fn run_list_universe(config_path: Option<&Path>, data_dir: &Path) -> Result<(), ScreenerError> {
    let config = resolve_config(config_path, &[])?;
    let port = CsvAdapter::new(data_dir.to_path_buf());
    let universe = load_universe(&port, &config.universe)?;

    if universe.is_empty() {
        eprintln!("No instruments passed the universe filter");
        return Ok(());
    }
    for instrument in &universe {
        println!(
            "{}\t{}\t{}\t{}",
            instrument.code,
            instrument.name,
            instrument.segment,
            format_krw(instrument.market_cap)
        );
    }
    eprintln!("{} instruments", universe.len());
    Ok(())
}

fn run_strategies(set: Option<&str>) -> Result<(), ScreenerError> {
    let ids: Vec<StrategyId> = match set {
        Some(s) => s
            .parse::<StrategySet>()
            .map_err(|reason| ScreenerError::ConfigInvalid {
                section: "scan".into(),
                key: "strategy_set".into(),
                reason,
            })?
            .enabled(),
        None => StrategyId::ALL.to_vec(),
    };
    for id in ids {
        println!(
            "{:>2}  {:<8}  {}",
            id.number(),
            id.family().to_string(),
            id.description()
        );
    }
    Ok(())
}
