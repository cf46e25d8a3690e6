use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use u_banker::config::RunConfig;
use u_banker::loader;
use u_banker::models::{ProcessDescriptor, ResourceCatalog};
use u_banker::report::{runs_to_json, RunSummary, StateReport};
use u_banker::scheduler::{RunReport, Scheduler, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Sequential,
    Edf,
    Llf,
    All,
}

impl StrategyArg {
    fn strategies(self) -> Vec<Strategy> {
        match self {
            StrategyArg::Sequential => vec![Strategy::Sequential],
            StrategyArg::Edf => vec![Strategy::Edf],
            StrategyArg::Llf => vec![Strategy::Llf],
            StrategyArg::All => Strategy::ALL.to_vec(),
        }
    }
}

/// Replays process descriptors against a deadlock-avoiding resource ledger.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Opts {
    /// Resource descriptor file
    resources: PathBuf,
    /// Process descriptor file
    processes: PathBuf,
    /// Scheduling strategy
    #[arg(long, value_enum, default_value_t = StrategyArg::All)]
    strategy: StrategyArg,
    /// JSON run configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print run reports as JSON instead of text
    #[arg(long)]
    json: bool,
    /// Read both descriptor files as JSON
    #[arg(long)]
    json_input: bool,
}

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn load(opts: &Opts, config: &RunConfig) -> u_banker::Result<(ResourceCatalog, Vec<ProcessDescriptor>)> {
    if opts.json_input {
        Ok((
            loader::load_resources_json(&opts.resources)?,
            loader::load_processes_json(&opts.processes, config)?,
        ))
    } else {
        Ok((
            loader::load_resources(&opts.resources)?,
            loader::load_processes(&opts.processes, config)?,
        ))
    }
}

fn run(opts: &Opts) -> u_banker::Result<()> {
    let config = match &opts.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    let (catalog, processes) = load(opts, &config)?;
    log::info!(
        "Loaded {} resource types and {} processes",
        catalog.len(),
        processes.len()
    );

    let scheduler = Scheduler::new(catalog, processes, config)?;
    let reports = opts
        .strategy
        .strategies()
        .into_iter()
        .map(|strategy| scheduler.run(strategy))
        .collect::<Result<Vec<RunReport>, _>>()?;

    if opts.json {
        println!("{}", runs_to_json(&reports)?);
        return Ok(());
    }

    if let Some(first) = reports.first() {
        println!("{}", StateReport::new(&first.initial, scheduler.catalog()));
    }
    for report in &reports {
        println!("{}", RunSummary::new(report, scheduler.catalog()));
    }
    Ok(())
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    setup_logging();

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
