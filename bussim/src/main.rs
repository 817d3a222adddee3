//! Bus transit network simulation application.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::path::PathBuf;

use eyre::WrapErr;
use structopt::StructOpt;

use bussim::report::{write_csv, Summary};
use bussim::{Config, Metrics, TransitSimulation};

/// Runs a bus transit network simulation.
#[derive(StructOpt)]
#[structopt(name = "bussim")]
struct Opt {
    /// Path to a JSON file with the network configuration.
    /// If absent, the built-in two-route network is simulated.
    #[structopt(long)]
    config: Option<PathBuf>,

    /// Seed of the random number generator.
    #[structopt(long, default_value = "42")]
    seed: u64,

    /// Overrides the horizon of the configuration.
    #[structopt(long)]
    horizon: Option<f64>,

    /// Directory where the CSV files are written.
    #[structopt(long, default_value = ".")]
    output_dir: PathBuf,

    /// Do not write the CSV files.
    #[structopt(long)]
    no_csv: bool,

    /// Do not display the progress bar.
    #[structopt(long)]
    no_progress: bool,

    /// Verbosity.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,

    /// Store the logs this file.
    #[structopt(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[structopt(long)]
    no_stderr: bool,
}

fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        3 => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        let _ = std::fs::remove_file(path);
        dispatch.chain(
            std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .append(false)
                .open(path)?,
        )
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(std::io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

fn load_config(opt: &Opt) -> eyre::Result<Config> {
    let mut config = match &opt.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    if let Some(horizon) = opt.horizon {
        config.horizon = horizon;
    }
    Ok(config)
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::from_args();
    set_up_logger(&opt)?;
    let config = load_config(&opt)?;

    let mut simulation = TransitSimulation::new(&config, opt.seed, Metrics::default())
        .wrap_err("invalid network configuration")?;
    let processed = if opt.no_progress {
        simulation.run()
    } else {
        simulation.run_with_progress()
    };
    log::info!(
        "Processed {} events; {} passengers left waiting",
        processed,
        simulation.waiting_passengers()
    );

    let metrics = simulation.into_sink();
    print!("{}", Summary::from_metrics(&metrics, config.service.capacity));
    if !opt.no_csv {
        std::fs::create_dir_all(&opt.output_dir).wrap_err_with(|| {
            format!("unable to create directory {}", opt.output_dir.display())
        })?;
        write_csv(&metrics, &opt.output_dir)?;
    }
    Ok(())
}
