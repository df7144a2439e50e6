//! CLI definition and dispatch.
//!
//! The orchestration layer: reads config and fills, builds a [`CalcInput`],
//! runs one recompute pass and renders the report.

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_fill_adapter::CsvFillAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report::JsonReport;
use crate::adapters::text_report::TextReport;
use crate::domain::calc::{self, BreakevenInput, CalcInput};
use crate::domain::config_validation::{parse_double, resolve_instrument, validate_calc_config};
use crate::domain::error::RiskCalcError;
use crate::domain::instrument::{Instrument, known_instruments};
use crate::domain::scale::DEFAULT_SCALE_ROWS;
use crate::domain::trade::{Direction, DivisionMode, Fill};
use crate::ports::config_port::ConfigPort;
use crate::ports::fill_port::FillPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "riskcalc", about = "Trade risk and R-multiple calculator")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute risk figures, the R-multiple table and break-even entry
    Calc {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        fills: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Adopt the current worst-case loss as the max risk before reporting
        #[arg(long)]
        accept_risk: bool,
    },
    /// Validate a calculator configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the built-in instrument presets
    Instruments,
    /// Snap a price onto an instrument's tick grid
    Round {
        #[arg(long, allow_hyphen_values = true)]
        price: f64,
        #[arg(long, conflicts_with_all = ["tick_size", "tick_value"])]
        preset: Option<String>,
        #[arg(long, requires = "tick_value")]
        tick_size: Option<f64>,
        #[arg(long, requires = "tick_size")]
        tick_value: Option<f64>,
        #[arg(long, default_value = "long")]
        direction: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(&cli.log_level);
    match cli.command {
        Command::Calc {
            config,
            fills,
            format,
            accept_risk,
        } => run_calc(&config, fills.as_deref(), format, accept_risk),
        Command::Validate { config } => run_validate(&config),
        Command::Instruments => run_instruments(),
        Command::Round {
            price,
            preset,
            tick_size,
            tick_value,
            direction,
        } => run_round(price, preset.as_deref(), tick_size, tick_value, &direction),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second init (tests calling run twice) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn fail(err: &RiskCalcError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RiskCalcError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_calc_input(
    config: &dyn ConfigPort,
    fills: Vec<Fill>,
) -> Result<CalcInput, RiskCalcError> {
    let instrument = resolve_instrument(config)?;

    let direction = config
        .get_string("trade", "direction")
        .map(|s| s.parse::<Direction>())
        .transpose()?
        .unwrap_or(Direction::Long);
    let mode = config
        .get_string("trade", "mode")
        .map(|s| s.parse::<DivisionMode>())
        .transpose()?
        .unwrap_or_default();

    let breakeven = match (
        parse_double(config, "breakeven", "target")?,
        parse_double(config, "breakeven", "contracts")?,
    ) {
        (Some(target), Some(contracts)) => Some(BreakevenInput { target, contracts }),
        _ => None,
    };

    let scale_rows = config.get_int("scale", "rows", DEFAULT_SCALE_ROWS as i64);

    Ok(CalcInput {
        tick_size: instrument.tick_size(),
        tick_value: instrument.tick_value(),
        direction,
        account_size: parse_double(config, "account", "size")?.unwrap_or(0.0),
        max_risk: parse_double(config, "trade", "max_risk")?.unwrap_or(0.0),
        mode,
        scale_rows: usize::try_from(scale_rows).unwrap_or(0),
        breakeven,
        fills,
    })
}

/// The fills file: command line first, then `[fills] path` resolved against
/// the config file's directory.
pub fn resolve_fills_path(
    fills_override: Option<&Path>,
    config: &dyn ConfigPort,
    config_path: &Path,
) -> Option<PathBuf> {
    if let Some(p) = fills_override {
        return Some(p.to_path_buf());
    }
    let configured = config
        .get_string("fills", "path")
        .filter(|s| !s.trim().is_empty())?;
    let configured = PathBuf::from(configured.trim());
    if configured.is_absolute() {
        return Some(configured);
    }
    let base = config_path.parent().unwrap_or_else(|| Path::new(""));
    Some(base.join(configured))
}

pub fn compute(
    config_path: &Path,
    fills_override: Option<&Path>,
    accept_risk: bool,
) -> Result<calc::CalcReport, RiskCalcError> {
    let config = load_config(config_path)?;
    validate_calc_config(&config)?;

    let fills = match resolve_fills_path(fills_override, &config, config_path) {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading fills");
            CsvFillAdapter::new(path).load_fills()?
        }
        None => {
            tracing::warn!("no fills file configured");
            Vec::new()
        }
    };

    let mut input = build_calc_input(&config, fills)?;
    if accept_risk {
        input = calc::accept_risk(&input)?;
    }

    tracing::info!(
        fills = input.fills.len(),
        direction = %input.direction,
        max_risk = input.max_risk,
        "running recalculation"
    );
    calc::recalc(&input)
}

fn run_calc(
    config_path: &Path,
    fills_override: Option<&Path>,
    format: OutputFormat,
    accept_risk: bool,
) -> ExitCode {
    let report = match compute(config_path, fills_override, accept_risk) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let writer: Box<dyn ReportPort> = match format {
        OutputFormat::Text => Box::new(TextReport),
        OutputFormat::Json => Box::new(JsonReport { pretty: true }),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match writer.write(&report, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if let Err(e) = validate_calc_config(&config) {
        return fail(&e);
    }
    match resolve_instrument(&config) {
        Ok(inst) => {
            println!(
                "Instrument: tick {} = ${:.2} ({} digits)",
                inst.format_price(inst.tick_size()),
                inst.tick_value(),
                inst.tick_size_digits()
            );
            println!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_instruments() -> ExitCode {
    println!("{:<8}  {:>10}  {:>10}", "Name", "Tick Size", "Tick Value");
    for (name, inst) in known_instruments() {
        println!(
            "{:<8}  {:>10}  {:>10.2}",
            name,
            inst.format_price(inst.tick_size()),
            inst.tick_value()
        );
    }
    ExitCode::SUCCESS
}

pub fn round_price(
    price: f64,
    preset: Option<&str>,
    tick_size: Option<f64>,
    tick_value: Option<f64>,
    direction: &str,
) -> Result<String, RiskCalcError> {
    let inst = match (preset, tick_size, tick_value) {
        (Some(name), _, _) => Instrument::preset(name)?,
        (None, Some(size), Some(value)) => Instrument::new(size, value)?,
        _ => {
            return Err(RiskCalcError::invalid(
                "instrument",
                "give --preset or both --tick-size and --tick-value",
            ));
        }
    };
    let direction: Direction = direction.parse()?;
    Ok(inst.format_price(inst.round(price, direction.sign())))
}

fn run_round(
    price: f64,
    preset: Option<&str>,
    tick_size: Option<f64>,
    tick_value: Option<f64>,
    direction: &str,
) -> ExitCode {
    match round_price(price, preset, tick_size, tick_value, direction) {
        Ok(rounded) => {
            println!("{rounded}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
