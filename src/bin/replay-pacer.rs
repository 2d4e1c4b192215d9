//! Binary entry point for the replay pacer tooling.
#![forbid(unsafe_code)]

use std::error::Error;
use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use replay_pacer::{
    cli::{
        config_file::{load_config, render_config, CONFIG_ENV},
        simulate::{run_simulation, SimulationOptions, SimulationStep},
    },
    pacer::PacerConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "replay-pacer",
    version,
    about = "Inspect and simulate the adaptive replay budget controller",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a pacer configuration.
    Config {
        #[arg(long, value_enum, default_value_t = Preset::Default, help = "Configuration preset")]
        preset: Preset,
    },
    /// Run the controller against a synthetic replay workload.
    Simulate(SimulateCmd),
}

#[derive(Args, Debug)]
struct SimulateCmd {
    #[arg(long, env = CONFIG_ENV, value_name = "FILE", help = "Pacer config file (TOML)")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 50, help = "Controller cycles to run")]
    cycles: u32,

    #[arg(long, default_value_t = 0, help = "Workload RNG seed")]
    seed: u64,

    #[arg(long, default_value_t = 5, help = "Replay workers per cycle")]
    workers: u32,

    #[arg(long, default_value_t = 4_000, help = "Mean WAL records arriving per cycle")]
    records_per_cycle: u64,

    #[arg(long, default_value_t = 40, help = "Mean hot misses per cycle while behind")]
    misses_per_cycle: u64,

    #[arg(long, default_value_t = 8 * 1024 * 1024, help = "Mean WAL ingest (bytes/s)")]
    ingest_bps: u64,

    #[arg(long, help = "Log every controller cycle")]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Preset {
    Default,
    Responsive,
    Smooth,
}

impl From<Preset> for PacerConfig {
    fn from(value: Preset) -> Self {
        match value {
            Preset::Default => PacerConfig::default(),
            Preset::Responsive => PacerConfig::responsive(),
            Preset::Smooth => PacerConfig::smooth(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let verbose = matches!(&cli.command, Command::Simulate(cmd) if cmd.verbose);
    init_tracing(if verbose { "replay_pacer=info" } else { "replay_pacer=warn" });
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Config { preset } => {
            let cfg = PacerConfig::from(preset);
            emit(&cli.format, &cfg, |_| -> Result<(), Box<dyn Error>> {
                print!("{}", render_config(&cfg)?);
                Ok(())
            })?;
        }
        Command::Simulate(cmd) => {
            let cfg = load_config(cmd.config.as_deref())?.verbose(cmd.verbose);
            let opts = SimulationOptions {
                cycles: cmd.cycles,
                seed: cmd.seed,
                workers: cmd.workers,
                records_per_cycle: cmd.records_per_cycle,
                misses_per_cycle: cmd.misses_per_cycle,
                ingest_bps: cmd.ingest_bps,
            };
            let steps = run_simulation(cfg, &opts)?;
            emit(&cli.format, &steps, |_| {
                print_simulation_text(&steps);
                Ok(())
            })?;
        }
    }

    Ok(())
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(OutputFormat) -> Result<(), Box<dyn Error>>,
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text)?,
    }
    Ok(())
}

fn print_simulation_text(steps: &[SimulationStep]) {
    for step in steps {
        let r = &step.report;
        println!(
            "cycle={:>4} backlog={:>7} replayed={:>6} misses={:>4} queue={:>9.2} miss_rate={:.4} wal_bps={:>10.0} pressures(q={:.2} m={:.2} w={:.2}) agg={:.2} budget={}{}",
            step.cycle,
            step.backlog,
            step.replayed,
            step.misses,
            r.queue_rate,
            r.miss_rate,
            r.ingest_bps,
            r.queue_pressure,
            r.miss_pressure,
            r.ingest_pressure,
            r.aggressiveness,
            r.budget,
            if r.budget_held { " (held)" } else { "" }
        );
    }
    if let Some(last) = steps.last() {
        println!();
        println!(
            "final budget={} aggressiveness={:.2} backlog={}",
            last.report.budget, last.report.aggressiveness, last.backlog
        );
    }
}
