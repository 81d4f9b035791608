//! MACD Lab CLI: analyse a stock, sweep holding periods, or run a batch.
//!
//! Commands:
//! - `analyze`: one (stock, Δ) run; prints balance and profit, writes logs
//! - `sweep`: Δ sweep for one stock; prints the profit table
//! - `run`: every stock of a TOML config, sweep and artifacts per stock

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use macdlab_core::domain::PriceSeries;
use macdlab_runner::export::{save_artifacts, save_outcome};
use macdlab_runner::{
    run_stock, AnalysisConfig, DelayOutcome, DelaySweep, ProblemsConfig, SweepConfig,
    SweepResults, Window,
};

#[derive(Parser)]
#[command(
    name = "macdlab",
    about = "MACD Lab CLI - MACD crossover signals with a holding-period filter"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one analysis: MACD signals, optional holding-period filter, simulation.
    Analyze {
        /// Stock name; prices are read from `{data_dir}/{stock}.csv`.
        stock: String,

        /// Minimum days between a signal and its predecessor (Δ). Omit for an unfiltered run.
        #[arg(long)]
        delay: Option<i64>,

        /// Print this many worst losing trades with their surrounding signals.
        #[arg(long)]
        problems: Option<usize>,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Sweep Δ over a range and compare final profit.
    Sweep {
        stock: String,

        #[arg(long, default_value_t = 0)]
        start: i64,

        /// Exclusive upper bound.
        #[arg(long, default_value_t = 30)]
        end: i64,

        #[arg(long, default_value_t = 3)]
        step: i64,

        /// Run delays one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Sweep every stock listed in a TOML config file.
    Run {
        #[arg(long)]
        config: PathBuf,

        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
}

/// Data selection flags shared by `analyze` and `sweep`.
#[derive(Args)]
struct DataArgs {
    /// Analyse the last N bars. Defaults to 1000.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    count: Option<usize>,

    /// First date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Units held on the first date.
    #[arg(long, default_value_t = 1000)]
    initial_balance: u64,

    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, default_value = "logs")]
    output_dir: PathBuf,

    /// Use a synthetic random walk when the price file is missing.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

impl DataArgs {
    fn window(&self) -> Window {
        match (self.count, self.from, self.to) {
            (Some(count), _, _) => Window::last(count),
            (None, None, None) => Window::default(),
            (None, from, to) => Window::range(from, to),
        }
    }

    fn into_config(self, stock: &str) -> Result<AnalysisConfig> {
        let config = AnalysisConfig {
            window: self.window(),
            data_dir: self.data_dir,
            output_dir: self.output_dir,
            stocks: vec![stock.to_string()],
            initial_balance: self.initial_balance,
            synthetic: self.synthetic,
            ..AnalysisConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            stock,
            delay,
            problems,
            data,
        } => run_analyze(&stock, delay, problems, data),
        Commands::Sweep {
            stock,
            start,
            end,
            step,
            sequential,
            data,
        } => {
            let mut config = data.into_config(&stock)?;
            config.sweep = SweepConfig { start, end, step };
            config.validate()?;
            run_sweep(&config, &stock, sequential)
        }
        Commands::Run { config, sequential } => run_batch(config, sequential),
    }
}

fn run_analyze(
    stock: &str,
    delay: Option<i64>,
    problems: Option<usize>,
    data: DataArgs,
) -> Result<()> {
    if delay.is_some_and(|d| d < 0) {
        bail!("--delay must be >= 0");
    }
    let config = data.into_config(stock)?;
    let run = run_stock(&config, stock)?;
    let outcome = run.context.evaluate(delay, config.initial_balance);

    print_outcome(&outcome);

    let paths = save_outcome(&config.output_dir, stock, run.context.series(), &outcome)?;
    println!("Saved trading log at: {}", paths.trade_log.display());

    if let Some(limit) = problems {
        let cfg = ProblemsConfig {
            limit,
            ..config.problems
        };
        print_problems(run.context.series(), &outcome, &cfg);
    }
    Ok(())
}

fn run_sweep(config: &AnalysisConfig, stock: &str, sequential: bool) -> Result<()> {
    let run = run_stock(config, stock)?;
    let delays = config.sweep.delays()?;
    let results = DelaySweep::new()
        .with_parallelism(!sequential)
        .run(&run.context, &delays, config.initial_balance);

    print_sweep_table(&results);

    let manifest = save_artifacts(&config.output_dir, &run, &results)?;
    info!(stock, manifest = %manifest.display(), "artifacts saved");

    for outcome in results.reported_runs() {
        print_problems(run.context.series(), outcome, &config.problems);
    }
    Ok(())
}

fn run_batch(path: PathBuf, sequential: bool) -> Result<()> {
    let config = AnalysisConfig::load(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    if config.stocks.is_empty() {
        bail!("config lists no stocks");
    }

    let mut failed = 0;
    for stock in &config.stocks {
        println!("── {stock} ──");
        if let Err(e) = run_sweep(&config, stock, sequential) {
            error!(stock = %stock, "stock failed: {e:#}");
            failed += 1;
        }
    }

    if failed == config.stocks.len() {
        bail!("all {failed} stocks failed");
    }
    Ok(())
}

fn print_outcome(outcome: &DelayOutcome) {
    let sim = &outcome.simulation;
    println!("Run: {}", outcome.label());
    if let Some(report) = &outcome.filter {
        println!(
            "Filtered: {} cancellations, {} events disabled",
            report.triggered(),
            report.disabled
        );
    }
    println!("Trades: {}", sim.trades.len());
    println!("Initial value: {:.2}", sim.initial_value);
    println!("Final balance: {:.2}", sim.final_value);
    println!("Profit: {:.2}", sim.profit);
}

fn print_sweep_table(results: &SweepResults) {
    println!("\"Δ\", \"profit\"");
    println!("\"base\", \"{:.2}\"", results.baseline.profit());
    for (delay, profit) in results.profits() {
        println!("\"{delay}\", \"{profit:.2}\"");
    }
    if let Some(best) = results.best() {
        println!("Best: {} ({:.2})", best.label(), best.profit());
    }
}

fn print_problems(series: &PriceSeries, outcome: &DelayOutcome, cfg: &ProblemsConfig) {
    let problems = outcome.problems(series, cfg);
    if problems.is_empty() {
        println!("No losing trades in {}", outcome.label());
        return;
    }
    println!("Worst trades in {}:", outcome.label());
    for problem in &problems {
        let t = &problem.trade;
        println!(
            "  #{} bought {} @ {:.2}, sold {} @ {:.2} after {} days: {:.2}",
            t.sequence,
            t.buy_date,
            t.buy_price,
            t.sell_date,
            t.sell_price,
            t.days_held(),
            t.profit
        );
        for event in problem.fragment.active_events() {
            let flag = if event.disabled { " (disabled)" } else { "" };
            println!("      {} {}{flag}", event.date, event.operation);
        }
    }
}
