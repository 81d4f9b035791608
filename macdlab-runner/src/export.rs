//! Export: trade logs, ledgers, balance histories, sweep tables and the
//! JSON run manifest.
//!
//! CSV exports return `String`s; `save_outcome` / `save_artifacts` write
//! them under the output directory as `{STOCK}_{kind}_{label}.csv`, where
//! `STOCK` is the upper-cased stock name and the label is `dT{Δ}` or `base`.
//!
//! The manifest carries a `schema_version`. Unknown versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use macdlab_core::domain::{Ledger, PriceSeries, TradeRecord};
use macdlab_core::engine::BalancePoint;
use macdlab_core::indicators::MacdSeries;

use crate::config::MacdSettings;
use crate::data_loader::DataSource;
use crate::runner::{DelayOutcome, StockRun};
use crate::sweep::SweepResults;

/// Current schema version for persisted manifests.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Summary of a stock's sweep, persisted as `{STOCK}_manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub stock: String,
    pub source: DataSource,
    pub dataset_hash: String,
    pub bars: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub macd: MacdSettings,
    pub initial_balance: u64,
    pub baseline: DelaySummary,
    pub delays: Vec<DelaySummary>,
    pub best_delay: Option<i64>,
}

/// Headline numbers for one Δ (or the baseline when `delay` is `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelaySummary {
    pub delay: Option<i64>,
    pub final_value: f64,
    pub profit: f64,
    pub trades: usize,
    pub disabled: usize,
}

impl DelaySummary {
    pub fn from_outcome(outcome: &DelayOutcome) -> Self {
        Self {
            delay: outcome.delay,
            final_value: outcome.simulation.final_value,
            profit: outcome.profit(),
            trades: outcome.trades().len(),
            disabled: outcome.ledger.disabled_count(),
        }
    }
}

impl RunManifest {
    pub fn new(run: &StockRun, results: &SweepResults) -> Self {
        let series = run.context.series();
        Self {
            schema_version: SCHEMA_VERSION,
            stock: run.stock.clone(),
            source: run.source.clone(),
            dataset_hash: run.dataset_hash.clone(),
            bars: series.len(),
            first_date: series.first().map(|p| p.date),
            last_date: series.last().map(|p| p.date),
            macd: *run.context.settings(),
            initial_balance: results.baseline.simulation.initial_balance,
            baseline: DelaySummary::from_outcome(&results.baseline),
            delays: results.outcomes.iter().map(DelaySummary::from_outcome).collect(),
            best_delay: results.best().and_then(|o| o.delay),
        }
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize RunManifest to JSON")
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize RunManifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV ────────────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Round-trip trade log: one row per executed Sell.
pub fn export_trade_log_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "No.",
        "Buy date",
        "Buy price",
        "Sell date",
        "Sell price",
        "Profit",
    ])?;
    for t in trades {
        wtr.write_record([
            t.sequence.to_string(),
            t.buy_date.to_string(),
            format!("{:.2}", t.buy_price),
            t.sell_date.to_string(),
            format!("{:.2}", t.sell_price),
            format!("{:.2}", t.profit),
        ])?;
    }
    finish(wtr)
}

/// Every ledger row, Hold included.
pub fn export_ledger_csv(ledger: &Ledger) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "operation",
        "indicator",
        "price",
        "predecessor",
        "disabled",
        "profit",
    ])?;
    for e in ledger.events() {
        wtr.write_record([
            e.date.to_string(),
            e.operation.to_string(),
            opt(e.indicator_value),
            opt(e.price),
            opt(e.predecessor),
            e.disabled.to_string(),
            opt(e.profit.map(|p| format!("{p:.2}"))),
        ])?;
    }
    finish(wtr)
}

pub fn export_balance_csv(points: &[BalancePoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "price", "instrument", "money", "value"])?;
    for p in points {
        wtr.write_record([
            p.date.to_string(),
            p.price.to_string(),
            p.instrument_balance.to_string(),
            format!("{:.2}", p.money_balance),
            format!("{:.2}", p.value()),
        ])?;
    }
    finish(wtr)
}

fn defined(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Indicator lines per bar for chart rendering; warm-up cells are blank.
pub fn export_macd_csv(series: &PriceSeries, macd: &MacdSeries) -> Result<String> {
    if series.len() != macd.len() {
        bail!(
            "MACD has {} values for {} bars",
            macd.len(),
            series.len()
        );
    }
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "price", "ema_fast", "ema_slow", "macd", "signal", "histogram"])?;
    let histogram = macd.histogram();
    for (i, p) in series.points().iter().enumerate() {
        wtr.write_record([
            p.date.to_string(),
            p.price.to_string(),
            defined(macd.ema_fast[i]),
            defined(macd.ema_slow[i]),
            defined(macd.macd[i]),
            defined(macd.signal[i]),
            defined(histogram[i]),
        ])?;
    }
    finish(wtr)
}

/// One row per Δ, preceded by the `base` row.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["delay", "final_value", "profit", "trades", "disabled"])?;
    for outcome in std::iter::once(&results.baseline).chain(&results.outcomes) {
        let s = DelaySummary::from_outcome(outcome);
        wtr.write_record([
            s.delay.map_or_else(|| "base".to_string(), |d| d.to_string()),
            format!("{:.2}", s.final_value),
            format!("{:.2}", s.profit),
            s.trades.to_string(),
            s.disabled.to_string(),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact files ─────────────────────────────────────────────────

/// Files written for one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomePaths {
    pub trade_log: PathBuf,
    pub ledger: PathBuf,
    pub balance: PathBuf,
}

fn artifact_path(output_dir: &Path, stock: &str, suffix: &str) -> PathBuf {
    output_dir.join(format!("{}_{suffix}", stock.to_uppercase()))
}

pub fn trade_log_path(output_dir: &Path, stock: &str, outcome: &DelayOutcome) -> PathBuf {
    artifact_path(output_dir, stock, &format!("buysell_{}.csv", outcome.label()))
}

fn write(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))
}

/// Write the trade log, ledger and balance history of one outcome.
pub fn save_outcome(
    output_dir: &Path,
    stock: &str,
    series: &PriceSeries,
    outcome: &DelayOutcome,
) -> Result<OutcomePaths> {
    ensure_dir(output_dir)?;
    let label = outcome.label();

    let paths = OutcomePaths {
        trade_log: trade_log_path(output_dir, stock, outcome),
        ledger: artifact_path(output_dir, stock, &format!("ledger_{label}.csv")),
        balance: artifact_path(output_dir, stock, &format!("balance_{label}.csv")),
    };

    write(&paths.trade_log, &export_trade_log_csv(outcome.trades())?)?;
    write(&paths.ledger, &export_ledger_csv(&outcome.ledger)?)?;
    write(
        &paths.balance,
        &export_balance_csv(&outcome.balance_history(series))?,
    )?;
    Ok(paths)
}

/// Write every outcome of a sweep plus `{STOCK}_macd.csv`,
/// `{STOCK}_sweep.csv` and `{STOCK}_manifest.json`. Returns the manifest path.
pub fn save_artifacts(output_dir: &Path, run: &StockRun, results: &SweepResults) -> Result<PathBuf> {
    let series = run.context.series();
    for outcome in std::iter::once(&results.baseline).chain(&results.outcomes) {
        save_outcome(output_dir, &run.stock, series, outcome)?;
    }

    write(
        &artifact_path(output_dir, &run.stock, "macd.csv"),
        &export_macd_csv(series, run.context.macd())?,
    )?;
    write(
        &artifact_path(output_dir, &run.stock, "sweep.csv"),
        &export_sweep_csv(results)?,
    )?;

    let manifest_path = artifact_path(output_dir, &run.stock, "manifest.json");
    write(&manifest_path, &export_json(&RunManifest::new(run, results))?)?;
    Ok(manifest_path)
}

pub fn load_manifest(path: &Path) -> Result<RunManifest> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
