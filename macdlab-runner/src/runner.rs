//! Per-stock analysis runner.
//!
//! `AnalysisContext` holds everything that does not depend on Δ: the price
//! series, its MACD lines and the unfiltered ledger. Each `evaluate` call
//! works on its own ledger copy, so runs for different Δ never share state.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use macdlab_core::diagnostics::{fragment, worst_trades, Fragment};
use macdlab_core::domain::{Ledger, Operation, PriceSeries, TradeRecord};
use macdlab_core::engine::BalancePoint;
use macdlab_core::indicators::{IndicatorError, Macd, MacdSeries};
use macdlab_core::signals::CrossoverError;
use macdlab_core::{FilterReport, HoldingPeriodFilter, PortfolioSimulator, SimulationResult};

use crate::config::{AnalysisConfig, MacdSettings, ProblemsConfig};
use crate::data_loader::{load_series, DataSource, LoadError, LoadOptions};

/// Errors from the runner. Each aborts one stock's run only.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("indicator error: {0}")]
    Indicator(#[from] IndicatorError),
    #[error("crossover error: {0}")]
    Crossover(#[from] CrossoverError),
}

/// Series, indicator lines and base ledger for one stock.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    series: PriceSeries,
    settings: MacdSettings,
    macd: MacdSeries,
    ledger: Ledger,
}

impl AnalysisContext {
    pub fn build(series: PriceSeries, settings: &MacdSettings) -> Result<Self, RunError> {
        let macd = Macd::new(settings.params())?.compute(&series)?;
        let ledger = settings.detector().detect_series(&series, &macd)?;

        debug!(
            symbol = series.symbol(),
            buys = ledger.count(Operation::Buy),
            sells = ledger.count(Operation::Sell),
            "signals detected"
        );

        Ok(Self {
            series,
            settings: *settings,
            macd,
            ledger,
        })
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn settings(&self) -> &MacdSettings {
        &self.settings
    }

    pub fn macd(&self) -> &MacdSeries {
        &self.macd
    }

    /// The unfiltered ledger as detected.
    pub fn base_ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Filter (unless `delay` is `None`) and simulate on a fresh ledger copy.
    pub fn evaluate(&self, delay: Option<i64>, initial_balance: u64) -> DelayOutcome {
        let mut ledger = self.ledger.clone();
        let filter = delay.map(|d| HoldingPeriodFilter::new(d).apply(&mut ledger));
        let simulation = PortfolioSimulator::new(initial_balance).run(&self.series, &mut ledger);

        debug!(
            symbol = self.series.symbol(),
            ?delay,
            trades = simulation.trades.len(),
            profit = simulation.profit,
            "delay evaluated"
        );

        DelayOutcome {
            delay,
            ledger,
            filter,
            simulation,
        }
    }
}

/// Result of one (stock, Δ) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayOutcome {
    /// `None` for the unfiltered baseline.
    pub delay: Option<i64>,
    pub ledger: Ledger,
    pub filter: Option<FilterReport>,
    pub simulation: SimulationResult,
}

impl DelayOutcome {
    /// File-name tag: `dT{Δ}`, or `base` for the unfiltered run.
    pub fn label(&self) -> String {
        match self.delay {
            Some(d) => format!("dT{d}"),
            None => "base".to_string(),
        }
    }

    pub fn profit(&self) -> f64 {
        self.simulation.profit
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.simulation.trades
    }

    pub fn balance_history(&self, series: &PriceSeries) -> Vec<BalancePoint> {
        self.simulation.balance_history(series)
    }

    /// The worst losing trades, each with the ledger and prices around its
    /// sell date.
    pub fn problems(&self, series: &PriceSeries, cfg: &ProblemsConfig) -> Vec<Problem> {
        worst_trades(self.trades(), cfg.limit)
            .into_iter()
            .map(|trade| {
                let fragment = fragment(series, &self.ledger, trade.sell_date, cfg.margin_days);
                Problem { trade, fragment }
            })
            .collect()
    }
}

/// A losing trade and the surrounding context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub trade: TradeRecord,
    pub fragment: Fragment,
}

/// A stock ready for evaluation, with its data provenance.
#[derive(Debug, Clone)]
pub struct StockRun {
    pub stock: String,
    pub source: DataSource,
    pub dataset_hash: String,
    pub context: AnalysisContext,
}

/// Load one stock per `config` and build its context.
pub fn run_stock(config: &AnalysisConfig, stock: &str) -> Result<StockRun, RunError> {
    let opts = LoadOptions {
        data_dir: config.data_dir.clone(),
        window: config.window.clone(),
        synthetic: config.synthetic,
    };
    let loaded = load_series(stock, &opts)?;
    let context = AnalysisContext::build(loaded.series, &config.macd)?;

    info!(
        stock,
        bars = context.series().len(),
        signals = context.base_ledger().active_indices().len(),
        synthetic = loaded.source.is_synthetic(),
        "stock prepared"
    );

    Ok(StockRun {
        stock: stock.to_string(),
        source: loaded.source,
        dataset_hash: loaded.dataset_hash,
        context,
    })
}
