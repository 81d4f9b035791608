//! Price loading and data resolution for the runner.
//!
//! Each stock resolves to `{data_dir}/{stock}.csv`, a daily quote file with
//! `<DATE>` (`YYYYMMDD`) and `<CLOSE>` columns; other columns are ignored.
//! Fallback policy:
//! 1. If the CSV exists → read it, sort by date, apply the window
//! 2. If not and `synthetic` is set → generate a seeded random walk (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only demo mode; manifests record it.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use macdlab_core::domain::{PricePoint, PriceSeries, SeriesError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Window;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no price file at {path} (use --synthetic for synthetic data)")]
    MissingData { path: PathBuf },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unparseable date '{value}'")]
    BadDate { value: String },

    #[error("invalid price series: {0}")]
    Series(#[from] SeriesError),
}

/// Where a series came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv { path: PathBuf },
    Synthetic { seed: u64 },
}

impl DataSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic { .. })
    }
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    pub window: Window,
    /// Generate a random walk when the CSV is missing.
    pub synthetic: bool,
}

/// A loaded series with provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: PriceSeries,
    pub source: DataSource,
    /// BLAKE3 over dates and prices.
    pub dataset_hash: String,
}

/// One row of a quote file. Only the date and close are used.
#[derive(Debug, Deserialize)]
struct QuoteRow {
    #[serde(rename = "<DATE>")]
    date: String,
    #[serde(rename = "<CLOSE>")]
    close: f64,
}

/// Seed used for synthetic walks unless the caller picks one.
pub const SYNTHETIC_SEED: u64 = 0;

/// First date of generated series when the window leaves it open.
fn synthetic_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

pub fn resolve_path(data_dir: &Path, stock: &str) -> PathBuf {
    data_dir.join(format!("{stock}.csv"))
}

/// Load one stock, falling back to synthetic data when allowed.
pub fn load_series(stock: &str, opts: &LoadOptions) -> Result<LoadedSeries, LoadError> {
    let path = resolve_path(&opts.data_dir, stock);

    let (series, source) = if path.exists() {
        let series = load_price_csv(&path, stock, &opts.window)?;
        info!(stock, path = %path.display(), bars = series.len(), "loaded prices");
        (series, DataSource::Csv { path })
    } else if opts.synthetic {
        warn!(stock, "no price file, generating synthetic data");
        let series = synthetic_for_window(stock, &opts.window, SYNTHETIC_SEED)?;
        (
            series,
            DataSource::Synthetic {
                seed: SYNTHETIC_SEED,
            },
        )
    } else {
        return Err(LoadError::MissingData { path });
    };

    let dataset_hash = dataset_hash(&series);
    Ok(LoadedSeries {
        series,
        source,
        dataset_hash,
    })
}

pub fn load_price_csv(path: &Path, symbol: &str, window: &Window) -> Result<PriceSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_price_csv(file, symbol, window)
}

/// Parse quote rows from any reader, sort them and apply `window`.
pub fn read_price_csv<R: Read>(
    reader: R,
    symbol: &str,
    window: &Window,
) -> Result<PriceSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut points = Vec::new();
    for row in rdr.deserialize() {
        let row: QuoteRow = row?;
        let date = parse_date(&row.date)?;
        if window.contains(date) {
            points.push(PricePoint::new(date, row.close));
        }
    }
    points.sort_by_key(|p| p.date);

    if let Some(count) = window.count {
        let start = points.len().saturating_sub(count);
        points.drain(..start);
    }

    Ok(PriceSeries::new(symbol, points)?)
}

/// `YYYYMMDD`, with ISO `YYYY-MM-DD` accepted as well.
fn parse_date(value: &str) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|_| LoadError::BadDate {
            value: value.to_string(),
        })
}

/// Deterministic BLAKE3 hash over the symbol, dates and prices.
pub fn dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(series.symbol().as_bytes());
    for point in series.points() {
        hasher.update(point.date.to_string().as_bytes());
        hasher.update(&point.price.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate `n` weekday closes starting at `start`.
///
/// A random walk from 100.0 with daily returns in ±3%, seeded from the
/// symbol and `seed` so the same inputs always give the same series.
pub fn synthetic_series(
    symbol: &str,
    start: NaiveDate,
    n: usize,
    seed: u64,
) -> Result<PriceSeries, SeriesError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(&seed.to_le_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let mut points = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    let mut current = start;

    while points.len() < n {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }
        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        price *= 1.0 + daily_return;
        points.push(PricePoint::new(current, price));
        current += Duration::days(1);
    }

    PriceSeries::new(symbol, points)
}

/// Synthetic series shaped by a window: `count` bars from the epoch, or
/// every weekday in `from..=to`.
fn synthetic_for_window(symbol: &str, window: &Window, seed: u64) -> Result<PriceSeries, LoadError> {
    if let Some(count) = window.count {
        return Ok(synthetic_series(symbol, synthetic_epoch(), count, seed)?);
    }
    let from = window.from.unwrap_or_else(synthetic_epoch);
    let n = match window.to {
        Some(to) => weekdays_between(from, to),
        None => 1000,
    };
    Ok(synthetic_series(symbol, from, n, seed)?)
}

fn weekdays_between(from: NaiveDate, to: NaiveDate) -> usize {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTES: &str = "\
<TICKER>,<PER>,<DATE>,<TIME>,<OPEN>,<HIGH>,<LOW>,<CLOSE>,<VOL>,<OPENINT>
USDPLN,D,20240105,000000,3.98,4.00,3.97,3.99,0,0
USDPLN,D,20240102,000000,3.93,3.96,3.92,3.95,0,0
USDPLN,D,20240103,000000,3.95,3.99,3.94,3.97,0,0
USDPLN,D,20240104,000000,3.97,3.98,3.95,3.96,0,0
";

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn reads_and_sorts_quote_rows() {
        let series = read_price_csv(QUOTES.as_bytes(), "usdpln", &Window::all()).unwrap();
        assert_eq!(series.dates(), vec![d(2), d(3), d(4), d(5)]);
        assert_eq!(series.prices(), vec![3.95, 3.97, 3.96, 3.99]);
    }

    #[test]
    fn count_window_keeps_latest_rows() {
        let series = read_price_csv(QUOTES.as_bytes(), "usdpln", &Window::last(2)).unwrap();
        assert_eq!(series.dates(), vec![d(4), d(5)]);
    }

    #[test]
    fn range_window_is_inclusive() {
        let window = Window::range(Some(d(3)), Some(d(4)));
        let series = read_price_csv(QUOTES.as_bytes(), "usdpln", &window).unwrap();
        assert_eq!(series.dates(), vec![d(3), d(4)]);
    }

    #[test]
    fn accepts_iso_dates() {
        let csv = "<DATE>,<CLOSE>\n2024-01-02,10.5\n";
        let series = read_price_csv(csv.as_bytes(), "x", &Window::all()).unwrap();
        assert_eq!(series.first().unwrap().date, d(2));
    }

    #[test]
    fn rejects_bad_date() {
        let csv = "<DATE>,<CLOSE>\nyesterday,10.5\n";
        let err = read_price_csv(csv.as_bytes(), "x", &Window::all()).unwrap_err();
        assert!(matches!(err, LoadError::BadDate { .. }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let csv = "<DATE>,<CLOSE>\n20240102,1.0\n20240102,2.0\n";
        let err = read_price_csv(csv.as_bytes(), "x", &Window::all()).unwrap_err();
        assert!(matches!(err, LoadError::Series(SeriesError::DuplicateDate(_))));
    }

    #[test]
    fn rejects_missing_close_column() {
        let csv = "<DATE>,<OPEN>\n20240102,1.0\n";
        let err = read_price_csv(csv.as_bytes(), "x", &Window::all()).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn synthetic_is_deterministic_and_skips_weekends() {
        let start = d(1);
        let a = synthetic_series("nwg", start, 50, 7).unwrap();
        let b = synthetic_series("nwg", start, 50, 7).unwrap();
        let c = synthetic_series("nwg", start, 50, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.prices(), c.prices());
        assert_eq!(a.len(), 50);
        for p in a.points() {
            assert!(!matches!(p.date.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(p.price > 0.0);
        }
    }

    #[test]
    fn synthetic_range_window_covers_weekdays() {
        // 2024-01-01 is a Monday; two full weeks
        let window = Window::range(Some(d(1)), Some(d(14)));
        let series = synthetic_for_window("x", &window, 0).unwrap();
        assert_eq!(series.len(), 10);
        assert_eq!(series.last().unwrap().date, d(12));
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let a = synthetic_series("x", d(1), 20, 0).unwrap();
        let b = synthetic_series("x", d(1), 20, 1).unwrap();
        assert_eq!(dataset_hash(&a), dataset_hash(&a.clone()));
        assert_ne!(dataset_hash(&a), dataset_hash(&b));
    }

    #[test]
    fn missing_file_without_synthetic_fails() {
        let dir = tempfile::tempdir().unwrap();
        let opts = LoadOptions {
            data_dir: dir.path().to_path_buf(),
            window: Window::default(),
            synthetic: false,
        };
        let err = load_series("nope", &opts).unwrap_err();
        assert!(matches!(err, LoadError::MissingData { .. }));
    }

    #[test]
    fn missing_file_with_synthetic_is_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let opts = LoadOptions {
            data_dir: dir.path().to_path_buf(),
            window: Window::last(120),
            synthetic: true,
        };
        let loaded = load_series("demo", &opts).unwrap();
        assert!(loaded.source.is_synthetic());
        assert_eq!(loaded.series.len(), 120);
        assert_eq!(loaded.dataset_hash.len(), 64);
    }

    #[test]
    fn csv_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(resolve_path(dir.path(), "usdpln"), QUOTES).unwrap();
        let opts = LoadOptions {
            data_dir: dir.path().to_path_buf(),
            window: Window::default(),
            synthetic: true,
        };
        let loaded = load_series("usdpln", &opts).unwrap();
        assert!(!loaded.source.is_synthetic());
        assert_eq!(loaded.series.len(), 4);
    }
}
