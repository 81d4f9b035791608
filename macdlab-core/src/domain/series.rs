//! PriceSeries: the ordered, date-indexed closing-price input.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Validation failures when building a `PriceSeries`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("dates out of order: {current} follows {previous}")]
    UnsortedDates {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("duplicate date {0}")]
    DuplicateDate(NaiveDate),

    #[error("non-positive or non-finite price {price} on {date}")]
    NonPositivePrice { date: NaiveDate, price: f64 },
}

/// Ordered daily closing prices for one instrument.
///
/// Dates are strictly increasing and every price is finite and > 0.
/// Immutable once built; the analysis stages only borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validate and wrap a list of points. An empty list is accepted here;
    /// the indicator stages report it as `EmptySeries`.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for point in &points {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(SeriesError::NonPositivePrice {
                    date: point.date,
                    price: point.price,
                });
            }
        }
        for pair in points.windows(2) {
            let (previous, current) = (pair[0].date, pair[1].date);
            if current == previous {
                return Err(SeriesError::DuplicateDate(current));
            }
            if current < previous {
                return Err(SeriesError::UnsortedDates { previous, current });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    /// Build from parallel date/price slices.
    pub fn from_parts(
        symbol: impl Into<String>,
        dates: &[NaiveDate],
        prices: &[f64],
    ) -> Result<Self, SeriesError> {
        let points = dates
            .iter()
            .zip(prices)
            .map(|(&date, &price)| PricePoint::new(date, price))
            .collect();
        Self::new(symbol, points)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Position of `date` in the series, if present.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.points.binary_search_by_key(&date, |p| p.date).ok()
    }

    /// Points with `from <= date <= to`.
    pub fn window(&self, from: NaiveDate, to: NaiveDate) -> &[PricePoint] {
        let start = self.points.partition_point(|p| p.date < from);
        let end = self.points.partition_point(|p| p.date <= to);
        if start >= end {
            return &[];
        }
        &self.points[start..end]
    }
}
