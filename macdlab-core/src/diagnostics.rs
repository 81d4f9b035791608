//! Problem detection: finds the worst losing round-trips and cuts a
//! window of prices and ledger rows around a date for closer inspection.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{Ledger, PricePoint, PriceSeries, SignalEvent, TradeRecord};

/// Losing trades, most negative profit first, at most `limit`.
pub fn worst_trades(trades: &[TradeRecord], limit: usize) -> Vec<TradeRecord> {
    let mut losses: Vec<TradeRecord> = trades.iter().filter(|t| t.is_loss()).cloned().collect();
    losses.sort_by(|a, b| a.profit.total_cmp(&b.profit));
    losses.truncate(limit);
    losses
}

/// Prices and ledger rows within `[around - margin, around + margin]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub around: NaiveDate,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub prices: Vec<PricePoint>,
    pub events: Vec<SignalEvent>,
}

impl Fragment {
    /// Active events inside the window, disabled ones included.
    pub fn active_events(&self) -> impl Iterator<Item = &SignalEvent> + '_ {
        self.events.iter().filter(|e| e.is_active())
    }
}

/// Cut the window around `around`. Negative margins count as zero and the
/// bounds saturate at the representable date range.
pub fn fragment(
    series: &PriceSeries,
    ledger: &Ledger,
    around: NaiveDate,
    margin_days: i64,
) -> Fragment {
    let margin = Days::new(margin_days.max(0).unsigned_abs());
    let from = around.checked_sub_days(margin).unwrap_or(NaiveDate::MIN);
    let to = around.checked_add_days(margin).unwrap_or(NaiveDate::MAX);

    let events = ledger
        .events()
        .iter()
        .filter(|e| e.date >= from && e.date <= to)
        .cloned()
        .collect();

    Fragment {
        around,
        from,
        to,
        prices: series.window(from, to).to_vec(),
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Operation;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    fn trade(sequence: usize, profit: f64) -> TradeRecord {
        TradeRecord {
            sequence,
            buy_date: d(1),
            buy_price: 1.0,
            sell_date: d(2),
            sell_price: 1.0,
            units: 1,
            profit,
        }
    }

    #[test]
    fn worst_trades_orders_losses() {
        let trades = vec![trade(0, 5.0), trade(1, -3.0), trade(2, -9.0), trade(3, -1.0)];
        let worst = worst_trades(&trades, 2);
        let seq: Vec<usize> = worst.iter().map(|t| t.sequence).collect();
        assert_eq!(seq, vec![2, 1]);
        assert!(worst_trades(&[trade(0, 1.0)], 5).is_empty());
    }

    #[test]
    fn fragment_is_inclusive_window() {
        let dates: Vec<NaiveDate> = (1..=20).map(d).collect();
        let prices: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let series = PriceSeries::from_parts("X", &dates, &prices).unwrap();
        let events = dates
            .iter()
            .map(|&date| {
                if date == d(10) {
                    SignalEvent::fired(date, Operation::Sell, 0.0, 10.0, None)
                } else {
                    SignalEvent::hold(date)
                }
            })
            .collect();
        let ledger = Ledger::from_events(events);

        let frag = fragment(&series, &ledger, d(10), 3);
        assert_eq!(frag.from, d(7));
        assert_eq!(frag.to, d(13));
        assert_eq!(frag.prices.len(), 7);
        assert_eq!(frag.events.len(), 7);
        assert_eq!(frag.active_events().count(), 1);
    }

    #[test]
    fn fragment_saturates_huge_margin() {
        let dates: Vec<NaiveDate> = (1..=5).map(d).collect();
        let series = PriceSeries::from_parts("X", &dates, &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let ledger = Ledger::from_events(dates.iter().map(|&date| SignalEvent::hold(date)).collect());

        let frag = fragment(&series, &ledger, d(3), 1_000_000_000_000);
        assert_eq!(frag.from, NaiveDate::MIN);
        assert_eq!(frag.to, NaiveDate::MAX);
        assert_eq!(frag.prices.len(), 5);
        assert_eq!(frag.events.len(), 5);

        let narrow = fragment(&series, &ledger, d(3), -4);
        assert_eq!((narrow.from, narrow.to), (d(3), d(3)));
    }
}
