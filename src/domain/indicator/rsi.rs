//! RSI (Relative Strength Index) with Wilder-style exponential smoothing.
//!
//! up[t] = max(C[t]-C[t-1], 0), down[t] = max(C[t-1]-C[t], 0)
//! avg_up/avg_down: unadjusted EMA with com = n-1 (alpha = 1/n),
//! seeded with the first change rather than a simple mean.
//! RSI = 100 - 100 / (1 + avg_up/avg_down); avg_down == 0 gives 100.
//!
//! Warmup: the first n outputs are flagged invalid. Values from index 1 on
//! are still produced by the recurrence.

use super::ema::ema_com;
use super::IndicatorPoint;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || closes.len() < 2 {
        return closes.iter().map(|_| IndicatorPoint::invalid()).collect();
    }

    let (ups, downs): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let com = (period - 1) as f64;
    let avg_up = ema_com(&ups, com);
    let avg_down = ema_com(&downs, com);

    let mut values = Vec::with_capacity(closes.len());
    values.push(IndicatorPoint::invalid());

    for (i, (&gain, &loss)) in avg_up.iter().zip(avg_down.iter()).enumerate() {
        let rsi = if loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + gain / loss)
        };
        values.push(IndicatorPoint {
            valid: i + 1 >= period,
            value: rsi,
        });
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rsi_empty() {
        assert!(calculate_rsi(&[], DEFAULT_PERIOD).is_empty());
    }

    #[test]
    fn rsi_single_close() {
        let series = calculate_rsi(&[100.0], DEFAULT_PERIOD);
        assert_eq!(series.len(), 1);
        assert!(!series[0].valid);
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&[100.0, 101.0, 102.0], 0);
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 5) as f64 * 2.0).collect();
        let series = calculate_rsi(&closes, 14);

        assert_eq!(series.len(), 20);
        for (i, point) in series.iter().enumerate().take(14) {
            assert!(!point.valid, "index {} should be warmup", i);
        }
        assert!(series[14].valid);
    }

    #[test]
    fn rsi_known_values_period_two() {
        // ups [1, 0], downs [0, 1], alpha = 1/2
        // avg_up [1, 0.5], avg_down [0, 0.5]
        let series = calculate_rsi(&[1.0, 2.0, 1.0], 2);

        assert!(!series[0].valid);
        assert!(!series[1].valid);
        assert_abs_diff_eq!(series[1].value, 100.0, epsilon = 1e-12);
        assert!(series[2].valid);
        assert_abs_diff_eq!(series[2].value, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn rsi_all_gains_saturates_at_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&closes, 14);

        for point in series.iter().filter(|p| p.valid) {
            assert_abs_diff_eq!(point.value, 100.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&closes, 14);

        for point in series.iter().filter(|p| p.valid) {
            assert_abs_diff_eq!(point.value, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rsi_flat_prices_guarded() {
        let series = calculate_rsi(&[50.0; 20], 14);
        for point in &series[1..] {
            assert!(point.value.is_finite());
            assert_abs_diff_eq!(point.value, 100.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=60)
            .map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 2.0)
            .collect();
        for point in calculate_rsi(&closes, 14) {
            if point.valid {
                assert!((0.0..=100.0).contains(&point.value), "RSI {} out of range", point.value);
            }
        }
    }

    #[test]
    fn rsi_period_one_reacts_to_last_change() {
        // alpha = 1: each output depends only on the latest change
        let series = calculate_rsi(&[10.0, 11.0, 9.0], 1);
        assert!(series[1].valid);
        assert_abs_diff_eq!(series[1].value, 100.0, epsilon = 1e-12);
        assert_abs_diff_eq!(series[2].value, 0.0, epsilon = 1e-12);
    }
}
