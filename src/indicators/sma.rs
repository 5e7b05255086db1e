// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA_N[i] = (close[i-N+1] + ... + close[i]) / N
//
// The output is aligned with the input: one slot per close, `None` for the
// first N-1 slots where the window is not yet full.
// =============================================================================

/// Compute the SMA series for `closes` over `period` bars.
///
/// # Edge cases
/// - `period == 0` => every slot is `None`
/// - `closes.len() < period` => every slot is `None`
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return result;
    }

    let period_f = period as f64;
    for (offset, window) in closes.windows(period).enumerate() {
        result[offset + period - 1] = Some(window.iter().sum::<f64>() / period_f);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_empty_input() {
        assert!(calculate_sma(&[], 5).is_empty());
    }

    #[test]
    fn sma_period_zero() {
        assert_eq!(calculate_sma(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn sma_shorter_than_period_is_all_none() {
        let out = calculate_sma(&[1.0, 2.0, 3.0], 5);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn sma_defined_from_period_minus_one() {
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let out = calculate_sma(&closes, 5);
        assert_eq!(out.len(), 10);
        for (i, v) in out.iter().enumerate() {
            if i < 4 {
                assert!(v.is_none(), "index {i} should be undefined");
            } else {
                let expected = closes[i - 4..=i].iter().sum::<f64>() / 5.0;
                assert!((v.unwrap() - expected).abs() < 1e-10);
            }
        }
        // (1+2+3+4+5)/5
        assert!((out[4].unwrap() - 3.0).abs() < 1e-10);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let closes = vec![10.0, 11.5, 9.25];
        let out = calculate_sma(&closes, 1);
        assert_eq!(out, vec![Some(10.0), Some(11.5), Some(9.25)]);
    }
}
