//! Summary Statistics
//!
//! Degenerate inputs resolve to `0` rather than `NaN`: an empty slice has
//! zero mean, a single value has zero sample variance.

/// Arithmetic mean, `0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample variance (n - 1 denominator), `0` for fewer than two values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Quantile of sorted values with linear interpolation between ranks.
///
/// Position is `q * (n - 1)`; `q` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Shannon entropy (bits) of a distribution given as counts.
///
/// Zero counts are ignored; an empty or all-zero input has entropy `0`.
pub fn shannon_entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let mut h = 0.0;
    for &c in counts.iter().filter(|&&c| c > 0) {
        let p = c as f64 / total as f64;
        h -= p * p.log2();
    }
    h
}

/// Speed distribution of a group
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample variance
    pub variance: f64,
    pub q25: f64,
    pub q75: f64,
}

impl SpeedSummary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let sorted = sorted_copy(values);
        Self {
            mean: mean(values),
            median: quantile_sorted(&sorted, 0.5),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            variance: sample_variance(values),
            q25: quantile_sorted(&sorted, 0.25),
            q75: quantile_sorted(&sorted, 0.75),
        }
    }
}

/// Mean, median and range of a set of values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spread {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Spread {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let sorted = sorted_copy(values);
        Self {
            mean: mean(values),
            median: quantile_sorted(&sorted, 0.5),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), 5.0);
        // Population variance is 4, sample variance is 32 / 7
        assert!((sample_variance(&v) - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(sample_variance(&[]), 0.0);
        assert_eq!(sample_variance(&[3.0]), 0.0);
        assert_eq!(quantile_sorted(&[], 0.5), 0.0);
        assert_eq!(SpeedSummary::from_values(&[]), SpeedSummary::default());
        assert_eq!(Spread::from_values(&[]), Spread::default());
    }

    #[test]
    fn test_linear_quantiles() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.25), 1.75);
        assert_eq!(quantile_sorted(&sorted, 0.5), 2.5);
        assert_eq!(quantile_sorted(&sorted, 0.75), 3.25);
        assert_eq!(quantile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(quantile_sorted(&sorted, 1.0), 4.0);
        assert_eq!(quantile_sorted(&[7.0], 0.25), 7.0);
    }

    #[test]
    fn test_speed_summary() {
        let s = SpeedSummary::from_values(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.variance - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.q25, 1.75);
        assert_eq!(s.q75, 3.25);
    }

    #[test]
    fn test_entropy_single_device_is_zero() {
        let h = shannon_entropy(&[12]);
        assert_eq!(h, 0.0);
        assert!(h.is_sign_positive());
    }

    #[test]
    fn test_entropy_uniform_is_log2_k() {
        for k in 1..=8usize {
            let counts = vec![5; k];
            assert!((shannon_entropy(&counts) - (k as f64).log2()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_entropy_three_to_one() {
        let expected = -(0.75f64 * 0.75f64.log2() + 0.25 * 0.25f64.log2());
        let h = shannon_entropy(&[3, 1]);
        assert!((h - expected).abs() < 1e-12);
        assert!((h - 0.811).abs() < 1e-3);
    }

    #[test]
    fn test_entropy_ignores_zero_counts() {
        assert_eq!(shannon_entropy(&[]), 0.0);
        assert_eq!(shannon_entropy(&[0, 0]), 0.0);
        assert_eq!(shannon_entropy(&[4, 0]), 0.0);
    }
}
