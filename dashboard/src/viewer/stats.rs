//! Descriptive statistics for numeric columns.

use serde_json::{json, Value};

/// Count, moments and quartiles of the non-null values of one column.
///
/// Statistics that are undefined for the sample size are `None` and
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    /// Summary object keyed `count, mean, std, min, 25%, 50%, 75%, max`.
    pub fn to_json(&self) -> Value {
        json!({
            "count": self.count,
            "mean": self.mean,
            "std": self.std,
            "min": self.min,
            "25%": self.p25,
            "50%": self.p50,
            "75%": self.p75,
            "max": self.max,
        })
    }
}

/// Summarize `values`. Non-finite values are ignored.
pub fn describe(values: &[f64]) -> NumericSummary {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
    let std = match mean {
        Some(mean) if count > 1 => {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            Some((ss / (count - 1) as f64).sqrt())
        }
        _ => None,
    };

    NumericSummary {
        count,
        mean,
        std,
        min: sorted.first().copied(),
        p25: quantile(&sorted, 0.25),
        p50: quantile(&sorted, 0.5),
        p75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Quantile of sorted data, interpolating linearly between closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_describe_matches_known_values() {
        let s = describe(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.count, 4);
        assert!(close(s.mean, 2.5));
        // sample std of 1..=4
        assert!(close(s.std, 1.2909944487358056));
        assert!(close(s.min, 1.0));
        assert!(close(s.p25, 1.75));
        assert!(close(s.p50, 2.5));
        assert!(close(s.p75, 3.25));
        assert!(close(s.max, 4.0));
    }

    #[test]
    fn test_single_value_has_no_std() {
        let s = describe(&[7.0]);
        assert_eq!(s.count, 1);
        assert_eq!(s.std, None);
        assert!(close(s.p25, 7.0));
        assert!(close(s.p75, 7.0));
    }

    #[test]
    fn test_empty_input() {
        let s = describe(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean, None);
        assert_eq!(s.min, None);
        assert_eq!(s.max, None);
    }

    #[test]
    fn test_serialized_keys() {
        let json = describe(&[1.0]).to_json();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["count", "mean", "std", "min", "25%", "50%", "75%", "max"]
        );
        assert!(json["std"].is_null());
    }

    proptest! {
        #[test]
        fn prop_quartiles_are_ordered(values in prop::collection::vec(-1e6f64..1e6, 1..64)) {
            let s = describe(&values);
            let min = s.min.unwrap();
            let p25 = s.p25.unwrap();
            let p50 = s.p50.unwrap();
            let p75 = s.p75.unwrap();
            let max = s.max.unwrap();
            let eps = 1e-6;
            prop_assert!(min <= p25 + eps && p25 <= p50 + eps);
            prop_assert!(p50 <= p75 + eps && p75 <= max + eps);
            prop_assert_eq!(s.count, values.len());
        }

        #[test]
        fn prop_mean_within_bounds(values in prop::collection::vec(-1e6f64..1e6, 1..64)) {
            let s = describe(&values);
            let mean = s.mean.unwrap();
            prop_assert!(mean >= s.min.unwrap() - 1e-6 && mean <= s.max.unwrap() + 1e-6);
        }
    }
}
