use chrono::Utc;

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Milliseconds to minutes.
pub fn ms_to_minutes(ms: i64) -> f64 {
    ms as f64 / 60_000.0
}

/// Wall clock in unix milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_negative_values() {
        assert_eq!(mean(&[-5.0, -10.0, -15.0]), Some(-10.0));
    }

    #[test]
    fn test_ratio_or_zero_guards_denominator() {
        assert_eq!(ratio_or_zero(6.0, 2.0), 3.0);
        assert_eq!(ratio_or_zero(6.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(6.0, -1.0), 0.0);
    }

    #[test]
    fn test_ms_to_minutes() {
        assert_eq!(ms_to_minutes(60_000), 1.0);
        assert_eq!(ms_to_minutes(30_000), 0.5);
        assert_eq!(ms_to_minutes(0), 0.0);
    }

    #[test]
    fn test_now_ms_is_after_epoch() {
        assert!(now_ms() > 0);
    }
}
