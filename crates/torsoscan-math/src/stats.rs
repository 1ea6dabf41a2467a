//! Statistics helpers used to score and aggregate search results.

/// Median of `values`; the mean of the two middle values for even counts.
///
/// Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Arithmetic mean of `values`, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Similarity of two values relative to `range`, raised to `weight`.
///
/// `max(0, 1 - |v1 - v2| / range) ^ weight`. A non-positive range yields
/// 1 for identical values and 0 otherwise.
pub fn similarity_coefficient(value1: f64, value2: f64, range: f64, weight: f64) -> f64 {
    let diff = (value1 - value2).abs();
    if range <= 0.0 {
        return if diff == 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - diff / range).max(0.0).powf(weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(median(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_similarity_coefficient() {
        assert!((similarity_coefficient(0.0, 0.0, 1.0, 20.0) - 1.0).abs() < 1e-12);
        assert!(similarity_coefficient(1.0, 0.0, 1.0, 1.0).abs() < 1e-12);
        assert!((similarity_coefficient(0.5, 0.0, 1.0, 1.0) - 0.5).abs() < 1e-12);
        // Beyond the range clamps to zero.
        assert_eq!(similarity_coefficient(3.0, 0.0, 1.0, 2.0), 0.0);
    }

    #[test]
    fn test_similarity_zero_range() {
        assert_eq!(similarity_coefficient(0.2, 0.2, 0.0, 20.0), 1.0);
        assert_eq!(similarity_coefficient(0.2, 0.3, 0.0, 20.0), 0.0);
    }
}
