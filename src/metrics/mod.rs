// Percentage spaces and contrast normalization over a built hierarchy.

pub mod contrast;
pub mod percentage;

/// `part / whole * 100`, or 0.0 when the whole is zero.
pub fn ratio_percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_percent_zero_denominator() {
        assert_eq!(ratio_percent(5.0, 0.0), 0.0);
        assert!((ratio_percent(1.0, 4.0) - 25.0).abs() < 1e-12);
    }
}
