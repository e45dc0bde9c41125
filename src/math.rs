pub fn arithmetic_mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

/// Median, averaging the two middle values for even lengths; `NaN` when empty
///
/// Sorts the slice in place.
pub fn median(x: &mut [f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.sort_unstable_by(f64::total_cmp);
    let mid = x.len() / 2;
    if x.len() % 2 == 0 {
        (x[mid - 1] + x[mid]) / 2.0
    } else {
        x[mid]
    }
}

/// Smallest value, `NaN` when empty
pub fn minimum(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Sample standard deviation (n - 1 denominator), `NaN` for fewer than two values
pub fn sample_stddev(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return f64::NAN;
    }
    let mean = arithmetic_mean(x);
    let sum_sq = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    (sum_sq / (x.len() - 1) as f64).sqrt()
}
