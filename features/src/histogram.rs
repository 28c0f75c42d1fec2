/// Equal-width histogram over `[lo, hi]`, last bin closed on the right.
///
/// Values outside the range and non-finite values are not counted.
pub fn histogram(values: impl IntoIterator<Item = f32>, bins: usize, lo: f32, hi: f32) -> Vec<f32> {
    let mut counts = vec![0.0f32; bins];
    if bins == 0 || hi <= lo {
        return counts;
    }
    let scale = bins as f32 / (hi - lo);
    for v in values {
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        let bin = (((v - lo) * scale) as usize).min(bins - 1);
        counts[bin] += 1.0;
    }
    counts
}

/// Scale a histogram in place to sum to 1.0. All-zero histograms stay zero.
pub fn normalize(hist: &mut [f32]) {
    let sum: f32 = hist.iter().sum();
    if sum > 0.0 {
        for v in hist.iter_mut() {
            *v /= sum;
        }
    }
}
