/// Resultant length per sample below which no mean direction exists
const MIN_RESULTANT_PER_SAMPLE: f64 = 1e-9;

/// Mean bearing in [0, 360) degrees, computed by vector summation
///
/// Returns `None` when there are no finite samples or when the unit vectors
/// cancel out (e.g. exactly opposing bearings).
pub fn mean_bearing<I>(bearings: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0usize;
    let mut sum_cos = 0.0;
    let mut sum_sin = 0.0;

    for bearing in bearings.into_iter().filter(|b| b.is_finite()) {
        let radians = bearing.to_radians();
        sum_cos += radians.cos();
        sum_sin += radians.sin();
        count += 1;
    }

    if count == 0 || sum_sin.hypot(sum_cos) < MIN_RESULTANT_PER_SAMPLE * count as f64 {
        return None;
    }

    let degrees = sum_sin.atan2(sum_cos).to_degrees().rem_euclid(360.0);
    // rem_euclid can round a tiny negative angle up to exactly 360
    if degrees >= 360.0 {
        Some(0.0)
    } else {
        Some(degrees)
    }
}
