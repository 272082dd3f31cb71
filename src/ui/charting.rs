use crate::stats::LogRecord;

/// `(target_time, offset_ms)` for every classified cue. Misses carry no offset.
pub fn offset_points(log: &[LogRecord]) -> Vec<(f64, f64)> {
    log.iter()
        .filter_map(|r| r.offset_ms.map(|ms| (r.target_time, ms as f64)))
        .collect()
}

/// X bounds (seconds) and symmetric Y half-range (ms) for the offsets chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> ([f64; 2], f64) {
    let first = points.first().map(|p| p.0).unwrap_or(0.0);
    let mut last = points.last().map(|p| p.0).unwrap_or(1.0);
    if last - first < 1.0 {
        last = first + 1.0;
    }

    // Never narrower than the outer acceptance band.
    let widest = points
        .iter()
        .fold(150.0_f64, |acc, &(_, ms)| acc.max(ms.abs()));

    ([first, last], widest.ceil())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
