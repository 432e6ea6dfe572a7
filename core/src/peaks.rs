//! Local maxima of a sampled curve.

/// Indices of strict local maxima of `z`.
///
/// A flat top counts once, at its midpoint (rounded down). The first and
/// last samples are never peaks, and comparisons against NaN always fail,
/// so NaN sentinels split a concatenated curve into independent pieces.
pub fn find_peaks(z: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if z.len() < 3 {
        return peaks;
    }
    let last = z.len() - 1;
    let mut i = 1;
    while i < last {
        if z[i - 1] < z[i] {
            let mut ahead = i + 1;
            while ahead < last && z[ahead] == z[i] {
                ahead += 1;
            }
            if z[ahead] < z[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}
