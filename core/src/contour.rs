//! Contour level selection for filled 2D contour plots.

use serde::{Deserialize, Serialize};

const DEFAULT_LINES: usize = 11;
const LOG_FLOOR: f64 = 1e-6;

/// `n` evenly spaced samples from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContourSpec {
    pub zlim:  Option<(f64, f64)>,
    pub lines: Option<usize>,
    pub log:   bool,
}

impl ContourSpec {
    /// Explicit contour levels for `z`, or `None` to let the renderer pick.
    ///
    /// A line count without limits spans the data range; limits without a
    /// line count use 11 lines. Log levels are spaced evenly in log10 and a
    /// lower limit of zero is lifted to 1e-6.
    pub fn levels(&self, z: &[f64]) -> Option<Vec<f64>> {
        let zlim = match (self.zlim, self.lines) {
            (Some(lim), _)   => lim,
            (None, Some(_))  => nan_range(z)?,
            (None, None)     => return None,
        };
        let lines = self.lines.unwrap_or(DEFAULT_LINES);
        let (lo, hi) = zlim;

        if self.log {
            let lo = if lo == 0.0 { LOG_FLOOR } else { lo };
            Some(
                linspace(lo.log10(), hi.log10(), lines)
                    .into_iter()
                    .map(|e| 10f64.powf(e))
                    .collect(),
            )
        } else {
            Some(linspace(lo, hi, lines))
        }
    }
}

/// Min/max ignoring NaN; `None` when nothing is left.
fn nan_range(z: &[f64]) -> Option<(f64, f64)> {
    z.iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, &v| match acc {
            None           => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Indices usable on a log colour scale: x present and z non-zero.
pub fn mask_for_log(x: &[f64], z: &[f64]) -> Vec<usize> {
    x.iter()
        .zip(z)
        .enumerate()
        .filter(|(_, (x, z))| !x.is_nan() && **z != 0.0)
        .map(|(i, _)| i)
        .collect()
}
