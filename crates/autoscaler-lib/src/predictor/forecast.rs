//! One-step-ahead usage forecasting
//!
//! Fits an ordinary least-squares line through the usage history, using the
//! sample index as the independent variable, and extrapolates it one step
//! past the last observation.

/// Denominators smaller than this are treated as a degenerate fit
pub const DEGENERATE_TOLERANCE: f64 = 1e-9;

/// Least-squares line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through `values` indexed `0..n`.
///
/// Returns `None` with fewer than two values or when the index sums carry
/// no signal (`|n·Σx² − (Σx)²| < DEGENERATE_TOLERANCE`).
pub fn fit_line(values: &[f64]) -> Option<LinearFit> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_x2, mut sum_xy) = (0.0, 0.0, 0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_x2 += x * x;
        sum_xy += x * y;
    }

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < DEGENERATE_TOLERANCE {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Some(LinearFit { slope, intercept })
}

/// Predict the next usage value from a history, oldest sample first.
///
/// * empty history → `0.0` (no signal)
/// * one sample, or a constant history → that value
/// * otherwise the fitted line evaluated at `x = n`, or the mean when the
///   fit is degenerate
///
/// The result is never negative.
pub fn predict(history: &[f64]) -> f64 {
    let forecast = match history {
        [] => return 0.0,
        // Constant histories skip the sums, which overflow near f64::MAX
        [first, rest @ ..] if rest.iter().all(|v| v == first) => *first,
        _ => match fit_line(history) {
            Some(fit) => fit.at(history.len() as f64),
            None => history.iter().sum::<f64>() / history.len() as f64,
        },
    };
    forecast.max(0.0)
}
