//! Rate of change over irregularly sampled data.
//!
//! Uses a backward first difference so every sample only depends on itself
//! and its predecessor. The first sample has no predecessor and is defined
//! as zero.

/// Floor applied to zero time steps (duplicate timestamps), in seconds
pub const MIN_DT: f64 = 1e-6;

/// Compute `d(values)/dt` in units per second.
///
/// The output has the same length as the shorter input. A zero time step is
/// replaced by [`MIN_DT`], so duplicate timestamps produce a large but finite
/// rate. Negative steps are used as-is.
pub fn rate_of_change(times: &[f64], values: &[f64]) -> Vec<f64> {
    let n = times.len().min(values.len());
    if n == 0 {
        return Vec::new();
    }

    let mut rate = Vec::with_capacity(n);
    rate.push(0.0);
    for i in 1..n {
        let mut dt = times[i] - times[i - 1];
        if dt == 0.0 {
            dt = MIN_DT;
        }
        rate.push((values[i] - values[i - 1]) / dt);
    }
    rate
}

/// Number of adjacent sample pairs sharing a timestamp
pub fn duplicate_timestamps(times: &[f64]) -> usize {
    times.windows(2).filter(|w| w[1] == w[0]).count()
}

/// Number of adjacent sample pairs where time goes backwards
pub fn backward_steps(times: &[f64]) -> usize {
    times.windows(2).filter(|w| w[1] < w[0]).count()
}
