//! Client-side aggregation of latency samples and transfer rates.

#[derive(Debug, Clone, PartialEq)]
pub struct PingStats {
    /// Mean round trip with the fastest and slowest sample dropped.
    pub latency_ms: f64,
    /// Mean absolute difference between consecutive samples.
    pub jitter_ms: f64,
    pub samples: usize,
}

/// `None` when there are no samples.
pub fn summarize(samples: &[f64]) -> Option<PingStats> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let trimmed = if sorted.len() > 2 {
        &sorted[1..sorted.len() - 1]
    } else {
        &sorted[..]
    };
    let latency_ms = trimmed.iter().sum::<f64>() / trimmed.len() as f64;

    let jitter_ms = if samples.len() > 1 {
        let diffs: f64 = samples.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
        diffs / (samples.len() - 1) as f64
    } else {
        0.0
    };

    Some(PingStats {
        latency_ms,
        jitter_ms,
        samples: samples.len(),
    })
}

/// Megabits per second; 0 when no time elapsed.
pub fn mbps(bytes: u64, seconds: f64) -> f64 {
    if seconds <= 0.0 {
        return 0.0;
    }
    bytes as f64 * 8.0 / seconds / 1_000_000.0
}
