//! Numeric and display formatting shared by widgets.
//!
//! These formulas are part of the widget contract: tests assert on the exact
//! display text, so changes here are breaking.

use std::collections::VecDeque;

/// CPU usage percentage from averaged idle/total tick deltas.
///
/// `100 - (100 * idle / total)`, clamped to `[0, 100]`. A zero or negative
/// total yields `0.0` (no samples yet).
#[must_use]
pub fn cpu_usage_percent(avg_idle: f64, avg_total: f64) -> f64 {
    if avg_total <= 0.0 {
        return 0.0;
    }
    (100.0 - (100.0 * avg_idle / avg_total)).clamp(0.0, 100.0)
}

/// Memory usage percentage: `(total - free) / total * 100`.
#[must_use]
pub fn memory_usage_percent(total: u64, free: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    total.saturating_sub(free) as f64 / total as f64 * 100.0
}

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable byte count: largest unit of B/KB/MB/GB/TB, two decimals
/// for scaled units. `format_bytes(0) == "0 B"`, `format_bytes(1536) == "1.50 KB"`.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", BYTE_UNITS[unit])
    }
}

/// Uptime as days/hours/minutes with leading zero-valued units omitted.
#[must_use]
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{hours}h"));
    }
    parts.push(format!("{minutes}m"));
    parts.join(" ")
}

/// Fixed-width progress bar from a percentage.
#[must_use]
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    let mut bar = String::with_capacity(width * 3);
    for i in 0..width {
        bar.push_str(if i < filled { "▓" } else { "░" });
    }
    bar
}

/// Direction of the most recent change in a [`History`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Latest sample is meaningfully above the previous one.
    Rising,
    /// Latest sample is meaningfully below the previous one.
    Falling,
    /// No meaningful change, or fewer than two samples.
    Flat,
}

impl Trend {
    /// Arrow glyph for the trend.
    #[must_use]
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Rising => "▲",
            Self::Falling => "▼",
            Self::Flat => "─",
        }
    }
}

/// Changes smaller than this are considered flat.
const TREND_EPSILON: f64 = 0.5;

/// Fixed-capacity sample ring buffer for trend arrows and sparklines.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl History {
    /// Create a history holding at most `capacity` samples (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Most recent sample.
    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Direction of the latest change.
    #[must_use]
    pub fn trend(&self) -> Trend {
        let mut iter = self.samples.iter().rev();
        match (iter.next(), iter.next()) {
            (Some(latest), Some(previous)) => {
                let delta = latest - previous;
                if delta > TREND_EPSILON {
                    Trend::Rising
                } else if delta < -TREND_EPSILON {
                    Trend::Falling
                } else {
                    Trend::Flat
                }
            }
            _ => Trend::Flat,
        }
    }

    /// Samples rounded to `u64`, oldest first, for ratatui sparklines.
    #[must_use]
    pub fn sparkline(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.max(0.0).round() as u64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_cpu_usage_from_tick_average() {
        // idle=80, total=100 averaged across cores -> 20.0
        let usage = cpu_usage_percent(80.0, 100.0);
        assert!((usage - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cpu_usage_clamped() {
        assert!((cpu_usage_percent(-10.0, 100.0) - 100.0).abs() < f64::EPSILON);
        assert!((cpu_usage_percent(150.0, 100.0)).abs() < f64::EPSILON);
        assert!((cpu_usage_percent(5.0, 0.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_memory_usage_percent() {
        assert!((memory_usage_percent(100, 25) - 75.0).abs() < f64::EPSILON);
        assert!((memory_usage_percent(0, 0)).abs() < f64::EPSILON);
        // free larger than total saturates instead of going negative
        assert!((memory_usage_percent(100, 200)).abs() < f64::EPSILON);
    }

    #[test_case(0, "0 B")]
    #[test_case(512, "512 B")]
    #[test_case(1536, "1.50 KB")]
    #[test_case(1_048_576, "1.00 MB")]
    #[test_case(3_221_225_472, "3.00 GB")]
    #[test_case(1_099_511_627_776, "1.00 TB")]
    fn test_format_bytes(input: u64, expected: &str) {
        assert_eq!(format_bytes(input), expected);
    }

    #[test_case(59, "0m")]
    #[test_case(180, "3m")]
    #[test_case(3_900, "1h 5m")]
    #[test_case(90_000, "1d 1h 0m")]
    #[test_case(86_400 + 300, "1d 0h 5m")]
    fn test_format_uptime(seconds: u64, expected: &str) {
        assert_eq!(format_uptime(seconds), expected);
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(50.0, 4), "▓▓░░");
        assert_eq!(progress_bar(100.0, 4), "▓▓▓▓");
        assert_eq!(progress_bar(150.0, 2), "▓▓");
    }

    #[test]
    fn test_history_eviction() {
        let mut history = History::new(3);
        for sample in [1.0, 2.0, 3.0, 4.0] {
            history.push(sample);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.sparkline(), vec![2, 3, 4]);
        assert_eq!(history.latest(), Some(4.0));
    }

    #[test]
    fn test_history_trend() {
        let mut history = History::new(8);
        assert_eq!(history.trend(), Trend::Flat);
        history.push(10.0);
        assert_eq!(history.trend(), Trend::Flat);
        history.push(12.0);
        assert_eq!(history.trend(), Trend::Rising);
        history.push(5.0);
        assert_eq!(history.trend(), Trend::Falling);
        history.push(5.2);
        assert_eq!(history.trend(), Trend::Flat);
    }
}
