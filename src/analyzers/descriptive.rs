use serde::Serialize;
use std::collections::BTreeMap;

/// First and second moments plus central tendency of one variable
///
/// Every statistic is `None` when no valid sample exists; an empty input is
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Population standard deviation (divides by `count`)
    pub std_dev: Option<f64>,
    pub median: Option<f64>,
    /// Most frequent value; the smallest one wins a tie
    pub mode: Option<f64>,
}

impl StatisticsSummary {
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: None,
            std_dev: None,
            median: None,
            mode: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn summary(&self) -> String {
        match (self.mean, self.std_dev, self.median, self.mode) {
            (Some(mean), Some(std_dev), Some(median), Some(mode)) => format!(
                "n={}, mean={:.2}, std={:.2}, median={:.2}, mode={:.2}",
                self.count, mean, std_dev, median, mode
            ),
            _ => "No valid samples".to_string(),
        }
    }
}

/// Summarize numeric samples; NaN and infinite values are ignored
pub fn summarize<I>(samples: I) -> StatisticsSummary
where
    I: IntoIterator<Item = f64>,
{
    let mut values: Vec<f64> = samples.into_iter().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return StatisticsSummary::empty();
    }

    values.sort_by(f64::total_cmp);
    let count = values.len();
    let n = count as f64;

    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let median = if count % 2 == 1 {
        values[count / 2]
    } else {
        (values[count / 2 - 1] + values[count / 2]) / 2.0
    };

    StatisticsSummary {
        count,
        mean: Some(mean),
        std_dev: Some(variance.sqrt()),
        median: Some(median),
        mode: sorted_mode(&values),
    }
}

/// Longest run of equal values in a sorted slice; earlier runs win ties,
/// so the smallest value is returned among equally frequent ones
fn sorted_mode(sorted: &[f64]) -> Option<f64> {
    let mut best: Option<(f64, usize)> = None;
    let mut index = 0;

    while index < sorted.len() {
        let value = sorted[index];
        let run = sorted[index..].iter().take_while(|v| **v == value).count();

        if best.map_or(true, |(_, best_run)| run > best_run) {
            best = Some((value, run));
        }
        index += run;
    }

    best.map(|(value, _)| value)
}

/// Truncate toward zero to whole units before summarizing
pub fn truncated(value: f64) -> f64 {
    // -0.4 truncates to -0.0; adding 0.0 turns that into 0.0
    value.trunc() + 0.0
}

/// Occurrences of every observed category code
pub fn frequency_count<I>(codes: I) -> BTreeMap<u32, usize>
where
    I: IntoIterator<Item = u32>,
{
    let mut counts = BTreeMap::new();
    for code in codes {
        *counts.entry(code).or_insert(0) += 1;
    }
    counts
}
