//! Resource-sample parsing and window aggregation
//!
//! dstat writes a CSV with four metadata lines, then a two-row header where
//! a blank cell in the first row means "same category as the previous
//! column". Columns are addressed by (category, field), e.g.
//! ("memory usage", "used"). Rows are keyed by the epoch-time first column.
//!
//! The aggregator slices the series to a trial's time window and computes
//! distributional statistics per tracked channel. Memory arrives in bytes
//! and is rescaled to megabytes before statistics; CPU percentages are used
//! as provided.

use std::collections::HashMap;
use thiserror::Error;

/// Number of leading metadata lines before the header in a dstat CSV
const METADATA_LINES: usize = 4;

/// Errors for resource-series parsing and aggregation
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("no samples in window [{start}, {end}]")]
    EmptyWindow { start: i64, end: i64 },

    #[error("channel {category:?}/{field:?} missing from resource series")]
    MissingChannel { category: String, field: String },

    #[error("malformed resource csv: {0}")]
    Malformed(String),
}

/// Two-level column address in a dstat CSV
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub category: String,
    pub field: String,
}

impl ChannelKey {
    pub fn new(category: &str, field: &str) -> Self {
        Self {
            category: category.to_string(),
            field: field.to_string(),
        }
    }
}

/// One timestamped row of the resource series
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSample {
    pub epoch: i64,
    pub channels: HashMap<ChannelKey, f64>,
}

/// Distributional statistics for one channel over a selected window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSummary {
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub stdev: f64,
    /// Percent of samples within one stdev of the mean, inclusive bounds
    pub stdev_range: f64,
}

/// The four tracked channels, aggregated over one trial window
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUsage {
    /// Memory used, megabytes
    pub memory: ResourceSummary,
    /// CPU time in user space, percent
    pub cpu_user: ResourceSummary,
    /// CPU time in kernel space, percent
    pub cpu_system: ResourceSummary,
    /// User plus system CPU, percent
    pub cpu: ResourceSummary,
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"').to_string())
        .collect()
}

/// Parse a dstat CSV into timestamped samples.
///
/// The two header rows are folded into (category, field) keys: a blank
/// category cell reuses the previous non-blank one. The first column is
/// forced to the fixed `epoch` key regardless of its printed label. Cells
/// that do not parse as numbers are dropped from that sample.
pub fn parse_dstat(text: &str) -> Result<Vec<ResourceSample>, ResourceError> {
    let mut lines = text
        .lines()
        .skip(METADATA_LINES)
        .skip_while(|line| line.trim().is_empty());

    let categories_row = lines
        .next()
        .ok_or_else(|| ResourceError::Malformed("missing category header row".to_string()))?;
    let fields_row = lines
        .next()
        .ok_or_else(|| ResourceError::Malformed("missing field header row".to_string()))?;

    // Carry-forward fold over the first header row
    let mut categories: Vec<String> = Vec::new();
    for cell in split_row(categories_row) {
        let category = if cell.is_empty() {
            categories.last().cloned().ok_or_else(|| {
                ResourceError::Malformed("category header starts with a blank cell".to_string())
            })?
        } else {
            cell
        };
        categories.push(category);
    }

    let fields = split_row(fields_row);
    if fields.len() != categories.len() {
        return Err(ResourceError::Malformed(format!(
            "header rows disagree: {} categories vs {} fields",
            categories.len(),
            fields.len()
        )));
    }

    let mut keys: Vec<ChannelKey> = categories
        .iter()
        .zip(&fields)
        .map(|(category, field)| ChannelKey::new(category, field))
        .collect();
    keys[0] = ChannelKey::new("epoch", "epoch");

    let mut samples = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_row(line);
        let Some(epoch) = cells.first().and_then(|c| c.parse::<f64>().ok()) else {
            continue;
        };

        let mut channels = HashMap::new();
        for (key, cell) in keys.iter().zip(&cells).skip(1) {
            if let Ok(value) = cell.parse::<f64>() {
                channels.insert(key.clone(), value);
            }
        }
        samples.push(ResourceSample {
            epoch: epoch as i64,
            channels,
        });
    }

    Ok(samples)
}

fn summarize(values: &[f64]) -> ResourceSummary {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let max = values.iter().cloned().fold(f64::MIN, f64::max);

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = sorted[sorted.len() / 2];

    let stdev = if values.len() < 2 {
        0.0
    } else {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    };

    let within = values
        .iter()
        .filter(|v| (**v - mean).abs() <= stdev)
        .count() as f64;
    let stdev_range = 100.0 * within / n;

    ResourceSummary {
        mean,
        median,
        max,
        stdev,
        stdev_range,
    }
}

fn window_values(
    samples: &[ResourceSample],
    key: &ChannelKey,
    window: (i64, i64),
) -> Result<Vec<f64>, ResourceError> {
    let (start, end) = window;
    let mut in_window = false;
    let mut values = Vec::new();

    for sample in samples {
        if sample.epoch < start || sample.epoch > end {
            continue;
        }
        in_window = true;
        if let Some(value) = sample.channels.get(key) {
            values.push(*value);
        }
    }

    if !in_window {
        return Err(ResourceError::EmptyWindow { start, end });
    }
    if values.is_empty() {
        return Err(ResourceError::MissingChannel {
            category: key.category.clone(),
            field: key.field.clone(),
        });
    }
    Ok(values)
}

/// Statistics for one channel over the closed window `[start, end]`.
pub fn aggregate(
    samples: &[ResourceSample],
    key: &ChannelKey,
    window: (i64, i64),
) -> Result<ResourceSummary, ResourceError> {
    Ok(summarize(&window_values(samples, key, window)?))
}

/// Aggregate the four tracked channels over one trial window.
pub fn aggregate_usage(
    samples: &[ResourceSample],
    window: (i64, i64),
) -> Result<ResourceUsage, ResourceError> {
    let memory_key = ChannelKey::new("memory usage", "used");
    let user_key = ChannelKey::new("total cpu usage", "usr");
    let system_key = ChannelKey::new("total cpu usage", "sys");

    // Bytes to megabytes before statistics
    let memory_mb: Vec<f64> = window_values(samples, &memory_key, window)?
        .iter()
        .map(|bytes| bytes / 1e6)
        .collect();
    let user = window_values(samples, &user_key, window)?;
    let system = window_values(samples, &system_key, window)?;

    let combined: Vec<f64> = samples
        .iter()
        .filter(|s| s.epoch >= window.0 && s.epoch <= window.1)
        .filter_map(|s| {
            let usr = s.channels.get(&user_key)?;
            let sys = s.channels.get(&system_key)?;
            Some(usr + sys)
        })
        .collect();
    if combined.is_empty() {
        return Err(ResourceError::MissingChannel {
            category: user_key.category,
            field: "usr+sys".to_string(),
        });
    }

    Ok(ResourceUsage {
        memory: summarize(&memory_mb),
        cpu_user: summarize(&user),
        cpu_system: summarize(&system),
        cpu: summarize(&combined),
    })
}
