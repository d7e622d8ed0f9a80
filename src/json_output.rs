//! JSON output format for framework summaries
//!
//! Explicit serde structs mirroring the grid schema consumed downstream: one
//! array per test type, each element a framework with `rps`, `latency` and
//! resource groups. No runtime type inspection anywhere; every field is
//! spelled out.

use crate::record::TrialRecord;
use crate::resource::{ResourceSummary, ResourceUsage};
use crate::summary::FrameworkSummary;
use serde::{Deserialize, Serialize};

/// Throughput group of a framework row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRps {
    /// Aggregate requests per second of the selected trial
    pub requests_per_sec: f64,
    pub transfer_megabytes_per_sec: f64,
    /// Per-thread Req/Sec distribution
    pub thread_rps_mean: f64,
    pub thread_rps_stdev: f64,
    pub thread_rps_max: f64,
    pub thread_rps_stdev_range: f64,
    pub request_count: u64,
    pub megabytes_read: f64,
    pub over_seconds: f64,
    pub non_2xx_percent: f64,
    pub socket_error_count: u64,
}

/// Latency group, all milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLatency {
    pub thread_mean: f64,
    pub thread_stdev: f64,
    pub thread_max: f64,
    pub thread_stdev_range: f64,
    pub lat50: f64,
    pub lat75: f64,
    pub lat90: f64,
    pub lat99: f64,
}

/// Distributional statistics for one resource channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JsonResourceStats {
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub stdev: f64,
    pub stdev_range: f64,
}

impl From<&ResourceSummary> for JsonResourceStats {
    fn from(summary: &ResourceSummary) -> Self {
        Self {
            mean: summary.mean,
            median: summary.median,
            max: summary.max,
            stdev: summary.stdev,
            stdev_range: summary.stdev_range,
        }
    }
}

/// One framework row in a test-type output file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFramework {
    pub name: String,
    pub threads: u64,
    pub connections: u64,
    pub rps: JsonRps,
    pub latency: JsonLatency,
    /// Memory used, megabytes
    pub memory: JsonResourceStats,
    pub cpu_user: JsonResourceStats,
    pub cpu_system: JsonResourceStats,
    /// Combined user + system CPU
    pub cpu: JsonResourceStats,
}

impl From<&FrameworkSummary> for JsonFramework {
    fn from(summary: &FrameworkSummary) -> Self {
        let trial: &TrialRecord = &summary.trial;
        let ResourceUsage {
            memory,
            cpu_user,
            cpu_system,
            cpu,
        } = &summary.resources;

        Self {
            name: summary.name.clone(),
            threads: trial.threads,
            connections: trial.connections,
            rps: JsonRps {
                requests_per_sec: trial.requests_per_sec,
                transfer_megabytes_per_sec: trial.transfer_megabytes_per_sec,
                thread_rps_mean: trial.thread_rps.mean,
                thread_rps_stdev: trial.thread_rps.stdev,
                thread_rps_max: trial.thread_rps.max,
                thread_rps_stdev_range: trial.thread_rps.stdev_range,
                request_count: trial.request_count,
                megabytes_read: trial.megabytes_read,
                over_seconds: trial.over_seconds,
                non_2xx_percent: trial.non_2xx_percent,
                socket_error_count: trial.socket_error_count,
            },
            latency: JsonLatency {
                thread_mean: trial.latency.mean,
                thread_stdev: trial.latency.stdev,
                thread_max: trial.latency.max,
                thread_stdev_range: trial.latency.stdev_range,
                lat50: trial.lat50,
                lat75: trial.lat75,
                lat90: trial.lat90,
                lat99: trial.lat99,
            },
            memory: memory.into(),
            cpu_user: cpu_user.into(),
            cpu_system: cpu_system.into(),
            cpu: cpu.into(),
        }
    }
}

/// Render one test type's summaries as a JSON array, sorted by descending
/// throughput so the hottest frameworks lead the file.
pub fn to_json(summaries: &[FrameworkSummary], pretty: bool) -> serde_json::Result<String> {
    let mut rows: Vec<JsonFramework> = summaries.iter().map(JsonFramework::from).collect();
    rows.sort_by(|a, b| {
        b.rps
            .requests_per_sec
            .partial_cmp(&a.rps.requests_per_sec)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if pretty {
        serde_json::to_string_pretty(&rows)
    } else {
        serde_json::to_string(&rows)
    }
}
