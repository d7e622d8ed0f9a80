//! CSV output format for framework summaries
//!
//! Flat one-row-per-framework rendition of the same data the JSON emitter
//! produces, for spreadsheet analysis.

use crate::summary::FrameworkSummary;

const COLUMNS: &[&str] = &[
    "framework",
    "threads",
    "connections",
    "requests_per_sec",
    "transfer_megabytes_per_sec",
    "thread_rps_mean",
    "thread_rps_stdev",
    "thread_rps_max",
    "thread_rps_stdev_range",
    "request_count",
    "megabytes_read",
    "over_seconds",
    "non_2xx_percent",
    "socket_error_count",
    "latency_mean",
    "latency_stdev",
    "latency_max",
    "latency_stdev_range",
    "lat50",
    "lat75",
    "lat90",
    "lat99",
    "memory_mean",
    "memory_median",
    "memory_max",
    "memory_stdev",
    "cpu_user_mean",
    "cpu_system_mean",
    "cpu_mean",
    "cpu_median",
    "cpu_max",
    "cpu_stdev",
];

/// Escape a CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn format_row(summary: &FrameworkSummary) -> String {
    let trial = &summary.trial;
    let resources = &summary.resources;

    let fields: Vec<String> = vec![
        escape_field(&summary.name),
        trial.threads.to_string(),
        trial.connections.to_string(),
        trial.requests_per_sec.to_string(),
        trial.transfer_megabytes_per_sec.to_string(),
        trial.thread_rps.mean.to_string(),
        trial.thread_rps.stdev.to_string(),
        trial.thread_rps.max.to_string(),
        trial.thread_rps.stdev_range.to_string(),
        trial.request_count.to_string(),
        trial.megabytes_read.to_string(),
        trial.over_seconds.to_string(),
        trial.non_2xx_percent.to_string(),
        trial.socket_error_count.to_string(),
        trial.latency.mean.to_string(),
        trial.latency.stdev.to_string(),
        trial.latency.max.to_string(),
        trial.latency.stdev_range.to_string(),
        trial.lat50.to_string(),
        trial.lat75.to_string(),
        trial.lat90.to_string(),
        trial.lat99.to_string(),
        resources.memory.mean.to_string(),
        resources.memory.median.to_string(),
        resources.memory.max.to_string(),
        resources.memory.stdev.to_string(),
        resources.cpu_user.mean.to_string(),
        resources.cpu_system.mean.to_string(),
        resources.cpu.mean.to_string(),
        resources.cpu.median.to_string(),
        resources.cpu.max.to_string(),
        resources.cpu.stdev.to_string(),
    ];

    fields.join(",")
}

/// Render one test type's summaries as CSV, header row first, sorted by
/// descending throughput like the JSON output.
pub fn to_csv(summaries: &[FrameworkSummary]) -> String {
    let mut rows: Vec<&FrameworkSummary> = summaries.iter().collect();
    rows.sort_by(|a, b| {
        b.trial
            .requests_per_sec
            .partial_cmp(&a.trial.requests_per_sec)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut output = String::new();
    output.push_str(&COLUMNS.join(","));
    output.push('\n');
    for summary in rows {
        output.push_str(&format_row(summary));
        output.push('\n');
    }
    output
}
