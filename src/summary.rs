//! Per-framework summary assembly
//!
//! Ties the pipeline together for one (test-type, framework) pair: split the
//! raw log, parse every timed section, apply the socket-error gate, pick the
//! representative trial, and correlate its time window against the resource
//! series. Soft rejections come back as `Ok(None)`; structural failures carry
//! the file label and section context for diagnosis.

use crate::record::{self, ParseError, TrialRecord};
use crate::resource::{self, ResourceError, ResourceUsage};
use crate::section;
use crate::select;
use thiserror::Error;

/// Seconds discounted at the window head for ramp-up before steady state
const WINDOW_RAMP_OFFSET: i64 = 1;

/// Errors that abort processing of a single framework/test file
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("malformed section {index} in {file}: {source}\nsection text:\n{text}")]
    MalformedSection {
        file: String,
        /// 1-based section index within the raw log
        index: usize,
        /// Raw section text, kept for diagnosing grammar drift
        text: String,
        source: ParseError,
    },

    #[error("resource aggregation failed for {file}: {source}")]
    Resource {
        file: String,
        source: ResourceError,
    },
}

/// Final output unit for one framework under one test type
#[derive(Debug, Clone, PartialEq)]
pub struct FrameworkSummary {
    pub name: String,
    pub trial: TrialRecord,
    pub resources: ResourceUsage,
}

/// Run the extraction pipeline for one framework/test pair.
///
/// `raw_text` is the wrk log, `stats_text` the dstat CSV; the labels name
/// their source files in errors. `Ok(None)` means the pair was softly
/// rejected (failure sentinel, no timed trials, or all trials gated out) and
/// should simply be absent from the output.
pub fn summarize_framework(
    name: &str,
    raw_text: &str,
    stats_text: &str,
    raw_label: &str,
    stats_label: &str,
) -> Result<Option<FrameworkSummary>, SummaryError> {
    let Some(sections) = section::split(raw_text.lines()) else {
        tracing::debug!(framework = name, "skipping: raw log carries a failure sentinel");
        return Ok(None);
    };

    let mut trials = Vec::new();
    for raw_section in section::timed_sections(sections) {
        let text = raw_section.grammar_text();
        let trial = record::parse(&text).map_err(|source| SummaryError::MalformedSection {
            file: raw_label.to_string(),
            index: raw_section.index,
            text,
            source,
        })?;
        trials.push(trial);
    }

    select::retain_clean(&mut trials);
    let Some(best) = select::select_best(&trials) else {
        tracing::debug!(framework = name, "skipping: no selectable trials");
        return Ok(None);
    };

    let samples = resource::parse_dstat(stats_text).map_err(|source| SummaryError::Resource {
        file: stats_label.to_string(),
        source,
    })?;

    let window = (best.start_time + WINDOW_RAMP_OFFSET, best.end_time);
    let resources =
        resource::aggregate_usage(&samples, window).map_err(|source| SummaryError::Resource {
            file: stats_label.to_string(),
            source,
        })?;

    Ok(Some(FrameworkSummary {
        name: name.to_string(),
        trial: best.clone(),
        resources,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "---------------------------------------------------------";

    fn raw_log(sections: &[(f64, i64, i64)]) -> String {
        let mut text = String::new();
        // Untimed warmup first
        text.push_str(BANNER);
        text.push_str("\n Running Warmup test\n");
        text.push_str(BANNER);
        text.push_str("\n  4 threads and 256 connections\n");

        for (rps, start, end) in sections {
            text.push_str(BANNER);
            text.push_str("\n Running Concurrency 256\n");
            text.push_str(BANNER);
            text.push('\n');
            text.push_str(&format!("STARTTIME {start}\n"));
            text.push_str("Running 15s test @ http://server:8080/plaintext\n");
            text.push_str("  4 threads and 256 connections\n");
            text.push_str("  Thread Stats   Avg      Stdev     Max   +/- Stdev\n");
            text.push_str("    Latency     1.71ms    1.27ms  21.24ms   86.96%\n");
            text.push_str("    Req/Sec     2.53k   435.17     3.81k    68.75%\n");
            text.push_str("  Latency Distribution\n");
            text.push_str("     50%    1.44ms\n");
            text.push_str("     75%    2.11ms\n");
            text.push_str("     90%    3.17ms\n");
            text.push_str("     99%    6.79ms\n");
            text.push_str("  150000 requests in 15.00s, 18.00MB read\n");
            text.push_str(&format!("Requests/sec:   {rps}\n"));
            text.push_str("Transfer/sec:      1.20MB\n");
            text.push_str(&format!("ENDTIME {end}\n"));
        }
        text
    }

    fn stats_csv(epochs: std::ops::RangeInclusive<i64>) -> String {
        let mut text = String::from(
            "\"Dstat 0.7.3 CSV output\"\n\
             \"Author:\",\"Dag Wieers\"\n\
             \"Host:\",\"bench-server\"\n\
             \"Cmdline:\",\"dstat -Tcm --output stats.txt\"\n\
             \n\
             \"epoch\",\"total cpu usage\",,\"memory usage\"\n\
             \"epoch\",\"usr\",\"sys\",\"used\"\n",
        );
        for epoch in epochs {
            text.push_str(&format!("{epoch},25.0,10.0,1.5e9\n"));
        }
        text
    }

    #[test]
    fn test_summarize_framework_end_to_end() {
        let raw = raw_log(&[(9000.0, 1000, 1015), (12000.0, 1020, 1035)]);
        let stats = stats_csv(995..=1040);

        let summary = summarize_framework("actix", &raw, &stats, "raw.txt", "stats.txt")
            .unwrap()
            .unwrap();

        assert_eq!(summary.name, "actix");
        // Higher-throughput second trial wins
        assert_eq!(summary.trial.requests_per_sec, 12000.0);
        assert_eq!(summary.trial.start_time, 1020);
        assert_eq!(summary.resources.memory.mean, 1500.0);
        assert_eq!(summary.resources.cpu.mean, 35.0);
    }

    #[test]
    fn test_summarize_framework_sentinel_is_soft_reject() {
        let mut raw = raw_log(&[(9000.0, 1000, 1015)]);
        raw.push_str("unable to connect to server:8080\n");
        let result = summarize_framework("actix", &raw, &stats_csv(995..=1040), "r", "s");
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_summarize_framework_no_timed_trials_is_soft_reject() {
        // Warmup only, never timed
        let raw = raw_log(&[]);
        let result = summarize_framework("actix", &raw, &stats_csv(995..=1040), "r", "s");
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_summarize_framework_malformed_section_carries_context() {
        let raw = raw_log(&[(9000.0, 1000, 1015)]).replace("Latency Distribution\n", "");
        let err = summarize_framework("actix", &raw, &stats_csv(995..=1040), "raw.txt", "s")
            .unwrap_err();

        match err {
            SummaryError::MalformedSection { file, index, text, .. } => {
                assert_eq!(file, "raw.txt");
                assert_eq!(index, 2);
                assert!(text.contains("Thread Stats"));
            }
            other => panic!("expected MalformedSection, got {other:?}"),
        }
    }

    #[test]
    fn test_summarize_framework_window_discounts_ramp_second() {
        let raw = raw_log(&[(9000.0, 1000, 1002)]);
        // Sample only at the trial's first second, which the offset discounts
        let stats = stats_csv(1000..=1000);

        let err = summarize_framework("actix", &raw, &stats, "r", "stats.txt").unwrap_err();
        match err {
            SummaryError::Resource { file, source } => {
                assert_eq!(file, "stats.txt");
                assert!(matches!(
                    source,
                    ResourceError::EmptyWindow { start: 1001, end: 1002 }
                ));
            }
            other => panic!("expected Resource error, got {other:?}"),
        }
    }
}
