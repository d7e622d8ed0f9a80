//! Section splitting for wrk raw logs
//!
//! A raw.txt holds several back-to-back wrk invocations (primer, warmup, then
//! one per concurrency or query level), each introduced by a dashed banner.
//! The splitter partitions the file into per-trial text blocks, drops banner
//! noise, and rejects files that recorded a failed run outright.
//!
//! Retained lines get a `;` appended so the record grammar can treat line
//! boundaries as explicit terminators. STARTTIME/ENDTIME markers are captured
//! wherever they appear and re-emitted at the section tail, keeping the
//! grammar straight-line.

/// One trial attempt's worth of accumulated text
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    /// 1-based position of the dashed banner that opened this section
    pub index: usize,
    /// Retained content lines, one trailing `;` per line
    pub text: String,
    /// Query level announced by the banner (`Queries: <n>`), if any
    pub query_level: Option<u32>,
    start_time: Option<i64>,
    end_time: Option<i64>,
}

impl RawSection {
    fn new(index: usize) -> Self {
        Self {
            index,
            text: String::new(),
            query_level: None,
            start_time: None,
            end_time: None,
        }
    }

    /// True when both time-window markers were present. Primer and warmup
    /// runs are not timed and never set this.
    pub fn has_window(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// The section text with the timing window re-anchored at the tail.
    pub fn grammar_text(&self) -> String {
        let mut text = self.text.clone();
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            text.push_str(&format!("STARTTIME {start};\nENDTIME {end};\n"));
        }
        text
    }
}

/// Whole-file failure sentinels: the load generator never reached the server,
/// recorded nothing, or produced NaN throughput.
fn is_failure_sentinel(line: &str) -> bool {
    line.starts_with("unable to connect to")
        || line.starts_with("0 requests")
        || line.ends_with("nan%")
}

fn is_banner(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b == b'-')
}

/// Query level announced inside a banner, e.g. ` Queries: 20 for actix`.
fn banner_query_level(line: &str) -> Option<u32> {
    let rest = line.trim_start().strip_prefix("Queries:")?;
    let level = rest.split_whitespace().next()?;
    level.parse().ok()
}

/// Partition a raw log into ordered trial sections.
///
/// Returns `None` when the file carries a failure sentinel, signaling the
/// caller to skip this framework/test pair entirely. That is distinct from
/// `Some(vec![])`, which just means no sections were found.
pub fn split<'a, I>(lines: I) -> Option<Vec<RawSection>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sections: Vec<RawSection> = Vec::new();
    let mut in_header = false;
    let mut index = 0usize;

    for line in lines {
        let line = line.trim();

        if is_banner(line) {
            if in_header {
                in_header = false;
                continue;
            }
            in_header = true;
            index += 1;
            sections.push(RawSection::new(index));
            continue;
        }

        if in_header {
            // Banner text is noise, but the query announcement tags the
            // section that follows.
            if let Some(section) = sections.last_mut() {
                if section.query_level.is_none() {
                    section.query_level = banner_query_level(line);
                }
            }
            continue;
        }

        if is_failure_sentinel(line) {
            return None;
        }

        let Some(section) = sections.last_mut() else {
            // Stray content before the first banner
            continue;
        };

        if let Some(rest) = line.strip_prefix("STARTTIME") {
            section.start_time = rest.trim().parse().ok();
            continue;
        }
        if let Some(rest) = line.strip_prefix("ENDTIME") {
            section.end_time = rest.trim().parse().ok();
            continue;
        }
        if line.starts_with("Running") || line.is_empty() {
            continue;
        }

        section.text.push_str(line);
        section.text.push_str(";\n");
    }

    Some(sections)
}

/// The sections eligible for record parsing: timed trials only, restricted to
/// the designated (maximum) query level when the run contained a
/// repeated-query sub-benchmark.
pub fn timed_sections(sections: Vec<RawSection>) -> Vec<RawSection> {
    let designated = sections.iter().filter_map(|s| s.query_level).max();

    sections
        .into_iter()
        .filter(|s| s.has_window())
        .filter(|s| match (s.query_level, designated) {
            (level, Some(max)) => level == Some(max),
            (_, None) => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "---------------------------------------------------------";

    fn timed_block(start: i64, end: i64) -> Vec<String> {
        vec![
            BANNER.to_string(),
            " Running Concurrency 256".to_string(),
            " wrk -c 256 http://server:8080/json".to_string(),
            BANNER.to_string(),
            format!("STARTTIME {start}"),
            "Running 15s test @ http://server:8080/json".to_string(),
            "  4 threads and 256 connections".to_string(),
            "Requests/sec: 1234.56".to_string(),
            format!("ENDTIME {end}"),
        ]
    }

    #[test]
    fn test_split_single_timed_section() {
        let lines = timed_block(1000, 1015);
        let sections = split(lines.iter().map(String::as_str)).unwrap();

        assert_eq!(sections.len(), 1);
        let section = &sections[0];
        assert_eq!(section.index, 1);
        assert!(section.has_window());
        assert_eq!(
            section.text,
            "4 threads and 256 connections;\nRequests/sec: 1234.56;\n"
        );
    }

    #[test]
    fn test_grammar_text_anchors_window_at_tail() {
        let lines = timed_block(1000, 1015);
        let sections = split(lines.iter().map(String::as_str)).unwrap();

        let text = sections[0].grammar_text();
        assert!(text.ends_with("STARTTIME 1000;\nENDTIME 1015;\n"));
    }

    #[test]
    fn test_split_skips_banner_noise_and_running_lines() {
        let lines = timed_block(1, 2);
        let sections = split(lines.iter().map(String::as_str)).unwrap();

        let text = &sections[0].text;
        assert!(!text.contains("wrk -c"));
        assert!(!text.contains("Running"));
    }

    #[test]
    fn test_split_unable_to_connect_rejects_file() {
        let mut lines = timed_block(1, 2);
        lines.push("unable to connect to server:8080 Connection refused".to_string());
        assert!(split(lines.iter().map(String::as_str)).is_none());
    }

    #[test]
    fn test_split_zero_requests_rejects_file() {
        let mut lines = timed_block(1, 2);
        lines.insert(5, "0 requests in 15.00s, 0.00B read".to_string());
        assert!(split(lines.iter().map(String::as_str)).is_none());
    }

    #[test]
    fn test_split_nan_percent_rejects_file() {
        let mut lines = timed_block(1, 2);
        lines.push("    Req/Sec     0.00      0.00     0.00      nan%".to_string());
        assert!(split(lines.iter().map(String::as_str)).is_none());
    }

    #[test]
    fn test_split_empty_input_is_some_empty() {
        // No sections is not the same as a rejected file
        let sections = split(std::iter::empty());
        assert_eq!(sections, Some(vec![]));
    }

    #[test]
    fn test_untimed_sections_excluded() {
        let mut lines = vec![
            BANNER.to_string(),
            " Running Warmup actix".to_string(),
            BANNER.to_string(),
            "  4 threads and 256 connections".to_string(),
        ];
        lines.extend(timed_block(1000, 1015));

        let sections = split(lines.iter().map(String::as_str)).unwrap();
        assert_eq!(sections.len(), 2);

        let timed = timed_sections(sections);
        assert_eq!(timed.len(), 1);
        assert_eq!(timed[0].index, 2);
    }

    #[test]
    fn test_query_levels_keep_only_designated_phase() {
        let mut lines = Vec::new();
        for (level, start) in [(1u32, 100i64), (5, 200), (20, 300)] {
            lines.push(BANNER.to_string());
            lines.push(format!(" Queries: {level} for actix"));
            lines.push(BANNER.to_string());
            lines.push(format!("STARTTIME {start}"));
            lines.push("  4 threads and 256 connections".to_string());
            lines.push(format!("ENDTIME {}", start + 15));
        }

        let sections = split(lines.iter().map(String::as_str)).unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].query_level, Some(1));
        assert_eq!(sections[2].query_level, Some(20));

        let timed = timed_sections(sections);
        assert_eq!(timed.len(), 1);
        assert_eq!(timed[0].query_level, Some(20));
    }

    #[test]
    fn test_mixed_query_and_warmup_sections() {
        let mut lines = vec![
            BANNER.to_string(),
            " Running Primer actix".to_string(),
            BANNER.to_string(),
            "  4 threads and 8 connections".to_string(),
        ];
        for (level, start) in [(15u32, 100i64), (20, 200)] {
            lines.push(BANNER.to_string());
            lines.push(format!(" Queries: {level} for actix"));
            lines.push(BANNER.to_string());
            lines.push(format!("STARTTIME {start}"));
            lines.push("content".to_string());
            lines.push(format!("ENDTIME {}", start + 15));
        }

        let sections = split(lines.iter().map(String::as_str)).unwrap();
        let timed = timed_sections(sections);
        assert_eq!(timed.len(), 1);
        assert_eq!(timed[0].query_level, Some(20));
    }

    #[test]
    fn test_banner_detection() {
        assert!(is_banner("----"));
        assert!(is_banner(BANNER));
        assert!(!is_banner(""));
        assert!(!is_banner("-- --"));
        assert!(!is_banner("content"));
    }
}
