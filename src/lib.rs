//! Cosechar - benchmark-result harvester
//!
//! This library extracts normalized performance summaries from the raw
//! artifacts of a TechEmpower-style benchmark run: wrk load-test logs are
//! split into trial sections, parsed against the wrk report grammar with
//! unit normalization, the best trial is selected per framework, and its
//! time window is correlated against the dstat resource series.

pub mod cli;
pub mod config;
pub mod csv_output;
pub mod json_output;
pub mod record;
pub mod resource;
pub mod scan;
pub mod section;
pub mod select;
pub mod summary;
pub mod units;
