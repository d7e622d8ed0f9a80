//! Representative-trial selection
//!
//! TechEmpower reports the best run, not the median, so the selector picks
//! the trial with the highest aggregate requests-per-second among all timed
//! sections. Trials disqualified by the socket-error gate never reach the
//! selector.

use crate::record::TrialRecord;

/// Drop trials that failed the socket-error quality gate.
pub fn retain_clean(trials: &mut Vec<TrialRecord>) {
    trials.retain(|trial| {
        if trial.excessive_socket_errors() {
            tracing::debug!(
                socket_errors = trial.socket_error_count,
                requests = trial.request_count,
                "dropping trial: socket errors above threshold"
            );
            false
        } else {
            true
        }
    });
}

/// Pick the representative trial: maximum canonical requests-per-second.
///
/// Ties resolve to the first maximal trial, so section order in the source
/// file is preserved deterministically. Empty input yields `None`.
pub fn select_best(trials: &[TrialRecord]) -> Option<&TrialRecord> {
    let mut best: Option<&TrialRecord> = None;
    for trial in trials {
        match best {
            Some(current) if trial.requests_per_sec <= current.requests_per_sec => {}
            _ => best = Some(trial),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ThreadDistribution;
    use proptest::prelude::*;

    fn trial(requests_per_sec: f64, request_count: u64, socket_errors: u64) -> TrialRecord {
        TrialRecord {
            threads: 4,
            connections: 256,
            latency: ThreadDistribution::default(),
            thread_rps: ThreadDistribution::default(),
            lat50: 1.0,
            lat75: 1.5,
            lat90: 2.0,
            lat99: 3.0,
            request_count,
            over_seconds: 15.0,
            megabytes_read: 10.0,
            requests_per_sec,
            transfer_megabytes_per_sec: 1.0,
            non_2xx_count: 0,
            non_2xx_percent: 0.0,
            socket_error_count: socket_errors,
            start_time: 1000,
            end_time: 1015,
        }
    }

    #[test]
    fn test_select_best_empty_is_none() {
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_select_best_picks_maximum() {
        let trials = vec![
            trial(1000.0, 10_000, 0),
            trial(3000.0, 30_000, 0),
            trial(2000.0, 20_000, 0),
        ];
        let best = select_best(&trials).unwrap();
        assert_eq!(best.requests_per_sec, 3000.0);
    }

    #[test]
    fn test_select_best_tie_resolves_to_earliest() {
        let mut first = trial(2000.0, 10_000, 0);
        first.start_time = 111;
        let mut second = trial(2000.0, 10_000, 0);
        second.start_time = 222;

        let trials = vec![first, second, trial(500.0, 5_000, 0)];
        let best = select_best(&trials).unwrap();
        assert_eq!(best.start_time, 111);
    }

    #[test]
    fn test_retain_clean_applies_socket_gate() {
        let mut trials = vec![
            trial(1000.0, 10_000, 51), // above 0.5%
            trial(900.0, 10_000, 50),  // exactly 0.5%
            trial(800.0, 10_000, 0),
        ];
        retain_clean(&mut trials);

        assert_eq!(trials.len(), 2);
        assert_eq!(trials[0].requests_per_sec, 900.0);
        assert_eq!(select_best(&trials).unwrap().requests_per_sec, 900.0);
    }

    proptest! {
        #[test]
        fn prop_selected_rps_is_maximal(rps in proptest::collection::vec(0.0f64..1e7, 1..20)) {
            let trials: Vec<_> = rps.iter().map(|&r| trial(r, 1000, 0)).collect();
            let best = select_best(&trials).unwrap();
            for t in &trials {
                prop_assert!(best.requests_per_sec >= t.requests_per_sec);
            }
        }

        #[test]
        fn prop_unique_maximum_is_selected(
            rps in proptest::collection::vec(0.0f64..1e6, 1..20),
            bump in 1.0f64..100.0,
            pick in any::<prop::sample::Index>(),
        ) {
            let mut trials: Vec<_> = rps.iter().map(|&r| trial(r, 1000, 0)).collect();
            let idx = pick.index(trials.len());
            let ceiling = 1e6 + bump;
            trials[idx].requests_per_sec = ceiling;
            let best = select_best(&trials).unwrap();
            prop_assert_eq!(best.requests_per_sec, ceiling);
        }
    }
}
