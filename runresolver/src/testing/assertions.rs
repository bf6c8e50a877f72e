//! Assertions on resolution outcomes.

use crate::metadata::ArtifactId;
use crate::resolution::{ResolveOutcome, ResolvedRun, SkipReason};

/// Asserts that the outcome resolved `run_id` and returns the run.
#[track_caller]
pub fn assert_resolved<'a>(outcome: &'a ResolveOutcome, run_id: &str) -> &'a ResolvedRun {
    match outcome {
        ResolveOutcome::Resolved(run) => {
            assert_eq!(run.run_id, run_id, "Resolved the wrong run");
            run
        }
        ResolveOutcome::Skipped(reason) => {
            panic!("Expected run '{run_id}' to resolve, got skip: {reason}")
        }
    }
}

/// Asserts the resolved run and the artifact ids of every channel.
///
/// Channels not listed in `expected` must be absent.
#[track_caller]
pub fn assert_resolved_ids(
    outcome: &ResolveOutcome,
    run_id: &str,
    expected: &[(&str, &[ArtifactId])],
) {
    let run = assert_resolved(outcome, run_id);
    let actual = run.channels.artifact_ids();
    let expected: std::collections::BTreeMap<String, Vec<ArtifactId>> = expected
        .iter()
        .map(|(k, ids)| ((*k).to_string(), ids.to_vec()))
        .collect();
    assert_eq!(actual, expected, "Channel mapping of run '{run_id}' differs");
}

/// Asserts that the outcome is a skip.
#[track_caller]
pub fn assert_skipped(outcome: &ResolveOutcome) {
    assert!(
        outcome.is_skipped(),
        "Expected a skip, got {:?}",
        outcome.run().map(|r| &r.run_id)
    );
}

/// Asserts that the outcome is a skip for `expected`.
#[track_caller]
pub fn assert_skipped_with(outcome: &ResolveOutcome, expected: &SkipReason) {
    match outcome {
        ResolveOutcome::Skipped(reason) => assert_eq!(reason, expected),
        ResolveOutcome::Resolved(run) => {
            panic!("Expected skip '{expected}', resolved run '{}'", run.run_id)
        }
    }
}
