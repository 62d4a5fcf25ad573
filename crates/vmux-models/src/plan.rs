//! Duration-fitting planner.
//!
//! Given the durations of the downloaded source clips and a target duration,
//! the planner decides how to assemble the clips into exactly the target:
//! either by trimming (enough material) or by cycling the source list in
//! order and truncating the final pass (not enough material). The planner is
//! pure: no clock, no randomness, identical input yields identical output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance for duration comparisons, in seconds.
///
/// Container timestamps are millisecond-granular at best, so anything below
/// this is treated as zero remaining budget.
pub const DURATION_EPSILON: f64 = 1e-3;

/// Errors from plan construction. All of these indicate invalid input and
/// are rejected before any I/O happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("no video sources provided")]
    NoSources,

    #[error("source {index} has non-positive duration {duration}s")]
    NonPositiveDuration { index: usize, duration: f64 },

    #[error("target duration must be positive, got {0}s")]
    NonPositiveTarget(f64),
}

/// A bounded slice of one source clip used in the final assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Index into the ordered source list.
    pub source: usize,
    /// Start offset within the source, in seconds.
    pub start: f64,
    /// Play length, in seconds. Always positive.
    pub length: f64,
}

impl Segment {
    /// End offset within the source (`start + length`).
    pub fn end(&self) -> f64 {
        self.start + self.length
    }
}

/// An ordered segment sequence whose total play length equals the target
/// duration. Immutable once built; consumed by the media layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    segments: Vec<Segment>,
    target: f64,
}

impl Plan {
    /// Fit the ordered source durations into exactly `target` seconds.
    ///
    /// Trim case (`sum(durations) >= target`): sources are consumed in order
    /// at full length until the remaining budget is smaller than the next
    /// source, which contributes one final partial segment from offset 0.
    /// Sources past the cutoff do not appear in the plan.
    ///
    /// Loop case (`sum(durations) < target`): the source list is cycled in
    /// its original order, and the final segment of the final pass is
    /// truncated so the total is exactly `target`. The plan never overshoots.
    pub fn fit(durations: &[f64], target: f64) -> Result<Self, PlanError> {
        if durations.is_empty() {
            return Err(PlanError::NoSources);
        }
        if let Some((index, &duration)) = durations
            .iter()
            .enumerate()
            .find(|(_, &d)| !d.is_finite() || d <= 0.0)
        {
            return Err(PlanError::NonPositiveDuration { index, duration });
        }
        if !target.is_finite() || target <= 0.0 {
            return Err(PlanError::NonPositiveTarget(target));
        }

        let mut segments = Vec::new();
        let mut remaining = target;

        // Each full pass consumes at least min(durations) > 0 seconds, so
        // the walk terminates.
        'walk: loop {
            for (source, &duration) in durations.iter().enumerate() {
                if remaining <= DURATION_EPSILON {
                    break 'walk;
                }
                let length = duration.min(remaining);
                segments.push(Segment {
                    source,
                    start: 0.0,
                    length,
                });
                remaining -= length;
            }
        }

        Ok(Self { segments, target })
    }

    /// The target duration this plan was built for.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// The segments in playback order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Sum of all segment play lengths.
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Highest source index referenced by the plan, if any.
    pub fn max_source(&self) -> Option<usize> {
        self.segments.iter().map(|s| s.source).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < DURATION_EPSILON, "{} != {}", a, b);
    }

    #[test]
    fn test_exact_fit_single_source() {
        let plan = Plan::fit(&[5.0], 5.0).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.segments()[0].source, 0);
        assert_close(plan.segments()[0].start, 0.0);
        assert_close(plan.segments()[0].length, 5.0);
    }

    #[test]
    fn test_loop_single_source() {
        let plan = Plan::fit(&[5.0], 12.0).unwrap();
        let lengths: Vec<f64> = plan.segments().iter().map(|s| s.length).collect();
        assert_eq!(plan.len(), 3);
        assert_close(lengths[0], 5.0);
        assert_close(lengths[1], 5.0);
        assert_close(lengths[2], 2.0);
        assert!(plan.segments().iter().all(|s| s.source == 0));
        assert_close(plan.total_length(), 12.0);
    }

    #[test]
    fn test_trim_excludes_tail_sources() {
        let plan = Plan::fit(&[4.0, 4.0, 4.0], 6.0).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.segments()[0].source, 0);
        assert_close(plan.segments()[0].length, 4.0);
        assert_eq!(plan.segments()[1].source, 1);
        assert_close(plan.segments()[1].length, 2.0);
        assert_eq!(plan.max_source(), Some(1));
    }

    #[test]
    fn test_single_long_source_truncates() {
        let plan = Plan::fit(&[100.0], 30.0).unwrap();
        assert_eq!(plan.len(), 1);
        assert_close(plan.segments()[0].start, 0.0);
        assert_close(plan.segments()[0].length, 30.0);
    }

    #[test]
    fn test_exact_sum_no_truncation() {
        let durations = [3.0, 7.0, 2.5];
        let plan = Plan::fit(&durations, 12.5).unwrap();
        assert_eq!(plan.len(), 3);
        for (segment, &duration) in plan.segments().iter().zip(durations.iter()) {
            assert_close(segment.length, duration);
        }
    }

    #[test]
    fn test_total_always_hits_target() {
        let cases: &[(&[f64], f64)] = &[
            (&[1.0, 2.0, 3.0], 100.0),
            (&[0.5], 0.7),
            (&[10.0, 0.1], 9.95),
            (&[33.3, 12.7, 8.05], 600.0),
        ];
        for (durations, target) in cases {
            let plan = Plan::fit(durations, *target).unwrap();
            assert_close(plan.total_length(), *target);
        }
    }

    #[test]
    fn test_trim_case_is_weakly_monotone() {
        let plan = Plan::fit(&[2.0, 3.0, 4.0, 5.0], 10.0).unwrap();
        let indices: Vec<usize> = plan.segments().iter().map(|s| s.source).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
        for segment in plan.segments() {
            assert!(segment.length <= [2.0, 3.0, 4.0, 5.0][segment.source] + DURATION_EPSILON);
        }
    }

    #[test]
    fn test_loop_case_cycles_in_order() {
        let durations = [2.0, 3.0];
        let plan = Plan::fit(&durations, 13.0).unwrap();
        // Full cycles: (2+3)*2 = 10, then 2 + 1 of the third pass.
        let indices: Vec<usize> = plan.segments().iter().map(|s| s.source).collect();
        assert_eq!(indices, vec![0, 1, 0, 1, 0, 1]);
        // Only the last segment is truncated.
        for segment in &plan.segments()[..plan.len() - 1] {
            assert_close(segment.length, durations[segment.source]);
        }
        assert_close(plan.segments().last().unwrap().length, 1.0);
    }

    #[test]
    fn test_deterministic() {
        let durations = [4.2, 1.7, 9.0];
        let a = Plan::fit(&durations, 47.0).unwrap();
        let b = Plan::fit(&durations, 47.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_sources_rejected() {
        assert_eq!(Plan::fit(&[], 10.0), Err(PlanError::NoSources));
    }

    #[test]
    fn test_non_positive_target_rejected() {
        assert_eq!(Plan::fit(&[5.0], 0.0), Err(PlanError::NonPositiveTarget(0.0)));
        assert_eq!(
            Plan::fit(&[5.0], -1.0),
            Err(PlanError::NonPositiveTarget(-1.0))
        );
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        assert_eq!(
            Plan::fit(&[5.0, 0.0], 10.0),
            Err(PlanError::NonPositiveDuration {
                index: 1,
                duration: 0.0
            })
        );
        assert!(Plan::fit(&[f64::NAN], 10.0).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let plan = Plan::fit(&[5.0, 3.0], 6.0).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }
}
