//! Allocation normalizer
//!
//! The normalizer is the stability core of Residua. It is NOT an
//! optional component: candidate plans come out of a reasoning oracle
//! and carry no numeric guarantees.
//!
//! Responsibilities:
//! - Rescale declared percentages so they sum to 100
//! - Fall back to equal shares for an uninformative candidate
//! - Recompute every entry's tons from its percentage
//! - Correct residual rounding drift deterministically
//!
//! It is a pure function: no external calls, no failure mode, and
//! idempotent. Normalizing its own output changes nothing.

use crate::types::{CandidatePlan, FinalPlan};

/// Maximum tolerated deviation of the percentage sum from 100 after
/// per-entry rounding.
pub const SUM_TOLERANCE: f64 = 0.1;

/// Repair a candidate allocation into one satisfying the hard numeric
/// invariants: percentages sum to 100 within [`SUM_TOLERANCE`] and each
/// entry's tons equals `(percentage / 100) * total_residue` to two
/// decimals.
///
/// An empty entry list passes through unchanged. A plan whose declared
/// percentages sum to zero or less gets an equal share per entry. The
/// residual drift left by independent per-entry rounding, when it
/// exceeds the tolerance, is added to the last entry: a fixed
/// deterministic tie-break kept for output parity.
pub fn normalize(mut plan: CandidatePlan, total_residue: f64) -> FinalPlan {
    if plan.allocation.is_empty() {
        return FinalPlan(plan);
    }

    let declared = plan.declared_percentage_sum();
    if declared > 0.0 {
        for entry in &mut plan.allocation {
            entry.percentage = round2(entry.percentage / declared * 100.0);
        }
    } else {
        // Uninformative candidate: every declared share was zero or
        // negative. Spread evenly rather than failing.
        let equal = round2(100.0 / plan.allocation.len() as f64);
        for entry in &mut plan.allocation {
            entry.percentage = equal;
        }
    }

    for entry in &mut plan.allocation {
        entry.tons = round2(entry.percentage / 100.0 * total_residue);
    }

    let rounded_sum: f64 = plan.allocation.iter().map(|e| e.percentage).sum();
    if (rounded_sum - 100.0).abs() > SUM_TOLERANCE {
        let drift = round2(100.0 - rounded_sum);
        if let Some(last) = plan.allocation.last_mut() {
            last.percentage += drift;
            last.tons = round2(last.percentage / 100.0 * total_residue);
        }
    }

    FinalPlan(plan)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AllocationEntry, Pathway};

    fn plan_of(percentages: &[f64]) -> CandidatePlan {
        // Cycle through the pathways; tests with more than four entries
        // only care about the numbers.
        let allocation = percentages
            .iter()
            .enumerate()
            .map(|(i, &p)| AllocationEntry::new(Pathway::ALL[i % 4], p, 0.0))
            .collect();
        CandidatePlan {
            allocation,
            ..CandidatePlan::default()
        }
    }

    fn four_pathway_plan(percentages: [f64; 4]) -> CandidatePlan {
        let allocation = Pathway::ALL
            .iter()
            .zip(percentages)
            .map(|(&pathway, p)| AllocationEntry::new(pathway, p, 0.0))
            .collect();
        CandidatePlan {
            allocation,
            ..CandidatePlan::default()
        }
    }

    fn percentage_sum(plan: &FinalPlan) -> f64 {
        plan.plan().allocation.iter().map(|e| e.percentage).sum()
    }

    #[test]
    fn test_empty_plan_passes_through() {
        let normalized = normalize(CandidatePlan::default(), 1000.0);
        assert!(normalized.plan().allocation.is_empty());
    }

    #[test]
    fn test_proportional_rescale() {
        let normalized = normalize(four_pathway_plan([10.0, 10.0, 10.0, 10.0]), 1000.0);
        for entry in &normalized.plan().allocation {
            assert_eq!(entry.percentage, 25.0);
            assert_eq!(entry.tons, 250.0);
        }
    }

    #[test]
    fn test_zero_sum_falls_back_to_equal_shares() {
        let normalized = normalize(four_pathway_plan([0.0, 0.0, 0.0, 0.0]), 1000.0);
        for entry in &normalized.plan().allocation {
            assert_eq!(entry.percentage, 25.0);
            assert_eq!(entry.tons, 250.0);
        }
    }

    #[test]
    fn test_negative_sum_falls_back_to_equal_shares() {
        let normalized = normalize(four_pathway_plan([-10.0, -5.0, 0.0, 0.0]), 400.0);
        for entry in &normalized.plan().allocation {
            assert_eq!(entry.percentage, 25.0);
            assert_eq!(entry.tons, 100.0);
        }
    }

    #[test]
    fn test_single_pathway_unchanged() {
        let plan = CandidatePlan {
            allocation: vec![AllocationEntry::new(Pathway::Biogas, 100.0, 0.0)],
            ..CandidatePlan::default()
        };
        let normalized = normalize(plan, 750.0);
        let entry = &normalized.plan().allocation[0];
        assert_eq!(entry.percentage, 100.0);
        assert_eq!(entry.tons, 750.0);
    }

    #[test]
    fn test_rounding_drift_within_tolerance_is_left_alone() {
        // Three equal thirds round to 33.33 each; the 99.99 sum is
        // inside the tolerance, so no entry is touched by the
        // correction step.
        let normalized = normalize(plan_of(&[33.33, 33.33, 33.33]), 900.0);
        let entries = &normalized.plan().allocation;
        assert_eq!(entries[0].percentage, 33.33);
        assert_eq!(entries[1].percentage, 33.33);
        assert_eq!(entries[2].percentage, 33.33);
        assert!((percentage_sum(&normalized) - 100.0).abs() <= SUM_TOLERANCE);
    }

    #[test]
    fn test_rounding_drift_correction_adjusts_only_last_entry() {
        // 150 equal shares rescale to 100/150 = 0.666..., which rounds
        // up to 0.67 each and leaves the sum at 100.5, past the
        // tolerance. The correction must land entirely on the last
        // entry.
        let normalized = normalize(plan_of(&vec![1.0; 150]), 1000.0);
        let entries = &normalized.plan().allocation;
        for entry in &entries[..149] {
            assert_eq!(entry.percentage, 0.67);
        }
        let last = &entries[149];
        assert!((last.percentage - 0.17).abs() < 1e-9);
        assert!((last.tons - 1.7).abs() < 0.01);
        assert!((percentage_sum(&normalized) - 100.0).abs() <= SUM_TOLERANCE);
    }

    #[test]
    fn test_sum_invariant_for_arbitrary_candidates() {
        let candidates: Vec<Vec<f64>> = vec![
            vec![7.0, 13.0, 42.0],
            vec![0.01, 0.02, 0.03, 0.04],
            vec![99.9, 0.1],
            vec![250.0, 250.0, 250.0, 250.0],
            vec![1e-6, 2e-6],
        ];
        for percentages in candidates {
            let normalized = normalize(plan_of(&percentages), 1234.5);
            assert!(
                (percentage_sum(&normalized) - 100.0).abs() <= SUM_TOLERANCE,
                "sum invariant violated for {:?}",
                percentages
            );
        }
    }

    #[test]
    fn test_tons_consistency() {
        let total = 7500.0;
        let normalized = normalize(four_pathway_plan([40.0, 25.0, 20.0, 15.0]), total);
        for entry in &normalized.plan().allocation {
            let expected = entry.percentage / 100.0 * total;
            assert!(
                (entry.tons - expected).abs() <= 0.01,
                "tons {} inconsistent with percentage {}",
                entry.tons,
                entry.percentage
            );
        }
    }

    #[test]
    fn test_idempotence() {
        let inputs: Vec<Vec<f64>> = vec![
            vec![10.0, 10.0, 10.0, 10.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![33.33, 33.33, 33.33],
            vec![1.0; 150],
            vec![100.0],
        ];
        for percentages in inputs {
            let total = 1000.0;
            let once = normalize(plan_of(&percentages), total);
            let twice = normalize(once.plan().clone(), total);
            for (a, b) in once
                .plan()
                .allocation
                .iter()
                .zip(&twice.plan().allocation)
            {
                assert!(
                    (a.percentage - b.percentage).abs() <= 0.01,
                    "percentage moved on renormalize for {:?}",
                    percentages
                );
                assert!(
                    (a.tons - b.tons).abs() <= 0.01,
                    "tons moved on renormalize for {:?}",
                    percentages
                );
            }
        }
    }

    #[test]
    fn test_free_text_fields_pass_through() {
        let mut plan = four_pathway_plan([30.0, 30.0, 30.0, 30.0]);
        plan.notes = "respects compost ceiling".to_string();
        plan.missing_data = "biochar potential score".to_string();
        plan.allocation[0].reasoning = Some("subsidized".to_string());

        let normalized = normalize(plan, 1000.0);
        assert_eq!(normalized.plan().notes, "respects compost ceiling");
        assert_eq!(normalized.plan().missing_data, "biochar potential score");
        assert_eq!(
            normalized.plan().allocation[0].reasoning.as_deref(),
            Some("subsidized")
        );
    }
}
