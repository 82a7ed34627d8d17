//! Pairing records with planned identifiers while avoiding fixed points.
//!
//! A fixed point is a record that would get back the identifier it already
//! carries. The search reshuffles a bounded number of times, then falls back
//! to a greedy forward swap. The swap can dead-end, so the result reports
//! any positions that still conflict instead of assuming success.

use crate::asin::Asin;
use rand::Rng;
use rand::seq::SliceRandom;

/// Default number of reshuffles before the repair pass.
pub const DEFAULT_SHUFFLE_ATTEMPTS: usize = 600;

/// Identifiers paired positionally with the records.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub asins: Vec<Asin>,
    /// Positions whose identifier equals the record's original.
    pub conflicts: Vec<usize>,
    /// Shuffles performed.
    pub attempts: usize,
    /// Whether the swap repair pass ran.
    pub repaired: bool,
}

impl Assignment {
    /// Take the candidates as-is, only recording conflicts.
    pub fn unchecked(originals: &[Asin], candidates: Vec<Asin>) -> Self {
        let conflicts = fixed_points(originals, &candidates);
        Self {
            asins: candidates,
            conflicts,
            attempts: 0,
            repaired: false,
        }
    }

    pub fn is_conflict_free(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Positions where the candidate equals the original.
pub fn fixed_points(originals: &[Asin], candidates: &[Asin]) -> Vec<usize> {
    originals
        .iter()
        .zip(candidates)
        .enumerate()
        .filter(|(_, (orig, cand))| orig == cand)
        .map(|(i, _)| i)
        .collect()
}

/// Greedy forward swap: for each conflicting `i`, swap with the first later
/// `j` such that neither position conflicts afterwards.
pub fn repair_fixed_points(originals: &[Asin], assignment: &mut [Asin]) {
    let n = originals.len().min(assignment.len());
    for i in 0..n {
        if assignment[i] != originals[i] {
            continue;
        }
        if let Some(j) = (i + 1..n).find(|&j| assignment[j] != originals[i] && assignment[i] != originals[j]) {
            assignment.swap(i, j);
        }
    }
}

/// Shuffle `candidates` until no record keeps its original identifier,
/// falling back to [`repair_fixed_points`] once `max_attempts` is spent.
pub fn avoid_fixed_points<R: Rng + ?Sized>(
    originals: &[Asin],
    candidates: Vec<Asin>,
    max_attempts: usize,
    rng: &mut R,
) -> Assignment {
    debug_assert_eq!(originals.len(), candidates.len());
    let mut asins = candidates;

    if asins.is_empty() {
        return Assignment {
            asins,
            conflicts: Vec::new(),
            attempts: 0,
            repaired: false,
        };
    }

    for attempt in 1..=max_attempts {
        asins.shuffle(rng);
        if fixed_points(originals, &asins).is_empty() {
            log::debug!("No fixed points after {} shuffle(s)", attempt);
            return Assignment {
                asins,
                conflicts: Vec::new(),
                attempts: attempt,
                repaired: false,
            };
        }
    }

    log::info!("Fixed points remain after {} shuffles, running swap repair", max_attempts);
    repair_fixed_points(originals, &mut asins);
    let conflicts = fixed_points(originals, &asins);

    Assignment {
        asins,
        conflicts,
        attempts: max_attempts,
        repaired: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn asins(ids: &[&str]) -> Vec<Asin> {
        ids.iter().map(|s| Asin::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_fixed_points() {
        let originals = asins(&["AAAAAAAAAA", "BBBBBBBBBB", "CCCCCCCCCC"]);
        let candidates = asins(&["AAAAAAAAAA", "CCCCCCCCCC", "CCCCCCCCCC"]);
        assert_eq!(fixed_points(&originals, &candidates), vec![0, 2]);
    }

    #[test]
    fn test_empty_assignment() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = avoid_fixed_points(&[], Vec::new(), 10, &mut rng);
        assert!(result.asins.is_empty());
        assert!(result.is_conflict_free());
    }

    #[test]
    fn test_derangement_found_by_shuffling() {
        let originals = asins(&["AAAAAAAAAA", "BBBBBBBBBB", "CCCCCCCCCC", "DDDDDDDDDD"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = avoid_fixed_points(&originals, originals.clone(), DEFAULT_SHUFFLE_ATTEMPTS, &mut rng);

            assert!(result.is_conflict_free());
            assert!(!result.repaired);
            let mut sorted = result.asins.clone();
            sorted.sort();
            assert_eq!(sorted, originals);
        }
    }

    #[test]
    fn test_single_identifier_cannot_avoid_fixed_point() {
        let originals = asins(&["AAAAAAAAAA"]);
        let mut rng = StdRng::seed_from_u64(2);
        let result = avoid_fixed_points(&originals, originals.clone(), 5, &mut rng);

        assert_eq!(result.conflicts, vec![0]);
        assert!(result.repaired);
        assert_eq!(result.attempts, 5);
    }

    #[test]
    fn test_repair_swaps_forward() {
        let originals = asins(&["AAAAAAAAAA", "BBBBBBBBBB", "CCCCCCCCCC"]);
        let mut assignment = asins(&["AAAAAAAAAA", "CCCCCCCCCC", "BBBBBBBBBB"]);

        repair_fixed_points(&originals, &mut assignment);

        assert_eq!(assignment, asins(&["CCCCCCCCCC", "AAAAAAAAAA", "BBBBBBBBBB"]));
        assert!(fixed_points(&originals, &assignment).is_empty());
    }

    #[test]
    fn test_repair_can_dead_end() {
        // The last position has nothing after it to swap with.
        let originals = asins(&["AAAAAAAAAA", "BBBBBBBBBB"]);
        let mut assignment = asins(&["BBBBBBBBBB", "BBBBBBBBBB"]);

        repair_fixed_points(&originals, &mut assignment);

        assert_eq!(fixed_points(&originals, &assignment), vec![1]);
    }

    #[test]
    fn test_zero_attempts_goes_straight_to_repair() {
        let originals = asins(&["AAAAAAAAAA", "BBBBBBBBBB"]);
        let mut rng = StdRng::seed_from_u64(3);
        let result = avoid_fixed_points(&originals, originals.clone(), 0, &mut rng);

        assert!(result.repaired);
        assert!(result.is_conflict_free());
        assert_eq!(result.asins, asins(&["BBBBBBBBBB", "AAAAAAAAAA"]));
    }

    #[test]
    fn test_unchecked_reports_conflicts() {
        let originals = asins(&["AAAAAAAAAA", "BBBBBBBBBB"]);
        let result = Assignment::unchecked(&originals, originals.clone());
        assert_eq!(result.conflicts, vec![0, 1]);
        assert_eq!(result.attempts, 0);
    }
}
