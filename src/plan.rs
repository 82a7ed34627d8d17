//! Allocation planning: how many times each ASIN gets used in a run.
//!
//! A plan is a count per pool identifier summing to the number of target
//! records. Which shape it takes depends on the policy and on how the
//! record count `n` compares with the pool size `u`:
//!
//! - `Covered`: every identifier at least once, extras spread randomly
//!   without exceeding the cap.
//! - `Sparse`: fewer records than identifiers, `n` distinct picks.
//! - `Overflow`: the cap cannot hold, every identifier gets the cap and the
//!   surplus is spread round-robin.
//! - `Free`: independent draws with replacement, optionally capped.
//! - `Permutation`: the observed identifiers reshuffled among themselves.

use crate::asin::Asin;
use crate::pool::AsinPool;
use eyre::Result;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Total draw attempts in capped free mode before falling back to uncapped draws.
pub const FREE_DRAW_ATTEMPTS: usize = 10_000;

/// How identifiers may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPolicy {
    /// Maximum uses of one identifier, `None` for uncapped.
    pub cap: Option<usize>,
    /// Use every identifier at least once when the record count allows it.
    pub coverage: bool,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            cap: None,
            coverage: true,
        }
    }
}

/// Planning failures.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Nothing to allocate from.
    EmptyPool,
    /// A cap of zero can never place a record.
    ZeroCap,
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanError::EmptyPool => write!(f, "identifier pool is empty"),
            PlanError::ZeroCap => write!(f, "reuse cap must be at least 1"),
        }
    }
}

impl std::error::Error for PlanError {}

/// The shape a plan took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Covered,
    Sparse,
    Overflow,
    Free,
    Permutation,
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Regime::Covered => "covered",
            Regime::Sparse => "sparse",
            Regime::Overflow => "overflow",
            Regime::Free => "free",
            Regime::Permutation => "permutation",
        };
        f.write_str(name)
    }
}

/// A requested cap that could not be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapWarning {
    pub requested: usize,
    pub effective: usize,
    pub records: usize,
    pub pool_size: usize,
}

impl std::fmt::Display for CapWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "N={} > {}x U={}: cap raised from {} to {}",
            self.records,
            self.requested,
            self.pool_size,
            self.requested,
            self.effective
        )
    }
}

/// Per-identifier target counts.
#[derive(Debug, Clone, PartialEq)]
pub struct CountPlan {
    asins: Vec<Asin>,
    counts: Vec<usize>,
    regime: Regime,
    effective_cap: Option<usize>,
    cap_warning: Option<CapWarning>,
}

impl CountPlan {
    pub fn regime(&self) -> Regime {
        self.regime
    }

    /// Highest count any identifier may reach in this plan.
    pub fn effective_cap(&self) -> Option<usize> {
        self.effective_cap
    }

    pub fn cap_warning(&self) -> Option<&CapWarning> {
        self.cap_warning.as_ref()
    }

    /// `(asin, count)` pairs in pool order, zero counts included.
    pub fn counts(&self) -> impl Iterator<Item = (&Asin, usize)> {
        self.asins.iter().zip(self.counts.iter().copied())
    }

    pub fn count_of(&self, asin: &Asin) -> usize {
        self.asins
            .iter()
            .position(|a| a == asin)
            .map(|i| self.counts[i])
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Every identifier repeated per its count, then shuffled.
    pub fn flatten_shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Asin> {
        let mut flat: Vec<Asin> = self
            .counts()
            .flat_map(|(asin, count)| std::iter::repeat_n(asin.clone(), count))
            .collect();
        flat.shuffle(rng);
        flat
    }

    /// Counts equal to the multiplicities of `originals`.
    pub fn permutation(originals: &[Asin]) -> Self {
        let pool = AsinPool::from_asins(originals.iter().cloned());
        let index = index_of(pool.as_slice());
        let mut counts = vec![0; pool.len()];
        for asin in originals {
            counts[index[asin]] += 1;
        }
        let effective_cap = counts.iter().copied().max();
        Self {
            asins: pool.as_slice().to_vec(),
            counts,
            regime: Regime::Permutation,
            effective_cap,
            cap_warning: None,
        }
    }

    /// Count limits `(max, min)` a substitution must respect, if any.
    fn substitution_bounds(&self) -> Option<(usize, usize)> {
        let unbounded = self.effective_cap.unwrap_or(usize::MAX);
        match self.regime {
            Regime::Covered => Some((unbounded, 1)),
            // Counts stay within one of each other: move only from ceil to floor.
            Regime::Overflow => {
                let u = self.asins.len().max(1);
                Some((self.total().div_ceil(u), self.total() / u))
            }
            Regime::Sparse => Some((1, 0)),
            Regime::Free => Some((unbounded, 0)),
            Regime::Permutation => None,
        }
    }

    /// Re-point conflicting positions at other pool identifiers with spare
    /// capacity, updating the counts so the plan's invariants still hold.
    ///
    /// Returns the positions that still conflict.
    pub fn substitute(&mut self, assignment: &mut [Asin], originals: &[Asin], conflicts: &[usize]) -> Vec<usize> {
        let Some((max, min)) = self.substitution_bounds() else {
            return conflicts.to_vec();
        };
        let index = index_of(&self.asins);
        let mut remaining = Vec::new();

        for &pos in conflicts {
            let Some(&old) = index.get(&assignment[pos]) else {
                remaining.push(pos);
                continue;
            };
            if self.counts[old] <= min {
                remaining.push(pos);
                continue;
            }

            // Least-used eligible identifier, first in pool order on ties.
            let replacement = (0..self.asins.len())
                .filter(|&j| j != old && self.counts[j] < max && self.asins[j] != originals[pos])
                .min_by_key(|&j| self.counts[j]);

            match replacement {
                Some(j) => {
                    log::debug!("Substituting {} for {} at position {}", self.asins[j], self.asins[old], pos);
                    self.counts[old] -= 1;
                    self.counts[j] += 1;
                    assignment[pos] = self.asins[j].clone();
                }
                None => remaining.push(pos),
            }
        }

        remaining
    }
}

fn index_of(asins: &[Asin]) -> HashMap<Asin, usize> {
    asins.iter().enumerate().map(|(i, a)| (a.clone(), i)).collect()
}

/// Build the count table for `n` records drawn from `pool`.
pub fn plan_counts<R: Rng + ?Sized>(n: usize, pool: &AsinPool, policy: &PlanPolicy, rng: &mut R) -> Result<CountPlan> {
    let u = pool.len();
    if u == 0 {
        return Err(eyre::eyre!(PlanError::EmptyPool));
    }
    if policy.cap == Some(0) {
        return Err(eyre::eyre!(PlanError::ZeroCap));
    }

    let asins = pool.as_slice().to_vec();
    let plan = if !policy.coverage {
        plan_free(n, asins, policy.cap, rng)
    } else {
        match policy.cap {
            Some(cap) if n > cap.saturating_mul(u) => plan_overflow(n, asins, cap, rng),
            cap if n >= u => plan_covered(n, asins, cap, rng),
            cap => plan_sparse(n, asins, cap, rng),
        }
    };

    debug_assert_eq!(plan.total(), n);
    log::info!(
        "Planned {} record(s) over {} ASIN(s): regime={}, effective cap={}",
        n,
        u,
        plan.regime,
        plan.effective_cap.map_or_else(|| "none".to_string(), |c| c.to_string())
    );
    if let Some(warning) = &plan.cap_warning {
        log::warn!("{}", warning);
    }
    Ok(plan)
}

fn plan_covered<R: Rng + ?Sized>(n: usize, asins: Vec<Asin>, cap: Option<usize>, rng: &mut R) -> CountPlan {
    let u = asins.len();
    let mut counts = vec![1; u];
    let extra = n - u;

    match cap {
        Some(cap) => {
            // One slot per spare use; n <= cap * u guarantees enough slots.
            let mut bag: Vec<usize> = (0..u).flat_map(|i| std::iter::repeat_n(i, cap - 1)).collect();
            bag.shuffle(rng);
            for &i in bag.iter().take(extra) {
                counts[i] += 1;
            }
        }
        None => {
            for _ in 0..extra {
                counts[rng.random_range(0..u)] += 1;
            }
        }
    }

    CountPlan {
        asins,
        counts,
        regime: Regime::Covered,
        effective_cap: cap,
        cap_warning: None,
    }
}

fn plan_sparse<R: Rng + ?Sized>(n: usize, asins: Vec<Asin>, cap: Option<usize>, rng: &mut R) -> CountPlan {
    let u = asins.len();
    let mut order: Vec<usize> = (0..u).collect();
    order.shuffle(rng);

    let mut counts = vec![0; u];
    for &i in order.iter().take(n) {
        counts[i] = 1;
    }

    CountPlan {
        asins,
        counts,
        regime: Regime::Sparse,
        effective_cap: cap,
        cap_warning: None,
    }
}

fn plan_overflow<R: Rng + ?Sized>(n: usize, asins: Vec<Asin>, cap: usize, rng: &mut R) -> CountPlan {
    let u = asins.len();
    let mut counts = vec![cap; u];
    let surplus = n - cap * u;

    let mut order: Vec<usize> = (0..u).collect();
    order.shuffle(rng);
    for k in 0..surplus {
        counts[order[k % u]] += 1;
    }

    let effective = n.div_ceil(u);
    CountPlan {
        asins,
        counts,
        regime: Regime::Overflow,
        effective_cap: Some(effective),
        cap_warning: Some(CapWarning {
            requested: cap,
            effective,
            records: n,
            pool_size: u,
        }),
    }
}

fn plan_free<R: Rng + ?Sized>(n: usize, asins: Vec<Asin>, cap: Option<usize>, rng: &mut R) -> CountPlan {
    let u = asins.len();
    let mut counts = vec![0; u];

    let Some(cap) = cap else {
        for _ in 0..n {
            counts[rng.random_range(0..u)] += 1;
        }
        return CountPlan {
            asins,
            counts,
            regime: Regime::Free,
            effective_cap: None,
            cap_warning: None,
        };
    };

    let mut placed = 0;
    let mut tries = 0;
    while placed < n && tries < FREE_DRAW_ATTEMPTS {
        let i = rng.random_range(0..u);
        if counts[i] < cap {
            counts[i] += 1;
            placed += 1;
        }
        tries += 1;
    }
    for _ in placed..n {
        counts[rng.random_range(0..u)] += 1;
    }

    let max = counts.iter().copied().max().unwrap_or(0);
    let cap_warning = (max > cap).then_some(CapWarning {
        requested: cap,
        effective: max,
        records: n,
        pool_size: u,
    });

    CountPlan {
        asins,
        counts,
        regime: Regime::Free,
        effective_cap: Some(max.max(cap)),
        cap_warning,
    }
}
