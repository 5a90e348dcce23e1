//! Test ranker.
//!
//! Scores the generated pool and selects the top-N. The score of a
//! candidate is its base value plus a coverage bonus that shrinks with every
//! pick already made in its category:
//!
//! ```text
//! base  = priority_weight * priority / 4 + detection_weight * confidence
//! bonus = coverage_weight / (1 + picks_in_category)
//! ```
//!
//! Selection is greedy (highest base + bonus first; ties go to the higher
//! priority, then the earlier generation order), so picked scores never
//! increase and the selection is already sorted.
//!
//! Coverage swap: when a mandatory category present in the pool is missing
//! from the greedy selection, its best unselected candidate replaces the
//! lowest-scoring selected item whose removal keeps every mandatory category
//! covered. Non-CRITICAL victims are taken first; a CRITICAL item is only
//! displaced when nothing else qualifies. This trades raw score for the
//! coverage guarantee on purpose.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::models::{Priority, RankedTestCase, RankingConfig, TestCase, TestCategory};

/// A greedy pick over pool indices.
#[derive(Debug, Clone, Copy)]
struct Pick {
    index: usize,
    score: f64,
    /// Picks already made in the category when this one was taken
    prior_in_category: usize,
}

#[derive(Debug, Clone)]
pub struct TestRanker {
    config: RankingConfig,
}

impl Default for TestRanker {
    fn default() -> Self {
        Self::new(RankingConfig::default())
    }
}

impl TestRanker {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn top_n(&self) -> usize {
        self.config.top_n
    }

    /// Rank the pool with the configured top-N.
    pub fn rank(&self, pool: &[TestCase]) -> Vec<RankedTestCase> {
        self.rank_top(pool, self.config.top_n)
    }

    /// Select exactly `min(top_n, pool.len())` test cases.
    pub fn rank_top(&self, pool: &[TestCase], top_n: usize) -> Vec<RankedTestCase> {
        let n = top_n.min(pool.len());
        if n == 0 {
            return Vec::new();
        }

        let all: Vec<usize> = (0..pool.len()).collect();
        let mut selected: BTreeSet<usize> = self
            .greedy(pool, &all, n)
            .into_iter()
            .map(|pick| pick.index)
            .collect();
        let swapped = self.coverage_swap(pool, &mut selected);

        let selected: Vec<usize> = selected.into_iter().collect();
        self.greedy(pool, &selected, n)
            .into_iter()
            .map(|pick| {
                let test_case = pool[pick.index].clone();
                let coverage_swap = swapped.contains(&pick.index);
                let ranking_reason = self.reason(&test_case, &pick, coverage_swap);
                RankedTestCase {
                    test_case,
                    overall_score: pick.score,
                    ranking_reason,
                    coverage_swap,
                }
            })
            .collect()
    }

    /// Score without the coverage bonus.
    pub fn base_score(&self, test_case: &TestCase) -> f64 {
        let priority = f64::from(test_case.priority.weight()) / f64::from(Priority::Critical.weight());
        let confidence = test_case
            .detection_confidence
            .unwrap_or(self.config.default_detection_confidence);
        self.config.priority_weight * priority + self.config.detection_weight * confidence
    }

    /// Diminishing coverage bonus for a category that already has `picks` selections.
    pub fn coverage_bonus(&self, picks: usize) -> f64 {
        self.config.coverage_weight / (1.0 + picks as f64)
    }

    /// Greedy selection of up to `n` items among `candidates`.
    fn greedy(&self, pool: &[TestCase], candidates: &[usize], n: usize) -> Vec<Pick> {
        let mut remaining: Vec<usize> = candidates.to_vec();
        let mut per_category: BTreeMap<TestCategory, usize> = BTreeMap::new();
        let mut picks = Vec::with_capacity(n);

        while picks.len() < n && !remaining.is_empty() {
            let mut best: Option<(usize, Pick)> = None;
            for (slot, &index) in remaining.iter().enumerate() {
                let case = &pool[index];
                let prior = per_category.get(&case.category).copied().unwrap_or(0);
                let candidate = Pick {
                    index,
                    score: self.base_score(case) + self.coverage_bonus(prior),
                    prior_in_category: prior,
                };
                let better = match &best {
                    None => true,
                    Some((_, current)) => outranks(pool, &candidate, current),
                };
                if better {
                    best = Some((slot, candidate));
                }
            }
            let Some((slot, pick)) = best else { break };
            remaining.swap_remove(slot);
            *per_category.entry(pool[pick.index].category).or_insert(0) += 1;
            picks.push(pick);
        }
        picks
    }

    /// Fill missing mandatory categories; returns the indices swapped in.
    fn coverage_swap(&self, pool: &[TestCase], selected: &mut BTreeSet<usize>) -> BTreeSet<usize> {
        let mut swapped = BTreeSet::new();

        for category in TestCategory::MANDATORY {
            if selected.iter().any(|&i| pool[i].category == category) {
                continue;
            }
            let Some(filler) = (0..pool.len())
                .filter(|i| !selected.contains(i) && pool[*i].category == category)
                .min_by(|a, b| compare_base(self, pool, *a, *b))
            else {
                continue;
            };

            let counts = category_counts(pool, selected);
            let current: Vec<usize> = selected.iter().copied().collect();
            let scores: BTreeMap<usize, f64> = self
                .greedy(pool, &current, current.len())
                .into_iter()
                .map(|pick| (pick.index, pick.score))
                .collect();

            let victim = current
                .iter()
                .copied()
                .filter(|&i| !swapped.contains(&i))
                .filter(|&i| {
                    let c = pool[i].category;
                    counts.get(&c).copied().unwrap_or(0) >= 2 || !c.is_mandatory()
                })
                .min_by(|&a, &b| {
                    let key = |i: usize| {
                        let c = pool[i].category;
                        (
                            pool[i].priority == Priority::Critical,
                            counts.get(&c).copied().unwrap_or(0) < 2,
                        )
                    };
                    key(a)
                        .cmp(&key(b))
                        .then_with(|| {
                            let sa = scores.get(&a).copied().unwrap_or(0.0);
                            let sb = scores.get(&b).copied().unwrap_or(0.0);
                            sa.total_cmp(&sb)
                        })
                        .then_with(|| pool[a].priority.cmp(&pool[b].priority))
                        .then_with(|| b.cmp(&a))
                });

            if let Some(victim) = victim {
                tracing::debug!(
                    category = %category,
                    swapped_in = pool[filler].id,
                    swapped_out = pool[victim].id,
                    "coverage swap"
                );
                selected.remove(&victim);
                selected.insert(filler);
                swapped.insert(filler);
            }
        }
        swapped
    }

    fn reason(&self, test_case: &TestCase, pick: &Pick, coverage_swap: bool) -> String {
        let bonus = self.coverage_bonus(pick.prior_in_category);
        let coverage = if pick.prior_in_category == 0 {
            format!("first {} pick, coverage bonus +{bonus:.3}", test_case.category)
        } else {
            format!(
                "{} already had {} pick(s), reduced coverage bonus +{bonus:.3}",
                test_case.category, pick.prior_in_category
            )
        };
        let mut reason = format!(
            "{} priority {} test; {coverage}; score {:.3}",
            test_case.priority, test_case.category, pick.score
        );
        if coverage_swap {
            reason.push_str(&format!(
                "; swapped in to cover mandatory category {}",
                test_case.category
            ));
        }
        reason
    }
}

/// True when `a` should be picked before `b`.
fn outranks(pool: &[TestCase], a: &Pick, b: &Pick) -> bool {
    a.score
        .total_cmp(&b.score)
        .then_with(|| pool[a.index].priority.cmp(&pool[b.index].priority))
        .then_with(|| b.index.cmp(&a.index))
        .is_gt()
}

/// Orders the better candidate (by base score) first.
fn compare_base(ranker: &TestRanker, pool: &[TestCase], a: usize, b: usize) -> std::cmp::Ordering {
    ranker
        .base_score(&pool[b])
        .total_cmp(&ranker.base_score(&pool[a]))
        .then_with(|| pool[b].priority.cmp(&pool[a].priority))
        .then_with(|| a.cmp(&b))
}

fn category_counts(pool: &[TestCase], selected: &BTreeSet<usize>) -> BTreeMap<TestCategory, usize> {
    let mut counts = BTreeMap::new();
    for &i in selected {
        *counts.entry(pool[i].category).or_insert(0) += 1;
    }
    counts
}
