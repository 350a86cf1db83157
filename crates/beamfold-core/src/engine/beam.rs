use super::state::{Manner, State, StateKind};
use std::collections::HashMap;

/// A state keyed by its opening position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub i: usize,
    pub state: State,
}

/// The states of one kind ending at one position.
///
/// Candidates are stored in insertion order next to an index keyed by the opening position,
/// so iteration order never depends on hashing.
#[derive(Debug, Clone, Default)]
pub struct BeamStep {
    candidates: Vec<Candidate>,
    index: HashMap<usize, usize>,
}

impl BeamStep {
    /// Records `score` for opening position `i` if it beats the current entry. Ties keep the
    /// first writer. Returns whether the entry changed.
    pub fn update(&mut self, i: usize, score: i32, manner: Manner) -> bool {
        match self.index.get(&i) {
            Some(&slot) => {
                let entry = &mut self.candidates[slot];
                if score > entry.state.score {
                    entry.state = State::new(score, manner);
                    true
                } else {
                    false
                }
            }
            None => {
                self.index.insert(i, self.candidates.len());
                self.candidates.push(Candidate {
                    i,
                    state: State::new(score, manner),
                });
                true
            }
        }
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<State> {
        self.index.get(&i).map(|&slot| self.candidates[slot].state)
    }

    /// Dense slot of the entry for `i`, stable until the next prune.
    #[inline]
    pub fn slot(&self, i: usize) -> Option<usize> {
        self.index.get(&i).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Keeps the `beam_size` best candidates and returns how many were discarded.
    ///
    /// Candidates are ranked by `prefix(i) + score`, where `prefix(i)` is the best exterior
    /// score ending just before `i`. Equal keys prefer the larger opening position. Exactly
    /// `beam_size` candidates survive, in their original insertion order. A `beam_size` of
    /// zero disables pruning.
    pub fn prune<F>(&mut self, beam_size: usize, prefix: F) -> usize
    where
        F: Fn(usize) -> i64,
    {
        if beam_size == 0 || self.candidates.len() <= beam_size {
            return 0;
        }

        let keys: Vec<(i64, usize)> = self
            .candidates
            .iter()
            .map(|c| (prefix(c.i) + i64::from(c.state.score), c.i))
            .collect();
        let mut ranking = keys.clone();
        ranking.select_nth_unstable_by(beam_size - 1, |a, b| b.cmp(a));
        let cutoff = ranking[beam_size - 1];

        let before = self.candidates.len();
        let mut keep = keys.iter().map(|key| *key >= cutoff);
        self.candidates.retain(|_| keep.next().unwrap_or(false));
        self.rebuild_index();
        before - self.candidates.len()
    }

    /// Reorders the candidates by opening position.
    pub fn sort_by_opening(&mut self) {
        self.candidates.sort_unstable_by_key(|c| c.i);
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        self.index.extend(
            self.candidates
                .iter()
                .enumerate()
                .map(|(slot, c)| (c.i, slot)),
        );
    }
}

impl<'a> IntoIterator for &'a BeamStep {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Number of candidates discarded by pruning, per state kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeamStats {
    pub hairpin: u64,
    pub multi: u64,
    pub pair: u64,
    pub m2: u64,
    pub m: u64,
}

impl BeamStats {
    pub fn record(&mut self, kind: StateKind, discarded: usize) {
        let counter = match kind {
            StateKind::Hairpin => &mut self.hairpin,
            StateKind::Multi => &mut self.multi,
            StateKind::Pair => &mut self.pair,
            StateKind::M2 => &mut self.m2,
            StateKind::M => &mut self.m,
            StateKind::Exterior => return,
        };
        *counter += discarded as u64;
    }

    pub fn get(&self, kind: StateKind) -> u64 {
        match kind {
            StateKind::Hairpin => self.hairpin,
            StateKind::Multi => self.multi,
            StateKind::Pair => self.pair,
            StateKind::M2 => self.m2,
            StateKind::M => self.m,
            StateKind::Exterior => 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.hairpin + self.multi + self.pair + self.m2 + self.m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(entries: &[(usize, i32)]) -> BeamStep {
        let mut step = BeamStep::default();
        for &(i, score) in entries {
            step.update(i, score, Manner::Hairpin);
        }
        step
    }

    fn opening_positions(step: &BeamStep) -> Vec<usize> {
        step.iter().map(|c| c.i).collect()
    }

    #[test]
    fn update_keeps_strictly_better_scores_only() {
        let mut step = BeamStep::default();
        assert!(step.update(3, -100, Manner::Hairpin));
        assert!(!step.update(3, -100, Manner::Helix));
        assert_eq!(step.get(3).unwrap().manner, Manner::Hairpin);
        assert!(step.update(3, -50, Manner::Helix));
        assert_eq!(step.get(3), Some(State::new(-50, Manner::Helix)));
        assert_eq!(step.len(), 1);
    }

    #[test]
    fn prune_keeps_best_candidates_in_insertion_order() {
        let mut step = step(&[(0, -10), (1, -50), (2, -5), (3, -40), (4, -1)]);
        let discarded = step.prune(3, |_| 0);
        assert_eq!(discarded, 2);
        assert_eq!(opening_positions(&step), vec![0, 2, 4]);
        assert_eq!(step.get(1), None);
        assert_eq!(step.slot(4), Some(2));
    }

    #[test]
    fn prune_breaks_ties_toward_larger_opening_position() {
        let mut step = step(&[(5, -10), (2, -10), (7, -10), (1, -10)]);
        step.prune(2, |_| 0);
        assert_eq!(opening_positions(&step), vec![5, 7]);
    }

    #[test]
    fn prune_ranks_with_the_exterior_prefix() {
        let mut step = step(&[(1, -10), (4, -30)]);
        step.prune(1, |i| if i == 4 { 100 } else { 0 });
        assert_eq!(opening_positions(&step), vec![4]);
    }

    #[test]
    fn sorting_by_opening_keeps_lookups_valid() {
        let mut step = step(&[(7, -1), (2, -3), (5, -2)]);
        step.sort_by_opening();
        assert_eq!(opening_positions(&step), vec![2, 5, 7]);
        assert_eq!(step.slot(7), Some(2));
        assert_eq!(step.get(5), Some(State::new(-2, Manner::Hairpin)));
    }

    #[test]
    fn zero_or_oversized_beam_keeps_everything() {
        let mut unlimited = step(&[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(unlimited.prune(0, |_| 0), 0);
        assert_eq!(unlimited.len(), 3);

        let mut wide = step(&[(0, 1), (1, 2)]);
        assert_eq!(wide.prune(10, |_| 0), 0);
        assert_eq!(wide.len(), 2);
    }

    #[test]
    fn prune_is_deterministic() {
        let entries: Vec<(usize, i32)> = (0..50).map(|i| (i, -((i as i32 * 37) % 11))).collect();
        let mut a = step(&entries);
        let mut b = step(&entries);
        a.prune(7, |i| (i % 3) as i64);
        b.prune(7, |i| (i % 3) as i64);
        assert_eq!(opening_positions(&a), opening_positions(&b));
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn stats_accumulate_per_kind() {
        let mut stats = BeamStats::default();
        stats.record(StateKind::Pair, 4);
        stats.record(StateKind::Pair, 1);
        stats.record(StateKind::M, 2);
        stats.record(StateKind::Exterior, 9);
        assert_eq!(stats.get(StateKind::Pair), 5);
        assert_eq!(stats.total(), 7);
    }
}
