use super::beam::{BeamStats, BeamStep};
use super::config::FoldConfig;
use super::state::{State, StateKind};
use crate::core::energy::model::EnergyModel;
use crate::core::energy::pair::can_pair;
use crate::core::energy::shape::ShapeBonus;
use crate::core::sequence::Nucleotide;
use std::iter;
use tracing::trace;

/// Ranking prefix used for states that open right after a position with no exterior state.
const MISSING_PREFIX: i64 = i32::MIN as i64;

/// For every nucleotide and position `j`, the first position after `j` it can pair with.
#[derive(Debug, Clone)]
pub(crate) struct PairLookahead {
    next: [Vec<Option<usize>>; 5],
}

impl PairLookahead {
    pub fn new(seq: &[Nucleotide]) -> Self {
        let next = Nucleotide::ALL.map(|nuc| {
            let mut table = vec![None; seq.len()];
            let mut next = None;
            for j in (0..seq.len()).rev() {
                table[j] = next;
                if can_pair(nuc, seq[j]) {
                    next = Some(j);
                }
            }
            table
        });
        Self { next }
    }

    #[inline]
    pub fn after(&self, nuc: Nucleotide, j: usize) -> Option<usize> {
        self.next[nuc.ordinal()].get(j).copied().flatten()
    }
}

/// Everything the inside and outside sweeps share: the sequence, the scoring model and the
/// fold options that shape the transitions.
pub(crate) struct FoldContext<'a> {
    pub seq: &'a [Nucleotide],
    pub model: &'a EnergyModel,
    pub shape: ShapeBonus,
    pub lookahead: PairLookahead,
    pub beam_size: usize,
    pub sharp_turn: bool,
}

impl<'a> FoldContext<'a> {
    pub fn new(seq: &'a [Nucleotide], model: &'a EnergyModel, config: &FoldConfig) -> Self {
        let shape = config
            .shape
            .as_ref()
            .map(|profile| profile.pseudo_energies(&config.shape_transform))
            .unwrap_or_default();
        Self {
            seq,
            model,
            shape,
            lookahead: PairLookahead::new(seq),
            beam_size: config.beam_size,
            sharp_turn: config.sharp_turn,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[inline]
    pub fn next_pair(&self, i: usize, j: usize) -> Option<usize> {
        self.lookahead.after(self.seq[i], j)
    }

    /// First partner for a hairpin opened at `j` that leaves enough unpaired bases.
    pub fn first_hairpin_partner(&self, j: usize) -> Option<usize> {
        let min_loop = self.model.min_hairpin_loop();
        let mut next = self.next_pair(j, j);
        if self.sharp_turn {
            return next;
        }
        while let Some(q) = next {
            if q - j - 1 >= min_loop {
                break;
            }
            next = self.next_pair(j, q);
        }
        next
    }

    /// Outer pairs `(p, q)` reachable from `(i, j)` through a stack, bulge or interior loop
    /// within the loop-size limit, with the loop score (negated energy, SHAPE included).
    pub fn outer_pairs(
        &self,
        i: usize,
        j: usize,
    ) -> impl Iterator<Item = (usize, usize, i32)> + '_ {
        let max_loop = self.model.max_loop();
        let lower = if j + 1 < self.len() {
            i.saturating_sub(max_loop)
        } else {
            i
        };
        (lower..i).rev().flat_map(move |p| {
            iter::successors(self.next_pair(p, j), move |&q| self.next_pair(p, q))
                .take_while(move |&q| (i - p) + (q - j) - 2 <= max_loop)
                .map(move |q| (p, q, self.single_score(p, q, i, j)))
        })
    }

    fn single_score(&self, p: usize, q: usize, i: usize, j: usize) -> i32 {
        let score = -self.model.single(self.seq, p, q, i, j);
        if p + 1 == i && q == j + 1 {
            score - self.shape.helix(p, i, j, q)
        } else {
            score
        }
    }

    /// Multiloop openings `(p, q)` around branches spanning `[i, j]`, with the score of
    /// the unpaired bases on both sides.
    pub fn multi_openings(
        &self,
        i: usize,
        j: usize,
    ) -> impl Iterator<Item = (usize, usize, i32)> + '_ {
        let max_loop = self.model.max_loop();
        (i.saturating_sub(max_loop)..i).rev().filter_map(move |p| {
            let q = self.next_pair(p, j)?;
            let unpaired = (i - p - 1) + (q - j - 1);
            Some((p, q, -self.model.multi_unpaired(unpaired)))
        })
    }

    /// Ranking prefix of a state opening at `i`: the best exterior score over `[0, i - 1]`.
    #[inline]
    pub fn prefix(exterior: &[Option<State>], i: usize) -> i64 {
        if i == 0 {
            return 0;
        }
        exterior[i - 1]
            .map(|state| i64::from(state.score))
            .unwrap_or(MISSING_PREFIX)
    }

    pub fn prune(
        &self,
        step: &mut BeamStep,
        kind: StateKind,
        exterior: &[Option<State>],
        stats: &mut BeamStats,
    ) {
        let before = step.len();
        let discarded = step.prune(self.beam_size, |i| Self::prefix(exterior, i));
        if discarded > 0 {
            trace!(
                kind = kind.name(),
                before,
                kept = step.len(),
                discarded,
                "Pruned beam."
            );
        }
        stats.record(kind, discarded);
    }
}
