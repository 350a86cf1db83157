use super::beam::{BeamStats, BeamStep};
use super::context::FoldContext;
use super::progress::{Progress, ProgressReporter};
use super::state::{Manner, NodeRef, State, StateKind};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::mem;

/// All states retained by the inside sweep, indexed by end position.
#[derive(Debug, Clone)]
pub struct Lattice {
    hairpin: Vec<BeamStep>,
    multi: Vec<BeamStep>,
    pair: Vec<BeamStep>,
    m2: Vec<BeamStep>,
    m: Vec<BeamStep>,
    /// Pruned `M` beams by descending ranking key, for the cube-pruned `M2` join.
    m_ranked: Vec<Vec<Ranked>>,
    exterior: Vec<Option<State>>,
    stats: BeamStats,
}

/// An `M` state in ranking order.
#[derive(Debug, Clone, Copy)]
struct Ranked {
    key: i64,
    i: usize,
    score: i32,
}

/// A retained `P(split + 1, j)` that can close a two-branch segment, with its multiloop
/// branch score.
#[derive(Debug, Clone, Copy)]
struct Branch {
    split: usize,
    score: i32,
}

/// Frontier of one branch in the `M2` join: the branch combined with the `rank`-th best
/// `M` state ending at its split.
#[derive(Debug, PartialEq, Eq)]
struct Corner {
    key: i64,
    branch: usize,
    rank: usize,
}

impl Ord for Corner {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| other.branch.cmp(&self.branch))
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

impl PartialOrd for Corner {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Lattice {
    fn new(length: usize) -> Self {
        Self {
            hairpin: vec![BeamStep::default(); length],
            multi: vec![BeamStep::default(); length],
            pair: vec![BeamStep::default(); length],
            m2: vec![BeamStep::default(); length],
            m: vec![BeamStep::default(); length],
            m_ranked: vec![Vec::new(); length],
            exterior: vec![None; length],
            stats: BeamStats::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.exterior.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.exterior.is_empty()
    }

    /// The beams of one kind, one per end position. Empty for the exterior kind.
    pub fn steps(&self, kind: StateKind) -> &[BeamStep] {
        match kind {
            StateKind::Hairpin => &self.hairpin,
            StateKind::Multi => &self.multi,
            StateKind::Pair => &self.pair,
            StateKind::M2 => &self.m2,
            StateKind::M => &self.m,
            StateKind::Exterior => &[],
        }
    }

    pub fn state(&self, node: NodeRef) -> Option<State> {
        match node.kind {
            StateKind::Exterior => self.exterior(node.j),
            kind => self.steps(kind).get(node.j)?.get(node.i),
        }
    }

    #[inline]
    pub fn exterior(&self, j: usize) -> Option<State> {
        self.exterior.get(j).copied().flatten()
    }

    /// Score of the complete structure.
    pub fn best(&self) -> Option<State> {
        self.exterior.last().copied().flatten()
    }

    pub fn stats(&self) -> &BeamStats {
        &self.stats
    }

    pub fn retained(&self, kind: StateKind) -> usize {
        match kind {
            StateKind::Exterior => self.exterior.iter().flatten().count(),
            kind => self.steps(kind).iter().map(BeamStep::len).sum(),
        }
    }
}

fn update_exterior(slot: &mut Option<State>, score: i32, manner: Manner) {
    match slot {
        Some(current) if current.score >= score => {}
        _ => *slot = Some(State::new(score, manner)),
    }
}

/// Runs the left-to-right beam-pruned sweep.
///
/// At each position `j` the beams ending at `j` are pruned and expanded in a fixed order:
/// hairpin candidates, multiloop closings, pairs, two-branch and one-branch multiloop
/// segments, and finally the exterior prefix. Every expansion writes either to position `j`
/// of a kind processed later in that order or to a later position, so each beam is complete
/// before it is pruned.
pub(crate) fn inside(context: &FoldContext, reporter: &ProgressReporter) -> Lattice {
    let n = context.len();
    let mut lattice = Lattice::new(n);
    if n == 0 {
        return lattice;
    }
    lattice.exterior[0] = Some(State::new(0, Manner::CPlusU));

    reporter.report(Progress::TaskStart {
        total_steps: n as u64,
    });
    for j in 0..n {
        hairpin_step(context, &mut lattice, j);
        multi_step(context, &mut lattice, j);
        pair_step(context, &mut lattice, j);
        m2_step(context, &mut lattice, j);
        m_step(context, &mut lattice, j);
        exterior_step(context, &mut lattice, j);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    lattice
}

fn hairpin_step(context: &FoldContext, lattice: &mut Lattice, j: usize) {
    let (seq, model) = (context.seq, context.model);

    if let Some(q) = context.first_hairpin_partner(j) {
        let score = -model.hairpin(seq, j, q, context.sharp_turn);
        lattice.hairpin[q].update(j, score, Manner::Hairpin);
    }

    let mut step = mem::take(&mut lattice.hairpin[j]);
    context.prune(
        &mut step,
        StateKind::Hairpin,
        &lattice.exterior,
        &mut lattice.stats,
    );
    for candidate in &step {
        let i = candidate.i;
        if let Some(q) = context.next_pair(i, j) {
            let score = -model.hairpin(seq, i, q, context.sharp_turn);
            lattice.hairpin[q].update(i, score, Manner::Hairpin);
        }
        lattice.pair[j].update(i, candidate.state.score, Manner::Hairpin);
    }
    lattice.hairpin[j] = step;
}

fn multi_step(context: &FoldContext, lattice: &mut Lattice, j: usize) {
    let (seq, model) = (context.seq, context.model);

    let mut step = mem::take(&mut lattice.multi[j]);
    context.prune(
        &mut step,
        StateKind::Multi,
        &lattice.exterior,
        &mut lattice.stats,
    );
    for candidate in &step {
        let (i, score) = (candidate.i, candidate.state.score);
        if let (Some(q), Some((l1, l2))) =
            (context.next_pair(i, j), candidate.state.manner.loop_lengths())
        {
            lattice.multi[q].update(
                i,
                score - model.multi_unpaired(q - j),
                Manner::MultiPlusU {
                    l1,
                    l2: l2 + q - j,
                },
            );
        }
        lattice.pair[j].update(
            i,
            score - model.multi_closing(seq, i, j),
            Manner::PFromMulti,
        );
    }
    lattice.multi[j] = step;
}

fn pair_step(context: &FoldContext, lattice: &mut Lattice, j: usize) {
    let (seq, model) = (context.seq, context.model);
    let n = context.len();

    let mut step = mem::take(&mut lattice.pair[j]);
    context.prune(
        &mut step,
        StateKind::Pair,
        &lattice.exterior,
        &mut lattice.stats,
    );
    let mut branches = Vec::new();
    for candidate in &step {
        let (i, score) = (candidate.i, candidate.state.score);

        for (p, q, loop_score) in context.outer_pairs(i, j) {
            let manner = if p + 1 == i && q == j + 1 {
                Manner::Helix
            } else {
                Manner::SingleBranch {
                    l1: i - p,
                    l2: q - j,
                }
            };
            lattice.pair[q].update(p, score + loop_score, manner);
        }

        if i > 0 && j + 1 < n {
            let branch = score - model.multi_stem(seq, i, j);
            lattice.m[j].update(i, branch, Manner::MFromP);
            if !lattice.m[i - 1].is_empty() {
                branches.push(Branch {
                    split: i - 1,
                    score: branch,
                });
            }
        }

        let stem = score - model.exterior_stem(seq, i, j);
        if i == 0 {
            update_exterior(
                &mut lattice.exterior[j],
                stem,
                Manner::CPlusP { split: None },
            );
        } else if let Some(prefix) = lattice.exterior[i - 1] {
            update_exterior(
                &mut lattice.exterior[j],
                prefix.score + stem,
                Manner::CPlusP {
                    split: Some(i - 1),
                },
            );
        }
    }
    lattice.pair[j] = step;

    if context.beam_size == 0 {
        join_all(lattice, j, &branches);
    } else {
        join_cube(lattice, j, &branches, context.beam_size);
    }
    lattice.m2[j].sort_by_opening();
}

/// `M2 = M + P` over every retained combination. On equal scores the earliest branch wins.
fn join_all(lattice: &mut Lattice, j: usize, branches: &[Branch]) {
    for branch in branches {
        for left in &lattice.m[branch.split] {
            lattice.m2[j].update(
                left.i,
                left.state.score + branch.score,
                Manner::M2FromMP {
                    split: branch.split,
                },
            );
        }
    }
}

/// `M2 = M + P` by cube pruning.
///
/// Each branch walks the `M` states at its split in ranking order, and a heap merges the
/// walks so combinations come out by descending `prefix + score`, the key the `M2` beam is
/// pruned by, earlier branches first on equal keys. The first combination reaching an
/// opening position is its best, so later ones for the same position are skipped. The join
/// stops once `beam_size` positions are filled and the next key falls below the last one
/// filled, which leaves the pruned beam identical to the full join.
fn join_cube(lattice: &mut Lattice, j: usize, branches: &[Branch], beam_size: usize) {
    let ranked = &lattice.m_ranked;
    let m2 = &mut lattice.m2[j];

    let mut heap: BinaryHeap<Corner> = branches
        .iter()
        .enumerate()
        .filter_map(|(index, branch)| {
            let best = ranked[branch.split].first()?;
            Some(Corner {
                key: best.key + i64::from(branch.score),
                branch: index,
                rank: 0,
            })
        })
        .collect();

    let mut filled = 0;
    let mut last_key = i64::MAX;
    while let Some(corner) = heap.pop() {
        if filled >= beam_size && corner.key < last_key {
            break;
        }
        let branch = branches[corner.branch];
        let walk = &ranked[branch.split];
        let left = walk[corner.rank];
        if m2.get(left.i).is_none() {
            m2.update(
                left.i,
                left.score + branch.score,
                Manner::M2FromMP {
                    split: branch.split,
                },
            );
            filled += 1;
            last_key = corner.key;
        }

        let next = walk
            .iter()
            .enumerate()
            .skip(corner.rank + 1)
            .find(|(_, candidate)| m2.get(candidate.i).is_none());
        if let Some((rank, candidate)) = next {
            heap.push(Corner {
                key: candidate.key + i64::from(branch.score),
                branch: corner.branch,
                rank,
            });
        }
    }
}

fn m2_step(context: &FoldContext, lattice: &mut Lattice, j: usize) {
    let mut step = mem::take(&mut lattice.m2[j]);
    context.prune(&mut step, StateKind::M2, &lattice.exterior, &mut lattice.stats);
    for candidate in &step {
        let (i, score) = (candidate.i, candidate.state.score);
        for (p, q, unpaired) in context.multi_openings(i, j) {
            lattice.multi[q].update(
                p,
                score + unpaired,
                Manner::MultiFromM2 {
                    l1: i - p,
                    l2: q - j,
                },
            );
        }
        lattice.m[j].update(i, score, Manner::MFromM2);
    }
    lattice.m2[j] = step;
}

fn m_step(context: &FoldContext, lattice: &mut Lattice, j: usize) {
    let mut step = mem::take(&mut lattice.m[j]);
    context.prune(&mut step, StateKind::M, &lattice.exterior, &mut lattice.stats);
    if j + 1 < context.len() {
        let unpaired = context.model.multi_unpaired(1);
        for candidate in &step {
            lattice.m[j + 1].update(
                candidate.i,
                candidate.state.score - unpaired,
                Manner::MPlusU,
            );
        }
    }
    if context.beam_size > 0 && !step.is_empty() {
        let mut ranked: Vec<Ranked> = step
            .iter()
            .map(|c| Ranked {
                key: FoldContext::prefix(&lattice.exterior, c.i) + i64::from(c.state.score),
                i: c.i,
                score: c.state.score,
            })
            .collect();
        ranked.sort_by(|a, b| b.key.cmp(&a.key));
        lattice.m_ranked[j] = ranked;
    }
    lattice.m[j] = step;
}

fn exterior_step(context: &FoldContext, lattice: &mut Lattice, j: usize) {
    if j + 1 >= context.len() {
        return;
    }
    if let Some(current) = lattice.exterior[j] {
        update_exterior(
            &mut lattice.exterior[j + 1],
            current.score,
            Manner::CPlusU,
        );
    }
}
