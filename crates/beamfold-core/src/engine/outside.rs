//! Best-completion ("outside") scores over the retained lattice.
//!
//! For every retained state `S`, `outside(S)` is the best score of the rest of a complete
//! structure that uses `S`, so `inside(S) + outside(S)` is the best full-structure score
//! through `S`. Only transitions between retained states are replayed, which keeps every
//! completion reconstructible from the lattice.
//!
//! Each transition is relaxed exactly once, when the sweep reaches the source at the latest
//! position. Positions are visited from right to left and, within a position, kinds in the
//! order exterior, M, M2, pair, multi; a state's outside score is therefore final before any
//! transition that reads it is relaxed.

use super::context::FoldContext;
use super::lattice::Lattice;
use super::state::{NodeRef, StateKind};

/// How a state's best completion continues: into `target`, together with the inside
/// structure of `sibling` when the transition combines two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OutsideEdge {
    pub target: NodeRef,
    pub sibling: Option<NodeRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Outside {
    pub score: i32,
    /// `None` only for the complete structure itself.
    pub edge: Option<OutsideEdge>,
}

/// Outside scores aligned with the beam slots of a [`Lattice`].
pub(crate) struct OutsideTable {
    multi: Vec<Vec<Option<Outside>>>,
    pair: Vec<Vec<Option<Outside>>>,
    m2: Vec<Vec<Option<Outside>>>,
    m: Vec<Vec<Option<Outside>>>,
    exterior: Vec<Option<Outside>>,
}

impl OutsideTable {
    fn new(lattice: &Lattice) -> Self {
        let slots = |kind: StateKind| -> Vec<Vec<Option<Outside>>> {
            lattice
                .steps(kind)
                .iter()
                .map(|step| vec![None; step.len()])
                .collect()
        };
        Self {
            multi: slots(StateKind::Multi),
            pair: slots(StateKind::Pair),
            m2: slots(StateKind::M2),
            m: slots(StateKind::M),
            exterior: vec![None; lattice.len()],
        }
    }

    fn entry_mut(&mut self, lattice: &Lattice, node: NodeRef) -> Option<&mut Option<Outside>> {
        let table = match node.kind {
            StateKind::Exterior => return self.exterior.get_mut(node.j),
            StateKind::Multi => &mut self.multi,
            StateKind::Pair => &mut self.pair,
            StateKind::M2 => &mut self.m2,
            StateKind::M => &mut self.m,
            StateKind::Hairpin => return None,
        };
        let slot = lattice.steps(node.kind).get(node.j)?.slot(node.i)?;
        table.get_mut(node.j)?.get_mut(slot)
    }

    pub fn get(&self, lattice: &Lattice, node: NodeRef) -> Option<Outside> {
        let table = match node.kind {
            StateKind::Exterior => return self.exterior.get(node.j).copied().flatten(),
            StateKind::Multi => &self.multi,
            StateKind::Pair => &self.pair,
            StateKind::M2 => &self.m2,
            StateKind::M => &self.m,
            StateKind::Hairpin => return None,
        };
        let slot = lattice.steps(node.kind).get(node.j)?.slot(node.i)?;
        table.get(node.j)?.get(slot).copied().flatten()
    }

    #[inline]
    pub fn score(&self, lattice: &Lattice, node: NodeRef) -> Option<i32> {
        self.get(lattice, node).map(|entry| entry.score)
    }

    /// Offers `score` as the outside score of `node`, reached through `edge`.
    fn relax(&mut self, lattice: &Lattice, node: NodeRef, score: i32, edge: OutsideEdge) {
        if let Some(entry) = self.entry_mut(lattice, node) {
            match entry {
                Some(current) if current.score >= score => {}
                _ => {
                    *entry = Some(Outside {
                        score,
                        edge: Some(edge),
                    })
                }
            }
        }
    }
}

/// Computes outside scores for every retained state, rooted at the complete structure.
pub(crate) fn outside(context: &FoldContext, lattice: &Lattice) -> OutsideTable {
    let mut table = OutsideTable::new(lattice);
    let n = lattice.len();
    let Some(last) = n.checked_sub(1) else {
        return table;
    };
    table.exterior[last] = Some(Outside {
        score: 0,
        edge: None,
    });

    for j in (0..n).rev() {
        exterior_edges(lattice, &mut table, j);
        m_edges(context, lattice, &mut table, j);
        m2_edges(context, lattice, &mut table, j);
        pair_edges(context, lattice, &mut table, j);
        multi_edges(context, lattice, &mut table, j);
    }
    table
}

fn exterior_edges(lattice: &Lattice, table: &mut OutsideTable, j: usize) {
    let (source, target) = (NodeRef::exterior(j), NodeRef::exterior(j + 1));
    if lattice.state(source).is_none() {
        return;
    }
    if let Some(out) = table.score(lattice, target) {
        let edge = OutsideEdge {
            target,
            sibling: None,
        };
        table.relax(lattice, source, out, edge);
    }
}

fn m_edges(context: &FoldContext, lattice: &Lattice, table: &mut OutsideTable, j: usize) {
    if j + 1 >= lattice.len() {
        return;
    }
    let unpaired = context.model.multi_unpaired(1);
    for candidate in &lattice.steps(StateKind::M)[j] {
        let source = NodeRef::new(StateKind::M, candidate.i, j);
        let target = NodeRef::new(StateKind::M, candidate.i, j + 1);
        if let Some(out) = table.score(lattice, target) {
            let edge = OutsideEdge {
                target,
                sibling: None,
            };
            table.relax(lattice, source, out - unpaired, edge);
        }
    }
}

fn m2_edges(context: &FoldContext, lattice: &Lattice, table: &mut OutsideTable, j: usize) {
    for candidate in &lattice.steps(StateKind::M2)[j] {
        let i = candidate.i;
        let source = NodeRef::new(StateKind::M2, i, j);

        let target = NodeRef::new(StateKind::M, i, j);
        if let Some(out) = table.score(lattice, target) {
            let edge = OutsideEdge {
                target,
                sibling: None,
            };
            table.relax(lattice, source, out, edge);
        }

        for (p, q, unpaired) in context.multi_openings(i, j) {
            let target = NodeRef::new(StateKind::Multi, p, q);
            if let Some(out) = table.score(lattice, target) {
                let edge = OutsideEdge {
                    target,
                    sibling: None,
                };
                table.relax(lattice, source, out + unpaired, edge);
            }
        }
    }
}

fn pair_edges(context: &FoldContext, lattice: &Lattice, table: &mut OutsideTable, j: usize) {
    let (seq, model) = (context.seq, context.model);
    let n = lattice.len();

    for candidate in &lattice.steps(StateKind::Pair)[j] {
        let (i, inside) = (candidate.i, candidate.state.score);
        let source = NodeRef::pair(i, j);

        for (p, q, loop_score) in context.outer_pairs(i, j) {
            let target = NodeRef::pair(p, q);
            if let Some(out) = table.score(lattice, target) {
                let edge = OutsideEdge {
                    target,
                    sibling: None,
                };
                table.relax(lattice, source, out + loop_score, edge);
            }
        }

        if i > 0 && j + 1 < n {
            let branch = -model.multi_stem(seq, i, j);

            let target = NodeRef::new(StateKind::M, i, j);
            if let Some(out) = table.score(lattice, target) {
                let edge = OutsideEdge {
                    target,
                    sibling: None,
                };
                table.relax(lattice, source, out + branch, edge);
            }

            let split = i - 1;
            for left in &lattice.steps(StateKind::M)[split] {
                let target = NodeRef::new(StateKind::M2, left.i, j);
                let Some(out) = table.score(lattice, target) else {
                    continue;
                };
                let left_node = NodeRef::new(StateKind::M, left.i, split);
                let through = out + branch;
                table.relax(
                    lattice,
                    source,
                    through + left.state.score,
                    OutsideEdge {
                        target,
                        sibling: Some(left_node),
                    },
                );
                table.relax(
                    lattice,
                    left_node,
                    through + inside,
                    OutsideEdge {
                        target,
                        sibling: Some(source),
                    },
                );
            }
        }

        let target = NodeRef::exterior(j);
        let Some(out) = table.score(lattice, target) else {
            continue;
        };
        let stem = -model.exterior_stem(seq, i, j);
        if i == 0 {
            let edge = OutsideEdge {
                target,
                sibling: None,
            };
            table.relax(lattice, source, out + stem, edge);
        } else if let Some(prefix) = lattice.exterior(i - 1) {
            let prefix_node = NodeRef::exterior(i - 1);
            table.relax(
                lattice,
                source,
                out + stem + prefix.score,
                OutsideEdge {
                    target,
                    sibling: Some(prefix_node),
                },
            );
            table.relax(
                lattice,
                prefix_node,
                out + stem + inside,
                OutsideEdge {
                    target,
                    sibling: Some(source),
                },
            );
        }
    }
}

fn multi_edges(context: &FoldContext, lattice: &Lattice, table: &mut OutsideTable, j: usize) {
    let (seq, model) = (context.seq, context.model);

    for candidate in &lattice.steps(StateKind::Multi)[j] {
        let i = candidate.i;
        let source = NodeRef::new(StateKind::Multi, i, j);

        let target = NodeRef::pair(i, j);
        if let Some(out) = table.score(lattice, target) {
            let edge = OutsideEdge {
                target,
                sibling: None,
            };
            table.relax(lattice, source, out - model.multi_closing(seq, i, j), edge);
        }

        if let Some(q) = context.next_pair(i, j) {
            let target = NodeRef::new(StateKind::Multi, i, q);
            if let Some(out) = table.score(lattice, target) {
                let edge = OutsideEdge {
                    target,
                    sibling: None,
                };
                table.relax(lattice, source, out - model.multi_unpaired(q - j), edge);
            }
        }
    }
}
