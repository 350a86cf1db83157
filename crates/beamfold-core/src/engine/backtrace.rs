use super::error::FoldError;
use super::lattice::Lattice;
use super::outside::OutsideTable;
use super::state::{Manner, NodeRef, StateKind};

/// Collects the pairs of the best inside derivation of `start` into `pairs`.
pub(crate) fn inside_pairs(
    lattice: &Lattice,
    start: NodeRef,
    pairs: &mut Vec<(usize, usize)>,
) -> Result<(), FoldError> {
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        let NodeRef { kind, i, j } = node;
        let state = lattice
            .state(node)
            .ok_or_else(|| FoldError::Internal(format!("backtrace reached missing state {:?}", node)))?;

        match (kind, state.manner) {
            (StateKind::Exterior, Manner::CPlusU) => {
                if j > 0 {
                    stack.push(NodeRef::exterior(j - 1));
                }
            }
            (StateKind::Exterior, Manner::CPlusP { split }) => match split {
                Some(k) => {
                    stack.push(NodeRef::exterior(k));
                    stack.push(NodeRef::pair(k + 1, j));
                }
                None => stack.push(NodeRef::pair(0, j)),
            },
            (StateKind::Pair, manner) => {
                pairs.push((i, j));
                match manner {
                    Manner::Hairpin => {}
                    Manner::Helix => stack.push(NodeRef::pair(i + 1, j - 1)),
                    Manner::SingleBranch { l1, l2 } => stack.push(NodeRef::pair(i + l1, j - l2)),
                    Manner::PFromMulti => stack.push(NodeRef::new(StateKind::Multi, i, j)),
                    other => return Err(unexpected(node, other)),
                }
            }
            (StateKind::Multi, Manner::MultiFromM2 { l1, l2 })
            | (StateKind::Multi, Manner::MultiPlusU { l1, l2 }) => {
                stack.push(NodeRef::new(StateKind::M2, i + l1, j - l2));
            }
            (StateKind::M2, Manner::M2FromMP { split }) => {
                stack.push(NodeRef::new(StateKind::M, i, split));
                stack.push(NodeRef::pair(split + 1, j));
            }
            (StateKind::M, Manner::MFromM2) => stack.push(NodeRef::new(StateKind::M2, i, j)),
            (StateKind::M, Manner::MFromP) => stack.push(NodeRef::pair(i, j)),
            (StateKind::M, Manner::MPlusU) => stack.push(NodeRef::new(StateKind::M, i, j - 1)),
            (_, manner) => return Err(unexpected(node, manner)),
        }
    }
    Ok(())
}

/// Collects the pairs completing `start` into a full structure, following the best
/// outside edges up to the root.
pub(crate) fn outside_pairs(
    lattice: &Lattice,
    outside: &OutsideTable,
    start: NodeRef,
    pairs: &mut Vec<(usize, usize)>,
) -> Result<(), FoldError> {
    let mut node = start;
    loop {
        let entry = outside
            .get(lattice, node)
            .ok_or_else(|| FoldError::Internal(format!("no outside score for {:?}", node)))?;
        let Some(edge) = entry.edge else {
            return Ok(());
        };
        if let Some(sibling) = edge.sibling {
            inside_pairs(lattice, sibling, pairs)?;
        }
        if edge.target.kind == StateKind::Pair {
            pairs.push((edge.target.i, edge.target.j));
        }
        node = edge.target;
    }
}

fn unexpected(node: NodeRef, manner: Manner) -> FoldError {
    FoldError::Internal(format!(
        "state {:?} cannot be derived by {:?}",
        node, manner
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::model::EnergyModel;
    use crate::core::sequence::Sequence;
    use crate::engine::config::FoldConfig;
    use crate::engine::context::FoldContext;
    use crate::engine::lattice::inside;
    use crate::engine::outside::outside;
    use crate::engine::progress::ProgressReporter;

    fn fold_pairs(raw: &str) -> (Lattice, Vec<(usize, usize)>) {
        let seq = Sequence::parse(raw).unwrap();
        let config = FoldConfig::default();
        let model = EnergyModel::turner2004(config.dangles).unwrap();
        let context = FoldContext::new(seq.bases(), &model, &config);
        let lattice = inside(&context, &ProgressReporter::new());
        let mut pairs = Vec::new();
        inside_pairs(&lattice, NodeRef::exterior(seq.len() - 1), &mut pairs).unwrap();
        pairs.sort_unstable();
        (lattice, pairs)
    }

    #[test]
    fn backtrace_recovers_hairpin_stem() {
        let (_, pairs) = fold_pairs("GGGAAACCC");
        assert_eq!(pairs, vec![(0, 8), (1, 7), (2, 6)]);
    }

    #[test]
    fn backtrace_of_unpaired_sequence_is_empty() {
        let (_, pairs) = fold_pairs("AAAAAAA");
        assert!(pairs.is_empty());
    }

    #[test]
    fn missing_state_is_an_internal_error() {
        let (lattice, _) = fold_pairs("GGGAAACCC");
        let mut pairs = Vec::new();
        let result = inside_pairs(&lattice, NodeRef::pair(3, 4), &mut pairs);
        assert!(matches!(result, Err(FoldError::Internal(_))));
    }

    #[test]
    fn inner_pair_completes_to_the_optimal_structure() {
        let seq = Sequence::parse("GGGAAACCC").unwrap();
        let config = FoldConfig::default();
        let model = EnergyModel::turner2004(config.dangles).unwrap();
        let context = FoldContext::new(seq.bases(), &model, &config);
        let lattice = inside(&context, &ProgressReporter::new());
        let table = outside(&context, &lattice);

        let mut pairs = Vec::new();
        inside_pairs(&lattice, NodeRef::pair(1, 7), &mut pairs).unwrap();
        outside_pairs(&lattice, &table, NodeRef::pair(1, 7), &mut pairs).unwrap();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 8), (1, 7), (2, 6)]);
    }
}
