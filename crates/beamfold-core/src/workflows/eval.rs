use crate::core::energy::model::{EnergyModel, TwoLoopKind};
use crate::core::energy::pair::can_pair;
use crate::core::energy::shape::ShapeBonus;
use crate::core::energy::term::EnergyTerm;
use crate::core::sequence::{Nucleotide, Sequence};
use crate::core::structure::{PairTable, StructureError};
use crate::engine::config::FoldConfig;
use crate::engine::error::FoldError;
use std::borrow::Cow;
use tracing::{debug, instrument};

/// Free energy of a fixed structure, broken down by loop type.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub structure: String,
    /// Free energy in kcal/mol, identical to what a fold reports for the same structure.
    pub energy: f64,
    pub terms: EnergyTerm,
}

/// Scores `structure` on `sequence` under the same model and options a fold would use.
///
/// Every pair must be canonical, and unless `config.sharp_turn` is set every hairpin must
/// enclose at least the model's minimum loop.
#[instrument(skip_all, name = "eval_workflow", fields(length = sequence.len()))]
pub fn run(
    sequence: &Sequence,
    structure: &PairTable,
    model: &EnergyModel,
    config: &FoldConfig,
) -> Result<Evaluation, FoldError> {
    if structure.len() != sequence.len() {
        return Err(FoldError::LengthMismatch {
            sequence: sequence.len(),
            structure: structure.len(),
        });
    }
    if let Some(profile) = &config.shape {
        if profile.len() != sequence.len() {
            return Err(FoldError::ShapeLength {
                sequence: sequence.len(),
                profile: profile.len(),
            });
        }
    }
    let model = if model.dangles() == config.dangles {
        Cow::Borrowed(model)
    } else {
        Cow::Owned(model.with_dangles(config.dangles))
    };
    validate(sequence.bases(), structure, &model, config.sharp_turn)?;

    let shape = config
        .shape
        .as_ref()
        .map(|profile| profile.pseudo_energies(&config.shape_transform))
        .unwrap_or_default();
    let terms = decompose(sequence.bases(), structure, &model, config.sharp_turn, &shape);
    debug!(total = terms.total(), pairs = structure.pair_count(), "Evaluated structure.");

    Ok(Evaluation {
        structure: structure.to_dot_bracket(),
        energy: f64::from(terms.total()) / 100.0,
        terms,
    })
}

/// Parses both inputs and evaluates with the bundled Turner 2004 parameters.
pub fn eval(sequence: &str, structure: &str, config: &FoldConfig) -> Result<Evaluation, FoldError> {
    let sequence = Sequence::parse(sequence)?;
    let structure = PairTable::from_dot_bracket(structure)?;
    let model = EnergyModel::turner2004(config.dangles)?;
    run(&sequence, &structure, &model, config)
}

fn validate(
    seq: &[Nucleotide],
    structure: &PairTable,
    model: &EnergyModel,
    sharp_turn: bool,
) -> Result<(), StructureError> {
    let min_loop = model.min_hairpin_loop();
    for (i, j) in structure.pairs() {
        if !can_pair(seq[i], seq[j]) {
            return Err(StructureError::NonCanonicalPair { i, j });
        }
        if !sharp_turn && j - i - 1 < min_loop {
            return Err(StructureError::SharpTurn { i, j, min_loop });
        }
    }
    Ok(())
}

/// Outermost pairs strictly inside `(start, end)`, left to right.
fn branches(structure: &PairTable, start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut k = start;
    while k < end {
        match structure.partner(k) {
            Some(l) if l > k && l < end => {
                found.push((k, l));
                k = l + 1;
            }
            _ => k += 1,
        }
    }
    found
}

fn decompose(
    seq: &[Nucleotide],
    structure: &PairTable,
    model: &EnergyModel,
    sharp_turn: bool,
    shape: &ShapeBonus,
) -> EnergyTerm {
    let mut terms = EnergyTerm::default();

    let mut loops = branches(structure, 0, seq.len());
    for &(i, j) in &loops {
        terms += EnergyTerm::exterior(model.exterior_stem(seq, i, j));
    }

    while let Some((i, j)) = loops.pop() {
        let inner = branches(structure, i + 1, j);
        match inner.as_slice() {
            [] => terms += EnergyTerm::hairpin(model.hairpin(seq, i, j, sharp_turn)),
            &[(p, q)] => {
                let energy = model.single(seq, i, j, p, q);
                terms += match TwoLoopKind::classify(i, j, p, q) {
                    TwoLoopKind::Stack => {
                        EnergyTerm::stack(energy) + EnergyTerm::shape(shape.helix(i, p, q, j))
                    }
                    TwoLoopKind::Bulge => EnergyTerm::bulge(energy),
                    TwoLoopKind::Interior => EnergyTerm::interior(energy),
                };
            }
            stems => {
                let enclosed: usize = stems.iter().map(|&(p, q)| q - p + 1).sum();
                let unpaired = (j - i - 1) - enclosed;
                let energy = model.multi_closing(seq, i, j)
                    + stems
                        .iter()
                        .map(|&(p, q)| model.multi_stem(seq, p, q))
                        .sum::<i32>()
                    + model.multi_unpaired(unpaired);
                terms += EnergyTerm::multi(energy);
            }
        }
        loops.extend(inner);
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::model::DangleMode;
    use crate::core::energy::shape::ShapeProfile;
    use crate::engine::config::FoldConfigBuilder;

    fn default_eval(sequence: &str, structure: &str) -> Result<Evaluation, FoldError> {
        eval(sequence, structure, &FoldConfig::default())
    }

    #[test]
    fn hairpin_stem_breaks_down_by_loop() {
        let result = default_eval("GGGAAACCC", "(((...)))").unwrap();
        assert_eq!(result.terms.hairpin, 540);
        assert_eq!(result.terms.stack, -660);
        assert_eq!(result.terms.total(), -120);
        assert_eq!(result.energy, -1.2);
        assert_eq!(result.structure, "(((...)))");
    }

    #[test]
    fn open_structure_has_zero_energy() {
        let result = default_eval("GGGAAACCC", ".........").unwrap();
        assert_eq!(result.terms, EnergyTerm::default());
        assert_eq!(result.energy, 0.0);
    }

    #[test]
    fn length_mismatch_is_reported() {
        assert!(matches!(
            default_eval("GGGAAACCC", "(((..)))"),
            Err(FoldError::LengthMismatch {
                sequence: 9,
                structure: 8
            })
        ));
    }

    #[test]
    fn malformed_brackets_are_rejected() {
        assert!(matches!(
            default_eval("GGGAAACCC", "((....)))"),
            Err(FoldError::Structure(StructureError::UnmatchedClose { .. }))
        ));
    }

    #[test]
    fn non_canonical_pairs_are_rejected() {
        assert!(matches!(
            default_eval("GGGAAAACC", "(((...)))"),
            Err(FoldError::Structure(StructureError::NonCanonicalPair { i: 2, j: 6 }))
        ));
    }

    #[test]
    fn sharp_turns_depend_on_the_config() {
        assert!(matches!(
            default_eval("GGGAACCC", "(((..)))"),
            Err(FoldError::Structure(StructureError::SharpTurn {
                i: 2,
                j: 5,
                min_loop: 3
            }))
        ));
        let config = FoldConfigBuilder::new().sharp_turn(true).build().unwrap();
        assert!(eval("GGGAACCC", "(((..)))", &config).is_ok());
    }

    #[test]
    fn bulges_and_interior_loops_are_classified() {
        let model = EnergyModel::turner2004(DangleMode::Double).unwrap();

        let bulge = default_eval("GGAGGAAACCCC", "((.((...))))").unwrap();
        let seq = Sequence::parse("GGAGGAAACCCC").unwrap();
        assert_eq!(bulge.terms.bulge, model.single(seq.bases(), 1, 10, 3, 9));
        assert!(bulge.terms.bulge > 0);
        assert_eq!(bulge.terms.interior, 0);

        let interior = default_eval("GGAGGAAACCACC", "((.((...)).))").unwrap();
        let seq = Sequence::parse("GGAGGAAACCACC").unwrap();
        assert_eq!(interior.terms.interior, model.single(seq.bases(), 1, 11, 3, 9));
        assert_eq!(interior.terms.bulge, 0);
        assert_eq!(interior.terms.stack, 2 * -330);
    }

    #[test]
    fn multiloop_collects_closing_stems_and_unpaired_bases() {
        let sequence = "GGAGGAAACCAGGAAACCACC";
        let structure = "((.((...)).((...)).))";
        let result = default_eval(sequence, structure).unwrap();
        assert_ne!(result.terms.multi, 0);
        assert_eq!(result.terms.interior, 0);
        assert_eq!(
            result.terms.total(),
            result.terms.hairpin
                + result.terms.stack
                + result.terms.multi
                + result.terms.exterior
        );

        let seq = Sequence::parse(sequence).unwrap();
        let model = EnergyModel::turner2004(DangleMode::Double).unwrap();
        let bases = seq.bases();
        let expected = model.multi_closing(bases, 1, 19)
            + model.multi_stem(bases, 3, 9)
            + model.multi_stem(bases, 11, 17)
            + model.multi_unpaired(3);
        assert_eq!(result.terms.multi, expected);
    }

    #[test]
    fn dangle_mode_of_the_config_is_used() {
        let structure = ".(((...))).";
        let none = FoldConfigBuilder::new().dangles(DangleMode::None).build().unwrap();
        let double = FoldConfig::default();
        let a = eval("AGGGAAACCCA", structure, &none).unwrap();
        let b = eval("AGGGAAACCCA", structure, &double).unwrap();
        assert_eq!(a.terms.exterior, 0);
        assert_ne!(a.terms.exterior, b.terms.exterior);
    }

    #[test]
    fn shape_bonus_applies_to_stacks_only() {
        let profile = ShapeProfile::new(vec![Some(0.0); 9]);
        let config = FoldConfigBuilder::new().shape(profile).build().unwrap();
        let result = eval("GGGAAACCC", "(((...)))", &config).unwrap();
        assert_eq!(result.terms.shape, -480);
        assert_eq!(result.terms.stack, -660);
        assert_eq!(result.terms.hairpin, 540);
    }
}
