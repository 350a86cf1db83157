use crate::core::energy::model::EnergyModel;
use crate::core::sequence::Sequence;
use crate::core::structure::PairTable;
use crate::engine::backtrace::{inside_pairs, outside_pairs};
use crate::engine::beam::BeamStats;
use crate::engine::config::FoldConfig;
use crate::engine::context::FoldContext;
use crate::engine::error::FoldError;
use crate::engine::lattice::{self, Lattice};
use crate::engine::outside;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{NodeRef, StateKind};
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// A structure within the suboptimal window, with its free energy in kcal/mol.
#[derive(Debug, Clone, PartialEq)]
pub struct Suboptimal {
    pub structure: String,
    pub energy: f64,
}

/// Beam bookkeeping of one fold. Useful for tuning the beam size; never affects the result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FoldDiagnostics {
    pub discarded: BeamStats,
    pub retained_pairs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    /// Dot-bracket structure, one symbol per nucleotide.
    pub structure: String,
    /// Free energy in kcal/mol.
    pub energy: f64,
    /// Distinct structures within the configured window, best first and starting with
    /// `structure`. Empty unless suboptimals were requested.
    pub suboptimals: Vec<Suboptimal>,
    pub diagnostics: FoldDiagnostics,
}

/// Converts an internal score (negated dcal/mol) to kcal/mol.
#[inline]
pub fn score_to_energy(score: i32) -> f64 {
    f64::from(score.saturating_neg()) / 100.0
}

/// Folds `sequence` under `model`.
///
/// The fold is scored with the dangle mode of `config`, which takes precedence over the
/// mode `model` was built with.
#[instrument(skip_all, name = "fold_workflow", fields(length = sequence.len()))]
pub fn run(
    sequence: &Sequence,
    model: &EnergyModel,
    config: &FoldConfig,
    reporter: &ProgressReporter,
) -> Result<FoldResult, FoldError> {
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
    info!(
        beam_size = config.beam_size,
        dangles = %config.dangles,
        sharp_turn = config.sharp_turn,
        shape = config.shape.is_some(),
        "Starting fold."
    );

    let context = FoldContext::new(sequence.bases(), &model, config);

    // === Phase 1: Inside sweep ===
    let lattice = reporter.phase("Inside Sweep", || lattice::inside(&context, reporter));
    log_lattice(&lattice, config.verbose);

    // === Phase 2: Backtrace of the optimum ===
    let best = lattice
        .best()
        .ok_or_else(|| FoldError::Internal("no exterior state at the last position".into()))?;
    let root = NodeRef::exterior(sequence.len() - 1);
    let structure = reporter.phase("Backtrace", || {
        let mut pairs = Vec::new();
        inside_pairs(&lattice, root, &mut pairs)?;
        to_dot_bracket(sequence.len(), pairs)
    })?;
    let energy = score_to_energy(best.score);

    // === Phase 3: Suboptimal structures (optional) ===
    let suboptimals = if config.suboptimals_enabled() {
        reporter.phase("Suboptimal Structures", || {
            suboptimal_structures(&context, &lattice, best.score, &structure, config)
        })?
    } else {
        Vec::new()
    };
    if !suboptimals.is_empty() {
        reporter.report(Progress::Message(format!(
            "Found {} structure(s) within {:.2} kcal/mol.",
            suboptimals.len(),
            config.energy_delta
        )));
    }

    info!(energy, pairs = structure.matches('(').count(), "Fold complete.");
    Ok(FoldResult {
        structure,
        energy,
        suboptimals,
        diagnostics: FoldDiagnostics {
            discarded: *lattice.stats(),
            retained_pairs: lattice.retained(StateKind::Pair),
        },
    })
}

/// Parses `sequence` and folds it with the bundled Turner 2004 parameters.
pub fn fold(sequence: &str, config: &FoldConfig) -> Result<FoldResult, FoldError> {
    let sequence = Sequence::parse(sequence)?;
    let model = EnergyModel::turner2004(config.dangles)?;
    run(&sequence, &model, config, &ProgressReporter::new())
}

fn log_lattice(lattice: &Lattice, verbose: bool) {
    let stats = lattice.stats();
    debug!(
        retained_pairs = lattice.retained(StateKind::Pair),
        discarded = stats.total(),
        "Inside sweep complete."
    );
    if verbose {
        for kind in StateKind::BEAMED {
            info!(
                kind = kind.name(),
                retained = lattice.retained(kind),
                discarded = stats.get(kind),
                "Beam summary."
            );
        }
    }
}

fn to_dot_bracket(length: usize, pairs: Vec<(usize, usize)>) -> Result<String, FoldError> {
    PairTable::from_pairs(length, pairs)
        .map(|table| table.to_dot_bracket())
        .map_err(|e| FoldError::Internal(format!("backtrace produced an invalid structure: {}", e)))
}

/// Every retained pair whose best complete structure lies within the window contributes
/// that structure. The optimum comes first, the rest follow by energy then bracket string.
fn suboptimal_structures(
    context: &FoldContext,
    lattice: &Lattice,
    best: i32,
    mfe: &str,
    config: &FoldConfig,
) -> Result<Vec<Suboptimal>, FoldError> {
    let table = outside::outside(context, lattice);
    let threshold = best.saturating_sub(config.energy_delta_dcal());

    let mut seen = HashSet::from([mfe.to_string()]);
    let mut found: Vec<(i32, String)> = Vec::new();
    for (j, step) in lattice.steps(StateKind::Pair).iter().enumerate() {
        for candidate in step {
            let node = NodeRef::pair(candidate.i, j);
            let Some(out) = table.score(lattice, node) else {
                continue;
            };
            let total = candidate.state.score + out;
            if total < threshold {
                continue;
            }
            let mut pairs = Vec::new();
            inside_pairs(lattice, node, &mut pairs)?;
            outside_pairs(lattice, &table, node, &mut pairs)?;
            let structure = to_dot_bracket(lattice.len(), pairs)?;
            if seen.insert(structure.clone()) {
                found.push((total, structure));
            }
        }
    }
    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    debug!(candidates = found.len(), threshold, "Collected suboptimal structures.");

    let mut result = vec![Suboptimal {
        structure: mfe.to_string(),
        energy: score_to_energy(best),
    }];
    result.extend(found.into_iter().map(|(score, structure)| Suboptimal {
        structure,
        energy: score_to_energy(score),
    }));
    if let Some(limit) = config.max_suboptimals {
        result.truncate(limit);
    }
    Ok(result)
}
