use super::{input_error, load_registry, record_label};
use crate::cli::EvalArgs;
use crate::config::PartialFoldConfig;
use crate::error::{CliError, Result};
use crate::utils::input::{self, EvalRecord};
use beamfold::core::energy::model::EnergyModel;
use beamfold::core::energy::term::EnergyTerm;
use beamfold::core::sequence::Sequence;
use beamfold::core::structure::PairTable;
use beamfold::engine::config::FoldConfig;
use beamfold::engine::error::FoldError;
use beamfold::workflows::eval::{self, Evaluation};
use rayon::prelude::*;
use std::fmt::Write as _;
use std::io::Write as _;
use tracing::{error, info, warn};

pub fn run(args: EvalArgs) -> Result<()> {
    let settings = PartialFoldConfig::load(&args.model)?.merge_with_eval_args(&args)?;
    let registry = load_registry(settings.params_path.as_deref(), settings.fold.dangles)?;

    let content = input::read_input(args.input.as_deref())?;
    let records = input::parse_eval_records(&content)
        .map_err(|e| input_error(args.input.as_deref(), e))?;
    if records.is_empty() {
        warn!("No sequence/structure pairs found in the input.");
        return Ok(());
    }

    let model = registry.snapshot();
    info!(records = records.len(), "Evaluating structures.");
    let outcomes: Vec<_> = records
        .par_iter()
        .map(|record| evaluate_record(record, &model, &settings.fold))
        .collect();

    let mut stdout = std::io::stdout().lock();
    let mut failed = 0;
    for (index, (record, outcome)) in records.iter().zip(&outcomes).enumerate() {
        match outcome {
            Ok((sequence, evaluation)) => {
                let rendered = render(record, sequence, evaluation, args.breakdown);
                stdout.write_all(rendered.as_bytes())?;
            }
            Err(e) => {
                failed += 1;
                let label = record_label(record.name.as_deref(), index);
                error!(record = %label, "Evaluation failed: {}", e);
                eprintln!("Error in record {}: {}", label, e);
            }
        }
    }
    stdout.flush()?;

    if failed > 0 {
        return Err(CliError::Records {
            failed,
            total: records.len(),
        });
    }
    Ok(())
}

fn evaluate_record(
    record: &EvalRecord,
    model: &EnergyModel,
    config: &FoldConfig,
) -> std::result::Result<(Sequence, Evaluation), FoldError> {
    let sequence = Sequence::parse(&record.sequence)?;
    let structure = PairTable::from_dot_bracket(&record.structure)?;
    let evaluation = eval::run(&sequence, &structure, model, config)?;
    Ok((sequence, evaluation))
}

fn kcal(dcal: i32) -> f64 {
    f64::from(dcal) / 100.0
}

fn render(record: &EvalRecord, sequence: &Sequence, evaluation: &Evaluation, breakdown: bool) -> String {
    let mut out = String::new();
    if let Some(name) = &record.name {
        let _ = writeln!(out, ">{}", name);
    }
    let _ = writeln!(out, "{}", sequence);
    let _ = writeln!(out, "{} ({:.2})", evaluation.structure, evaluation.energy);
    if breakdown {
        let EnergyTerm {
            hairpin,
            stack,
            bulge,
            interior,
            multi,
            exterior,
            shape,
        } = evaluation.terms;
        let _ = writeln!(
            out,
            "  hairpin={:.2} stack={:.2} bulge={:.2} interior={:.2} multi={:.2} exterior={:.2} shape={:.2}",
            kcal(hairpin),
            kcal(stack),
            kcal(bulge),
            kcal(interior),
            kcal(multi),
            kcal(exterior),
            kcal(shape)
        );
    }
    out
}
