use super::{input_error, load_registry, record_label};
use crate::cli::FoldArgs;
use crate::config::PartialFoldConfig;
use crate::error::{CliError, Result};
use crate::utils::input::{self, FoldRecord};
use crate::utils::progress::{SweepProgress, batch_bar};
use beamfold::core::energy::model::EnergyModel;
use beamfold::core::sequence::Sequence;
use beamfold::engine::config::FoldConfig;
use beamfold::engine::error::FoldError;
use beamfold::engine::progress::ProgressReporter;
use beamfold::workflows::fold::{self, FoldResult};
use rayon::prelude::*;
use std::fmt::Write as _;
use std::io::Write as _;
use tracing::{error, info, warn};

pub fn run(args: FoldArgs, show_progress: bool) -> Result<()> {
    let settings = PartialFoldConfig::load(&args.model)?.merge_with_fold_args(&args)?;
    let registry = load_registry(settings.params_path.as_deref(), settings.fold.dangles)?;

    let content = input::read_input(args.input.as_deref())?;
    let records = input::parse_fold_records(&content)
        .map_err(|e| input_error(args.input.as_deref(), e))?;
    if records.is_empty() {
        warn!("No sequences found in the input.");
        return Ok(());
    }

    let mut config = settings.fold;
    if let Some(path) = &args.shape {
        let [record] = records.as_slice() else {
            return Err(CliError::Argument(format!(
                "--shape applies to a single sequence, but the input has {}",
                records.len()
            )));
        };
        info!("Loading SHAPE reactivities from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let profile = input::parse_shape(&content, record.sequence.chars().count())
            .map_err(|e| input_error(Some(path), e))?;
        config.shape = Some(profile);
    }

    let model = registry.snapshot();
    info!(
        records = records.len(),
        beam_size = config.beam_size,
        "Folding sequences."
    );

    let outcomes: Vec<std::result::Result<(Sequence, FoldResult), FoldError>> =
        if let [record] = records.as_slice() {
            let progress = SweepProgress::new(show_progress);
            let reporter = ProgressReporter::with_callback(progress.callback());
            vec![fold_record(record, &model, &config, &reporter)]
        } else {
            let bar = batch_bar(records.len(), show_progress);
            let outcomes = records
                .par_iter()
                .map(|record| {
                    let outcome = fold_record(record, &model, &config, &ProgressReporter::new());
                    bar.inc(1);
                    outcome
                })
                .collect();
            bar.finish_and_clear();
            outcomes
        };

    let mut stdout = std::io::stdout().lock();
    let mut failed = 0;
    for (index, (record, outcome)) in records.iter().zip(&outcomes).enumerate() {
        match outcome {
            Ok((sequence, result)) => {
                stdout.write_all(render(record, sequence, result).as_bytes())?;
                if args.stats {
                    eprintln!(
                        "{}: {} retained pair state(s), {} state(s) pruned",
                        record_label(record.name.as_deref(), index),
                        result.diagnostics.retained_pairs,
                        result.diagnostics.discarded.total()
                    );
                }
            }
            Err(e) => {
                failed += 1;
                let label = record_label(record.name.as_deref(), index);
                error!(record = %label, "Fold failed: {}", e);
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

fn fold_record(
    record: &FoldRecord,
    model: &EnergyModel,
    config: &FoldConfig,
    reporter: &ProgressReporter,
) -> std::result::Result<(Sequence, FoldResult), FoldError> {
    let sequence = Sequence::parse(&record.sequence)?;
    let result = fold::run(&sequence, model, config, reporter)?;
    Ok((sequence, result))
}

/// Name line (when present), the normalized sequence, then one `structure (energy)` line
/// per reported structure.
fn render(record: &FoldRecord, sequence: &Sequence, result: &FoldResult) -> String {
    let mut out = String::new();
    if let Some(name) = &record.name {
        let _ = writeln!(out, ">{}", name);
    }
    let _ = writeln!(out, "{}", sequence);
    if result.suboptimals.is_empty() {
        let _ = writeln!(out, "{} ({:.2})", result.structure, result.energy);
    }
    for subopt in &result.suboptimals {
        let _ = writeln!(out, "{} ({:.2})", subopt.structure, subopt.energy);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamfold::engine::config::FoldConfigBuilder;

    fn folded(raw: &str, config: &FoldConfig) -> (Sequence, FoldResult) {
        let record = FoldRecord {
            name: None,
            sequence: raw.to_string(),
        };
        let model = EnergyModel::turner2004(config.dangles).unwrap();
        fold_record(&record, &model, config, &ProgressReporter::new()).unwrap()
    }

    #[test]
    fn render_prints_name_sequence_and_structure() {
        let record = FoldRecord {
            name: Some("hairpin".to_string()),
            sequence: "gggaaaccc".to_string(),
        };
        let (sequence, result) = folded(&record.sequence, &FoldConfig::default());
        assert_eq!(
            render(&record, &sequence, &result),
            ">hairpin\nGGGAAACCC\n(((...))) (-1.20)\n"
        );
    }

    #[test]
    fn render_of_an_open_structure_has_no_negative_zero() {
        let record = FoldRecord {
            name: None,
            sequence: "AAAA".to_string(),
        };
        let (sequence, result) = folded(&record.sequence, &FoldConfig::default());
        assert_eq!(render(&record, &sequence, &result), "AAAA\n.... (0.00)\n");
    }

    #[test]
    fn render_lists_suboptimals_after_the_optimum() {
        let config = FoldConfigBuilder::new().energy_delta(5.0).build().unwrap();
        let record = FoldRecord {
            name: None,
            sequence: "GGGAAAUCCCAGGGCAUCGAUUCGGCGAUACC".to_string(),
        };
        let (sequence, result) = folded(&record.sequence, &config);
        let rendered = render(&record, &sequence, &result);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 1 + result.suboptimals.len());
        assert_eq!(
            lines[1],
            format!("{} ({:.2})", result.structure, result.energy)
        );
    }

    #[test]
    fn invalid_records_report_their_error() {
        let record = FoldRecord {
            name: None,
            sequence: "ACGX".to_string(),
        };
        let model = EnergyModel::turner2004(Default::default()).unwrap();
        let outcome = fold_record(&record, &model, &FoldConfig::default(), &ProgressReporter::new());
        assert!(matches!(outcome, Err(FoldError::Sequence(_))));
    }
}
