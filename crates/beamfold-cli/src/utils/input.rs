use beamfold::core::energy::shape::ShapeProfile;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Line {line}: record '{name}' has no sequence")]
    MissingSequence { line: usize, name: String },

    #[error("Line {line}: sequence has no structure line")]
    MissingStructure { line: usize },

    #[error("Line {line}: {reason}")]
    Shape { line: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldRecord {
    pub name: Option<String>,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRecord {
    pub name: Option<String>,
    pub sequence: String,
    pub structure: String,
}

/// Reads a whole input file, or standard input for `None` and `-`.
pub fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path),
        _ => {
            let mut content = String::new();
            std::io::stdin().lock().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

fn lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// FASTA records, or one sequence per line. Sequence lines following a `>` header are
/// joined until the next header.
pub fn parse_fold_records(content: &str) -> Result<Vec<FoldRecord>, InputError> {
    let mut records = Vec::new();
    let mut current: Option<(usize, FoldRecord)> = None;

    let finish = |entry: Option<(usize, FoldRecord)>, records: &mut Vec<FoldRecord>| {
        if let Some((line, record)) = entry {
            if record.sequence.is_empty() {
                return Err(InputError::MissingSequence {
                    line,
                    name: record.name.unwrap_or_default(),
                });
            }
            records.push(record);
        }
        Ok(())
    };

    for (number, line) in lines(content) {
        if let Some(name) = line.strip_prefix('>') {
            finish(current.take(), &mut records)?;
            current = Some((
                number,
                FoldRecord {
                    name: Some(name.trim().to_string()),
                    sequence: String::new(),
                },
            ));
        } else if let Some((_, record)) = current.as_mut() {
            record.sequence.push_str(line);
        } else {
            records.push(FoldRecord {
                name: None,
                sequence: line.to_string(),
            });
        }
    }
    finish(current, &mut records)?;
    Ok(records)
}

/// Sequence and structure line pairs, each optionally preceded by a `>` name. Anything
/// after the first token of a structure line is ignored, so fold output can be read back.
pub fn parse_eval_records(content: &str) -> Result<Vec<EvalRecord>, InputError> {
    let mut records = Vec::new();
    let mut name: Option<(usize, String)> = None;
    let mut sequence: Option<(usize, String)> = None;

    for (number, line) in lines(content) {
        if let Some(header) = line.strip_prefix('>') {
            if let Some((line, _)) = sequence {
                return Err(InputError::MissingStructure { line });
            }
            if let Some((line, name)) = name {
                return Err(InputError::MissingSequence { line, name });
            }
            name = Some((number, header.trim().to_string()));
        } else if let Some((_, seq)) = sequence.take() {
            let structure = line.split_whitespace().next().unwrap_or_default();
            records.push(EvalRecord {
                name: name.take().map(|(_, name)| name),
                sequence: seq,
                structure: structure.to_string(),
            });
        } else {
            sequence = Some((number, line.to_string()));
        }
    }

    if let Some((line, _)) = sequence {
        return Err(InputError::MissingStructure { line });
    }
    if let Some((line, name)) = name {
        return Err(InputError::MissingSequence { line, name });
    }
    Ok(records)
}

/// Parses a SHAPE reactivity file for a sequence of `length` nucleotides.
///
/// Each row holds a 1-based position and a reactivity, separated by tabs, commas or spaces.
/// `NA` marks a position without data, as does any position that is not listed.
pub fn parse_shape(content: &str, length: usize) -> Result<ShapeProfile, InputError> {
    let delimiter = if content.contains('\t') {
        b'\t'
    } else if content.contains(',') {
        b','
    } else {
        b' '
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());

    let mut reactivities = vec![None; length];
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| InputError::Shape {
            line: e.position().map_or(index + 1, |p| p.line() as usize),
            reason: e.to_string(),
        })?;
        let line = record.position().map_or(index + 1, |p| p.line() as usize);
        let fields: Vec<&str> = record.iter().filter(|field| !field.is_empty()).collect();
        let [position, value] = fields[..] else {
            if fields.is_empty() {
                continue;
            }
            return Err(InputError::Shape {
                line,
                reason: format!("expected 2 columns, found {}", fields.len()),
            });
        };

        let position: usize = position.parse().map_err(|_| InputError::Shape {
            line,
            reason: format!("invalid position '{}'", position),
        })?;
        if position == 0 || position > length {
            return Err(InputError::Shape {
                line,
                reason: format!("position {} is outside 1..={}", position, length),
            });
        }
        reactivities[position - 1] = if value.eq_ignore_ascii_case("NA") {
            None
        } else {
            Some(value.parse::<f64>().map_err(|_| InputError::Shape {
                line,
                reason: format!("invalid reactivity '{}'", value),
            })?)
        };
    }
    Ok(ShapeProfile::new(reactivities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn plain_lines_are_separate_records() {
        let records = parse_fold_records("GGGAAACCC\n\n  ACGU  \n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, None);
        assert_eq!(records[1].sequence, "ACGU");
    }

    #[test]
    fn fasta_records_join_wrapped_lines() {
        let content = ">first one\nGGGAAA\nCCC\n>second\nACGU\n";
        let records = parse_fold_records(content).unwrap();
        assert_eq!(
            records,
            vec![
                FoldRecord {
                    name: Some("first one".to_string()),
                    sequence: "GGGAAACCC".to_string(),
                },
                FoldRecord {
                    name: Some("second".to_string()),
                    sequence: "ACGU".to_string(),
                },
            ]
        );
    }

    #[test]
    fn header_without_sequence_is_an_error() {
        let err = parse_fold_records(">empty\n>next\nACGU\n").unwrap_err();
        assert_eq!(
            err,
            InputError::MissingSequence {
                line: 1,
                name: "empty".to_string()
            }
        );
    }

    #[test]
    fn eval_records_accept_fold_output() {
        let content = ">hairpin\nGGGAAACCC\n(((...))) (-1.20)\nACGU\n....\n";
        let records = parse_eval_records(content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("hairpin"));
        assert_eq!(records[0].structure, "(((...)))");
        assert_eq!(records[1].name, None);
        assert_eq!(records[1].sequence, "ACGU");
    }

    #[test]
    fn eval_sequence_without_structure_is_an_error() {
        assert_eq!(
            parse_eval_records("GGGAAACCC\n").unwrap_err(),
            InputError::MissingStructure { line: 1 }
        );
        assert_eq!(
            parse_eval_records("ACGU\n>next\n").unwrap_err(),
            InputError::MissingStructure { line: 1 }
        );
    }

    #[test]
    fn shape_columns_fill_a_profile() {
        let profile = parse_shape("1 0.5\n3   NA\n4 1.25\n", 5).unwrap();
        assert_eq!(profile.len(), 5);
        assert_eq!(profile.reactivity(0), Some(0.5));
        assert_eq!(profile.reactivity(1), None);
        assert_eq!(profile.reactivity(2), None);
        assert_eq!(profile.reactivity(3), Some(1.25));
    }

    #[test]
    fn shape_accepts_tabs_and_commas() {
        let tabs = parse_shape("1\t0.1\n2\t0.2\n", 2).unwrap();
        let commas = parse_shape("1,0.1\n2,0.2\n", 2).unwrap();
        assert_eq!(tabs, commas);
    }

    #[test]
    fn shape_rejects_bad_rows() {
        assert!(matches!(
            parse_shape("1 0.5\n9 0.1\n", 5),
            Err(InputError::Shape { line: 2, .. })
        ));
        assert!(matches!(
            parse_shape("0 0.5\n", 5),
            Err(InputError::Shape { line: 1, .. })
        ));
        assert!(matches!(
            parse_shape("1 high\n", 5),
            Err(InputError::Shape { line: 1, .. })
        ));
        assert!(matches!(
            parse_shape("1 0.5 0.7\n", 5),
            Err(InputError::Shape { line: 1, .. })
        ));
    }

    #[test]
    fn input_is_read_from_a_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">seq\nACGU").unwrap();
        let content = read_input(Some(file.path())).unwrap();
        assert_eq!(parse_fold_records(&content).unwrap().len(), 1);
    }
}
