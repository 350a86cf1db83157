use std::fmt;
use thiserror::Error;

const UNPAIRED: char = '.';
const OPEN: char = '(';
const CLOSE: char = ')';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Invalid structure symbol '{symbol}' at position {position}")]
    InvalidSymbol { symbol: char, position: usize },
    #[error("Unmatched closing bracket at position {position}")]
    UnmatchedClose { position: usize },
    #[error("Unmatched opening bracket at position {position}")]
    UnmatchedOpen { position: usize },
    #[error("Pair ({i}, {j}) is out of range for a structure of length {length}")]
    OutOfRange { i: usize, j: usize, length: usize },
    #[error("Position {position} is paired more than once")]
    AlreadyPaired { position: usize },
    #[error("Pair ({i}, {j}) crosses another pair")]
    Crossing { i: usize, j: usize },
    #[error("Pair ({i}, {j}) is not a canonical base pair")]
    NonCanonicalPair { i: usize, j: usize },
    #[error("Pair ({i}, {j}) encloses fewer than {min_loop} unpaired bases")]
    SharpTurn { i: usize, j: usize, min_loop: usize },
}

/// Pairing partner of every position of a properly nested secondary structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairTable {
    partners: Vec<Option<usize>>,
}

impl PairTable {
    pub fn unpaired(length: usize) -> Self {
        Self {
            partners: vec![None; length],
        }
    }

    pub fn from_dot_bracket(notation: &str) -> Result<Self, StructureError> {
        let symbols: Vec<char> = notation.trim().chars().collect();
        let mut partners = vec![None; symbols.len()];
        let mut open = Vec::new();

        for (position, &symbol) in symbols.iter().enumerate() {
            match symbol {
                UNPAIRED => {}
                OPEN => open.push(position),
                CLOSE => {
                    let i = open
                        .pop()
                        .ok_or(StructureError::UnmatchedClose { position })?;
                    partners[i] = Some(position);
                    partners[position] = Some(i);
                }
                _ => return Err(StructureError::InvalidSymbol { symbol, position }),
            }
        }

        if let Some(&position) = open.last() {
            return Err(StructureError::UnmatchedOpen { position });
        }
        Ok(Self { partners })
    }

    /// Builds a table from `(i, j)` pairs, rejecting overlapping or crossing pairs.
    pub fn from_pairs<I>(length: usize, pairs: I) -> Result<Self, StructureError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut partners = vec![None; length];
        for (a, b) in pairs {
            let (i, j) = if a < b { (a, b) } else { (b, a) };
            if i == j || j >= length {
                return Err(StructureError::OutOfRange { i, j, length });
            }
            for position in [i, j] {
                if partners[position].is_some() {
                    return Err(StructureError::AlreadyPaired { position });
                }
            }
            partners[i] = Some(j);
            partners[j] = Some(i);
        }

        let table = Self { partners };
        table.check_nesting()?;
        Ok(table)
    }

    fn check_nesting(&self) -> Result<(), StructureError> {
        let mut open: Vec<usize> = Vec::new();
        for (position, partner) in self.partners.iter().enumerate() {
            match partner {
                Some(j) if *j > position => open.push(position),
                Some(i) => {
                    if open.pop() != Some(*i) {
                        return Err(StructureError::Crossing {
                            i: *i,
                            j: position,
                        });
                    }
                }
                None => {}
            }
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    #[inline]
    pub fn partner(&self, position: usize) -> Option<usize> {
        self.partners.get(position).copied().flatten()
    }

    /// Pairs `(i, j)` with `i < j`, ordered by `i`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.partners
            .iter()
            .enumerate()
            .filter_map(|(i, partner)| partner.filter(|&j| j > i).map(|j| (i, j)))
    }

    pub fn pair_count(&self) -> usize {
        self.pairs().count()
    }

    pub fn to_dot_bracket(&self) -> String {
        self.partners
            .iter()
            .enumerate()
            .map(|(i, partner)| match partner {
                None => UNPAIRED,
                Some(j) if *j > i => OPEN,
                Some(_) => CLOSE,
            })
            .collect()
    }
}

impl fmt::Display for PairTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dot_bracket())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_hairpin() {
        let table = PairTable::from_dot_bracket("((...))").unwrap();
        assert_eq!(table.len(), 7);
        assert_eq!(table.partner(0), Some(6));
        assert_eq!(table.partner(6), Some(0));
        assert_eq!(table.partner(1), Some(5));
        assert_eq!(table.partner(3), None);
        assert_eq!(table.pairs().collect::<Vec<_>>(), vec![(0, 6), (1, 5)]);
    }

    #[test]
    fn dot_bracket_round_trips_for_multiloop() {
        let notation = "((..((...))..((...))..))";
        let table = PairTable::from_dot_bracket(notation).unwrap();
        assert_eq!(table.to_dot_bracket(), notation);
        assert_eq!(table.pair_count(), 6);
    }

    #[test]
    fn rejects_unmatched_close() {
        assert_eq!(
            PairTable::from_dot_bracket("(..))"),
            Err(StructureError::UnmatchedClose { position: 4 })
        );
    }

    #[test]
    fn rejects_unmatched_open() {
        assert_eq!(
            PairTable::from_dot_bracket("((...)"),
            Err(StructureError::UnmatchedOpen { position: 0 })
        );
    }

    #[test]
    fn rejects_unknown_symbols() {
        assert_eq!(
            PairTable::from_dot_bracket("(.[.)"),
            Err(StructureError::InvalidSymbol {
                symbol: '[',
                position: 2
            })
        );
    }

    #[test]
    fn from_pairs_accepts_nested_pairs_in_any_order() {
        let table = PairTable::from_pairs(9, [(1, 7), (8, 0), (2, 6)]).unwrap();
        assert_eq!(table.to_dot_bracket(), "(((...)))");
    }

    #[test]
    fn from_pairs_rejects_crossing_pairs() {
        let result = PairTable::from_pairs(10, [(0, 5), (3, 8)]);
        assert!(matches!(result, Err(StructureError::Crossing { .. })));
    }

    #[test]
    fn from_pairs_rejects_reused_position() {
        let result = PairTable::from_pairs(10, [(0, 5), (5, 9)]);
        assert_eq!(result, Err(StructureError::AlreadyPaired { position: 5 }));
    }

    #[test]
    fn from_pairs_rejects_out_of_range_pair() {
        let result = PairTable::from_pairs(4, [(0, 4)]);
        assert!(matches!(result, Err(StructureError::OutOfRange { .. })));
    }

    #[test]
    fn unpaired_table_renders_dots() {
        assert_eq!(PairTable::unpaired(4).to_dot_bracket(), "....");
    }
}
