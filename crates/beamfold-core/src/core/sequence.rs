use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single position of an RNA sequence.
///
/// `N` is the neutral placeholder for ambiguous IUPAC codes. It never pairs and indexes
/// the "unknown" row of every mismatch and dangle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nucleotide {
    A,
    C,
    G,
    U,
    N,
}

// Upper-case symbols only; input is upper-cased before lookup.
static NUCLEOTIDE_CODES: Map<char, Nucleotide> = phf_map! {
    'A' => Nucleotide::A,
    'C' => Nucleotide::C,
    'G' => Nucleotide::G,
    'U' => Nucleotide::U,
    'T' => Nucleotide::U,
    'N' => Nucleotide::N,
    'R' => Nucleotide::N,
    'Y' => Nucleotide::N,
    'K' => Nucleotide::N,
    'M' => Nucleotide::N,
    'S' => Nucleotide::N,
    'W' => Nucleotide::N,
    'B' => Nucleotide::N,
    'D' => Nucleotide::N,
    'H' => Nucleotide::N,
    'V' => Nucleotide::N,
};

impl Nucleotide {
    pub fn from_char(c: char) -> Option<Self> {
        NUCLEOTIDE_CODES.get(&c.to_ascii_uppercase()).copied()
    }

    pub fn to_char(self) -> char {
        match self {
            Nucleotide::A => 'A',
            Nucleotide::C => 'C',
            Nucleotide::G => 'G',
            Nucleotide::U => 'U',
            Nucleotide::N => 'N',
        }
    }

    /// Row/column index into mismatch and dangle tables (N, A, C, G, U).
    #[inline]
    pub fn table_index(self) -> usize {
        match self {
            Nucleotide::N => 0,
            Nucleotide::A => 1,
            Nucleotide::C => 2,
            Nucleotide::G => 3,
            Nucleotide::U => 4,
        }
    }

    /// Dense index used by the per-nucleotide lookahead tables of the lattice.
    #[inline]
    pub(crate) fn ordinal(self) -> usize {
        match self {
            Nucleotide::A => 0,
            Nucleotide::C => 1,
            Nucleotide::G => 2,
            Nucleotide::U => 3,
            Nucleotide::N => 4,
        }
    }

    pub(crate) const ALL: [Nucleotide; 5] = [
        Nucleotide::A,
        Nucleotide::C,
        Nucleotide::G,
        Nucleotide::U,
        Nucleotide::N,
    ];
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Sequence is empty")]
    Empty,
    #[error("Invalid nucleotide '{symbol}' at position {position}")]
    InvalidSymbol { symbol: char, position: usize },
}

/// A validated, normalized RNA sequence. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    bases: Vec<Nucleotide>,
}

impl Sequence {
    /// Validates and normalizes raw input.
    ///
    /// Surrounding whitespace is ignored, case is folded, `T` is read as `U` and ambiguous
    /// IUPAC codes become `N`. Any other symbol, including interior whitespace, is rejected
    /// with its zero-based position.
    pub fn parse(raw: &str) -> Result<Self, SequenceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SequenceError::Empty);
        }
        let bases = trimmed
            .chars()
            .enumerate()
            .map(|(position, symbol)| {
                Nucleotide::from_char(symbol)
                    .ok_or(SequenceError::InvalidSymbol { symbol, position })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bases })
    }

    pub fn from_bases(bases: Vec<Nucleotide>) -> Result<Self, SequenceError> {
        if bases.is_empty() {
            return Err(SequenceError::Empty);
        }
        Ok(Self { bases })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Always `false`; kept for API symmetry with collections.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    #[inline]
    pub fn bases(&self) -> &[Nucleotide] {
        &self.bases
    }

    #[inline]
    pub fn get(&self, position: usize) -> Option<Nucleotide> {
        self.bases.get(position).copied()
    }
}

impl FromStr for Sequence {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for base in &self.bases {
            write!(f, "{}", base.to_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_thymine() {
        let seq = Sequence::parse("gcAt").unwrap();
        assert_eq!(
            seq.bases(),
            &[Nucleotide::G, Nucleotide::C, Nucleotide::A, Nucleotide::U]
        );
        assert_eq!(seq.to_string(), "GCAU");
    }

    #[test]
    fn parse_maps_ambiguity_codes_to_placeholder() {
        let seq = Sequence::parse("ARYN").unwrap();
        assert_eq!(seq.get(1), Some(Nucleotide::N));
        assert_eq!(seq.get(2), Some(Nucleotide::N));
        assert_eq!(seq.get(3), Some(Nucleotide::N));
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let seq = Sequence::parse("  GGGAAACCC\n").unwrap();
        assert_eq!(seq.len(), 9);
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert_eq!(Sequence::parse(""), Err(SequenceError::Empty));
        assert_eq!(Sequence::parse("   \n"), Err(SequenceError::Empty));
    }

    #[test]
    fn parse_rejects_invalid_symbol_with_position() {
        assert_eq!(
            Sequence::parse("GGXA"),
            Err(SequenceError::InvalidSymbol {
                symbol: 'X',
                position: 2
            })
        );
    }

    #[test]
    fn parse_rejects_interior_whitespace() {
        assert!(matches!(
            Sequence::parse("GG AA"),
            Err(SequenceError::InvalidSymbol { symbol: ' ', .. })
        ));
    }

    #[test]
    fn from_bases_rejects_empty_vector() {
        assert_eq!(Sequence::from_bases(Vec::new()), Err(SequenceError::Empty));
    }

    #[test]
    fn table_index_places_unknown_first() {
        assert_eq!(Nucleotide::N.table_index(), 0);
        assert_eq!(Nucleotide::A.table_index(), 1);
        assert_eq!(Nucleotide::U.table_index(), 4);
    }
}
