use crate::core::sequence::Nucleotide;

/// The canonical Watson-Crick and wobble pairs, named 5' partner first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PairType {
    CG,
    GC,
    GU,
    UG,
    AU,
    UA,
}

impl PairType {
    pub const ALL: [PairType; 6] = [
        PairType::CG,
        PairType::GC,
        PairType::GU,
        PairType::UG,
        PairType::AU,
        PairType::UA,
    ];

    /// Pair type formed by `five` (5' partner) and `three` (3' partner), if they can pair.
    #[inline]
    pub fn of(five: Nucleotide, three: Nucleotide) -> Option<Self> {
        use Nucleotide::*;
        match (five, three) {
            (C, G) => Some(PairType::CG),
            (G, C) => Some(PairType::GC),
            (G, U) => Some(PairType::GU),
            (U, G) => Some(PairType::UG),
            (A, U) => Some(PairType::AU),
            (U, A) => Some(PairType::UA),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// G-C pairs carry no terminal AU/GU penalty.
    #[inline]
    pub fn is_gc(self) -> bool {
        matches!(self, PairType::CG | PairType::GC)
    }

    pub fn reversed(self) -> Self {
        match self {
            PairType::CG => PairType::GC,
            PairType::GC => PairType::CG,
            PairType::GU => PairType::UG,
            PairType::UG => PairType::GU,
            PairType::AU => PairType::UA,
            PairType::UA => PairType::AU,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PairType::CG => "CG",
            PairType::GC => "GC",
            PairType::GU => "GU",
            PairType::UG => "UG",
            PairType::AU => "AU",
            PairType::UA => "UA",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pair| pair.name() == name)
    }
}

#[inline]
pub fn can_pair(five: Nucleotide, three: Nucleotide) -> bool {
    PairType::of(five, three).is_some()
}
