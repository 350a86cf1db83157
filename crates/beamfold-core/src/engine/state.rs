/// The families of partial structures tracked by the lattice.
///
/// Every kind except [`StateKind::Exterior`] is indexed by an interval `[i, j]`; the exterior
/// prefix is a single state per position covering `[0, j]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKind {
    /// Hairpin candidate: `(i, j)` could close a hairpin loop.
    Hairpin,
    /// `(i, j)` closes a multiloop whose branches are already in place.
    Multi,
    /// `i` pairs with `j`.
    Pair,
    /// Two or more multiloop branches spanning `[i, j]`.
    M2,
    /// One or more multiloop branches spanning `[i, j]`.
    M,
    /// Best structure of the prefix `[0, j]`.
    Exterior,
}

impl StateKind {
    pub const BEAMED: [StateKind; 5] = [
        StateKind::Hairpin,
        StateKind::Multi,
        StateKind::Pair,
        StateKind::M2,
        StateKind::M,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StateKind::Hairpin => "hairpin",
            StateKind::Multi => "multi",
            StateKind::Pair => "pair",
            StateKind::M2 => "m2",
            StateKind::M => "m",
            StateKind::Exterior => "exterior",
        }
    }
}

/// How a state was derived. Each variant names its sources, so backtracing is a lookup by
/// position rather than a pointer walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manner {
    /// `P(i, j)` closes a hairpin (also used for the hairpin candidates themselves).
    Hairpin,
    /// `P(i, j)` stacks on `P(i + 1, j - 1)`.
    Helix,
    /// `P(i, j)` closes a bulge or interior loop around `P(i + l1, j - l2)`.
    SingleBranch { l1: usize, l2: usize },
    /// `P(i, j)` closes `Multi(i, j)`.
    PFromMulti,
    /// `Multi(i, j)` opened around `M2(i + l1, j - l2)`.
    MultiFromM2 { l1: usize, l2: usize },
    /// `Multi(i, j)` extended by unpaired bases; branches still at `M2(i + l1, j - l2)`.
    MultiPlusU { l1: usize, l2: usize },
    /// `M2(i, j) = M(i, split) + P(split + 1, j)`.
    M2FromMP { split: usize },
    MFromM2,
    MFromP,
    /// `M(i, j) = M(i, j - 1)` plus an unpaired base.
    MPlusU,
    /// `C(j) = C(j - 1)` plus an unpaired base; at `j = 0` the lone unpaired base.
    CPlusU,
    /// `C(j) = C(split) + P(split + 1, j)`, or `P(0, j)` alone.
    CPlusP { split: Option<usize> },
}

impl Manner {
    /// Unpaired run lengths recorded by multiloop states.
    pub fn loop_lengths(self) -> Option<(usize, usize)> {
        match self {
            Manner::MultiFromM2 { l1, l2 } | Manner::MultiPlusU { l1, l2 } => Some((l1, l2)),
            _ => None,
        }
    }
}

/// A scored partial structure. Scores are negated energies in dcal/mol; higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    pub score: i32,
    pub manner: Manner,
}

impl State {
    pub fn new(score: i32, manner: Manner) -> Self {
        Self { score, manner }
    }
}

/// Address of a state inside the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub kind: StateKind,
    pub i: usize,
    pub j: usize,
}

impl NodeRef {
    pub fn new(kind: StateKind, i: usize, j: usize) -> Self {
        Self { kind, i, j }
    }

    pub fn pair(i: usize, j: usize) -> Self {
        Self::new(StateKind::Pair, i, j)
    }

    pub fn exterior(j: usize) -> Self {
        Self::new(StateKind::Exterior, 0, j)
    }
}
