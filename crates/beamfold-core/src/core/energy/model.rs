use super::pair::PairType;
use super::params::{EnergyParams, LoopTable, Mismatch, PairIndexed, ParamLoadError};
use crate::core::sequence::Nucleotide;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// How unpaired bases next to a helix end contribute to multiloop and exterior stems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DangleMode {
    /// No dangle or terminal mismatch energies.
    None,
    /// Each stem takes its single most favorable dangle, 5' or 3'.
    Single,
    /// Both neighbors count, scored as a terminal mismatch.
    #[default]
    Double,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown dangle mode '{0}' (expected 0/none, 1/single or 2/double)")]
pub struct DangleModeError(pub String);

impl FromStr for DangleMode {
    type Err = DangleModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "none" => Ok(DangleMode::None),
            "1" | "single" => Ok(DangleMode::Single),
            "2" | "double" => Ok(DangleMode::Double),
            _ => Err(DangleModeError(s.to_string())),
        }
    }
}

impl TryFrom<u8> for DangleMode {
    type Error = DangleModeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DangleMode::None),
            1 => Ok(DangleMode::Single),
            2 => Ok(DangleMode::Double),
            other => Err(DangleModeError(other.to_string())),
        }
    }
}

impl fmt::Display for DangleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DangleMode::None => "none",
            DangleMode::Single => "single",
            DangleMode::Double => "double",
        };
        f.write_str(name)
    }
}

/// Shape of the loop closed between an outer pair and the next inner pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoLoopKind {
    Stack,
    Bulge,
    Interior,
}

impl TwoLoopKind {
    pub fn classify(i: usize, j: usize, p: usize, q: usize) -> Self {
        let left = p - i - 1;
        let right = j - q - 1;
        match (left, right) {
            (0, 0) => TwoLoopKind::Stack,
            (0, _) | (_, 0) => TwoLoopKind::Bulge,
            _ => TwoLoopKind::Interior,
        }
    }
}

/// Nearest-neighbor energy functions over an immutable parameter set.
///
/// All energies are in dcal/mol. Indices refer to positions of the `seq` slice passed to
/// each call; callers guarantee they are in range. A pair that cannot form scores the
/// `unfavorable` constant rather than failing.
#[derive(Debug, Clone)]
pub struct EnergyModel {
    params: Arc<EnergyParams>,
    dangles: DangleMode,
}

impl EnergyModel {
    pub fn new(params: Arc<EnergyParams>, dangles: DangleMode) -> Self {
        Self { params, dangles }
    }

    pub fn turner2004(dangles: DangleMode) -> Result<Self, ParamLoadError> {
        Ok(Self::new(EnergyParams::turner2004()?, dangles))
    }

    #[inline]
    pub fn params(&self) -> &EnergyParams {
        &self.params
    }

    #[inline]
    pub fn dangles(&self) -> DangleMode {
        self.dangles
    }

    /// Same tables, different dangle convention.
    pub fn with_dangles(&self, dangles: DangleMode) -> Self {
        Self {
            params: Arc::clone(&self.params),
            dangles,
        }
    }

    #[inline]
    pub fn min_hairpin_loop(&self) -> usize {
        self.params.globals.min_hairpin_loop
    }

    #[inline]
    pub fn max_loop(&self) -> usize {
        self.params.globals.max_loop
    }

    #[inline]
    pub fn unfavorable(&self) -> i32 {
        self.params.globals.unfavorable
    }

    /// Hairpin loop closed by `(i, j)`.
    pub fn hairpin(&self, seq: &[Nucleotide], i: usize, j: usize, sharp_turn: bool) -> i32 {
        let globals = &self.params.globals;
        let size = j - i - 1;
        if size < globals.min_hairpin_loop && !sharp_turn {
            return globals.unfavorable;
        }
        let Some(pair) = PairType::of(seq[i], seq[j]) else {
            return globals.unfavorable;
        };

        let energy = match self.params.hairpin.lookup(size, globals.lxc) {
            Some(value) => value,
            None if sharp_turn => self.params.hairpin.smallest().unwrap_or(globals.unfavorable),
            None => globals.unfavorable,
        };
        if size < 3 {
            return energy;
        }
        if matches!(size, 3 | 4 | 6) {
            if let Some(special) = self.special_hairpin(&seq[i..=j]) {
                return special;
            }
        }
        if size == 3 {
            return energy + self.terminal_au(pair);
        }
        energy + mismatch(&self.params.mismatch_hairpin, pair, seq[i + 1], seq[j - 1])
    }

    fn special_hairpin(&self, motif: &[Nucleotide]) -> Option<i32> {
        let mut key = [0u8; 8];
        let key = key.get_mut(..motif.len())?;
        for (slot, base) in key.iter_mut().zip(motif) {
            if *base == Nucleotide::N {
                return None;
            }
            *slot = base.to_char() as u8;
        }
        self.params.special_hairpins.get(&key[..]).copied()
    }

    /// Stack, bulge or interior loop between the outer pair `(i, j)` and inner pair `(p, q)`.
    pub fn single(&self, seq: &[Nucleotide], i: usize, j: usize, p: usize, q: usize) -> i32 {
        let params = &self.params;
        let globals = &params.globals;
        let (Some(outer), Some(inner)) = (PairType::of(seq[i], seq[j]), PairType::of(seq[q], seq[p]))
        else {
            return globals.unfavorable;
        };

        let left = p - i - 1;
        let right = j - q - 1;
        let (long, short) = if left > right {
            (left, right)
        } else {
            (right, left)
        };

        if long == 0 {
            return self.stack(outer, inner);
        }

        if short == 0 {
            let energy = self.loop_energy(&params.bulge, long);
            if long == 1 {
                return energy + self.stack(outer, inner);
            }
            return energy + self.terminal_au(outer) + self.terminal_au(inner);
        }

        let (si1, sj1) = (seq[i + 1], seq[j - 1]);
        let (sp1, sq1) = (seq[p - 1], seq[q + 1]);
        let asymmetry = ((long - short) as i32 * globals.ninio).min(globals.max_ninio);

        let tabulated = self.small_interior(outer, inner, left, right, [si1, sp1, sq1, sj1]);
        if let Some(energy) = tabulated {
            return energy;
        }
        if short == 1 && long > 2 {
            return self.loop_energy(&params.interior, long + 1)
                + asymmetry
                + mismatch(&params.mismatch_interior_1n, outer, si1, sj1)
                + mismatch(&params.mismatch_interior_1n, inner, sq1, sp1);
        }
        if short == 2 && long == 3 {
            return self.loop_energy(&params.interior, 5)
                + globals.ninio
                + mismatch(&params.mismatch_interior_23, outer, si1, sj1)
                + mismatch(&params.mismatch_interior_23, inner, sq1, sp1);
        }
        self.loop_energy(&params.interior, long + short)
            + asymmetry
            + mismatch(&params.mismatch_interior, outer, si1, sj1)
            + mismatch(&params.mismatch_interior, inner, sq1, sp1)
    }

    /// Tabulated 1x1, 2x1 and 2x2 loops. `bases` are the unpaired neighbors of `i`, `p`,
    /// `q` and `j`, in that order.
    fn small_interior(
        &self,
        outer: PairType,
        inner: PairType,
        left: usize,
        right: usize,
        bases: [Nucleotide; 4],
    ) -> Option<i32> {
        let params = &self.params;
        let [i1, p1, q1, j1] = bases.map(Nucleotide::table_index);
        match (left, right) {
            (1, 1) => params
                .interior_1x1
                .get(&(outer, inner))
                .map(|t| t[i1][j1]),
            (1, 2) => params
                .interior_2x1
                .get(&(outer, inner))
                .map(|t| t[i1][q1][j1]),
            // Two bases on the 5' side: the table is read from the inner pair.
            (2, 1) => params
                .interior_2x1
                .get(&(inner, outer))
                .map(|t| t[q1][i1][p1]),
            (2, 2) => params
                .interior_2x2
                .get(&(outer, inner))
                .map(|t| t[i1][p1][q1][j1]),
            _ => None,
        }
    }

    /// Closing pair `(i, j)` of a multiloop, seen from inside the loop.
    pub fn multi_closing(&self, seq: &[Nucleotide], i: usize, j: usize) -> i32 {
        let globals = &self.params.globals;
        let Some(pair) = PairType::of(seq[j], seq[i]) else {
            return globals.unfavorable;
        };
        self.stem(
            pair,
            Some(seq[j - 1]),
            Some(seq[i + 1]),
            &self.params.mismatch_multi,
        ) + globals.ml_intern
            + globals.ml_closing
    }

    /// Branch `(i, j)` inside a multiloop.
    pub fn multi_stem(&self, seq: &[Nucleotide], i: usize, j: usize) -> i32 {
        let globals = &self.params.globals;
        let Some(pair) = PairType::of(seq[i], seq[j]) else {
            return globals.unfavorable;
        };
        let five = i.checked_sub(1).map(|k| seq[k]);
        let three = seq.get(j + 1).copied();
        self.stem(pair, five, three, &self.params.mismatch_multi) + globals.ml_intern
    }

    #[inline]
    pub fn multi_unpaired(&self, count: usize) -> i32 {
        count as i32 * self.params.globals.ml_base
    }

    /// Helix `(i, j)` in the exterior loop. Neighbors past either end of the sequence are
    /// simply absent.
    pub fn exterior_stem(&self, seq: &[Nucleotide], i: usize, j: usize) -> i32 {
        let Some(pair) = PairType::of(seq[i], seq[j]) else {
            return self.params.globals.unfavorable;
        };
        let five = i.checked_sub(1).map(|k| seq[k]);
        let three = seq.get(j + 1).copied();
        self.stem(pair, five, three, &self.params.mismatch_exterior)
    }

    fn stem(
        &self,
        pair: PairType,
        five: Option<Nucleotide>,
        three: Option<Nucleotide>,
        mismatches: &PairIndexed<Mismatch>,
    ) -> i32 {
        let params = &self.params;
        let d5 = five.and_then(|b| params.dangle5[pair.index()].map(|row| row[b.table_index()]));
        let d3 = three.and_then(|b| params.dangle3[pair.index()].map(|row| row[b.table_index()]));

        let dangle = match self.dangles {
            DangleMode::None => 0,
            DangleMode::Single => d5.into_iter().chain(d3).min().unwrap_or(0).min(0),
            DangleMode::Double => match (five, three) {
                (Some(f), Some(t)) => mismatches[pair.index()]
                    .map(|m| m[f.table_index()][t.table_index()])
                    .unwrap_or(d5.unwrap_or(0) + d3.unwrap_or(0)),
                _ => d5.or(d3).unwrap_or(0),
            },
        };
        dangle + self.terminal_au(pair)
    }

    #[inline]
    fn stack(&self, outer: PairType, inner: PairType) -> i32 {
        self.params.stack[outer.index()][inner.index()].unwrap_or(0)
    }

    #[inline]
    fn terminal_au(&self, pair: PairType) -> i32 {
        if pair.is_gc() {
            0
        } else {
            self.params.globals.terminal_au
        }
    }

    #[inline]
    fn loop_energy(&self, table: &LoopTable, size: usize) -> i32 {
        table
            .lookup(size, self.params.globals.lxc)
            .unwrap_or(self.params.globals.unfavorable)
    }
}

#[inline]
fn mismatch(
    table: &PairIndexed<Mismatch>,
    pair: PairType,
    five_side: Nucleotide,
    three_side: Nucleotide,
) -> i32 {
    table[pair.index()]
        .map(|m| m[five_side.table_index()][three_side.table_index()])
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::Sequence;

    fn model(dangles: DangleMode) -> EnergyModel {
        EnergyModel::turner2004(dangles).unwrap()
    }

    fn bases(raw: &str) -> Vec<Nucleotide> {
        Sequence::parse(raw).unwrap().bases().to_vec()
    }

    /// The bundled set extended with extra TOML tables.
    fn model_with(extra: &str) -> EnergyModel {
        let doc = format!("{}\n{}", include_str!("../../../data/turner2004.toml"), extra);
        let params = EnergyParams::from_toml_str(&doc, "extended").unwrap();
        EnergyModel::new(Arc::new(params), DangleMode::Double)
    }

    /// Nested array of 5-wide levels holding `value` at `hit` and `fill` everywhere else.
    fn table(depth: usize, fill: i32, hit: &[usize], value: i32) -> String {
        fn render(depth: usize, fill: i32, hit: Option<&[usize]>, value: i32) -> String {
            if depth == 0 {
                return if hit.is_some() { value } else { fill }.to_string();
            }
            let entries: Vec<String> = (0..5)
                .map(|k| {
                    let next = hit
                        .and_then(|path| path.split_first())
                        .filter(|&(&first, _)| first == k)
                        .map(|(_, rest)| rest);
                    render(depth - 1, fill, next, value)
                })
                .collect();
            format!("[{}]", entries.join(", "))
        }
        render(depth, fill, Some(hit), value)
    }

    #[test]
    fn triloop_hairpin_uses_length_table_only() {
        let seq = bases("GGGAAACCC");
        assert_eq!(model(DangleMode::Double).hairpin(&seq, 2, 6, false), 540);
    }

    #[test]
    fn triloop_closed_by_au_pays_terminal_penalty() {
        let seq = bases("AGAAU");
        assert_eq!(model(DangleMode::Double).hairpin(&seq, 0, 4, false), 540 + 50);
    }

    #[test]
    fn tetraloop_hairpin_adds_terminal_mismatch() {
        let seq = bases("GAAAAC");
        let m = model(DangleMode::Double);
        let expected = 560
            + m.params().mismatch_hairpin[PairType::GC.index()].unwrap()
                [Nucleotide::A.table_index()][Nucleotide::A.table_index()];
        assert_eq!(m.hairpin(&seq, 0, 5, false), expected);
    }

    #[test]
    fn special_tetraloop_replaces_the_generic_score() {
        let seq = bases("GGCUUCGGCC");
        assert_eq!(model(DangleMode::Double).hairpin(&seq, 2, 7, false), 370);
    }

    #[test]
    fn sharp_turn_hairpins_are_unfavorable_unless_allowed() {
        let seq = bases("GAAC");
        let m = model(DangleMode::Double);
        assert_eq!(m.hairpin(&seq, 0, 3, false), m.unfavorable());
        assert_eq!(m.hairpin(&seq, 0, 3, true), 540);
    }

    #[test]
    fn long_hairpins_extrapolate_logarithmically() {
        let m = model(DangleMode::Double);
        let seq = bases(&format!("G{}C", "A".repeat(40)));
        let extrapolated = 769 + (107.856 * (40.0f64 / 30.0).ln()) as i32;
        let mismatch = m.params().mismatch_hairpin[PairType::GC.index()].unwrap()
            [Nucleotide::A.table_index()][Nucleotide::A.table_index()];
        assert_eq!(m.hairpin(&seq, 0, 41, false), extrapolated + mismatch);
    }

    #[test]
    fn stacked_gc_pairs_use_the_stack_table() {
        let seq = bases("GGGAAACCC");
        assert_eq!(model(DangleMode::Double).single(&seq, 0, 8, 1, 7), -330);
    }

    #[test]
    fn single_nucleotide_bulge_keeps_stacking() {
        let seq = bases("GAGAAAACC");
        let m = model(DangleMode::Double);
        // (0, 8) closes a bulge over position 1 onto (2, 7).
        let expected = 380 + m.params().stack[PairType::GC.index()][PairType::CG.index()].unwrap();
        assert_eq!(m.single(&seq, 0, 8, 2, 7), expected);
    }

    #[test]
    fn longer_bulges_pay_terminal_penalties() {
        let seq = bases("AAAGAAAACU");
        let m = model(DangleMode::Double);
        // Outer A-U, inner G-C, two unpaired bases on the 5' side.
        assert_eq!(m.single(&seq, 0, 9, 3, 8), 280 + 50);
    }

    #[test]
    fn one_by_one_interior_loop_without_table_uses_generic_formula() {
        let seq = bases("GAGAAAACAC");
        let m = model(DangleMode::Double);
        let p = m.params();
        let expected = 50
            + p.mismatch_interior[PairType::GC.index()].unwrap()[Nucleotide::A.table_index()]
                [Nucleotide::A.table_index()]
            + p.mismatch_interior[PairType::CG.index()].unwrap()[Nucleotide::A.table_index()]
                [Nucleotide::A.table_index()];
        assert_eq!(m.single(&seq, 0, 9, 2, 7), expected);
    }

    #[test]
    fn one_by_one_interior_loop_reads_its_table() {
        let m = model_with(&format!("[interior_1x1]\nGC-CG = {}\n", table(2, 90, &[1, 1], -40)));
        // (0, 8) G-C around (2, 6) G-C, A on both sides.
        assert_eq!(m.single(&bases("GAGAAACAC"), 0, 8, 2, 6), -40);
        // Same pairs, G-A mismatch instead.
        assert_eq!(m.single(&bases("GGGAAACAC"), 0, 8, 2, 6), 90);
    }

    #[test]
    fn two_by_one_interior_loop_reads_its_table_in_both_orientations() {
        let m = model_with(&format!(
            "[interior_2x1]\nGC-CG = {}\nCG-GC = {}\n",
            table(3, 110, &[1, 4, 1], 230),
            table(3, 110, &[4, 1, 1], 170)
        ));
        // One base on the 5' side, two on the 3' side: read from the outer pair.
        assert_eq!(m.single(&bases("GAGAAACUAC"), 0, 9, 2, 6), 230);
        // Two on the 5' side, one on the 3' side: read from the inner pair.
        assert_eq!(m.single(&bases("GAAGAAACUC"), 0, 9, 3, 7), 170);
    }

    #[test]
    fn two_by_two_interior_loop_reads_its_table() {
        let m = model_with(&format!(
            "[interior_2x2]\nGC-CG = {}\n",
            table(4, 130, &[1, 1, 4, 4], 50)
        ));
        assert_eq!(m.single(&bases("GAAGAAACUUC"), 0, 10, 3, 7), 50);
        assert_eq!(m.single(&bases("GUUGAAACAAC"), 0, 10, 3, 7), 130);
    }

    #[test]
    fn interior_loops_without_a_matching_table_fall_back_to_the_formula() {
        let extended = model_with(&format!(
            "[interior_2x2]\nCG-GC = {}\n",
            table(4, 130, &[1, 1, 4, 4], 50)
        ));
        let bundled = model(DangleMode::Double);
        let seq = bases("GAAGAAACUUC");
        assert_eq!(
            extended.single(&seq, 0, 10, 3, 7),
            bundled.single(&seq, 0, 10, 3, 7)
        );
    }

    #[test]
    fn one_by_n_interior_loop_uses_asymmetry_penalty() {
        // Outer (0, 13) G-C, inner (2, 9) G-C: one base on the left, three on the right.
        let seq = bases("GAGAAAAAACAAAC");
        let m = model(DangleMode::Double);
        let p = m.params();
        let mm = |pair: PairType, a: Nucleotide, b: Nucleotide| {
            p.mismatch_interior_1n[pair.index()].unwrap()[a.table_index()][b.table_index()]
        };
        let expected = 110
            + 120
            + mm(PairType::GC, Nucleotide::A, Nucleotide::A)
            + mm(PairType::CG, Nucleotide::A, Nucleotide::A);
        assert_eq!(m.single(&seq, 0, 13, 2, 9), expected);
    }

    #[test]
    fn classify_distinguishes_two_loop_shapes() {
        assert_eq!(TwoLoopKind::classify(0, 9, 1, 8), TwoLoopKind::Stack);
        assert_eq!(TwoLoopKind::classify(0, 9, 3, 8), TwoLoopKind::Bulge);
        assert_eq!(TwoLoopKind::classify(0, 9, 2, 7), TwoLoopKind::Interior);
    }

    #[test]
    fn exterior_stem_without_neighbors_only_pays_terminal_penalty() {
        let seq = bases("AU");
        for mode in [DangleMode::None, DangleMode::Single, DangleMode::Double] {
            assert_eq!(model(mode).exterior_stem(&seq, 0, 1), 50);
        }
        let seq = bases("GC");
        assert_eq!(model(DangleMode::Double).exterior_stem(&seq, 0, 1), 0);
    }

    #[test]
    fn exterior_stem_dangles_follow_the_mode() {
        let seq = bases("GAUC");
        assert_eq!(model(DangleMode::None).exterior_stem(&seq, 1, 2), 50);
        assert_eq!(model(DangleMode::Single).exterior_stem(&seq, 1, 2), -40 + 50);

        let m = model(DangleMode::Double);
        let expected = m.params().mismatch_exterior[PairType::AU.index()].unwrap()
            [Nucleotide::G.table_index()][Nucleotide::C.table_index()]
            + 50;
        assert_eq!(m.exterior_stem(&seq, 1, 2), expected);
    }

    #[test]
    fn multi_closing_includes_closing_and_branch_penalties() {
        let seq = bases("GAAAAAAAAC");
        let m = model(DangleMode::None);
        assert_eq!(m.multi_closing(&seq, 0, 9), 930 - 90);
        assert_eq!(m.multi_stem(&seq, 0, 9), -90);
        assert_eq!(m.multi_unpaired(7), 0);
    }

    #[test]
    fn unpairable_bases_score_unfavorable() {
        let seq = bases("AAAAA");
        let m = model(DangleMode::Double);
        assert_eq!(m.exterior_stem(&seq, 0, 4), m.unfavorable());
        assert_eq!(m.hairpin(&seq, 0, 4, false), m.unfavorable());
    }

    #[test]
    fn dangle_mode_parses_names_and_numbers() {
        assert_eq!("2".parse::<DangleMode>().unwrap(), DangleMode::Double);
        assert_eq!("Single".parse::<DangleMode>().unwrap(), DangleMode::Single);
        assert_eq!(DangleMode::try_from(0u8).unwrap(), DangleMode::None);
        assert!("3".parse::<DangleMode>().is_err());
        assert_eq!(DangleMode::default(), DangleMode::Double);
    }
}
