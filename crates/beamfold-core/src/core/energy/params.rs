use super::pair::PairType;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

const TURNER_2004_TOML: &str = include_str!("../../../data/turner2004.toml");
const TURNER_2004_ORIGIN: &str = "<bundled turner2004.toml>";

static TURNER_2004: LazyLock<Result<Arc<EnergyParams>, String>> = LazyLock::new(|| {
    EnergyParams::from_toml_str(TURNER_2004_TOML, TURNER_2004_ORIGIN)
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

/// 5x5 terminal mismatch matrix indexed by [`Nucleotide::table_index`]: rows are the base
/// adjacent to the 5' partner of the pair, columns the base adjacent to its 3' partner.
///
/// [`Nucleotide::table_index`]: crate::core::sequence::Nucleotide::table_index
pub type Mismatch = [[i32; 5]; 5];

/// 2x1 interior loop energies, indexed `[5' single base][3' pair neighbor][3' base]` as seen
/// from the outer pair.
pub type Interior2x1 = [[[i32; 5]; 5]; 5];

/// 2x2 interior loop energies, indexed by the four unpaired bases from 5' to 3'.
pub type Interior2x2 = [[[[i32; 5]; 5]; 5]; 5];

/// Small interior loop tables keyed by (outer pair, inner pair seen from inside the loop).
pub type LoopTables<T> = HashMap<(PairType, PairType), T>;

/// One entry per [`PairType`], `None` where the parameter file gives no value.
pub type PairIndexed<T> = [Option<T>; 6];

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GlobalParams {
    pub min_hairpin_loop: usize,
    pub max_loop: usize,
    pub lxc: f64,
    pub terminal_au: i32,
    pub ninio: i32,
    pub max_ninio: i32,
    pub ml_closing: i32,
    pub ml_intern: i32,
    pub ml_base: i32,
    pub unfavorable: i32,
}

/// Loop initiation energies by loop size, starting at `min_size`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoopTable {
    pub min_size: usize,
    pub values: Vec<i32>,
}

impl LoopTable {
    pub fn max_size(&self) -> usize {
        (self.min_size + self.values.len()).saturating_sub(1)
    }

    /// Energy for a loop of `size` unpaired bases. Sizes past the end of the table are
    /// extrapolated logarithmically from the largest entry; sizes below `min_size` have no
    /// value.
    pub fn lookup(&self, size: usize, lxc: f64) -> Option<i32> {
        if size < self.min_size {
            return None;
        }
        if let Some(&value) = self.values.get(size - self.min_size) {
            return Some(value);
        }
        let last = *self.values.last()?;
        let ratio = size as f64 / self.max_size() as f64;
        Some(last + (lxc * ratio.ln()) as i32)
    }

    pub fn smallest(&self) -> Option<i32> {
        self.values.first().copied()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLoops {
    hairpin: LoopTable,
    bulge: LoopTable,
    interior: LoopTable,
}

type RawMatrices = HashMap<String, Vec<Vec<i32>>>;
type RawCubes = HashMap<String, Vec<Vec<Vec<i32>>>>;
type RawHypercubes = HashMap<String, Vec<Vec<Vec<Vec<i32>>>>>;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawMismatches {
    #[serde(default)]
    hairpin: RawMatrices,
    #[serde(default)]
    interior: RawMatrices,
    #[serde(default)]
    interior_1n: RawMatrices,
    #[serde(default)]
    interior_23: RawMatrices,
    #[serde(default)]
    multi: RawMatrices,
    #[serde(default)]
    exterior: RawMatrices,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParams {
    globals: GlobalParams,
    loops: RawLoops,
    #[serde(default)]
    stack: HashMap<String, HashMap<String, i32>>,
    #[serde(default)]
    dangle5: HashMap<String, Vec<i32>>,
    #[serde(default)]
    dangle3: HashMap<String, Vec<i32>>,
    #[serde(default)]
    mismatch: RawMismatches,
    #[serde(default)]
    interior_1x1: RawMatrices,
    #[serde(default)]
    interior_2x1: RawCubes,
    #[serde(default)]
    interior_2x2: RawHypercubes,
    #[serde(default)]
    special_hairpins: HashMap<String, i32>,
}

/// Validated nearest-neighbor parameter tables.
///
/// Constructed once and never mutated; folds share it through an [`Arc`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyParams {
    pub globals: GlobalParams,
    pub hairpin: LoopTable,
    pub bulge: LoopTable,
    pub interior: LoopTable,
    pub stack: [[Option<i32>; 6]; 6],
    pub dangle5: PairIndexed<[i32; 5]>,
    pub dangle3: PairIndexed<[i32; 5]>,
    pub mismatch_hairpin: PairIndexed<Mismatch>,
    pub mismatch_interior: PairIndexed<Mismatch>,
    pub mismatch_interior_1n: PairIndexed<Mismatch>,
    pub mismatch_interior_23: PairIndexed<Mismatch>,
    pub mismatch_multi: PairIndexed<Mismatch>,
    pub mismatch_exterior: PairIndexed<Mismatch>,
    /// 1x1 interior loops, indexed by the 5' and 3' unpaired base.
    pub interior_1x1: LoopTables<Mismatch>,
    pub interior_2x1: LoopTables<Interior2x1>,
    pub interior_2x2: LoopTables<Interior2x2>,
    /// Closing pair plus loop sequence (e.g. `CUUCGG`) to total hairpin energy.
    pub special_hairpins: HashMap<Vec<u8>, i32>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid parameter table '{table}' in '{path}': {reason}")]
    Invalid {
        path: String,
        table: String,
        reason: String,
    },
    #[error("Bundled parameter set is unusable: {0}")]
    Bundled(String),
}

impl EnergyParams {
    /// The bundled Turner 2004 parameter set. Parsed once per process.
    pub fn turner2004() -> Result<Arc<Self>, ParamLoadError> {
        TURNER_2004
            .as_ref()
            .map(Arc::clone)
            .map_err(|message| ParamLoadError::Bundled(message.clone()))
    }

    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.to_string_lossy())
    }

    /// Parses and validates a parameter document. `origin` names the source in errors.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ParamLoadError> {
        let raw: RawParams = toml::from_str(content).map_err(|e| ParamLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        Validator { origin }.convert(raw)
    }
}

struct Validator<'a> {
    origin: &'a str,
}

impl Validator<'_> {
    fn invalid(&self, table: &str, reason: impl Into<String>) -> ParamLoadError {
        ParamLoadError::Invalid {
            path: self.origin.to_string(),
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    fn convert(&self, raw: RawParams) -> Result<EnergyParams, ParamLoadError> {
        self.check_globals(&raw.globals)?;
        self.check_loop_table("loops.hairpin", &raw.loops.hairpin, 0)?;
        self.check_loop_table("loops.bulge", &raw.loops.bulge, 1)?;
        self.check_loop_table("loops.interior", &raw.loops.interior, 2)?;

        let mismatch = raw.mismatch;
        Ok(EnergyParams {
            stack: self.stack_table(&raw.stack)?,
            dangle5: self.dangle_table("dangle5", &raw.dangle5)?,
            dangle3: self.dangle_table("dangle3", &raw.dangle3)?,
            mismatch_hairpin: self.mismatch_table("mismatch.hairpin", &mismatch.hairpin)?,
            mismatch_interior: self.mismatch_table("mismatch.interior", &mismatch.interior)?,
            mismatch_interior_1n: self
                .mismatch_table("mismatch.interior_1n", &mismatch.interior_1n)?,
            mismatch_interior_23: self
                .mismatch_table("mismatch.interior_23", &mismatch.interior_23)?,
            mismatch_multi: self.mismatch_table("mismatch.multi", &mismatch.multi)?,
            mismatch_exterior: self.mismatch_table("mismatch.exterior", &mismatch.exterior)?,
            interior_1x1: self.loop_tables("interior_1x1", &raw.interior_1x1, |name, rows| {
                self.matrix(name, rows)
            })?,
            interior_2x1: self.loop_tables("interior_2x1", &raw.interior_2x1, |name, rows| {
                self.cube(name, rows)
            })?,
            interior_2x2: self.loop_tables("interior_2x2", &raw.interior_2x2, |name, rows| {
                self.hypercube(name, rows)
            })?,
            special_hairpins: self.special_hairpins(&raw.special_hairpins)?,
            globals: raw.globals,
            hairpin: raw.loops.hairpin,
            bulge: raw.loops.bulge,
            interior: raw.loops.interior,
        })
    }

    fn check_globals(&self, globals: &GlobalParams) -> Result<(), ParamLoadError> {
        if globals.max_loop == 0 {
            return Err(self.invalid("globals", "max_loop must be positive"));
        }
        if !globals.lxc.is_finite() || globals.lxc < 0.0 {
            return Err(self.invalid("globals", "lxc must be a finite, non-negative number"));
        }
        if globals.unfavorable <= 0 {
            return Err(self.invalid("globals", "unfavorable must be positive"));
        }
        if globals.max_ninio < 0 {
            return Err(self.invalid("globals", "max_ninio must not be negative"));
        }
        Ok(())
    }

    fn check_loop_table(
        &self,
        name: &str,
        table: &LoopTable,
        smallest_size: usize,
    ) -> Result<(), ParamLoadError> {
        if table.values.is_empty() {
            return Err(self.invalid(name, "table has no values"));
        }
        if table.min_size < smallest_size {
            return Err(self.invalid(
                name,
                format!("min_size must be at least {}", smallest_size),
            ));
        }
        Ok(())
    }

    fn pair(&self, table: &str, name: &str) -> Result<PairType, ParamLoadError> {
        PairType::from_name(name)
            .ok_or_else(|| self.invalid(table, format!("unknown pair type '{}'", name)))
    }

    fn stack_table(
        &self,
        raw: &HashMap<String, HashMap<String, i32>>,
    ) -> Result<[[Option<i32>; 6]; 6], ParamLoadError> {
        let mut table = [[None; 6]; 6];
        for (outer, row) in raw {
            let outer = self.pair("stack", outer)?;
            for (inner, &value) in row {
                let inner = self.pair("stack", inner)?;
                table[outer.index()][inner.index()] = Some(value);
            }
        }
        Ok(table)
    }

    fn dangle_table(
        &self,
        name: &str,
        raw: &HashMap<String, Vec<i32>>,
    ) -> Result<PairIndexed<[i32; 5]>, ParamLoadError> {
        let mut table = [None; 6];
        for (pair, values) in raw {
            let pair = self.pair(name, pair)?;
            let row: [i32; 5] = values.as_slice().try_into().map_err(|_| {
                self.invalid(name, format!("expected 5 values, found {}", values.len()))
            })?;
            table[pair.index()] = Some(row);
        }
        Ok(table)
    }

    fn matrix(&self, name: &str, rows: &[Vec<i32>]) -> Result<Mismatch, ParamLoadError> {
        let mut matrix = [[0; 5]; 5];
        if rows.len() != 5 {
            return Err(self.invalid(name, format!("expected 5 rows, found {}", rows.len())));
        }
        for (target, row) in matrix.iter_mut().zip(rows) {
            *target = row.as_slice().try_into().map_err(|_| {
                self.invalid(name, format!("expected 5 columns, found {}", row.len()))
            })?;
        }
        Ok(matrix)
    }

    fn mismatch_table(
        &self,
        name: &str,
        raw: &RawMatrices,
    ) -> Result<PairIndexed<Mismatch>, ParamLoadError> {
        let mut table = [None; 6];
        for (pair, rows) in raw {
            let pair = self.pair(name, pair)?;
            table[pair.index()] = Some(self.matrix(name, rows)?);
        }
        Ok(table)
    }

    fn cube(&self, name: &str, slices: &[Vec<Vec<i32>>]) -> Result<Interior2x1, ParamLoadError> {
        let mut cube = [[[0; 5]; 5]; 5];
        if slices.len() != 5 {
            return Err(self.invalid(name, format!("expected 5 matrices, found {}", slices.len())));
        }
        for (target, rows) in cube.iter_mut().zip(slices) {
            *target = self.matrix(name, rows)?;
        }
        Ok(cube)
    }

    fn hypercube(
        &self,
        name: &str,
        cubes: &[Vec<Vec<Vec<i32>>>],
    ) -> Result<Interior2x2, ParamLoadError> {
        let mut hypercube = [[[[0; 5]; 5]; 5]; 5];
        if cubes.len() != 5 {
            return Err(self.invalid(name, format!("expected 5 cubes, found {}", cubes.len())));
        }
        for (target, slices) in hypercube.iter_mut().zip(cubes) {
            *target = self.cube(name, slices)?;
        }
        Ok(hypercube)
    }

    /// Parses a table keyed by `OUTER-INNER` pair names.
    fn loop_tables<R, T, F>(
        &self,
        name: &str,
        raw: &HashMap<String, R>,
        parse: F,
    ) -> Result<LoopTables<T>, ParamLoadError>
    where
        F: Fn(&str, &R) -> Result<T, ParamLoadError>,
    {
        raw.iter()
            .map(|(key, values)| {
                let (outer, inner) = key.split_once('-').ok_or_else(|| {
                    self.invalid(name, format!("key '{}' is not of the form OUTER-INNER", key))
                })?;
                let pairs = (self.pair(name, outer)?, self.pair(name, inner)?);
                Ok((pairs, parse(name, values)?))
            })
            .collect()
    }

    fn special_hairpins(
        &self,
        raw: &HashMap<String, i32>,
    ) -> Result<HashMap<Vec<u8>, i32>, ParamLoadError> {
        let name = "special_hairpins";
        raw.iter()
            .map(|(motif, &energy)| {
                let valid_symbols = motif.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'U'));
                if motif.len() < 3 || !valid_symbols {
                    return Err(self.invalid(
                        name,
                        format!("motif '{}' must be at least 3 bases of A, C, G, U", motif),
                    ));
                }
                Ok((motif.as_bytes().to_vec(), energy))
            })
            .collect()
    }
}
