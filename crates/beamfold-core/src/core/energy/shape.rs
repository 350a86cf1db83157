//! SHAPE reactivity profiles and their conversion to pseudo-free energies.
//!
//! A reactivity `r` becomes the pseudo-energy `slope * ln(r + 1) + intercept` (kcal/mol),
//! charged once per nucleotide of both pairs in every stacked pair. Missing, negative or
//! non-finite reactivities carry no data and contribute nothing.

/// Linear-log transform parameters, in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeTransform {
    pub slope: f64,
    pub intercept: f64,
}

impl Default for ShapeTransform {
    fn default() -> Self {
        Self {
            slope: 1.8,
            intercept: -0.6,
        }
    }
}

impl ShapeTransform {
    pub fn is_finite(&self) -> bool {
        self.slope.is_finite() && self.intercept.is_finite()
    }

    /// Pseudo-energy in dcal/mol for a single reactivity, `None` when it carries no data.
    pub fn pseudo_energy(&self, reactivity: Option<f64>) -> Option<i32> {
        let r = reactivity.filter(|r| r.is_finite() && *r >= 0.0)?;
        Some(((self.slope * (r + 1.0).ln() + self.intercept) * 100.0).round() as i32)
    }
}

/// Per-position reactivities aligned to a sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeProfile {
    reactivities: Vec<Option<f64>>,
}

impl ShapeProfile {
    pub fn new(reactivities: Vec<Option<f64>>) -> Self {
        Self { reactivities }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.reactivities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reactivities.is_empty()
    }

    pub fn reactivity(&self, position: usize) -> Option<f64> {
        self.reactivities.get(position).copied().flatten()
    }

    pub fn pseudo_energies(&self, transform: &ShapeTransform) -> ShapeBonus {
        ShapeBonus {
            per_base: self
                .reactivities
                .iter()
                .map(|&r| transform.pseudo_energy(r).unwrap_or(0))
                .collect(),
        }
    }
}

impl FromIterator<Option<f64>> for ShapeProfile {
    fn from_iter<I: IntoIterator<Item = Option<f64>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Precomputed per-base pseudo-energies (dcal/mol). Empty means no SHAPE data at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShapeBonus {
    per_base: Vec<i32>,
}

impl ShapeBonus {
    #[inline]
    pub fn at(&self, position: usize) -> i32 {
        self.per_base.get(position).copied().unwrap_or(0)
    }

    /// Contribution of the stacked pairs `(p, q)` outside `(i, j)`.
    #[inline]
    pub fn helix(&self, p: usize, i: usize, j: usize, q: usize) -> i32 {
        if self.per_base.is_empty() {
            return 0;
        }
        self.at(p) + self.at(i) + self.at(j) + self.at(q)
    }
}
