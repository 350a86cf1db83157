use std::ops::{Add, AddAssign};

/// Free energy broken down by loop type, in dcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnergyTerm {
    pub hairpin: i32,
    pub stack: i32,
    pub bulge: i32,
    pub interior: i32,
    pub multi: i32,
    pub exterior: i32,
    pub shape: i32,
}

impl EnergyTerm {
    pub fn hairpin(value: i32) -> Self {
        Self {
            hairpin: value,
            ..Self::default()
        }
    }

    pub fn stack(value: i32) -> Self {
        Self {
            stack: value,
            ..Self::default()
        }
    }

    pub fn bulge(value: i32) -> Self {
        Self {
            bulge: value,
            ..Self::default()
        }
    }

    pub fn interior(value: i32) -> Self {
        Self {
            interior: value,
            ..Self::default()
        }
    }

    pub fn multi(value: i32) -> Self {
        Self {
            multi: value,
            ..Self::default()
        }
    }

    pub fn exterior(value: i32) -> Self {
        Self {
            exterior: value,
            ..Self::default()
        }
    }

    pub fn shape(value: i32) -> Self {
        Self {
            shape: value,
            ..Self::default()
        }
    }

    #[inline]
    pub fn total(&self) -> i32 {
        self.hairpin
            + self.stack
            + self.bulge
            + self.interior
            + self.multi
            + self.exterior
            + self.shape
    }

    /// Total in kcal/mol.
    #[inline]
    pub fn kcal(&self) -> f64 {
        self.total() as f64 / 100.0
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            hairpin: self.hairpin + rhs.hairpin,
            stack: self.stack + rhs.stack,
            bulge: self.bulge + rhs.bulge,
            interior: self.interior + rhs.interior,
            multi: self.multi + rhs.multi,
            exterior: self.exterior + rhs.exterior,
            shape: self.shape + rhs.shape,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sums_every_loop_type() {
        let term = EnergyTerm {
            hairpin: 540,
            stack: -660,
            bulge: 10,
            interior: 20,
            multi: 30,
            exterior: -40,
            shape: 5,
        };
        assert_eq!(term.total(), -95);
    }

    #[test]
    fn kcal_converts_from_dcal() {
        let term = EnergyTerm::hairpin(540) + EnergyTerm::stack(-660);
        assert_eq!(term.kcal(), -1.2);
    }

    #[test]
    fn add_assign_accumulates_per_field() {
        let mut term = EnergyTerm::stack(-330);
        term += EnergyTerm::stack(-240);
        term += EnergyTerm::exterior(50);
        assert_eq!(term.stack, -570);
        assert_eq!(term.exterior, 50);
        assert_eq!(term.hairpin, 0);
    }

    #[test]
    fn default_is_zero() {
        assert_eq!(EnergyTerm::default().total(), 0);
    }
}
