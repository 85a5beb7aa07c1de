//! Nuclear spin quantum numbers and the associated angular momentum
//! operators.
//!
//! Single-spin matrices are written in the basis `|I, m⟩` ordered by
//! descending projection `m = I, I - 1, ..., -I`; basis index `k` corresponds
//! to `m = I - k`.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    error::{ Error, Result },
    operator::{ Observable, Operator },
};

/// A single spin-projection quantum number.
///
/// This type is backed by a single `i32` representing the number of halves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpinProj(i32);

impl SpinProj {
    /// Create a new spin projection from a number of halves.
    pub fn new(m: i32) -> Self { Self(m) }

    /// Return `self` as a bare number of halves.
    pub fn halves(self) -> i32 { self.0 }

    /// Return `self` as an `f64`.
    pub fn f(self) -> f64 { f64::from(self.0) / 2.0 }
}

impl From<SpinProj> for f64 {
    fn from(m: SpinProj) -> Self { m.f() }
}

/// A single total-spin quantum number.
///
/// This type is backed by a single `u32` representing the number of halves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpinTotal(u32);

impl SpinTotal {
    /// Create a new total spin from a number of halves.
    pub fn new(j: u32) -> Self { Self(j) }

    /// Return `self` as a bare number of halves.
    pub fn halves(self) -> u32 { self.0 }

    /// Return `self` as an `f64`.
    pub fn f(self) -> f64 { f64::from(self.0) / 2.0 }

    /// Create a new total-spin quantum number from a `f64` value.
    ///
    /// Fails unless `f` is a non-negative integer multiple of 1/2.
    pub fn from_f64(f: f64) -> Result<Self> {
        let halves = 2.0 * f;
        if !f.is_finite() || f < 0.0 || (halves - halves.round()).abs() > 1e-9 {
            return Err(Error::InvalidQuantumNumber(f));
        }
        Ok(Self(halves.round() as u32))
    }

    /// Return the dimension `2I + 1` of the associated Hilbert space.
    pub fn dim(self) -> usize { self.0 as usize + 1 }

    /// Return an iterator over projections in basis order, i.e. from `+I`
    /// down to `-I`.
    pub fn projections(self) -> Projections {
        Projections { cur: self.0 as i32, min: -(self.0 as i32) }
    }
}

impl From<SpinTotal> for f64 {
    fn from(j: SpinTotal) -> Self { j.f() }
}

/// Iterator over the projections of a [`SpinTotal`], descending.
#[derive(Clone, Debug)]
pub struct Projections {
    cur: i32,
    min: i32,
}

impl Iterator for Projections {
    type Item = SpinProj;

    fn next(&mut self) -> Option<SpinProj> {
        (self.cur >= self.min).then(|| {
            let m = SpinProj(self.cur);
            self.cur -= 2;
            m
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.cur >= self.min { ((self.cur - self.min) / 2 + 1) as usize } else { 0 };
        (n, Some(n))
    }
}

impl ExactSizeIterator for Projections { }

/// Selector for one of the angular momentum operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    X,
    Y,
    Z,
    /// `I+ = I_x + i I_y`
    Raising,
    /// `I- = I_x - i I_y`
    Lowering,
}

/// The angular momentum operators of a single spin.
#[derive(Clone, Debug, PartialEq)]
pub struct AngularMomentum {
    x: Observable,
    y: Observable,
    z: Observable,
    raising: Operator,
    lowering: Operator,
}

impl AngularMomentum {
    /// Build the operators for total spin `j`.
    pub fn new(j: SpinTotal) -> Self {
        let n = j.dim();
        let jf = j.f();
        let mut raising: nd::Array2<C64> = nd::Array2::zeros((n, n));
        let mut z: nd::Array2<C64> = nd::Array2::zeros((n, n));
        for (k, m) in j.projections().enumerate() {
            let mf = m.f();
            z[[k, k]] = C64::from(mf);
            if k > 0 {
                raising[[k - 1, k]] = C64::from((jf * (jf + 1.0) - mf * (mf + 1.0)).sqrt());
            }
        }
        let raising = Operator::from_matrix_unchecked(raising);
        let lowering = raising.dagger();
        let x = (&raising + &lowering) / 2.0;
        let y = (&raising - &lowering) / C64::new(0.0, 2.0);
        Self {
            x: Observable::hermitian_part_of(&x),
            y: Observable::hermitian_part_of(&y),
            z: Observable::hermitian_part_of(&Operator::from_matrix_unchecked(z)),
            raising,
            lowering,
        }
    }

    /// Return the operator for a single component.
    pub fn get(&self, comp: Component) -> &Operator {
        match comp {
            Component::X => self.x.as_operator(),
            Component::Y => self.y.as_operator(),
            Component::Z => self.z.as_operator(),
            Component::Raising => &self.raising,
            Component::Lowering => &self.lowering,
        }
    }

    /// Return `[I_x, I_y, I_z]`.
    pub fn cartesian(&self) -> [&Observable; 3] { [&self.x, &self.y, &self.z] }

    pub fn x(&self) -> &Observable { &self.x }

    pub fn y(&self) -> &Observable { &self.y }

    pub fn z(&self) -> &Observable { &self.z }

    pub fn raising(&self) -> &Operator { &self.raising }

    pub fn lowering(&self) -> &Operator { &self.lowering }
}

/// A single nuclear spin: total angular momentum, gyromagnetic ratio, and the
/// associated operators.
#[derive(Clone, Debug, PartialEq)]
pub struct NuclearSpin {
    quantum_number: SpinTotal,
    gyro_ratio: f64,
    ops: AngularMomentum,
}

impl NuclearSpin {
    /// Create a new `NuclearSpin` with spin quantum number `quantum_number`
    /// and gyromagnetic ratio over 2π `gyro_ratio` (in MHz/T).
    pub fn new(quantum_number: f64, gyro_ratio: f64) -> Result<Self> {
        let j = SpinTotal::from_f64(quantum_number)?;
        if !gyro_ratio.is_finite() {
            return Err(Error::invalid("gamma/2pi", "must be finite"));
        }
        Ok(Self { quantum_number: j, gyro_ratio, ops: AngularMomentum::new(j) })
    }

    /// Return the total spin.
    pub fn total(&self) -> SpinTotal { self.quantum_number }

    /// Return the spin quantum number `I`.
    pub fn quantum_number(&self) -> f64 { self.quantum_number.f() }

    /// Return γ/2π in MHz/T.
    pub fn gyro_ratio(&self) -> f64 { self.gyro_ratio }

    /// Return `2I + 1`.
    pub fn dim(&self) -> usize { self.quantum_number.dim() }

    /// Return the angular momentum operators.
    pub fn ops(&self) -> &AngularMomentum { &self.ops }

    /// Return the operator for a single component.
    pub fn operator(&self, comp: Component) -> &Operator { self.ops.get(comp) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{ commutator, tests::assert_close };

    #[test]
    fn quantum_number_validation() {
        assert_eq!(SpinTotal::from_f64(1.5).unwrap().halves(), 3);
        assert_eq!(SpinTotal::from_f64(0.0).unwrap().dim(), 1);
        assert!(matches!(SpinTotal::from_f64(1.3), Err(Error::InvalidQuantumNumber(_))));
        assert!(matches!(SpinTotal::from_f64(-0.5), Err(Error::InvalidQuantumNumber(_))));
        assert!(NuclearSpin::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn projections_descend() {
        let m: Vec<f64> = SpinTotal::new(3).projections().map(f64::from).collect();
        assert_eq!(m, vec![1.5, 0.5, -0.5, -1.5]);
        assert_eq!(SpinTotal::new(4).projections().len(), 5);
    }

    #[test]
    fn angular_momentum_algebra() {
        for halves in 0..=9 {
            let spin = NuclearSpin::new(halves as f64 / 2.0, 1.0).unwrap();
            let ops = spin.ops();
            let d = spin.dim();
            let i = spin.quantum_number();
            let [x, y, z] = ops.cartesian();
            assert_close(&commutator(x, y), &(z.as_operator() * C64::i()));
            assert_close(&commutator(y, z), &(x.as_operator() * C64::i()));
            let casimir = &(x * x) + &(y * y) + z * z;
            assert_close(&casimir, &(Operator::identity(d).unwrap() * (i * (i + 1.0))));
            assert_close(
                ops.get(Component::Raising),
                &(x.as_operator() + y.as_operator() * C64::i()),
            );
        }
    }

    #[test]
    fn raising_matrix_elements() {
        let spin = NuclearSpin::new(1.0, 1.0).unwrap();
        let raising = spin.operator(Component::Raising).matrix();
        assert!((raising[[0, 1]].re - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!((raising[[1, 2]].re - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(raising[[1, 0]], C64::from(0.0));
        assert_eq!(spin.operator(Component::Z).matrix()[[0, 0]], C64::from(1.0));
    }
}
