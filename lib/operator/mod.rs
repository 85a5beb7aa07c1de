//! Dense complex square matrices acting on a spin system's Hilbert space.
//!
//! [`Operator`] is a plain value type: every algebraic operation returns a new
//! `Operator`. The refinements [`Observable`] (Hermitian) and
//! [`DensityMatrix`] (Hermitian, unit-trace, positive semidefinite) are
//! obtained by validation and degrade back to plain `Operator`s under
//! arithmetic.
//!
//! The `std::ops` implementations panic on dimension mismatch, the same way
//! `ndarray`'s do; use the `checked_*` methods for a fallible version.

use std::{
    f64::consts::TAU,
    ops::{ Add, Div, Mul, Neg, Sub },
};
use ndarray::{ self as nd, linalg::kron };
use ndarray_linalg::{ Eig, Eigh, Inverse, UPLO };
use num_complex::Complex64 as C64;
use crate::{
    constants::EPSILON,
    error::{ Error, Result },
};

mod expm;
pub mod observable;
pub mod density;
pub mod random;

pub use observable::Observable;
pub use density::{ DensityMatrix, canonical_density_matrix };
pub use random::{ random_operator, random_observable, random_density_matrix };

/// A `d × d` complex matrix, `d ≥ 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct Operator {
    pub(crate) matrix: nd::Array2<C64>,
}

impl AsRef<Operator> for Operator {
    fn as_ref(&self) -> &Operator { self }
}

fn check_elements(matrix: &nd::Array2<C64>) -> Result<()> {
    match matrix.indexed_iter().find(|(_, z)| !(z.re.is_finite() && z.im.is_finite())) {
        Some(((i, j), z))
            => Err(Error::NotComplex { index: (i, j), found: z.to_string() }),
        None => Ok(()),
    }
}

fn check_finite(matrix: nd::Array2<C64>, context: &'static str)
    -> Result<nd::Array2<C64>>
{
    if matrix.iter().all(|z| z.re.is_finite() && z.im.is_finite()) {
        Ok(matrix)
    } else {
        Err(Error::NonFinite(context))
    }
}

/// Reassemble `V diag(w) V^†` from an eigen-decomposition.
pub(crate) fn spectral(V: &nd::Array2<C64>, w: &nd::Array1<C64>)
    -> nd::Array2<C64>
{
    let Vw: nd::Array2<C64> = V * &w.view().insert_axis(nd::Axis(0));
    Vw.dot(&V.t().mapv(|v| v.conj()))
}

impl Operator {
    /// Create a new `Operator` from a square array of finite complex numbers.
    pub fn new(matrix: nd::Array2<C64>) -> Result<Self> {
        let (n, m) = matrix.dim();
        if n != m || n == 0 {
            return Err(Error::NotSquare(vec![n, m]));
        }
        check_elements(&matrix)?;
        Ok(Self { matrix })
    }

    /// Create a new `Operator` from a square array of real numbers.
    pub fn from_real(matrix: &nd::Array2<f64>) -> Result<Self> {
        Self::new(matrix.mapv(C64::from))
    }

    /// Create a new `Operator` from nested rows.
    ///
    /// Ragged or non-square input produces [`Error::NotSquare`].
    pub fn from_rows<T>(rows: &[Vec<T>]) -> Result<Self>
    where T: Into<C64> + Copy
    {
        let n = rows.len();
        if let Some(row) = rows.iter().find(|row| row.len() != n) {
            return Err(Error::NotSquare(vec![n, row.len()]));
        }
        let matrix: nd::Array2<C64>
            = nd::Array2::from_shape_fn((n, n), |(i, j)| rows[i][j].into());
        Self::new(matrix)
    }

    /// Create the `d × d` identity.
    pub fn identity(d: usize) -> Result<Self> {
        if d == 0 { return Err(Error::NotSquare(vec![0, 0])); }
        Ok(Self::eye(d))
    }

    pub(crate) fn eye(d: usize) -> Self {
        Self { matrix: nd::Array2::eye(d) }
    }

    pub(crate) fn zeros(d: usize) -> Self {
        Self { matrix: nd::Array2::zeros((d, d)) }
    }

    pub(crate) fn from_matrix_unchecked(matrix: nd::Array2<C64>) -> Self {
        Self { matrix }
    }

    /// Create a new `Operator` from a dynamically typed TOML value.
    ///
    /// Accepted forms are a positive integer `d` (the `d × d` identity) or an
    /// array of equal-length arrays whose elements are either numbers or
    /// `[re, im]` pairs.
    pub fn from_toml(value: &toml::Value) -> Result<Self> {
        match value {
            toml::Value::Integer(d) if *d >= 1 => Ok(Self::eye(*d as usize)),
            toml::Value::Integer(d)
                => Err(Error::invalid("dimension", format!("expected d >= 1, got {}", d))),
            toml::Value::Array(rows) => {
                let n = rows.len();
                let mut matrix: nd::Array2<C64> = nd::Array2::zeros((n, n));
                for (i, row) in rows.iter().enumerate() {
                    let row = match row {
                        toml::Value::Array(row) => row,
                        _ => { return Err(Error::NotSquare(vec![n])); },
                    };
                    if row.len() != n {
                        return Err(Error::NotSquare(vec![n, row.len()]));
                    }
                    for (j, elem) in row.iter().enumerate() {
                        matrix[[i, j]] = toml_complex(elem)
                            .ok_or_else(|| Error::NotComplex {
                                index: (i, j),
                                found: elem.to_string(),
                            })?;
                    }
                }
                Self::new(matrix)
            },
            other => Err(Error::UnsupportedType(other.type_str().to_string())),
        }
    }

    /// Return the dimension `d` of the Hilbert space.
    pub fn dim(&self) -> usize { self.matrix.nrows() }

    /// Return a reference to the underlying matrix.
    pub fn matrix(&self) -> &nd::Array2<C64> { &self.matrix }

    /// Consume `self` and return the underlying matrix.
    pub fn into_matrix(self) -> nd::Array2<C64> { self.matrix }

    fn check_dim(&self, other: &Operator) -> Result<()> {
        if self.dim() == other.dim() {
            Ok(())
        } else {
            Err(Error::DimensionMismatch(self.dim(), other.dim()))
        }
    }

    /// Add two operators, failing if their dimensions differ.
    pub fn checked_add(&self, other: &Operator) -> Result<Operator> {
        self.check_dim(other)?;
        Ok(Self { matrix: &self.matrix + &other.matrix })
    }

    /// Subtract two operators, failing if their dimensions differ.
    pub fn checked_sub(&self, other: &Operator) -> Result<Operator> {
        self.check_dim(other)?;
        Ok(Self { matrix: &self.matrix - &other.matrix })
    }

    /// Multiply two operators, failing if their dimensions differ.
    pub fn checked_mul(&self, other: &Operator) -> Result<Operator> {
        self.check_dim(other)?;
        Ok(Self { matrix: self.matrix.dot(&other.matrix) })
    }

    /// Compute the inverse.
    pub fn inverse(&self) -> Result<Self> {
        let inv = self.matrix.inv()?;
        Ok(Self { matrix: check_finite(inv, "matrix inversion")? })
    }

    /// Raise to an integer power by repeated squaring. Negative powers act on
    /// the inverse.
    pub fn pow(&self, k: i32) -> Result<Self> {
        let mut base: nd::Array2<C64>
            = if k < 0 { self.inverse()?.matrix } else { self.matrix.clone() };
        let mut acc: nd::Array2<C64> = nd::Array2::eye(self.dim());
        let mut e = k.unsigned_abs();
        while e > 0 {
            if e & 1 == 1 { acc = acc.dot(&base); }
            e >>= 1;
            if e > 0 { base = base.dot(&base); }
        }
        Ok(Self { matrix: check_finite(acc, "matrix power")? })
    }

    /// Compute the matrix exponential.
    ///
    /// Hermitian and anti-Hermitian inputs are exponentiated through their
    /// eigen-decomposition, so that `exp(-iH)` is unitary to machine
    /// precision; all others use Padé scaling and squaring.
    pub fn exp(&self) -> Result<Self> {
        let scale = self.max_abs().max(1.0);
        let herm = self.hermiticity_defect(1.0) / scale;
        let anti = self.hermiticity_defect(-1.0) / scale;
        let E: nd::Array2<C64>
            = if herm <= EPSILON && herm <= anti {
                let (w, V) = self.matrix.eigh(UPLO::Lower)?;
                spectral(&V, &w.mapv(|wk| C64::from(wk.exp())))
            } else if anti <= EPSILON {
                // A = -iK with K = iA Hermitian
                let K: nd::Array2<C64> = self.matrix.mapv(|a| C64::i() * a);
                let (w, V) = K.eigh(UPLO::Lower)?;
                spectral(&V, &w.mapv(|wk| C64::from_polar(1.0, -wk)))
            } else {
                expm::pade_exp(&self.matrix)?
            };
        Ok(Self { matrix: check_finite(E, "matrix exponential")? })
    }

    /// Return the conjugate transpose.
    pub fn dagger(&self) -> Self {
        Self { matrix: self.matrix.t().mapv(|a| a.conj()) }
    }

    /// Return the trace.
    pub fn trace(&self) -> C64 { self.matrix.diag().sum() }

    /// Compute eigenvalues and the matrix whose columns are the corresponding
    /// right eigenvectors.
    pub fn diagonalisation(&self) -> Result<(nd::Array1<C64>, Operator)> {
        let (w, V) = self.matrix.eig()?;
        Ok((w, Self { matrix: V }))
    }

    /// Compute `basis⁻¹ · self · basis`.
    pub fn sim_trans(&self, basis: &Operator) -> Result<Operator> {
        self.check_dim(basis)?;
        let binv = basis.inverse()?;
        Ok(Self { matrix: binv.matrix.dot(&self.matrix).dot(&basis.matrix) })
    }

    /// Cast into the picture generated by `h` at time `t`:
    /// `exp(i2πht) · self · exp(-i2πht)`, or the reverse transformation if
    /// `invert` is `true`.
    pub fn changed_picture(&self, h: &Operator, t: f64, invert: bool)
        -> Result<Operator>
    {
        self.check_dim(h)?;
        let sign: f64 = if invert { -1.0 } else { 1.0 };
        let fwd = (h * C64::new(0.0, sign * TAU * t)).exp()?;
        let bkw = (h * C64::new(0.0, -sign * TAU * t)).exp()?;
        Ok(Self { matrix: fwd.matrix.dot(&self.matrix).dot(&bkw.matrix) })
    }

    /// Return the Kronecker product `self ⊗ other`.
    pub fn kron(&self, other: &Operator) -> Operator {
        Self { matrix: kron(&self.matrix, &other.matrix) }
    }

    /// Return the largest absolute value over all matrix elements.
    pub fn max_abs(&self) -> f64 {
        self.matrix.iter().map(|a| a.norm()).fold(0.0, f64::max)
    }

    /// Return the largest elementwise absolute difference from `other`.
    ///
    /// *Panics* if the dimensions differ.
    pub fn max_abs_diff(&self, other: &Operator) -> f64 {
        self.matrix.iter().zip(other.matrix.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    // largest elementwise deviation of `A - sign * A^†`
    fn hermiticity_defect(&self, sign: f64) -> f64 {
        let n = self.dim();
        let mut defect: f64 = 0.0;
        for i in 0..n {
            for j in i..n {
                let dev = (self.matrix[[i, j]] - sign * self.matrix[[j, i]].conj()).norm();
                defect = defect.max(dev);
            }
        }
        defect
    }

    /// Return `true` if no element of `self` deviates from its conjugate
    /// transpose by more than [`EPSILON`].
    pub fn is_hermitian(&self) -> bool { self.hermiticity_defect(1.0) <= EPSILON }

    /// Return `true` if no element of `self` deviates from minus its
    /// conjugate transpose by more than [`EPSILON`].
    pub fn is_anti_hermitian(&self) -> bool {
        self.hermiticity_defect(-1.0) <= EPSILON
    }

    /// Return `(A + A^†) / 2`.
    pub fn hermitian_part(&self) -> Operator {
        Self { matrix: (&self.matrix + &self.dagger().matrix) / C64::from(2.0) }
    }

    /// Return `(A - A^†) / 2`.
    pub fn anti_hermitian_part(&self) -> Operator {
        Self { matrix: (&self.matrix - &self.dagger().matrix) / C64::from(2.0) }
    }

    /// Re-tag as an [`Observable`].
    pub fn cast_to_observable(self) -> Result<Observable> {
        Observable::new(self)
    }

    /// Re-tag as a [`DensityMatrix`], failing with the list of missing
    /// properties.
    pub fn cast_to_density_matrix(self) -> Result<DensityMatrix> {
        DensityMatrix::new(self)
    }
}

pub(crate) fn toml_real(value: &toml::Value) -> Option<f64> {
    match value {
        toml::Value::Integer(x) => Some(*x as f64),
        toml::Value::Float(x) => Some(*x),
        _ => None,
    }
}

pub(crate) fn toml_complex(value: &toml::Value) -> Option<C64> {
    let z = match value {
        toml::Value::Array(pair) if pair.len() == 2
            => C64::new(toml_real(&pair[0])?, toml_real(&pair[1])?),
        other => C64::from(toml_real(other)?),
    };
    (z.re.is_finite() && z.im.is_finite()).then_some(z)
}

/// Compute the commutator `[A, B] = A B - B A`.
///
/// *Panics* if the dimensions differ.
pub fn commutator<A, B>(a: &A, b: &B) -> Operator
where
    A: AsRef<Operator>,
    B: AsRef<Operator>,
{
    let a = &a.as_ref().matrix;
    let b = &b.as_ref().matrix;
    Operator { matrix: a.dot(b) - b.dot(a) }
}

/* Arithmetic ****************************************************************/

macro_rules! impl_op_op {
    ( @single $lhs:ty, $rhs:ty ) => {
        impl Add<$rhs> for $lhs {
            type Output = Operator;

            fn add(self, rhs: $rhs) -> Operator {
                let a: &Operator = AsRef::<Operator>::as_ref(&self);
                let b: &Operator = AsRef::<Operator>::as_ref(&rhs);
                Operator { matrix: &a.matrix + &b.matrix }
            }
        }

        impl Sub<$rhs> for $lhs {
            type Output = Operator;

            fn sub(self, rhs: $rhs) -> Operator {
                let a: &Operator = AsRef::<Operator>::as_ref(&self);
                let b: &Operator = AsRef::<Operator>::as_ref(&rhs);
                Operator { matrix: &a.matrix - &b.matrix }
            }
        }

        impl Mul<$rhs> for $lhs {
            type Output = Operator;

            fn mul(self, rhs: $rhs) -> Operator {
                let a: &Operator = AsRef::<Operator>::as_ref(&self);
                let b: &Operator = AsRef::<Operator>::as_ref(&rhs);
                Operator { matrix: a.matrix.dot(&b.matrix) }
            }
        }
    };
    ( $lhs:ty; $( $rhs:ty ),* $(,)? ) => {
        $( impl_op_op!(@single $lhs, $rhs); )*
    };
}

macro_rules! impl_op_scalar {
    ( @single $t:ty, $s:ty ) => {
        impl Mul<$s> for $t {
            type Output = Operator;

            fn mul(self, rhs: $s) -> Operator {
                let a: &Operator = AsRef::<Operator>::as_ref(&self);
                Operator { matrix: &a.matrix * C64::from(rhs) }
            }
        }

        impl Mul<$t> for $s {
            type Output = Operator;

            fn mul(self, rhs: $t) -> Operator {
                let a: &Operator = AsRef::<Operator>::as_ref(&rhs);
                Operator { matrix: &a.matrix * C64::from(self) }
            }
        }

        impl Div<$s> for $t {
            type Output = Operator;

            fn div(self, rhs: $s) -> Operator {
                let a: &Operator = AsRef::<Operator>::as_ref(&self);
                Operator { matrix: &a.matrix / C64::from(rhs) }
            }
        }
    };
    ( $( $t:ty ),* $(,)? ) => {
        $(
            impl_op_scalar!(@single $t, f64);
            impl_op_scalar!(@single $t, C64);

            impl Neg for $t {
                type Output = Operator;

                fn neg(self) -> Operator {
                    let a: &Operator = AsRef::<Operator>::as_ref(&self);
                    Operator { matrix: a.matrix.mapv(|x| -x) }
                }
            }
        )*
    };
}

impl_op_op!(Operator;
    Operator, &Operator, Observable, &Observable, DensityMatrix, &DensityMatrix);
impl_op_op!(&Operator;
    Operator, &Operator, Observable, &Observable, DensityMatrix, &DensityMatrix);
impl_op_op!(Observable;
    Operator, &Operator, Observable, &Observable, DensityMatrix, &DensityMatrix);
impl_op_op!(&Observable;
    Operator, &Operator, Observable, &Observable, DensityMatrix, &DensityMatrix);
impl_op_op!(DensityMatrix;
    Operator, &Operator, Observable, &Observable, DensityMatrix, &DensityMatrix);
impl_op_op!(&DensityMatrix;
    Operator, &Operator, Observable, &Observable, DensityMatrix, &DensityMatrix);
impl_op_scalar!(
    Operator, &Operator, Observable, &Observable, DensityMatrix, &DensityMatrix);
