//! Hermitian operators.

use std::ops::Deref;
use ndarray as nd;
use ndarray_linalg::{ Eigh, UPLO };
use num_complex::Complex64 as C64;
use crate::{
    constants::EPSILON,
    error::{ Error, Result },
    operator::{ DensityMatrix, Operator },
};

/// An [`Operator`] that is Hermitian within
/// [`EPSILON`][crate::constants::EPSILON].
#[derive(Clone, Debug, PartialEq)]
pub struct Observable(Operator);

impl AsRef<Operator> for Observable {
    fn as_ref(&self) -> &Operator { &self.0 }
}

impl Deref for Observable {
    type Target = Operator;

    fn deref(&self) -> &Operator { &self.0 }
}

impl From<Observable> for Operator {
    fn from(obs: Observable) -> Operator { obs.0 }
}

impl TryFrom<Operator> for Observable {
    type Error = Error;

    fn try_from(op: Operator) -> Result<Self> { Self::new(op) }
}

impl Observable {
    /// Create a new `Observable`, failing if `op` is not Hermitian.
    pub fn new(op: Operator) -> Result<Self> {
        if op.is_hermitian() { Ok(Self(op)) } else { Err(Error::NotHermitian) }
    }

    /// Create a new `Observable` from a square array.
    pub fn from_array(matrix: nd::Array2<C64>) -> Result<Self> {
        Self::new(Operator::new(matrix)?)
    }

    /// Create the `d × d` identity.
    pub fn identity(d: usize) -> Result<Self> {
        Ok(Self(Operator::identity(d)?))
    }

    /// Take the Hermitian part of `op`.
    pub fn hermitian_part_of(op: &Operator) -> Self {
        Self(op.hermitian_part())
    }

    pub(crate) fn zeros(d: usize) -> Self { Self(Operator::zeros(d)) }

    /// Return a reference to the underlying [`Operator`].
    pub fn as_operator(&self) -> &Operator { &self.0 }

    /// Strip the Hermiticity tag.
    pub fn into_operator(self) -> Operator { self.0 }

    /// Multiply by a real number.
    pub fn scaled(&self, x: f64) -> Self {
        Self(&self.0 * x)
    }

    /// Add another `Observable`.
    ///
    /// *Panics* if the dimensions differ.
    pub fn plus(&self, other: &Observable) -> Self {
        Self(&self.0 + &other.0)
    }

    /// Compute the (real, ascending) eigenvalues and the unitary matrix whose
    /// columns are the corresponding eigenvectors.
    pub fn diagonalisation(&self) -> Result<(nd::Array1<f64>, Operator)> {
        let (w, V) = self.0.matrix.eigh(UPLO::Lower)?;
        Ok((w, Operator::from_matrix_unchecked(V)))
    }

    /// Compute `tr(O ρ)`, failing if its imaginary part exceeds
    /// [`EPSILON`].
    pub fn expectation_value(&self, rho: &DensityMatrix) -> Result<f64> {
        let value = self.0.checked_mul(rho.as_operator())?.trace();
        if value.im.abs() > EPSILON {
            return Err(Error::invalid(
                "expectation value",
                format!("imaginary part {:e} exceeds tolerance", value.im),
            ));
        }
        Ok(value.re)
    }
}

/// Sum a collection of observables, returning `None` if it is empty.
///
/// *Panics* if the dimensions differ.
pub fn sum_observables<'a, I>(terms: I) -> Option<Observable>
where I: IntoIterator<Item = &'a Observable>
{
    let mut iter = terms.into_iter();
    let first = iter.next()?.clone();
    Some(iter.fold(first, |acc, term| acc.plus(term)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::operator::tests::assert_close;
    use rand::{ SeedableRng, rngs::StdRng };
    use crate::operator::{ random_density_matrix, random_observable, random_operator };

    #[test]
    fn rejects_non_hermitian() {
        let op = Operator::from_rows(&[vec![1.0, 1.0], vec![0.0, 0.0]]).unwrap();
        assert!(matches!(Observable::new(op), Err(Error::NotHermitian)));
    }

    #[test]
    fn hermiticity_is_absolute_at_large_scale() {
        let op = Operator::from_rows(&[vec![1e12, 1.0], vec![0.0, 0.0]]).unwrap();
        assert!(matches!(Observable::new(op), Err(Error::NotHermitian)));
    }

    #[test]
    fn diagonalisation_is_real_and_unitary() {
        let mut rng = StdRng::seed_from_u64(1234);
        for d in 1..=16 {
            let o = random_observable(d, &mut rng);
            let (w, V) = o.diagonalisation().unwrap();
            assert!(w.windows(2).into_iter().all(|p| p[0] <= p[1]));
            assert_close(&(&V.dagger() * &V), &Operator::identity(d).unwrap());
            let D = Operator::from_matrix_unchecked(
                nd::Array2::from_diag(&w.mapv(C64::from)));
            assert_close(&(&(&V * &D) * &V.dagger()), o.as_operator());
        }
    }

    #[test]
    fn expectation_value_of_identity_is_one() {
        let mut rng = StdRng::seed_from_u64(5);
        let rho = random_density_matrix(5, &mut rng).unwrap();
        let id = Observable::identity(5).unwrap();
        assert_relative_eq!(id.expectation_value(&rho).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn complex_expectation_value_fails() {
        let d = 8;
        let skew = C64::new(1.0, 0.9e-10);
        let matrix: nd::Array2<C64>
            = nd::Array2::from_shape_fn((d, d), |(i, j)| {
                if i > j { skew } else { C64::from(1.0) }
            });
        let o = Observable::from_array(matrix).unwrap();
        let psi: nd::Array1<C64>
            = nd::Array1::from_elem(d, C64::from(1.0 / (d as f64).sqrt()));
        let rho = DensityMatrix::from_pure(&psi).unwrap();
        assert!(matches!(
            o.expectation_value(&rho),
            Err(Error::InvalidParameter { name: "expectation value", .. }),
        ));

        let real = Observable::hermitian_part_of(o.as_operator());
        assert_relative_eq!(real.expectation_value(&rho).unwrap(), d as f64, epsilon = 1e-9);
    }

    #[test]
    fn hermitian_part_validates() {
        let mut rng = StdRng::seed_from_u64(17);
        let op = random_operator(6, &mut rng);
        let obs = Observable::hermitian_part_of(&op);
        assert!(Observable::new(obs.clone().into_operator()).is_ok());
        let sum = sum_observables([&obs, &obs]).unwrap();
        assert_close(sum.as_operator(), obs.scaled(2.0).as_operator());
    }
}
