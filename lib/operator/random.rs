//! Random operators, mainly for property testing.

use ndarray as nd;
use num_complex::Complex64 as C64;
use rand::Rng;
use crate::{
    error::Result,
    operator::{ DensityMatrix, Observable, Operator },
};

/// Generate a `d × d` operator whose real and imaginary parts are drawn
/// uniformly from `[-1, 1)`.
pub fn random_operator<R>(d: usize, rng: &mut R) -> Operator
where R: Rng + ?Sized
{
    let matrix: nd::Array2<C64>
        = nd::Array2::from_shape_simple_fn((d, d), || {
            C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
        });
    Operator::from_matrix_unchecked(matrix)
}

/// Generate a random `d × d` Hermitian operator.
pub fn random_observable<R>(d: usize, rng: &mut R) -> Observable
where R: Rng + ?Sized
{
    Observable::hermitian_part_of(&random_operator(d, rng))
}

/// Generate a random `d × d` density matrix: a random spectrum on the
/// probability simplex, rotated by a random unitary.
pub fn random_density_matrix<R>(d: usize, rng: &mut R) -> Result<DensityMatrix>
where R: Rng + ?Sized
{
    let mut p: nd::Array1<f64> = (0..d).map(|_| rng.gen_range(0.0..1.0)).collect();
    let total = p.sum();
    if total > 0.0 { p /= total; } else { p.fill(1.0 / d as f64); }
    let D = Operator::from_matrix_unchecked(nd::Array2::from_diag(&p.mapv(C64::from)));
    let U = (random_observable(d, rng).as_operator() * C64::i()).exp()?;
    (&(&U * &D) * &U.dagger()).hermitian_part().cast_to_density_matrix()
}
