//! Matrix exponential by scaling and squaring with a Padé(13) approximant.
//!
//! Used for operators that are neither Hermitian nor anti-Hermitian, for which
//! an eigen-decomposition is not guaranteed to be well conditioned. See Higham
//! (2005), "The Scaling and Squaring Method for the Matrix Exponential
//! Revisited", SIAM J. Matrix Anal. Appl. 26(4), 1179.

use ndarray as nd;
use ndarray_linalg::InverseInto;
use num_complex::Complex64 as C64;
use crate::error::Result;

// Padé(13, 13) coefficients b_0..b_13
const PADE13: [f64; 14] = [
    64764752532480000.0,
    32382376266240000.0,
    7771770303897600.0,
    1187353796428800.0,
    129060195264000.0,
    10559470521600.0,
    670442572800.0,
    33522128640.0,
    1323241920.0,
    40840800.0,
    960960.0,
    16380.0,
    182.0,
    1.0,
];

// largest 1-norm for which Padé(13) is accurate to double precision
const THETA13: f64 = 5.371920351148152;

fn norm1(A: &nd::Array2<C64>) -> f64 {
    A.columns().into_iter()
        .map(|col| col.iter().map(|a| a.norm()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Compute `exp(A)` for a square matrix `A`.
pub(crate) fn pade_exp(A: &nd::Array2<C64>) -> Result<nd::Array2<C64>> {
    let n = A.nrows();
    let norm = norm1(A);
    let s: i32
        = if norm > THETA13 {
            (norm / THETA13).log2().ceil().max(0.0) as i32
        } else {
            0
        };
    let A: nd::Array2<C64> = A.mapv(|a| a / 2.0_f64.powi(s));
    let b = |k: usize| C64::from(PADE13[k]);

    let I: nd::Array2<C64> = nd::Array2::eye(n);
    let A2 = A.dot(&A);
    let A4 = A2.dot(&A2);
    let A6 = A2.dot(&A4);

    let W1: nd::Array2<C64> = &A6 * b(13) + &A4 * b(11) + &A2 * b(9);
    let W2: nd::Array2<C64>
        = &A6 * b(7) + &A4 * b(5) + &A2 * b(3) + &I * b(1);
    let U: nd::Array2<C64> = A.dot(&(A6.dot(&W1) + W2));

    let Z1: nd::Array2<C64> = &A6 * b(12) + &A4 * b(10) + &A2 * b(8);
    let Z2: nd::Array2<C64>
        = &A6 * b(6) + &A4 * b(4) + &A2 * b(2) + &I * b(0);
    let V: nd::Array2<C64> = A6.dot(&Z1) + Z2;

    // r13(A) = (V - U)^-1 (V + U)
    let P: nd::Array2<C64> = &V + &U;
    let Q: nd::Array2<C64> = V - U;
    let mut R: nd::Array2<C64> = Q.inv_into()?.dot(&P);
    for _ in 0..s {
        R = R.dot(&R);
    }
    Ok(R)
}
