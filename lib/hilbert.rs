//! Composite Hilbert spaces of several nuclear spins.
//!
//! The space of a [`SpinSystem`] is the tensor product of its members' spaces,
//! in order; single-spin operators are embedded by tensoring with identities
//! on every other member.

use itertools::Itertools;
use ndarray::{ self as nd, linalg::kron };
use num_complex::Complex64 as C64;
use crate::{
    error::{ Error, Result },
    operator::{ Observable, Operator },
    spin::{ Component, NuclearSpin },
};

/// Compute the outer product `|a⟩⟨b|` of two state vectors.
pub fn outer_prod(a: &nd::Array1<C64>, b: &nd::Array1<C64>)
    -> nd::Array2<C64>
{
    let na = a.len();
    let nb = b.len();
    nd::Array2::from_shape_fn((na, nb), |(i, j)| a[i] * b[j].conj())
}

/// An ordered collection of nuclear spins.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinSystem {
    spins: Vec<NuclearSpin>,
}

impl From<NuclearSpin> for SpinSystem {
    fn from(spin: NuclearSpin) -> Self { Self { spins: vec![spin] } }
}

impl SpinSystem {
    /// Create a new `SpinSystem`, failing if `spins` is empty.
    pub fn new(spins: Vec<NuclearSpin>) -> Result<Self> {
        if spins.is_empty() {
            return Err(Error::invalid("spins", "a spin system needs at least one spin"));
        }
        Ok(Self { spins })
    }

    /// Return the member spins.
    pub fn spins(&self) -> &[NuclearSpin] { &self.spins }

    /// Return the number of member spins.
    pub fn len(&self) -> usize { self.spins.len() }

    /// Return `false`; a `SpinSystem` always holds at least one spin.
    pub fn is_empty(&self) -> bool { self.spins.is_empty() }

    /// Return the dimension of the full space.
    pub fn dim(&self) -> usize {
        self.spins.iter().map(|s| s.dim()).product()
    }

    /// Return the dimensions of the member spaces.
    pub fn dims(&self) -> Vec<usize> {
        self.spins.iter().map(|s| s.dim()).collect()
    }

    fn eye_around(&self, k: usize) -> (nd::Array2<C64>, nd::Array2<C64>) {
        let before: usize = self.spins.iter().take(k).map(|s| s.dim()).product();
        let after: usize = self.spins.iter().skip(k + 1).map(|s| s.dim()).product();
        (nd::Array2::eye(before), nd::Array2::eye(after))
    }

    /// Embed an operator acting on the `k`-th spin into the full space.
    pub fn embed(&self, k: usize, op: &Operator) -> Result<Operator> {
        let spin = self.spins.get(k)
            .ok_or_else(|| Error::invalid(
                "spin index", format!("{} out of range for {} spins", k, self.len())))?;
        if spin.dim() != op.dim() {
            return Err(Error::DimensionMismatch(spin.dim(), op.dim()));
        }
        let (eye1, eye2) = self.eye_around(k);
        Ok(Operator::from_matrix_unchecked(kron(&kron(&eye1, op.matrix()), &eye2)))
    }

    /// Return a component of the `k`-th spin's angular momentum, embedded in
    /// the full space.
    pub fn component(&self, k: usize, comp: Component) -> Result<Operator> {
        let spin = self.spins.get(k)
            .ok_or_else(|| Error::invalid(
                "spin index", format!("{} out of range for {} spins", k, self.len())))?;
        self.embed(k, spin.operator(comp))
    }

    /// Sum single-spin operators produced by `f` over all members, each
    /// embedded in the full space.
    pub fn sum_embedded<F>(&self, mut f: F) -> Operator
    where F: FnMut(&NuclearSpin) -> Operator
    {
        let n = self.dim();
        let mut acc: nd::Array2<C64> = nd::Array2::zeros((n, n));
        for (k, spin) in self.spins.iter().enumerate() {
            let (eye1, eye2) = self.eye_around(k);
            acc += &kron(&kron(&eye1, f(spin).matrix()), &eye2);
        }
        Operator::from_matrix_unchecked(acc)
    }

    /// Return a component of the total angular momentum.
    pub fn total(&self, comp: Component) -> Operator {
        self.sum_embedded(|spin| spin.operator(comp).clone())
    }

    /// Return `Σ_k γ_k I_comp^k`, with γ_k/2π in MHz/T.
    pub fn gamma_weighted(&self, comp: Component) -> Operator {
        self.sum_embedded(|spin| spin.operator(comp) * spin.gyro_ratio())
    }

    /// Return `Σ_k (I_x^k, I_y^k, I_z^k)`.
    pub fn total_cartesian(&self) -> [Observable; 3] {
        [Component::X, Component::Y, Component::Z]
            .map(|comp| Observable::hermitian_part_of(&self.total(comp)))
    }

    /// Return every unordered pair of spin indices `(n, m)` with `n < m`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> {
        (0..self.len()).tuple_combinations()
    }
}
