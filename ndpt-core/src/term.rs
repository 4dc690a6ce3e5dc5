use crate::error::{NdptError, Result};
use crate::multiset::{MultiSet, SortKey};
use crate::sigma::SigmaFactor;
use std::fmt;

/// A monomial `V_00^v_exp * Π Sigma(..)^k` of an energy correction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PerturbativeTerm {
    pub v_exp: u32,
    pub sigmas: MultiSet<SigmaFactor>,
}

impl PerturbativeTerm {
    pub fn new(v_exp: u32, sigmas: MultiSet<SigmaFactor>) -> Self {
        Self { v_exp, sigmas }
    }

    /// Canonical term of a raw composition.
    ///
    /// The first and last positions are adjacent on the cycle, so they are
    /// summed into a single leading position before canonicalizing.
    pub fn from_composition(composition: &[u32]) -> Result<Self> {
        let len = composition.len();
        if len < 2 {
            return Err(NdptError::CompositionTooShort { len });
        }
        let (first, last) = (composition[0], composition[len - 1]);
        let front = first
            .checked_add(last)
            .ok_or(NdptError::BoundaryOverflow { first, last })?;
        let mut merged = Vec::with_capacity(len - 1);
        merged.push(front);
        merged.extend_from_slice(&composition[1..len - 1]);
        Self::from_cyclic(merged)
    }

    /// Canonical term of an already merged cyclic sequence.
    ///
    /// The sequence is rotated so that it starts right after the last
    /// nonzero position (in index order) that is followed by a zero. It then
    /// begins with a maximal zero run and ends with a maximal nonzero run,
    /// so a plain left-to-right run decomposition is cyclically correct.
    pub fn from_cyclic(mut seq: Vec<u32>) -> Result<Self> {
        let len = seq.len();
        let boundary = (0..len)
            .filter(|&i| seq[i] != 0 && seq[(i + 1) % len] == 0)
            .last();
        let Some(boundary) = boundary else {
            return Err(NdptError::NoRotationBoundary { sequence: seq });
        };
        seq.rotate_left((boundary + 1) % len);

        let mut zeros = 0usize;
        let mut zero_runs = 0usize;
        let mut sigmas = MultiSet::new();
        for run in seq.chunk_by(|a, b| (*a == 0) == (*b == 0)) {
            if run[0] == 0 {
                zeros += run.len();
                zero_runs += 1;
            } else {
                sigmas.add(SigmaFactor::new(run.to_vec())?, 1);
            }
        }

        Ok(Self {
            v_exp: v_exponent(zeros, zero_runs)?,
            sigmas,
        })
    }

    /// `"<coeff> * (V_00 ^ <v_exp>) <sigmas>"`, dropping the `V_00` factor
    /// when its exponent is zero.
    pub fn display_with_coeff(&self, coeff: i64) -> String {
        if self.v_exp > 0 {
            format!("{} * (V_00 ^ {}) {}", coeff, self.v_exp, self.sigmas)
        } else {
            format!("{} * {}", coeff, self.sigmas)
        }
    }
}

/// A zero run of length L contributes L - 1 powers of V_00.
fn v_exponent(zeros: usize, zero_runs: usize) -> Result<u32> {
    let surplus = zeros - zero_runs;
    u32::try_from(surplus).map_err(|_| NdptError::ExponentOverflow { surplus })
}

impl SortKey for PerturbativeTerm {
    type Key = (u32, Vec<(Vec<u32>, i64)>);

    fn sort_key(&self) -> Self::Key {
        let sigmas = self
            .sigmas
            .sorted_items()
            .into_iter()
            .map(|(sigma, exp)| (sigma.indices().to_vec(), exp))
            .collect();
        (self.v_exp, sigmas)
    }
}

impl fmt::Display for PerturbativeTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.v_exp > 0 {
            write!(f, "(V_00 ^ {}) {}", self.v_exp, self.sigmas)
        } else {
            write!(f, "{}", self.sigmas)
        }
    }
}
