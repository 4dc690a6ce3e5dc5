use crate::error::{NdptError, Result};
use crate::multiset::SortKey;
use std::fmt;

/// One maximal run of nonzero positions of a canonical composition.
///
/// Equality is exact ordered-sequence equality: `Sigma(1,2)` and
/// `Sigma(2,1)` are different factors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SigmaFactor {
    indices: Vec<u32>,
}

impl SigmaFactor {
    pub fn new(indices: Vec<u32>) -> Result<Self> {
        if indices.is_empty() {
            return Err(NdptError::EmptySigma);
        }
        if indices.contains(&0) {
            return Err(NdptError::ZeroSigmaIndex { indices });
        }
        Ok(Self { indices })
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Sum of the indices, i.e. the number of composition units the run
    /// carries.
    pub fn weight(&self) -> u32 {
        self.indices.iter().sum()
    }

    /// True if `other` lists the same indices up to a cyclic shift.
    ///
    /// Not used when accumulating terms.
    pub fn is_cyclic_rotation_of(&self, other: &SigmaFactor) -> bool {
        let n = self.indices.len();
        if n != other.indices.len() {
            return false;
        }
        (0..n).any(|shift| {
            self.indices
                .iter()
                .enumerate()
                .all(|(i, v)| *v == other.indices[(i + shift) % n])
        })
    }

    /// True if every index of either factor appears in the other,
    /// ignoring order and repetition.
    ///
    /// Not used when accumulating terms.
    pub fn has_same_index_set(&self, other: &SigmaFactor) -> bool {
        self.indices.iter().all(|i| other.indices.contains(i))
            && other.indices.iter().all(|i| self.indices.contains(i))
    }
}

impl SortKey for SigmaFactor {
    type Key = Vec<u32>;

    fn sort_key(&self) -> Vec<u32> {
        self.indices.clone()
    }
}

impl fmt::Display for SigmaFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sigma(")?;
        for (i, idx) in self.indices.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", idx)?;
        }
        write!(f, ")")
    }
}
