use num_bigint::BigUint;
use num_integer::binomial;
use num_traits::{ToPrimitive, Zero};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Ordered sequence of non-negative integers produced by the generator.
pub type Composition = Vec<u32>;

/// Number of sequences of `n` non-negative integers summing to `m`,
/// i.e. the stars-and-bars count C(n+m-1, n-1).
pub fn composition_count(n: usize, m: u32) -> BigUint {
    if n == 0 {
        return if m == 0 {
            BigUint::from(1u32)
        } else {
            BigUint::zero()
        };
    }
    let top = BigUint::from(n as u64 + u64::from(m) - 1);
    binomial(top, BigUint::from(n as u64 - 1))
}

/// Number of sequences `noncancelling_compositions(n)` yields.
pub fn noncancelling_count(n: u32) -> BigUint {
    let len = n as usize;
    let mut total = composition_count(len, n);
    // (i, j) pairs with i + j = s: there are s - 1 of them.
    for s in 2..=n {
        total += composition_count(len, n - s) * BigUint::from(s - 1);
    }
    total
}

/// Enumerates restricted compositions, memoizing every `(length, sum)` shape.
///
/// The cache only ever grows. Racing threads may compute the same shape
/// twice; the first value stored is kept and handed out from then on.
#[derive(Debug, Default)]
pub struct CompositionGenerator {
    cache: RwLock<HashMap<(usize, u32), Arc<Vec<Composition>>>>,
}

impl CompositionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All sequences of `n` non-negative integers that add up to `m`.
    ///
    /// Sequences come out in lexicographic order of their leading entries,
    /// which callers must not rely on.
    pub fn restricted_composition(&self, n: usize, m: u32) -> Arc<Vec<Composition>> {
        if m == 0 {
            return Arc::new(vec![vec![0; n]]);
        }
        if n == 0 {
            return Arc::new(Vec::new());
        }
        if n == 1 {
            return Arc::new(vec![vec![m]]);
        }
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(n, m))
        {
            return Arc::clone(hit);
        }

        let capacity = composition_count(n, m).to_usize().unwrap_or(0);
        let mut out = Vec::with_capacity(capacity);
        for head in 0..=m {
            for tail in self.restricted_composition(n - 1, m - head).iter() {
                let mut seq = Vec::with_capacity(n);
                seq.push(head);
                seq.extend_from_slice(tail);
                out.push(seq);
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.entry((n, m)).or_insert_with(|| {
            trace!(n, m, count = out.len(), "cached composition shape");
            Arc::new(out)
        });
        Arc::clone(entry)
    }

    /// Raw compositions for one perturbation order whose boundary positions
    /// do not cancel: both zero, or both nonzero.
    ///
    /// Every yielded sequence has length `n + 2`. The iterator is lazy and
    /// finite; calling this again starts over from the beginning.
    pub fn noncancelling_compositions(&self, n: u32) -> impl Iterator<Item = Composition> + '_ {
        let len = n as usize;
        let zero_sides = self.restricted_composition(len, n);
        let zero_framed = (0..zero_sides.len()).map(move |k| framed(0, &zero_sides[k], 0));

        let nonzero_framed = (1..=n).flat_map(move |i| {
            (1..=n - i).flat_map(move |j| {
                let inner = self.restricted_composition(len, n - i - j);
                (0..inner.len()).map(move |k| framed(i, &inner[k], j))
            })
        });

        zero_framed.chain(nonzero_framed)
    }

    /// Number of memoized `(length, sum)` shapes.
    pub fn cached_shapes(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn framed(first: u32, middle: &[u32], last: u32) -> Composition {
    let mut seq = Vec::with_capacity(middle.len() + 2);
    seq.push(first);
    seq.extend_from_slice(middle);
    seq.push(last);
    seq
}
