use crate::composition::CompositionGenerator;
use crate::error::{NdptError, Result};
use crate::multiset::MultiSet;
use crate::sigma::SigmaFactor;
use crate::term::PerturbativeTerm;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// `(sigma indices, multiplicity)`
pub type SigmaRecord = (Vec<u32>, i64);
/// `(sigma factors, coefficient)`
pub type TermRecord = (Vec<SigmaRecord>, i64);
/// `(order, [(v_exp, terms)])`: the persisted shape of a correction.
pub type CorrectionTuple = (u32, Vec<(u32, Vec<TermRecord>)>);

/// Terms grouped by their `V_00` exponent.
pub type TermsByV00 = BTreeMap<u32, Vec<(PerturbativeTerm, i64)>>;

/// The `order`-th energy correction as a signed sum of perturbative terms.
///
/// `calc` fills `p_terms`; `sort_by_v00` must be called afterwards to
/// refresh the grouped view returned by `terms_by_v00`.
#[derive(Clone, Debug)]
pub struct EnergyCorrection {
    order: u32,
    p_terms: MultiSet<PerturbativeTerm>,
    terms_by_v00: TermsByV00,
}

impl EnergyCorrection {
    /// Empty correction of the given order. Orders below 2 have no
    /// composition with a rotation boundary and are rejected.
    pub fn new(order: u32) -> Result<Self> {
        if order < 2 {
            return Err(NdptError::InvalidOrder(order));
        }
        Ok(Self {
            order,
            p_terms: MultiSet::new(),
            terms_by_v00: BTreeMap::new(),
        })
    }

    /// `new`, `calc` and `sort_by_v00` in one go.
    pub fn compute(order: u32, generator: &CompositionGenerator) -> Result<Self> {
        let mut correction = Self::new(order)?;
        correction.calc(generator)?;
        correction.sort_by_v00();
        Ok(correction)
    }

    /// Accumulate every noncancelling composition of `order - 1` with sign
    /// `(-1)^(number of zeros)`.
    ///
    /// A composition that cannot be canonicalized aborts the whole order and
    /// leaves `self` untouched.
    pub fn calc(&mut self, generator: &CompositionGenerator) -> Result<()> {
        debug!(order = self.order, "computing energy correction");
        let mut p_terms = MultiSet::new();
        let mut compositions = 0u64;
        for raw in generator.noncancelling_compositions(self.order - 1) {
            let zeros = raw.iter().filter(|v| **v == 0).count();
            let sign = if zeros % 2 == 0 { 1 } else { -1 };
            p_terms.add_unpruned(PerturbativeTerm::from_composition(&raw)?, sign);
            compositions += 1;
        }
        p_terms.clear_zero_count_items();
        debug!(
            order = self.order,
            compositions,
            terms = p_terms.len(),
            cached_shapes = generator.cached_shapes(),
            "energy correction computed"
        );

        self.p_terms = p_terms;
        self.terms_by_v00.clear();
        Ok(())
    }

    /// Rebuild the exponent grouping from the current terms. Every exponent
    /// from 0 to `v_max` gets an entry, possibly empty.
    pub fn sort_by_v00(&mut self) {
        self.terms_by_v00 = self.grouped();
    }

    fn grouped(&self) -> TermsByV00 {
        let Some(v_max) = self.v_max() else {
            return BTreeMap::new();
        };
        let mut groups: TermsByV00 = (0..=v_max).map(|v| (v, Vec::new())).collect();
        for (term, coeff) in self.p_terms.sorted_items() {
            groups
                .entry(term.v_exp)
                .or_default()
                .push((term.clone(), coeff));
        }
        groups
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn p_terms(&self) -> &MultiSet<PerturbativeTerm> {
        &self.p_terms
    }

    /// Grouping as of the last `sort_by_v00` call.
    pub fn terms_by_v00(&self) -> &TermsByV00 {
        &self.terms_by_v00
    }

    pub fn term_count(&self) -> usize {
        self.p_terms.len()
    }

    pub fn v_max(&self) -> Option<u32> {
        self.p_terms.elements().map(|t| t.v_exp).max()
    }

    /// One `display_with_coeff` line per term, by ascending exponent.
    pub fn lines(&self) -> Vec<String> {
        self.grouped()
            .values()
            .flatten()
            .map(|(term, coeff)| term.display_with_coeff(*coeff))
            .collect()
    }

    pub fn to_tuple(&self) -> CorrectionTuple {
        let groups = self
            .grouped()
            .into_iter()
            .map(|(v_exp, terms)| {
                let records = terms
                    .into_iter()
                    .map(|(term, coeff)| {
                        let sigmas = term
                            .sigmas
                            .sorted_items()
                            .into_iter()
                            .map(|(sigma, exp)| (sigma.indices().to_vec(), exp))
                            .collect();
                        (sigmas, coeff)
                    })
                    .collect();
                (v_exp, records)
            })
            .collect();
        (self.order, groups)
    }

    pub fn from_tuple(tuple: CorrectionTuple) -> Result<Self> {
        let (order, groups) = tuple;
        let mut correction = Self::new(order)?;
        for (v_exp, terms) in groups {
            for (sigma_records, coeff) in terms {
                let mut sigmas = MultiSet::new();
                for (indices, exp) in sigma_records {
                    sigmas.add_unpruned(SigmaFactor::new(indices)?, exp);
                }
                sigmas.clear_zero_count_items();
                correction
                    .p_terms
                    .add_unpruned(PerturbativeTerm::new(v_exp, sigmas), coeff);
            }
        }
        correction.p_terms.clear_zero_count_items();
        correction.sort_by_v00();
        Ok(correction)
    }
}

impl fmt::Display for EnergyCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(v_exp: u32, sigmas: &[(&[u32], i64)]) -> PerturbativeTerm {
        PerturbativeTerm::new(
            v_exp,
            sigmas
                .iter()
                .map(|(s, k)| (SigmaFactor::new(s.to_vec()).unwrap(), *k))
                .collect(),
        )
    }

    fn compute(order: u32) -> EnergyCorrection {
        EnergyCorrection::compute(order, &CompositionGenerator::new()).unwrap()
    }

    #[test]
    fn test_rejects_orders_below_two() {
        assert_eq!(EnergyCorrection::new(0).unwrap_err(), NdptError::InvalidOrder(0));
        assert_eq!(EnergyCorrection::new(1).unwrap_err(), NdptError::InvalidOrder(1));
    }

    #[test]
    fn test_second_order() {
        let c = compute(2);
        assert_eq!(c.term_count(), 1);
        assert_eq!(c.p_terms().count(&term(0, &[(&[1], 1)])), 1);
    }

    #[test]
    fn test_third_order() {
        let c = compute(3);
        assert_eq!(c.term_count(), 2);
        assert_eq!(c.p_terms().count(&term(0, &[(&[1, 1], 1)])), 1);
        assert_eq!(c.p_terms().count(&term(1, &[(&[2], 1)])), -1);
        assert_eq!(
            c.lines(),
            vec!["1 * Sigma(1,1)", "-1 * (V_00 ^ 1) Sigma(2)"]
        );
    }

    #[test]
    fn test_fourth_order() {
        let c = compute(4);
        let expected: MultiSet<PerturbativeTerm> = [
            (term(0, &[(&[1], 1), (&[2], 1)]), -1),
            (term(0, &[(&[1, 1, 1], 1)]), 1),
            (term(1, &[(&[1, 2], 1)]), -1),
            (term(1, &[(&[2, 1], 1)]), -1),
            (term(2, &[(&[3], 1)]), 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(*c.p_terms(), expected);
    }

    #[test]
    fn test_fifth_order_collects_like_terms() {
        let c = compute(5);
        assert_eq!(c.term_count(), 13);
        assert_eq!(c.p_terms().count(&term(1, &[(&[1], 1), (&[3], 1)])), 2);
        assert_eq!(c.p_terms().count(&term(1, &[(&[2], 2)])), 1);
        assert_eq!(c.p_terms().count(&term(3, &[(&[4], 1)])), -1);
    }

    #[test]
    fn test_term_counts_grow_with_order() {
        let generator = CompositionGenerator::new();
        let counts: Vec<usize> = (2..=8)
            .map(|n| {
                EnergyCorrection::compute(n, &generator)
                    .unwrap()
                    .term_count()
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 5, 13, 32, 81, 197]);
    }

    #[test]
    fn test_sort_by_v00_covers_every_exponent() {
        let mut c = EnergyCorrection::new(6).unwrap();
        c.calc(&CompositionGenerator::new()).unwrap();
        assert!(c.terms_by_v00().is_empty());
        c.sort_by_v00();

        let sizes: Vec<(u32, usize)> = c
            .terms_by_v00()
            .iter()
            .map(|(v, terms)| (*v, terms.len()))
            .collect();
        assert_eq!(sizes, vec![(0, 9), (1, 10), (2, 8), (3, 4), (4, 1)]);
        for (v, terms) in c.terms_by_v00() {
            assert!(terms.iter().all(|(t, _)| t.v_exp == *v));
        }
    }

    #[test]
    fn test_grouping_keeps_empty_exponents() {
        let record: CorrectionTuple = (
            4,
            vec![
                (0, vec![(vec![(vec![1, 1, 1], 1)], 1)]),
                (2, vec![(vec![(vec![3], 1)], 1)]),
            ],
        );
        let c = EnergyCorrection::from_tuple(record).unwrap();
        let keys: Vec<u32> = c.terms_by_v00().keys().copied().collect();
        assert_eq!(keys, vec![0, 1, 2]);
        assert!(c.terms_by_v00()[&1].is_empty());
    }

    #[test]
    fn test_to_tuple_shape() {
        let c = compute(3);
        assert_eq!(
            c.to_tuple(),
            (
                3,
                vec![
                    (0, vec![(vec![(vec![1, 1], 1)], 1)]),
                    (1, vec![(vec![(vec![2], 1)], -1)]),
                ]
            )
        );
    }

    #[test]
    fn test_tuple_round_trip() {
        let c = compute(6);
        let rebuilt = EnergyCorrection::from_tuple(c.to_tuple()).unwrap();
        assert_eq!(rebuilt.order(), 6);
        assert_eq!(rebuilt.p_terms(), c.p_terms());
        assert_eq!(rebuilt.terms_by_v00(), c.terms_by_v00());
    }

    #[test]
    fn test_from_tuple_cancels_and_validates() {
        let cancelling: CorrectionTuple = (
            3,
            vec![(1, vec![(vec![(vec![2], 1)], -1), (vec![(vec![2], 1)], 1)])],
        );
        let c = EnergyCorrection::from_tuple(cancelling).unwrap();
        assert_eq!(c.term_count(), 0);
        assert!(c.terms_by_v00().is_empty());
        assert_eq!(c.to_string(), "");

        let malformed: CorrectionTuple = (3, vec![(0, vec![(vec![(vec![1, 0], 1)], 1)])]);
        assert_eq!(
            EnergyCorrection::from_tuple(malformed).unwrap_err(),
            NdptError::ZeroSigmaIndex {
                indices: vec![1, 0]
            }
        );
    }
}
