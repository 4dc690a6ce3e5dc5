// Combinatorics: restricted compositions and their memo cache
pub mod composition;

// Symbolic terms: sigma factors, signed multisets, canonical monomials
pub mod multiset;
pub mod sigma;
pub mod term;

// Accumulation of a full correction and its persisted shape
pub mod correction;
pub mod error;

pub use crate::composition::{
	composition_count, noncancelling_count, Composition, CompositionGenerator,
};
pub use crate::correction::{
	CorrectionTuple, EnergyCorrection, SigmaRecord, TermRecord, TermsByV00,
};
pub use crate::error::{NdptError, Result};
pub use crate::multiset::{MultiSet, SortKey};
pub use crate::sigma::SigmaFactor;
pub use crate::term::PerturbativeTerm;
