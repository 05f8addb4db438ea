//! Paternal genealogies of a haploid, constant size
//! Wright-Fisher population, simulated backward from
//! the present.
//!
//! The typical flow is:
//!
//! 1. [`simulate()`] a genealogy into a [`Population`].
//! 2. [`extract_pedigrees`] to partition it into family trees.
//! 3. Query [`meiotic_distance`] and [`path`] between individuals,
//!    or [`populate_all`] haplotypes down every tree.

mod cancel;
mod error;
mod flags;
mod haplotypes;
mod individual;
mod kinship;
mod pedigree;
mod population;
mod simulate;
mod trace;

pub use cancel::{Cancellation, NeverCancel, Termination};
pub use error::{Error, Result};
pub use haplotypes::autosomal::{
    conditional_cumulative, genotype_probabilities, possible_mutate_index, sample_genotype,
};
pub use haplotypes::{
    haplotype_l1_distance, populate_all, populate_pedigree, AutosomalModel, AutosomalParameters,
    FounderHaplotype, HaplotypeModel, LadderBoundedModel, LadderBoundedParameters, Transmission,
    UnboundedStepModel, UnboundedStepParameters, CHECK_CANCEL_EVERY,
};
pub use individual::Individual;
pub use kinship::{
    meiotic_distance, meiotic_distance_with, meioses_generation_distribution, path,
    DistanceScratch, MeiosesCount,
};
pub use pedigree::{extract_pedigrees, Pedigree, Pedigrees};
pub use population::Population;
pub use simulate::{simulate, FatherSelection, Generations, Simulation, SimulationParameters};
pub use trace::GenerationTrace;

/// Handle to an [`Individual`] of a [`Population`].
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct Node(pub(crate) usize);

impl Node {
    pub fn as_index(&self) -> usize {
        self.0
    }
}

/// Index of a [`Pedigree`] within [`Pedigrees`].
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct PedigreeId(pub(crate) usize);

impl PedigreeId {
    pub fn as_index(&self) -> usize {
        self.0
    }
}
