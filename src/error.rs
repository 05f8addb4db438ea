use thiserror::Error;

use crate::Node;

/// Errors returned by simulation, pedigree and inheritance operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("population size must be > 1, got {0}")]
    InvalidPopulationSize(usize),
    #[error("generations must be -1 (simulate to one founder) or > 0, got {0}")]
    InvalidGenerations(i64),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("{0:?} is not part of the population")]
    UnknownIndividual(Node),
    #[error("{0:?} already has a father")]
    FatherAlreadySet(Node),
    #[error("{father:?} (generation {father_generation}) cannot be the father of {child:?} (generation {child_generation})")]
    InvalidLink {
        father: Node,
        child: Node,
        father_generation: u32,
        child_generation: u32,
    },
    #[error("{0:?} is not assigned to a pedigree")]
    PedigreeNotAssigned(Node),
    #[error("population already has pedigree assignments; clear them before extracting again")]
    PedigreesAlreadyAssigned,
    #[error("haplotype of {0:?} is not set")]
    HaplotypeNotSet(Node),
    #[error("haplotype of {0:?} is already set")]
    HaplotypeAlreadySet(Node),
    #[error("haplotype of {0:?} has already been mutated")]
    HaplotypeAlreadyMutated(Node),
    #[error("expected {expected} loci, found {found}")]
    LocusCountMismatch { expected: usize, found: usize },
    #[error("allele {value} at locus {locus} is outside the ladder [{min}, {max}]")]
    OutsideLadder {
        locus: usize,
        value: i32,
        min: i32,
        max: i32,
    },
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}
