//! Haplotype inheritance down pedigrees.
//!
//! A [`Transmission`] model decides what the founder of a pedigree
//! carries and how a child's haplotype derives from its father's.
//! [`populate_pedigree`] applies a model to one tree, depth first,
//! and [`populate_all`] to every tree of a population.

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cancel::{Cancellation, Termination};
use crate::error::{Error, Result};
use crate::Individual;
use crate::Node;
use crate::Pedigree;
use crate::Pedigrees;
use crate::Population;

pub mod autosomal;
mod single_lineage;

pub use autosomal::{AutosomalModel, AutosomalParameters};
pub use single_lineage::{
    FounderHaplotype, LadderBoundedModel, LadderBoundedParameters, UnboundedStepModel,
    UnboundedStepParameters,
};

/// Cancellation is polled before every this many pedigrees.
pub const CHECK_CANCEL_EVERY: usize = 100;

/// Models validate their parameters when constructed, so every value
/// of an implementing type can be applied as is.
pub trait Transmission {
    fn founder_haplotype<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i32>;

    /// Give `child` a haplotype derived from `parent`.
    ///
    /// Implementations set the haplotype on `child` and then apply
    /// their mutation step through
    /// [`Individual::mutate_haplotype`], so a node reached twice
    /// is reported rather than silently overwritten.
    fn inherit<R: Rng + ?Sized>(
        &self,
        parent: &[i32],
        child: &mut Individual,
        rng: &mut R,
    ) -> Result<()>;
}

/// Any of the three models, for use from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaplotypeModel {
    Unbounded(UnboundedStepModel),
    LadderBounded(LadderBoundedModel),
    Autosomal(AutosomalModel),
}

impl Transmission for HaplotypeModel {
    fn founder_haplotype<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i32> {
        match self {
            Self::Unbounded(m) => m.founder_haplotype(rng),
            Self::LadderBounded(m) => m.founder_haplotype(rng),
            Self::Autosomal(m) => m.founder_haplotype(rng),
        }
    }

    fn inherit<R: Rng + ?Sized>(
        &self,
        parent: &[i32],
        child: &mut Individual,
        rng: &mut R,
    ) -> Result<()> {
        match self {
            Self::Unbounded(m) => m.inherit(parent, child, rng),
            Self::LadderBounded(m) => m.inherit(parent, child, rng),
            Self::Autosomal(m) => m.inherit(parent, child, rng),
        }
    }
}

/// Draw a founder haplotype for the root of `pedigree` and pass it down
/// to every member.
///
/// Members are visited in preorder from the root: a child right before
/// its own subtree, siblings in the order they were recorded.
///
/// # Errors
///
/// * [`Error::HaplotypeAlreadySet`] if the pedigree was already
///   populated. Use [`Population::clear_haplotypes`] first.
/// * Errors from the model's mutation step. Members visited before
///   the failure keep their haplotypes.
pub fn populate_pedigree<T, R>(
    population: &mut Population,
    pedigree: &Pedigree,
    model: &T,
    rng: &mut R,
) -> Result<()>
where
    T: Transmission,
    R: Rng + ?Sized,
{
    let root = pedigree.root();
    population.check(root)?;
    if population.at(root).haplotype_is_set() {
        return Err(Error::HaplotypeAlreadySet(root));
    }
    let founder = model.founder_haplotype(rng);
    population.at_mut(root).set_haplotype(founder)?;

    let mut stack: Vec<Node> = population.at(root).children().iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        let father = population
            .at(node)
            .father()
            .ok_or_else(|| Error::Internal(format!("{node:?} is a second root of {:?}", pedigree.id())))?;
        let parent = population
            .at(father)
            .haplotype()
            .ok_or(Error::HaplotypeNotSet(father))?
            .to_vec();
        model.inherit(&parent, population.at_mut(node), rng)?;
        stack.extend(population.at(node).children().iter().rev().copied());
    }
    Ok(())
}

/// [`populate_pedigree`] for every pedigree, in order.
///
/// Cancellation is polled every [`CHECK_CANCEL_EVERY`] pedigrees.
/// After a cancellation, pedigrees already visited are fully populated
/// and the rest are untouched.
pub fn populate_all<T, R, C>(
    population: &mut Population,
    pedigrees: &Pedigrees,
    model: &T,
    rng: &mut R,
    cancel: &C,
) -> Result<Termination>
where
    T: Transmission,
    R: Rng + ?Sized,
    C: Cancellation + ?Sized,
{
    for (i, pedigree) in pedigrees.iter().enumerate() {
        if i % CHECK_CANCEL_EVERY == 0 && cancel.is_cancelled() {
            info!("haplotype population cancelled after {i} pedigrees");
            return Ok(Termination::Cancelled);
        }
        populate_pedigree(population, pedigree, model, rng)?;
        debug!("populated pedigree {:?} ({} members)", pedigree.id(), pedigree.size());
    }
    info!("populated haplotypes of {} pedigrees", pedigrees.len());
    Ok(Termination::Completed)
}

/// Sum over loci of the absolute allele differences between `a` and `b`.
pub fn haplotype_l1_distance(population: &Population, a: Node, b: Node) -> Result<i64> {
    let ha = population
        .individual(a)?
        .haplotype()
        .ok_or(Error::HaplotypeNotSet(a))?;
    let hb = population
        .individual(b)?
        .haplotype()
        .ok_or(Error::HaplotypeNotSet(b))?;
    if ha.len() != hb.len() {
        return Err(Error::LocusCountMismatch {
            expected: ha.len(),
            found: hb.len(),
        });
    }
    Ok(ha
        .iter()
        .zip(hb.iter())
        .map(|(&x, &y)| (i64::from(x) - i64::from(y)).abs())
        .sum())
}
