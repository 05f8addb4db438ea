//! Step-wise mutation of uniparental haplotypes, one allele per locus.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Transmission;
use crate::error::{check_probability, Error, Result};
use crate::Individual;

/// Haplotype carried by the founder of every pedigree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FounderHaplotype {
    Fixed(Vec<i32>),
    /// Each locus drawn uniformly from `min[i]..=max[i]`.
    Uniform { min: Vec<i32>, max: Vec<i32> },
}

impl FounderHaplotype {
    fn validate(&self, loci: usize) -> Result<()> {
        match self {
            Self::Fixed(h) => check_loci(loci, h.len()),
            Self::Uniform { min, max } => {
                check_loci(loci, min.len())?;
                check_loci(loci, max.len())?;
                if let Some(i) = min.iter().zip(max).position(|(a, b)| a > b) {
                    return Err(Error::InvalidParameter(format!(
                        "founder range at locus {i} is empty: [{}, {}]",
                        min[i], max[i]
                    )));
                }
                Ok(())
            }
        }
    }

    // Only called on founders that passed validate().
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i32> {
        match self {
            Self::Fixed(h) => h.clone(),
            Self::Uniform { min, max } => min
                .iter()
                .zip(max)
                .map(|(&a, &b)| rng.gen_range(a..=b))
                .collect(),
        }
    }

    fn bounds(&self) -> (&[i32], &[i32]) {
        match self {
            Self::Fixed(h) => (h, h),
            Self::Uniform { min, max } => (min, max),
        }
    }
}

fn check_loci(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::LocusCountMismatch { expected, found })
    }
}

fn check_rates(mutation_rates: &[f64]) -> Result<()> {
    mutation_rates
        .iter()
        .try_for_each(|&r| check_probability("mutation rate", r))
}

fn copy_parent(parent: &[i32], loci: usize, child: &mut Individual) -> Result<()> {
    check_loci(loci, parent.len())?;
    child.set_haplotype(parent.to_vec())
}

/// Serialized form of an [`UnboundedStepModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnboundedStepParameters {
    pub mutation_rates: Vec<f64>,
    /// Defaults to 0 at every locus.
    #[serde(default)]
    pub founder: Option<FounderHaplotype>,
}

/// Each locus mutates with its own rate, by -1 or +1 with equal probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UnboundedStepParameters", into = "UnboundedStepParameters")]
pub struct UnboundedStepModel {
    mutation_rates: Vec<f64>,
    founder: FounderHaplotype,
}

impl UnboundedStepModel {
    /// Founders carry 0 at every locus.
    pub fn new(mutation_rates: Vec<f64>) -> Result<Self> {
        check_rates(&mutation_rates)?;
        let founder = FounderHaplotype::Fixed(vec![0; mutation_rates.len()]);
        Ok(Self {
            mutation_rates,
            founder,
        })
    }

    pub fn with_founder(self, founder: FounderHaplotype) -> Result<Self> {
        founder.validate(self.loci())?;
        Ok(Self { founder, ..self })
    }

    pub fn mutation_rates(&self) -> &[f64] {
        &self.mutation_rates
    }

    pub fn founder(&self) -> &FounderHaplotype {
        &self.founder
    }

    pub fn loci(&self) -> usize {
        self.mutation_rates.len()
    }
}

impl TryFrom<UnboundedStepParameters> for UnboundedStepModel {
    type Error = Error;

    fn try_from(value: UnboundedStepParameters) -> Result<Self> {
        let model = Self::new(value.mutation_rates)?;
        match value.founder {
            Some(founder) => model.with_founder(founder),
            None => Ok(model),
        }
    }
}

impl From<UnboundedStepModel> for UnboundedStepParameters {
    fn from(value: UnboundedStepModel) -> Self {
        Self {
            mutation_rates: value.mutation_rates,
            founder: Some(value.founder),
        }
    }
}

impl Transmission for UnboundedStepModel {
    fn founder_haplotype<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i32> {
        self.founder.draw(rng)
    }

    fn inherit<R: Rng + ?Sized>(
        &self,
        parent: &[i32],
        child: &mut Individual,
        rng: &mut R,
    ) -> Result<()> {
        copy_parent(parent, self.loci(), child)?;
        child.mutate_haplotype(|haplotype| {
            for (allele, &rate) in haplotype.iter_mut().zip(&self.mutation_rates) {
                if rng.gen::<f64>() < rate {
                    if rng.gen::<f64>() < 0.5 {
                        *allele -= 1;
                    } else {
                        *allele += 1;
                    }
                }
            }
            Ok(())
        })
    }
}

/// Serialized form of a [`LadderBoundedModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderBoundedParameters {
    pub mutation_rates: Vec<f64>,
    pub ladder_min: Vec<i32>,
    pub ladder_max: Vec<i32>,
    /// Defaults to the lower end of every ladder.
    #[serde(default)]
    pub founder: Option<FounderHaplotype>,
}

/// Step-wise mutation confined to `[ladder_min[i], ladder_max[i]]`.
///
/// An allele on a ladder end can only move inward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LadderBoundedParameters", into = "LadderBoundedParameters")]
pub struct LadderBoundedModel {
    mutation_rates: Vec<f64>,
    ladder_min: Vec<i32>,
    ladder_max: Vec<i32>,
    founder: FounderHaplotype,
}

impl LadderBoundedModel {
    /// Founders carry the lower end of every ladder.
    pub fn new(mutation_rates: Vec<f64>, ladder_min: Vec<i32>, ladder_max: Vec<i32>) -> Result<Self> {
        check_rates(&mutation_rates)?;
        check_loci(mutation_rates.len(), ladder_min.len())?;
        check_loci(mutation_rates.len(), ladder_max.len())?;
        for (i, (min, max)) in ladder_min.iter().zip(&ladder_max).enumerate() {
            if min >= max {
                return Err(Error::InvalidParameter(format!(
                    "ladder at locus {i} must have min < max, got [{min}, {max}]"
                )));
            }
        }
        let founder = FounderHaplotype::Fixed(ladder_min.clone());
        Ok(Self {
            mutation_rates,
            ladder_min,
            ladder_max,
            founder,
        })
    }

    /// Replace the founder haplotype, which must lie on the ladder.
    pub fn with_founder(self, founder: FounderHaplotype) -> Result<Self> {
        founder.validate(self.loci())?;
        let (low, high) = founder.bounds();
        for i in 0..self.loci() {
            if low[i] < self.ladder_min[i] || high[i] > self.ladder_max[i] {
                return Err(Error::InvalidParameter(format!(
                    "founder alleles at locus {i} must lie on the ladder [{}, {}]",
                    self.ladder_min[i], self.ladder_max[i]
                )));
            }
        }
        Ok(Self { founder, ..self })
    }

    pub fn mutation_rates(&self) -> &[f64] {
        &self.mutation_rates
    }

    pub fn ladder_min(&self) -> &[i32] {
        &self.ladder_min
    }

    pub fn ladder_max(&self) -> &[i32] {
        &self.ladder_max
    }

    pub fn founder(&self) -> &FounderHaplotype {
        &self.founder
    }

    pub fn loci(&self) -> usize {
        self.mutation_rates.len()
    }

    // locus < loci() for every caller.
    fn step<R: Rng + ?Sized>(&self, locus: usize, value: i32, rng: &mut R) -> Result<i32> {
        let (min, max) = (self.ladder_min[locus], self.ladder_max[locus]);
        if value < min || value > max {
            return Err(Error::OutsideLadder {
                locus,
                value,
                min,
                max,
            });
        }
        Ok(if value == min {
            value + 1
        } else if value == max {
            value - 1
        } else if rng.gen::<f64>() < 0.5 {
            value - 1
        } else {
            value + 1
        })
    }
}

impl TryFrom<LadderBoundedParameters> for LadderBoundedModel {
    type Error = Error;

    fn try_from(value: LadderBoundedParameters) -> Result<Self> {
        let model = Self::new(value.mutation_rates, value.ladder_min, value.ladder_max)?;
        match value.founder {
            Some(founder) => model.with_founder(founder),
            None => Ok(model),
        }
    }
}

impl From<LadderBoundedModel> for LadderBoundedParameters {
    fn from(value: LadderBoundedModel) -> Self {
        Self {
            mutation_rates: value.mutation_rates,
            ladder_min: value.ladder_min,
            ladder_max: value.ladder_max,
            founder: Some(value.founder),
        }
    }
}

impl Transmission for LadderBoundedModel {
    fn founder_haplotype<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i32> {
        self.founder.draw(rng)
    }

    fn inherit<R: Rng + ?Sized>(
        &self,
        parent: &[i32],
        child: &mut Individual,
        rng: &mut R,
    ) -> Result<()> {
        copy_parent(parent, self.loci(), child)?;
        child.mutate_haplotype(|haplotype| {
            for (locus, allele) in haplotype.iter_mut().enumerate() {
                if rng.gen::<f64>() < self.mutation_rates[locus] {
                    *allele = self.step(locus, *allele, rng)?;
                }
            }
            Ok(())
        })
    }
}
