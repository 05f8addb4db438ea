//! Diploid genotypes at a single autosomal locus.
//!
//! A genotype is stored as the sorted pair of allele indexes
//! into the allele distribution. Founders draw genotypes under
//! Hardy-Weinberg proportions corrected for the kinship coefficient
//! `theta`. A child takes one allele of its father and a second one
//! drawn conditionally on the first, then each allele may step to a
//! neighbouring index.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Transmission;
use crate::error::{check_probability, Error, Result};
use crate::Individual;

/// Serialized form of an [`AutosomalModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosomalParameters {
    /// Allele frequencies, normalized to sum to one.
    pub allele_dist: Vec<f64>,
    pub theta: f64,
    pub mutation_rate: f64,
}

fn normalized_alleles(allele_dist: &[f64]) -> Result<Vec<f64>> {
    if allele_dist.len() < 2 {
        return Err(Error::InvalidParameter(format!(
            "at least two alleles are required, got {}",
            allele_dist.len()
        )));
    }
    for &p in allele_dist {
        check_probability("allele probability", p)?;
    }
    let total: f64 = allele_dist.iter().sum();
    if total <= 0.0 {
        return Err(Error::InvalidParameter(
            "allele probabilities must have a positive sum".to_string(),
        ));
    }
    Ok(allele_dist.iter().map(|p| p / total).collect())
}

fn cumulative_sum(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values
        .into_iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

// First position with u <= cumulative; the last one absorbs rounding.
fn inverse_cdf(cumulative: &[f64], u: f64) -> usize {
    cumulative
        .iter()
        .position(|&c| u <= c)
        .unwrap_or(cumulative.len() - 1)
}

// Position k of the lower-triangular order to the pair (j, i), j <= i.
fn genotype_at(k: usize) -> [usize; 2] {
    let mut i = 0;
    let mut first = 0;
    while first + i + 1 <= k {
        first += i + 1;
        i += 1;
    }
    [k - first, i]
}

/// Probabilities of every unordered genotype.
///
/// Genotypes are listed as `(i, j)` for `i` in allele order and
/// `j <= i`. Homozygotes have probability `theta p_i + (1 - theta) p_i^2`
/// and heterozygotes `2 (1 - theta) p_i p_j`.
pub fn genotype_probabilities(allele_dist: &[f64], theta: f64) -> Result<Vec<f64>> {
    check_probability("theta", theta)?;
    let p = normalized_alleles(allele_dist)?;
    let mut rv = Vec::with_capacity(p.len() * (p.len() + 1) / 2);
    for i in 0..p.len() {
        for j in 0..=i {
            rv.push(if i == j {
                theta * p[i] + (1.0 - theta) * p[i] * p[i]
            } else {
                2.0 * (1.0 - theta) * p[i] * p[j]
            });
        }
    }
    Ok(rv)
}

/// Row `i` is the cumulative distribution of the second allele
/// given that the first one is `i`.
///
/// The conditional probability of `j` is `(1 - theta) p_j`, plus
/// `theta` when `j == i`. This is defined even for alleles of
/// frequency zero, which mutation can still produce.
pub fn conditional_cumulative(allele_dist: &[f64], theta: f64) -> Result<Vec<Vec<f64>>> {
    check_probability("theta", theta)?;
    let p = normalized_alleles(allele_dist)?;
    Ok((0..p.len())
        .map(|i| {
            cumulative_sum(
                p.iter()
                    .enumerate()
                    .map(|(j, &pj)| (1.0 - theta) * pj + if i == j { theta } else { 0.0 }),
            )
        })
        .collect())
}

/// Draw one genotype as a sorted pair of allele indexes.
pub fn sample_genotype<R: Rng + ?Sized>(
    allele_dist: &[f64],
    theta: f64,
    rng: &mut R,
) -> Result<[usize; 2]> {
    let cumulative = cumulative_sum(genotype_probabilities(allele_dist, theta)?);
    Ok(genotype_at(inverse_cdf(&cumulative, rng.gen::<f64>())))
}

/// With probability `mutation_rate`, step `index` to a neighbour in
/// `0..=max`. The ends step inward.
///
/// # Errors
///
/// * [`Error::InvalidParameter`] if `max == 0`, as no step is possible.
/// * [`Error::OutsideLadder`] if `index > max`.
pub fn possible_mutate_index<R: Rng + ?Sized>(
    index: usize,
    mutation_rate: f64,
    max: usize,
    rng: &mut R,
) -> Result<usize> {
    if max == 0 {
        return Err(Error::InvalidParameter(
            "max allele index must be >= 1".to_string(),
        ));
    }
    if index > max {
        return Err(Error::OutsideLadder {
            locus: 0,
            value: i32::try_from(index).unwrap_or(i32::MAX),
            min: 0,
            max: i32::try_from(max).unwrap_or(i32::MAX),
        });
    }
    Ok(if rng.gen::<f64>() >= mutation_rate {
        index
    } else if index == 0 {
        1
    } else if index == max {
        max - 1
    } else if rng.gen::<f64>() < 0.5 {
        index - 1
    } else {
        index + 1
    })
}

/// Inheritance of a single autosomal locus.
///
/// Built from [`AutosomalParameters`], which are validated and turned
/// into sampling tables once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AutosomalParameters", into = "AutosomalParameters")]
pub struct AutosomalModel {
    parameters: AutosomalParameters,
    genotype_cumulative: Vec<f64>,
    conditional: Vec<Vec<f64>>,
}

impl AutosomalModel {
    pub fn new(parameters: AutosomalParameters) -> Result<Self> {
        check_probability("mutation rate", parameters.mutation_rate)?;
        let genotype_cumulative = cumulative_sum(genotype_probabilities(
            &parameters.allele_dist,
            parameters.theta,
        )?);
        let conditional = conditional_cumulative(&parameters.allele_dist, parameters.theta)?;
        Ok(Self {
            parameters,
            genotype_cumulative,
            conditional,
        })
    }

    pub fn parameters(&self) -> &AutosomalParameters {
        &self.parameters
    }

    pub fn num_alleles(&self) -> usize {
        self.conditional.len()
    }

    fn max_index(&self) -> usize {
        self.num_alleles() - 1
    }

    fn allele_index(&self, value: i32) -> Result<usize> {
        usize::try_from(value)
            .ok()
            .filter(|&i| i <= self.max_index())
            .ok_or(Error::OutsideLadder {
                locus: 0,
                value,
                min: 0,
                max: self.max_index() as i32,
            })
    }
}

impl TryFrom<AutosomalParameters> for AutosomalModel {
    type Error = Error;

    fn try_from(value: AutosomalParameters) -> Result<Self> {
        Self::new(value)
    }
}

impl From<AutosomalModel> for AutosomalParameters {
    fn from(value: AutosomalModel) -> Self {
        value.parameters
    }
}

impl Transmission for AutosomalModel {
    fn founder_haplotype<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i32> {
        let [a, b] = genotype_at(inverse_cdf(&self.genotype_cumulative, rng.gen::<f64>()));
        vec![a as i32, b as i32]
    }

    fn inherit<R: Rng + ?Sized>(
        &self,
        parent: &[i32],
        child: &mut Individual,
        rng: &mut R,
    ) -> Result<()> {
        if parent.len() != 2 {
            return Err(Error::LocusCountMismatch {
                expected: 2,
                found: parent.len(),
            });
        }
        let from_father = if rng.gen::<f64>() < 0.5 {
            parent[0]
        } else {
            parent[1]
        };
        let from_father = self.allele_index(from_father)?;
        let other = inverse_cdf(&self.conditional[from_father], rng.gen::<f64>());
        child.set_haplotype(vec![from_father as i32, other as i32])?;

        let (rate, max) = (self.parameters.mutation_rate, self.max_index());
        child.mutate_haplotype(|genotype| {
            for allele in genotype.iter_mut() {
                *allele = possible_mutate_index(*allele as usize, rate, max, rng)? as i32;
            }
            genotype.sort_unstable();
            Ok(())
        })
    }
}
