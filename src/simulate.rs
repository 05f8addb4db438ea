//! Backward-in-time simulation of paternal genealogies.
//!
//! Starting from `population_size` individuals in generation 0, every
//! generation each surviving lineage picks a father slot in the previous
//! generation. The first lineage to pick a slot creates the father living
//! there; later lineages share him. Lineages that were never picked as
//! fathers simply end, so the number of occupied slots (the founders
//! remaining) can only shrink.

use std::cmp::Ordering;

use log::{debug, info, log_enabled, trace, warn, Level};
use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::{Distribution, Gamma};
use serde::{Deserialize, Serialize};

use crate::cancel::{Cancellation, Termination};
use crate::error::{Error, Result};
use crate::trace::GenerationTrace;
use crate::Node;
use crate::Population;

/// How many generations to simulate.
///
/// In configuration files this is the integer sentinel form:
/// `-1` simulates until one founder remains, `g > 0` simulates
/// exactly `g` generations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Generations {
    Fixed(u32),
    UntilOneFounder,
}

impl Generations {
    fn validate(&self) -> Result<()> {
        match self {
            Generations::Fixed(0) => Err(Error::InvalidGenerations(0)),
            _ => Ok(()),
        }
    }

    fn keep_going(&self, generation: u32, founders: usize) -> bool {
        match self {
            Generations::Fixed(g) => generation < *g,
            Generations::UntilOneFounder => founders > 1,
        }
    }
}

impl TryFrom<i64> for Generations {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Generations::UntilOneFounder),
            v if v > 0 => u32::try_from(v)
                .map(Generations::Fixed)
                .map_err(|_| Error::InvalidGenerations(v)),
            v => Err(Error::InvalidGenerations(v)),
        }
    }
}

impl From<Generations> for i64 {
    fn from(value: Generations) -> Self {
        match value {
            Generations::Fixed(g) => i64::from(g),
            Generations::UntilOneFounder => -1,
        }
    }
}

/// How a lineage picks its father slot.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatherSelection {
    /// Every slot is equally likely.
    #[default]
    Uniform,
    /// Each generation, every slot gets a Gamma(shape, scale)
    /// fecundity score and slots are chosen proportionally to it.
    Gamma { shape: f64, scale: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub population_size: usize,
    pub generations: Generations,
    #[serde(default)]
    pub father_selection: FatherSelection,
    /// Keep a [`GenerationTrace`].
    #[serde(default)]
    pub verbose: bool,
}

impl SimulationParameters {
    pub fn new(population_size: usize, generations: Generations) -> Self {
        Self {
            population_size,
            generations,
            father_selection: FatherSelection::default(),
            verbose: false,
        }
    }

    pub fn with_father_selection(self, father_selection: FatherSelection) -> Self {
        Self {
            father_selection,
            ..self
        }
    }

    pub fn with_verbose(self, verbose: bool) -> Self {
        Self { verbose, ..self }
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size <= 1 {
            return Err(Error::InvalidPopulationSize(self.population_size));
        }
        self.generations.validate()?;
        if let FatherSelection::Gamma { shape, scale } = self.father_selection {
            for (name, value) in [("gamma shape", shape), ("gamma scale", scale)] {
                if !(value.is_finite() && value > 0.0) {
                    return Err(Error::InvalidParameter(format!(
                        "{name} must be finite and > 0, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Output of [`simulate`].
#[derive(Debug, Clone)]
pub struct Simulation {
    population: Population,
    generations: u32,
    founders: usize,
    end_generation: Vec<Node>,
    trace: Option<GenerationTrace>,
    termination: Termination,
}

impl Simulation {
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    pub fn into_population(self) -> Population {
        self.population
    }

    /// Number of generations simulated backward from generation 0.
    pub fn generations(&self) -> u32 {
        self.generations
    }

    /// Number of individuals in the oldest simulated generation.
    pub fn founders(&self) -> usize {
        self.founders
    }

    /// The individuals of generation 0, in slot order.
    pub fn end_generation(&self) -> &[Node] {
        &self.end_generation
    }

    pub fn trace(&self) -> Option<&GenerationTrace> {
        self.trace.as_ref()
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }
}

enum FatherSampler {
    Uniform(Uniform<usize>),
    Weighted {
        gamma: Gamma<f64>,
        probabilities: Vec<f64>,
        permutation: Vec<usize>,
        cumulative: Vec<f64>,
    },
}

impl FatherSampler {
    fn new(selection: FatherSelection, population_size: usize) -> Result<Self> {
        match selection {
            FatherSelection::Uniform => Ok(Self::Uniform(Uniform::new(0, population_size))),
            FatherSelection::Gamma { shape, scale } => {
                let gamma = Gamma::new(shape, scale).map_err(|e| {
                    Error::InvalidParameter(format!("gamma({shape}, {scale}): {e}"))
                })?;
                Ok(Self::Weighted {
                    gamma,
                    probabilities: vec![0.0; population_size],
                    permutation: (0..population_size).collect(),
                    cumulative: vec![0.0; population_size],
                })
            }
        }
    }

    // Called once per generation, before any lineage samples.
    fn prepare<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Self::Weighted {
            gamma,
            probabilities,
            permutation,
            cumulative,
        } = self
        {
            probabilities
                .iter_mut()
                .for_each(|p| *p = gamma.sample(rng));
            if log_enabled!(Level::Trace) {
                let n = probabilities.len() as f64;
                let mean = probabilities.iter().sum::<f64>() / n;
                let var = probabilities
                    .iter()
                    .map(|p| (p - mean) * (p - mean))
                    .sum::<f64>()
                    / (n - 1.0);
                trace!("fecundity scores: mean = {mean}, var = {var}");
            }
            normalize(probabilities);
            permutation
                .iter_mut()
                .enumerate()
                .for_each(|(i, p)| *p = i);
            // sort_by is stable, so ties stay in slot order
            permutation.sort_by(|&a, &b| {
                probabilities[b]
                    .partial_cmp(&probabilities[a])
                    .unwrap_or(Ordering::Equal)
            });
            let mut sum = 0.0;
            for (c, &slot) in cumulative.iter_mut().zip(permutation.iter()) {
                sum += probabilities[slot];
                *c = sum;
            }
        }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match self {
            Self::Uniform(uniform) => rng.sample(uniform),
            Self::Weighted {
                permutation,
                cumulative,
                ..
            } => select_slot(cumulative, permutation, rng.gen::<f64>()),
        }
    }
}

fn normalize(probabilities: &mut [f64]) {
    let total: f64 = probabilities.iter().sum();
    if total.is_finite() && total > 0.0 {
        probabilities.iter_mut().for_each(|p| *p /= total);
    } else {
        warn!("degenerate fecundity scores (sum = {total}), falling back to uniform");
        let p = 1.0 / probabilities.len() as f64;
        probabilities.iter_mut().for_each(|x| *x = p);
    }
}

/// Inverse CDF lookup over the descending cumulative distribution:
/// the first position whose cumulative probability is `>= u`.
/// The last position absorbs rounding error in the final sum.
fn select_slot(cumulative: &[f64], permutation: &[usize], u: f64) -> usize {
    let last = cumulative.len() - 1;
    let position = cumulative[..last]
        .iter()
        .position(|&c| u <= c)
        .unwrap_or(last);
    permutation[position]
}

/// Simulate a genealogy backward in time.
///
/// # Errors
///
/// Configuration errors from [`SimulationParameters::validate`].
/// Nothing is simulated in that case.
///
/// # Cancellation
///
/// `cancel` is polled after each complete generation. When it fires, the
/// returned [`Simulation`] holds every completed generation and reports
/// [`Termination::Cancelled`].
pub fn simulate<R, C>(
    parameters: &SimulationParameters,
    rng: &mut R,
    cancel: &C,
) -> Result<Simulation>
where
    R: Rng + ?Sized,
    C: Cancellation + ?Sized,
{
    parameters.validate()?;
    let population_size = parameters.population_size;
    let mut sampler = FatherSampler::new(parameters.father_selection, population_size)?;

    info!(
        "simulating {population_size} lineages, generations = {:?}, father selection = {:?}",
        parameters.generations, parameters.father_selection
    );

    let mut population = Population::with_capacity(2 * population_size);
    let end_generation = (0..population_size)
        .map(|_| population.add_individual(0))
        .collect::<Vec<_>>();
    let mut trace = parameters
        .verbose
        .then(|| GenerationTrace::new(&end_generation));

    let mut children: Vec<Option<Node>> = end_generation.iter().copied().map(Some).collect();
    let mut fathers: Vec<Option<Node>> = vec![None; population_size];
    let mut founders = population_size;
    let mut generation = 0_u32;
    let mut termination = Termination::Completed;

    while parameters.generations.keep_going(generation, founders) {
        generation += 1;
        sampler.prepare(rng);
        fathers.iter_mut().for_each(|f| *f = None);
        if let Some(t) = trace.as_mut() {
            t.begin_generation();
        }

        let mut new_founders = 0_usize;
        for (child_slot, child) in children.iter().enumerate() {
            // Lineages that were never chosen as fathers have ended.
            let Some(child) = *child else {
                continue;
            };
            let father_slot = sampler.sample(rng);
            let father = match fathers[father_slot] {
                Some(father) => father,
                None => {
                    let father = population.add_individual(generation);
                    fathers[father_slot] = Some(father);
                    new_founders += 1;
                    if let Some(t) = trace.as_mut() {
                        t.record_individual(father_slot, father);
                    }
                    father
                }
            };
            population.link(father, child)?;
            if let Some(t) = trace.as_mut() {
                t.record_father(child_slot, father, father_slot);
            }
        }

        std::mem::swap(&mut children, &mut fathers);
        founders = new_founders;
        debug!("generation {generation}: {founders} founders remaining");

        if cancel.is_cancelled() {
            info!("simulation cancelled after {generation} generations");
            termination = Termination::Cancelled;
            break;
        }
    }

    info!(
        "simulated {generation} generations, {} individuals, {founders} founders",
        population.len()
    );

    Ok(Simulation {
        population,
        generations: generation,
        founders,
        end_generation,
        trace,
        termination,
    })
}
