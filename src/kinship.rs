//! Meiotic distances and paths inside a pedigree.
//!
//! Everything here relies on pedigrees being trees:
//! there is exactly one path between two members.

use std::collections::BTreeMap;
use std::collections::HashMap;

use nohash::BuildNoHashHasher;

use crate::error::{Error, Result};
use crate::Node;
use crate::PedigreeId;
use crate::Pedigrees;
use crate::Population;

type DistanceMap = HashMap<Node, u32, BuildNoHashHasher<usize>>;

/// Scratch space of one traversal.
///
/// A node is visited iff it has a distance. Reusing a
/// scratch across queries saves reallocation; each query
/// resets it first.
#[derive(Debug, Default)]
pub struct DistanceScratch {
    distance: DistanceMap,
    stack: Vec<Node>,
}

impl DistanceScratch {
    fn reset(&mut self) {
        self.distance.clear();
        self.stack.clear();
    }

    fn visit(&mut self, node: Node, distance: u32) {
        if !self.distance.contains_key(&node) {
            self.distance.insert(node, distance);
            self.stack.push(node);
        }
    }
}

fn pedigree_of(population: &Population, node: Node) -> Result<PedigreeId> {
    population
        .individual(node)?
        .pedigree()
        .ok_or(Error::PedigreeNotAssigned(node))
}

// Both must be assigned; None if they are in different pedigrees.
fn shared_pedigree(population: &Population, a: Node, b: Node) -> Result<Option<PedigreeId>> {
    let pa = pedigree_of(population, a)?;
    let pb = pedigree_of(population, b)?;
    Ok((pa == pb).then_some(pa))
}

// Walk the tree outward from `start` until `stop` returns true.
fn traverse<F>(population: &Population, start: Node, scratch: &mut DistanceScratch, mut stop: F)
where
    F: FnMut(Node, u32) -> bool,
{
    scratch.reset();
    scratch.visit(start, 0);
    while let Some(node) = scratch.stack.pop() {
        let d = scratch.distance[&node];
        if stop(node, d) {
            return;
        }
        let individual = population.at(node);
        if let Some(father) = individual.father() {
            scratch.visit(father, d + 1);
        }
        for &child in individual.children() {
            scratch.visit(child, d + 1);
        }
    }
}

/// Number of meioses separating `a` and `b`.
///
/// Returns `Ok(None)` when the two belong to different pedigrees.
///
/// # Errors
///
/// * [`Error::UnknownIndividual`] or [`Error::PedigreeNotAssigned`]
///   for either argument.
pub fn meiotic_distance(population: &Population, a: Node, b: Node) -> Result<Option<u32>> {
    let mut scratch = DistanceScratch::default();
    meiotic_distance_with(population, a, b, &mut scratch)
}

/// [`meiotic_distance`] reusing caller-owned scratch space.
pub fn meiotic_distance_with(
    population: &Population,
    a: Node,
    b: Node,
    scratch: &mut DistanceScratch,
) -> Result<Option<u32>> {
    if shared_pedigree(population, a, b)?.is_none() {
        return Ok(None);
    }
    let mut found = None;
    traverse(population, b, scratch, |node, d| {
        if node == a {
            found = Some(d);
            true
        } else {
            false
        }
    });
    match found {
        Some(d) => Ok(Some(d)),
        None => Err(Error::Internal(format!(
            "{a:?} and {b:?} share a pedigree but are not connected"
        ))),
    }
}

// Root first, `node` last.
fn path_from_root(population: &Population, root: Node, node: Node, limit: usize) -> Result<Vec<Node>> {
    let mut path = vec![node];
    let mut current = node;
    while let Some(father) = population.at(current).father() {
        if path.len() > limit {
            return Err(Error::Internal(format!(
                "father chain of {node:?} is longer than its pedigree"
            )));
        }
        path.push(father);
        current = father;
    }
    if current != root {
        return Err(Error::Internal(format!(
            "could not find a path from root {root:?} to {node:?}"
        )));
    }
    path.reverse();
    Ok(path)
}

/// The individuals on the path between `a` and `b`.
///
/// The result starts with the lowest common ancestor, followed by the
/// ancestors of `a` below it down to `a`, then those of `b` down to `b`.
/// It has `meiotic_distance(a, b) + 1` entries, or is empty when the two
/// belong to different pedigrees.
///
/// # Errors
///
/// * [`Error::UnknownIndividual`] or [`Error::PedigreeNotAssigned`]
///   for either argument.
/// * [`Error::Internal`] if a root to node path does not exist.
pub fn path(population: &Population, pedigrees: &Pedigrees, a: Node, b: Node) -> Result<Vec<Node>> {
    let id = match shared_pedigree(population, a, b)? {
        Some(id) => id,
        None => return Ok(vec![]),
    };
    let pedigree = pedigrees
        .get(id)
        .ok_or_else(|| Error::Internal(format!("unknown pedigree {id:?}")))?;
    let root = pedigree.root();
    let path_a = path_from_root(population, root, a, pedigree.size())?;
    let path_b = path_from_root(population, root, b, pedigree.size())?;

    let common = path_a
        .iter()
        .zip(path_b.iter())
        .take_while(|(x, y)| x == y)
        .count();
    if common == 0 {
        return Err(Error::Internal(format!(
            "{a:?} and {b:?} have no common ancestor"
        )));
    }

    let mut rv = Vec::with_capacity(path_a.len() + path_b.len() + 1 - 2 * common);
    rv.push(path_a[common - 1]);
    rv.extend_from_slice(&path_a[common..]);
    rv.extend_from_slice(&path_b[common..]);
    Ok(rv)
}

/// One row of [`meioses_generation_distribution`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MeiosesCount {
    pub generation: u32,
    pub meioses: u32,
    pub count: usize,
}

/// Tabulate the members of `node`'s pedigree by generation and
/// meiotic distance to `node`.
///
/// Members with a generation above `generation_bound` are skipped.
/// Rows are sorted by generation, then meioses.
pub fn meioses_generation_distribution(
    population: &Population,
    node: Node,
    generation_bound: Option<u32>,
) -> Result<Vec<MeiosesCount>> {
    pedigree_of(population, node)?;
    let mut table: BTreeMap<(u32, u32), usize> = BTreeMap::new();
    let mut scratch = DistanceScratch::default();
    traverse(population, node, &mut scratch, |other, d| {
        let generation = population.at(other).generation();
        if generation_bound.map_or(true, |b| generation <= b) {
            *table.entry((generation, d)).or_default() += 1;
        }
        false
    });
    Ok(table
        .into_iter()
        .map(|((generation, meioses), count)| MeiosesCount {
            generation,
            meioses,
            count,
        })
        .collect())
}

#[cfg(test)]
mod test_kinship {
    use super::*;
    use crate::pedigree::extract_pedigrees;
    use crate::pedigree::pedigree_fixtures::Forest;
    use crate::simulate::{simulate, Generations, SimulationParameters};
    use crate::NeverCancel;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn forest() -> (Vec<Node>, Population, Pedigrees) {
        let Forest {
            nodes,
            mut population,
        } = Forest::new();
        let pedigrees = extract_pedigrees(&mut population).unwrap();
        (nodes, population, pedigrees)
    }

    #[test]
    fn test_distances_in_forest() {
        let (n, pop, _) = forest();
        let d = |a: usize, b: usize| meiotic_distance(&pop, n[a], n[b]).unwrap();
        assert_eq!(d(0, 0), Some(0));
        assert_eq!(d(1, 0), Some(1));
        assert_eq!(d(3, 4), Some(2));
        assert_eq!(d(6, 5), Some(5));
        assert_eq!(d(5, 6), Some(5));
        assert_eq!(d(6, 0), Some(3));
        assert_eq!(d(8, 7), Some(1));
        assert_eq!(d(6, 8), None);
    }

    #[test]
    fn test_paths_in_forest() {
        let (n, pop, peds) = forest();
        let p = |a: usize, b: usize| path(&pop, &peds, n[a], n[b]).unwrap();
        // LCA, then down to 6, then down to 5
        assert_eq!(p(6, 5), vec![n[0], n[1], n[3], n[6], n[2], n[5]]);
        assert_eq!(p(3, 4), vec![n[1], n[3], n[4]]);
        assert_eq!(p(6, 1), vec![n[1], n[3], n[6]]);
        assert_eq!(p(4, 4), vec![n[4]]);
        assert!(p(0, 8).is_empty());
    }

    #[test]
    fn test_unassigned_is_an_error() {
        let Forest { nodes, population } = Forest::new();
        assert_eq!(
            meiotic_distance(&population, nodes[0], nodes[1]),
            Err(Error::PedigreeNotAssigned(nodes[0]))
        );
        assert_eq!(
            path(&population, &Pedigrees::default(), nodes[0], nodes[1]),
            Err(Error::PedigreeNotAssigned(nodes[0]))
        );
        let (n, pop, _) = forest();
        assert_eq!(
            meiotic_distance(&pop, n[0], Node(100)),
            Err(Error::UnknownIndividual(Node(100)))
        );
    }

    #[test]
    fn test_meioses_generation_distribution() {
        let (n, pop, _) = forest();
        let table = meioses_generation_distribution(&pop, n[3], None).unwrap();
        let expected = [
            (1, 1, 1), // 6
            (2, 0, 1), // 3
            (2, 2, 1), // 4
            (2, 4, 1), // 5
            (3, 1, 1), // 1
            (3, 3, 1), // 2
            (4, 2, 1), // 0
        ];
        assert_eq!(table.len(), expected.len());
        for (row, (generation, meioses, count)) in table.iter().zip(expected) {
            assert_eq!(
                *row,
                MeiosesCount {
                    generation,
                    meioses,
                    count
                }
            );
        }
        let bounded = meioses_generation_distribution(&pop, n[3], Some(2)).unwrap();
        assert_eq!(bounded.iter().map(|r| r.count).sum::<usize>(), 4);
    }

    proptest! {
        #[test]
        fn test_distance_properties(population_size in 2_usize..15, g in 1_u32..5, seed in any::<u64>()) {
            let p = SimulationParameters::new(population_size, Generations::Fixed(g));
            let mut rng = StdRng::seed_from_u64(seed);
            let mut pop = simulate(&p, &mut rng, &NeverCancel).unwrap().into_population();
            let peds = extract_pedigrees(&mut pop).unwrap();
            let mut scratch = DistanceScratch::default();

            for a in pop.nodes() {
                prop_assert_eq!(meiotic_distance_with(&pop, a, a, &mut scratch).unwrap(), Some(0));
                if let Some(father) = pop.at(a).father() {
                    prop_assert_eq!(meiotic_distance_with(&pop, a, father, &mut scratch).unwrap(), Some(1));
                }
            }
            let nodes = pop.nodes().collect::<Vec<_>>();
            for &a in nodes.iter().step_by(3) {
                for &b in nodes.iter().step_by(2) {
                    let ab = meiotic_distance_with(&pop, a, b, &mut scratch).unwrap();
                    let ba = meiotic_distance_with(&pop, b, a, &mut scratch).unwrap();
                    prop_assert_eq!(ab, ba);
                    let route = path(&pop, &peds, a, b).unwrap();
                    match ab {
                        Some(d) => prop_assert_eq!(route.len() - 1, d as usize),
                        None => prop_assert!(route.is_empty()),
                    }
                }
            }
        }
    }
}
