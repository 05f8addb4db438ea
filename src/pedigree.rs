use log::{debug, info};

use crate::error::{Error, Result};
use crate::Node;
use crate::PedigreeId;
use crate::Population;

/// One connected family tree of a [`Population`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pedigree {
    id: PedigreeId,
    root: Node,
    members: Vec<Node>,
    // (parent, child)
    relations: Vec<(Node, Node)>,
}

impl Pedigree {
    pub fn id(&self) -> PedigreeId {
        self.id
    }

    /// The only member without a father.
    pub fn root(&self) -> Node {
        self.root
    }

    /// Members in the order the extraction visited them.
    pub fn members(&self) -> &[Node] {
        &self.members
    }

    /// Every parent to child edge of the tree, recorded once.
    pub fn relations(&self) -> &[(Node, Node)] {
        &self.relations
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, population: &Population, node: Node) -> bool {
        population
            .get(node)
            .map_or(false, |i| i.pedigree() == Some(self.id))
    }

    /// Number of members with `generation <= bound`.
    /// `None` counts all members. Members missing from
    /// `population` are not counted.
    pub fn size_up_to_generation(&self, population: &Population, bound: Option<u32>) -> usize {
        match bound {
            Some(b) => self
                .members
                .iter()
                .filter(|&&m| population.get(m).map_or(false, |i| i.generation() <= b))
                .count(),
            None => self.size(),
        }
    }
}

/// All pedigrees of a population, indexed by [`PedigreeId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pedigrees {
    pedigrees: Vec<Pedigree>,
}

impl Pedigrees {
    pub fn len(&self) -> usize {
        self.pedigrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pedigrees.is_empty()
    }

    pub fn get(&self, id: PedigreeId) -> Option<&Pedigree> {
        self.pedigrees.get(id.as_index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pedigree> + '_ {
        self.pedigrees.iter()
    }

    /// The pedigree containing `node`.
    pub fn of(&self, population: &Population, node: Node) -> Result<&Pedigree> {
        let id = population
            .individual(node)?
            .pedigree()
            .ok_or(Error::PedigreeNotAssigned(node))?;
        self.get(id).ok_or_else(|| {
            Error::Internal(format!("{node:?} refers to unknown pedigree {id:?}"))
        })
    }
}

impl<'a> IntoIterator for &'a Pedigrees {
    type Item = &'a Pedigree;
    type IntoIter = std::slice::Iter<'a, Pedigree>;

    fn into_iter(self) -> Self::IntoIter {
        self.pedigrees.iter()
    }
}

// Flood fill from `start` along father and children edges.
// The assignment guard makes each node enter the stack
// at most once.
fn flood_fill(id: PedigreeId, start: Node, population: &mut Population) -> Result<Pedigree> {
    let mut members = vec![];
    let mut relations = vec![];
    let mut root = None;
    let mut stack = vec![start];
    population.at_mut(start).assign_pedigree(id);

    while let Some(node) = stack.pop() {
        members.push(node);
        let individual = population.at(node);
        let father = individual.father();
        // Children are cheap to copy compared to juggling borrows.
        let children = individual.children().to_vec();

        match father {
            Some(father) => {
                if population.at_mut(father).assign_pedigree(id) {
                    stack.push(father);
                }
            }
            None => {
                if let Some(previous) = root.replace(node) {
                    return Err(Error::Internal(format!(
                        "pedigree {id:?} has two roots: {previous:?} and {node:?}"
                    )));
                }
            }
        }
        for child in children.into_iter().rev() {
            relations.push((node, child));
            if population.at_mut(child).assign_pedigree(id) {
                stack.push(child);
            }
        }
    }

    let root = root.ok_or_else(|| Error::Internal(format!("pedigree {id:?} has no root")))?;
    Ok(Pedigree {
        id,
        root,
        members,
        relations,
    })
}

/// Partition `population` into its maximal family trees.
///
/// Every individual is stamped with the [`PedigreeId`] of its tree.
///
/// # Errors
///
/// * [`Error::PedigreesAlreadyAssigned`] if any individual already
///   belongs to a pedigree. See [`Population::clear_pedigrees`].
/// * [`Error::Internal`] if a component is not a tree with one root.
///   No individual keeps a pedigree assignment in that case.
pub fn extract_pedigrees(population: &mut Population) -> Result<Pedigrees> {
    if population.iter().any(|i| i.pedigree().is_some()) {
        return Err(Error::PedigreesAlreadyAssigned);
    }
    let mut pedigrees = vec![];
    for node in population.nodes() {
        if population.at(node).pedigree().is_some() {
            continue;
        }
        let id = PedigreeId(pedigrees.len());
        let pedigree = match flood_fill(id, node, population) {
            Ok(pedigree) => pedigree,
            Err(e) => {
                population.clear_pedigrees();
                return Err(e);
            }
        };
        debug!(
            "pedigree {id:?}: root = {:?}, size = {}",
            pedigree.root(),
            pedigree.size()
        );
        pedigrees.push(pedigree);
    }
    info!(
        "extracted {} pedigrees from {} individuals",
        pedigrees.len(),
        population.len()
    );
    Ok(Pedigrees { pedigrees })
}


#[cfg(test)]
mod test_extraction {
    use super::pedigree_fixtures::Forest;
    use super::*;
    use crate::kinship::meiotic_distance;
    use crate::simulate::{simulate, Generations, SimulationParameters};
    use crate::NeverCancel;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_forest() {
        let Forest {
            nodes,
            mut population,
        } = Forest::new();
        let pedigrees = extract_pedigrees(&mut population).unwrap();
        assert_eq!(pedigrees.len(), 2);

        let a = pedigrees.get(PedigreeId(0)).unwrap();
        assert_eq!(a.root(), nodes[0]);
        assert_eq!(a.size(), 7);
        assert_eq!(a.relations().len(), 6);
        for &n in &nodes[..7] {
            assert!(a.members().contains(&n));
            assert!(a.contains(&population, n));
        }
        assert!(a.relations().contains(&(nodes[1], nodes[4])));
        assert_eq!(a.size_up_to_generation(&population, Some(2)), 4);

        let b = pedigrees.get(PedigreeId(1)).unwrap();
        assert_eq!(b.root(), nodes[7]);
        assert_eq!(b.members().len(), 2);
        assert_eq!(b.relations(), &[(nodes[7], nodes[8])]);
        assert!(!b.contains(&population, nodes[0]));

        assert_eq!(pedigrees.of(&population, nodes[8]).unwrap().id(), PedigreeId(1));
    }

    #[test]
    fn test_extraction_twice_requires_clearing() {
        let Forest { mut population, .. } = Forest::new();
        let first = extract_pedigrees(&mut population).unwrap();
        assert_eq!(
            extract_pedigrees(&mut population),
            Err(Error::PedigreesAlreadyAssigned)
        );
        population.clear_pedigrees();
        let second = extract_pedigrees(&mut population).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_extraction_leaves_no_assignments() {
        let mut population = Population::new();
        let a = population.add_individual(1);
        let b = population.add_individual(2);
        let c = population.add_individual(0);
        population.link(b, c).unwrap();
        // A two-node cycle cannot be built through link().
        population.at_mut(a).set_father(b).unwrap();
        population.at_mut(b).set_father(a).unwrap();
        population.at_mut(a).add_child(b);
        population.at_mut(b).add_child(a);

        assert!(matches!(
            extract_pedigrees(&mut population),
            Err(Error::Internal(_))
        ));
        assert!(population.iter().all(|i| i.pedigree().is_none()));
        assert!(matches!(
            extract_pedigrees(&mut population),
            Err(Error::Internal(_))
        ));
        assert_eq!(
            meiotic_distance(&population, a, b),
            Err(Error::PedigreeNotAssigned(a))
        );
    }

    #[test]
    fn test_size_up_to_generation_with_other_population() {
        let Forest { mut population, .. } = Forest::new();
        let pedigrees = extract_pedigrees(&mut population).unwrap();
        let a = pedigrees.get(PedigreeId(0)).unwrap();
        assert_eq!(a.size_up_to_generation(&Population::new(), Some(3)), 0);
        assert_eq!(a.size_up_to_generation(&Population::new(), None), 7);
    }

    #[test]
    fn test_unassigned_individual() {
        let Forest { nodes, population } = Forest::new();
        let pedigrees = Pedigrees::default();
        assert_eq!(
            pedigrees.of(&population, nodes[3]).unwrap_err(),
            Error::PedigreeNotAssigned(nodes[3])
        );
    }

    proptest! {
        #[test]
        fn test_pedigrees_partition_population(population_size in 2_usize..40, g in 1_u32..8, seed in any::<u64>()) {
            let p = SimulationParameters::new(population_size, Generations::Fixed(g));
            let mut rng = StdRng::seed_from_u64(seed);
            let mut population = simulate(&p, &mut rng, &NeverCancel).unwrap().into_population();
            let pedigrees = extract_pedigrees(&mut population).unwrap();

            let total: usize = pedigrees.iter().map(|p| p.size()).sum();
            prop_assert_eq!(total, population.len());
            for pedigree in &pedigrees {
                prop_assert!(population.at(pedigree.root()).is_founder());
                prop_assert_eq!(pedigree.relations().len(), pedigree.size() - 1);
                for &m in pedigree.members() {
                    prop_assert_eq!(population.at(m).pedigree(), Some(pedigree.id()));
                }
            }
            let founders = population.iter().filter(|i| i.is_founder()).count();
            prop_assert_eq!(founders, pedigrees.len());
        }
    }
}
