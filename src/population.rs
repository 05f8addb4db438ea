use crate::error::{Error, Result};
use crate::Individual;
use crate::Node;
use crate::Pedigree;

/// Owns every [`Individual`] created by one simulation.
///
/// Individuals are never removed, so a [`Node`] handed out
/// by a population stays valid for the population's lifetime.
#[derive(Debug, Default, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            individuals: Vec::with_capacity(capacity),
        }
    }

    pub fn add_individual(&mut self, generation: u32) -> Node {
        let node = Node(self.individuals.len());
        self.individuals.push(Individual::new(node, generation));
        node
    }

    /// Record `father` as the father of `child`, updating both ends.
    ///
    /// Generations strictly increase from child to father, which keeps
    /// the population a forest.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownIndividual`] for either argument.
    /// * [`Error::InvalidLink`] unless `father` is older than `child`.
    /// * [`Error::FatherAlreadySet`] if `child` already has a father.
    pub fn link(&mut self, father: Node, child: Node) -> Result<()> {
        self.check(father)?;
        self.check(child)?;
        let father_generation = self.at(father).generation();
        let child_generation = self.at(child).generation();
        if father_generation <= child_generation {
            return Err(Error::InvalidLink {
                father,
                child,
                father_generation,
                child_generation,
            });
        }
        self.individuals[child.as_index()].set_father(father)?;
        self.individuals[father.as_index()].add_child(child);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, node: Node) -> Option<&Individual> {
        self.individuals.get(node.as_index())
    }

    pub fn individual(&self, node: Node) -> Result<&Individual> {
        self.get(node).ok_or(Error::UnknownIndividual(node))
    }

    pub fn individual_mut(&mut self, node: Node) -> Result<&mut Individual> {
        self.individuals
            .get_mut(node.as_index())
            .ok_or(Error::UnknownIndividual(node))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Individual> + '_ {
        self.individuals.iter()
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> {
        (0..self.individuals.len()).map(Node)
    }

    /// Number of individuals with `generation <= bound`.
    /// `None` counts everyone.
    pub fn size_up_to_generation(&self, bound: Option<u32>) -> usize {
        match bound {
            Some(b) => self.iter().filter(|i| i.generation() <= b).count(),
            None => self.len(),
        }
    }

    /// Individuals of the `k + 1` most recent generations,
    /// in order of creation.
    pub fn individuals_up_to_generation(&self, k: u32) -> Vec<Node> {
        self.iter()
            .filter(|i| i.generation() <= k)
            .map(|i| i.node())
            .collect()
    }

    /// Drop all pedigree assignments so that
    /// [`extract_pedigrees`](crate::extract_pedigrees) can run again.
    pub fn clear_pedigrees(&mut self) {
        self.individuals
            .iter_mut()
            .for_each(|i| i.unassign_pedigree());
    }

    /// Remove haplotypes from every member of `pedigree`.
    pub fn clear_haplotypes(&mut self, pedigree: &Pedigree) -> Result<()> {
        for &node in pedigree.members() {
            self.individual_mut(node)?.clear_haplotype();
        }
        Ok(())
    }

    pub(crate) fn check(&self, node: Node) -> Result<()> {
        if node.as_index() < self.individuals.len() {
            Ok(())
        } else {
            Err(Error::UnknownIndividual(node))
        }
    }

    // NOTE: panics if node is out of bounds.
    // Callers validate first.
    pub(crate) fn at(&self, node: Node) -> &Individual {
        &self.individuals[node.as_index()]
    }

    pub(crate) fn at_mut(&mut self, node: Node) -> &mut Individual {
        &mut self.individuals[node.as_index()]
    }
}

#[cfg(test)]
mod test_population {
    use super::*;

    //   0
    //  ---
    //  1 2
    //  |
    //  3
    fn small_population() -> (Population, [Node; 4]) {
        let mut pop = Population::new();
        let n3 = pop.add_individual(0);
        let n1 = pop.add_individual(1);
        let n2 = pop.add_individual(1);
        let n0 = pop.add_individual(2);
        pop.link(n0, n1).unwrap();
        pop.link(n0, n2).unwrap();
        pop.link(n1, n3).unwrap();
        (pop, [n0, n1, n2, n3])
    }

    #[test]
    fn test_identities_are_increasing() {
        let (pop, _) = small_population();
        let nodes = pop.nodes().collect::<Vec<_>>();
        assert!(nodes.windows(2).all(|w| w[0] < w[1]));
        for (node, ind) in nodes.iter().zip(pop.iter()) {
            assert_eq!(*node, ind.node());
        }
    }

    #[test]
    fn test_link_records_both_ends() {
        let (pop, [n0, n1, n2, n3]) = small_population();
        assert_eq!(pop.at(n0).children(), &[n1, n2]);
        assert_eq!(pop.at(n1).father(), Some(n0));
        assert_eq!(pop.at(n3).father(), Some(n1));
        assert!(pop.at(n0).is_founder());
    }

    #[test]
    fn test_link_twice_fails() {
        let (mut pop, [n0, _, _, n3]) = small_population();
        assert_eq!(pop.link(n0, n3), Err(Error::FatherAlreadySet(n3)));
        assert!(!pop.at(n0).children().contains(&n3));
    }

    #[test]
    fn test_link_must_go_back_in_time() {
        let (mut pop, [n0, n1, n2, n3]) = small_population();
        let n4 = pop.add_individual(0);
        assert_eq!(
            pop.link(n4, n4),
            Err(Error::InvalidLink {
                father: n4,
                child: n4,
                father_generation: 0,
                child_generation: 0
            })
        );
        // Same generation, and younger father.
        assert!(matches!(pop.link(n2, n1), Err(Error::InvalidLink { .. })));
        assert!(matches!(pop.link(n3, n0), Err(Error::InvalidLink { .. })));
        assert!(pop.at(n4).is_founder());
        assert!(pop.at(n4).children().is_empty());
        assert!(pop.at(n2).children().is_empty());
        pop.link(n2, n4).unwrap();
        assert_eq!(pop.at(n4).father(), Some(n2));
    }

    #[test]
    fn test_unknown_individual() {
        let (mut pop, [n0, ..]) = small_population();
        assert_eq!(pop.link(n0, Node(10)), Err(Error::UnknownIndividual(Node(10))));
        assert!(pop.individual(Node(4)).is_err());
        assert!(pop.get(Node(3)).is_some());
    }

    #[test]
    fn test_generation_bounded_queries() {
        let (pop, [_, n1, n2, n3]) = small_population();
        assert_eq!(pop.size_up_to_generation(None), 4);
        assert_eq!(pop.size_up_to_generation(Some(0)), 1);
        assert_eq!(pop.size_up_to_generation(Some(1)), 3);
        assert_eq!(pop.individuals_up_to_generation(1), vec![n3, n1, n2]);
    }
}
