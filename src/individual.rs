use crate::error::{Error, Result};
use crate::flags::HaplotypeFlags;
use crate::Node;
use crate::PedigreeId;

/// A node of the genealogy.
///
/// Relations are stored as [`Node`] indexes into the owning
/// [`Population`](crate::Population).
#[derive(Debug, Clone)]
pub struct Individual {
    node: Node,
    generation: u32,
    father: Option<Node>,
    children: Vec<Node>,
    pedigree: Option<PedigreeId>,
    haplotype: Vec<i32>,
    haplotype_flags: HaplotypeFlags,
}

impl Individual {
    pub(crate) fn new(node: Node, generation: u32) -> Self {
        Self {
            node,
            generation,
            father: None,
            children: vec![],
            pedigree: None,
            haplotype: vec![],
            haplotype_flags: HaplotypeFlags::default(),
        }
    }

    pub fn node(&self) -> Node {
        self.node
    }

    /// 0 for the end generation, increasing toward the founders.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn father(&self) -> Option<Node> {
        self.father
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_founder(&self) -> bool {
        self.father.is_none()
    }

    pub fn pedigree(&self) -> Option<PedigreeId> {
        self.pedigree
    }

    pub(crate) fn set_father(&mut self, father: Node) -> Result<()> {
        if self.father.is_some() {
            return Err(Error::FatherAlreadySet(self.node));
        }
        self.father = Some(father);
        Ok(())
    }

    pub(crate) fn add_child(&mut self, child: Node) {
        debug_assert!(!self.children.contains(&child));
        self.children.push(child);
    }

    /// Returns `false` if the individual was already assigned.
    pub(crate) fn assign_pedigree(&mut self, pedigree: PedigreeId) -> bool {
        if self.pedigree.is_some() {
            return false;
        }
        self.pedigree = Some(pedigree);
        true
    }

    pub(crate) fn unassign_pedigree(&mut self) {
        self.pedigree = None;
    }

    /// `None` until a haplotype has been set.
    pub fn haplotype(&self) -> Option<&[i32]> {
        if self.haplotype_flags.is_set() {
            Some(&self.haplotype)
        } else {
            None
        }
    }

    pub fn haplotype_is_set(&self) -> bool {
        self.haplotype_flags.is_set()
    }

    pub fn haplotype_is_mutated(&self) -> bool {
        self.haplotype_flags.is_mutated()
    }

    /// Store a haplotype on an individual that does not yet carry one.
    pub fn set_haplotype(&mut self, haplotype: Vec<i32>) -> Result<()> {
        if self.haplotype_flags.is_set() {
            return Err(Error::HaplotypeAlreadySet(self.node));
        }
        self.haplotype = haplotype;
        self.haplotype_flags = HaplotypeFlags::set();
        Ok(())
    }

    /// Apply `mutation` to the stored haplotype exactly once.
    ///
    /// # Errors
    ///
    /// * [`Error::HaplotypeNotSet`] if no haplotype is stored.
    /// * [`Error::HaplotypeAlreadyMutated`] on a second call.
    /// * Whatever `mutation` returns. The haplotype is then
    ///   left as `mutation` left it and is still marked as mutated.
    pub fn mutate_haplotype<F>(&mut self, mutation: F) -> Result<()>
    where
        F: FnOnce(&mut [i32]) -> Result<()>,
    {
        if !self.haplotype_flags.is_set() {
            return Err(Error::HaplotypeNotSet(self.node));
        }
        if self.haplotype_flags.is_mutated() {
            return Err(Error::HaplotypeAlreadyMutated(self.node));
        }
        self.haplotype_flags = self.haplotype_flags.with_mutated();
        mutation(&mut self.haplotype)
    }

    pub(crate) fn clear_haplotype(&mut self) {
        self.haplotype.clear();
        self.haplotype_flags = HaplotypeFlags::default();
    }
}

#[cfg(test)]
mod test_individual {
    use super::*;

    #[test]
    fn test_father_set_once() {
        let mut ind = Individual::new(Node(0), 0);
        assert!(ind.is_founder());
        ind.set_father(Node(1)).unwrap();
        assert_eq!(ind.father(), Some(Node(1)));
        assert_eq!(
            ind.set_father(Node(2)),
            Err(Error::FatherAlreadySet(Node(0)))
        );
        assert_eq!(ind.father(), Some(Node(1)));
    }

    #[test]
    fn test_pedigree_assignment_is_idempotent() {
        let mut ind = Individual::new(Node(3), 2);
        assert!(ind.assign_pedigree(PedigreeId(0)));
        assert!(!ind.assign_pedigree(PedigreeId(1)));
        assert_eq!(ind.pedigree(), Some(PedigreeId(0)));
        ind.unassign_pedigree();
        assert!(ind.pedigree().is_none());
    }

    #[test]
    fn test_mutate_requires_haplotype() {
        let mut ind = Individual::new(Node(0), 0);
        assert_eq!(
            ind.mutate_haplotype(|_| Ok(())),
            Err(Error::HaplotypeNotSet(Node(0)))
        );
    }

    #[test]
    fn test_double_mutation_is_an_error() {
        let mut ind = Individual::new(Node(0), 0);
        ind.set_haplotype(vec![10, 11]).unwrap();
        ind.mutate_haplotype(|h| {
            h[0] += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(ind.haplotype(), Some(&[11, 11][..]));
        assert_eq!(
            ind.mutate_haplotype(|_| Ok(())),
            Err(Error::HaplotypeAlreadyMutated(Node(0)))
        );
    }

    #[test]
    fn test_second_set_is_an_error() {
        let mut ind = Individual::new(Node(4), 0);
        ind.set_haplotype(vec![1]).unwrap();
        assert_eq!(
            ind.set_haplotype(vec![1]),
            Err(Error::HaplotypeAlreadySet(Node(4)))
        );
        ind.clear_haplotype();
        assert!(ind.haplotype().is_none());
        assert!(ind.set_haplotype(vec![2]).is_ok());
    }
}
