use crate::Node;

/// Per-generation record of a simulation, kept when
/// [`SimulationParameters::verbose`](crate::SimulationParameters) is set.
///
/// Columns are indexed by generation and rows by lineage slot.
/// For generation `g`, `individuals(g)[slot]` is the individual occupying
/// `slot`, while `fathers(g)[slot]` and `father_slots(g)[slot]` describe
/// its father in generation `g + 1`. Empty slots, and every slot
/// of the last generation, hold `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationTrace {
    individuals: Vec<Vec<Option<Node>>>,
    fathers: Vec<Vec<Option<Node>>>,
    father_slots: Vec<Vec<Option<usize>>>,
}

impl GenerationTrace {
    pub(crate) fn new(end_generation: &[Node]) -> Self {
        let slots = end_generation.len();
        Self {
            individuals: vec![end_generation.iter().copied().map(Some).collect()],
            fathers: vec![vec![None; slots]],
            father_slots: vec![vec![None; slots]],
        }
    }

    pub(crate) fn begin_generation(&mut self) {
        let slots = self.population_size();
        self.individuals.push(vec![None; slots]);
        self.fathers.push(vec![None; slots]);
        self.father_slots.push(vec![None; slots]);
    }

    pub(crate) fn record_individual(&mut self, slot: usize, node: Node) {
        if let Some(column) = self.individuals.last_mut() {
            column[slot] = Some(node);
        }
    }

    // The children of the generation being built
    // live in the second to last column.
    pub(crate) fn record_father(&mut self, child_slot: usize, father: Node, father_slot: usize) {
        let n = self.fathers.len();
        debug_assert!(n > 1);
        self.fathers[n - 2][child_slot] = Some(father);
        self.father_slots[n - 2][child_slot] = Some(father_slot);
    }

    pub fn num_generations(&self) -> usize {
        self.individuals.len()
    }

    pub fn population_size(&self) -> usize {
        self.individuals.first().map_or(0, |c| c.len())
    }

    pub fn individuals(&self, generation: usize) -> Option<&[Option<Node>]> {
        self.individuals.get(generation).map(|c| c.as_slice())
    }

    pub fn fathers(&self, generation: usize) -> Option<&[Option<Node>]> {
        self.fathers.get(generation).map(|c| c.as_slice())
    }

    pub fn father_slots(&self, generation: usize) -> Option<&[Option<usize>]> {
        self.father_slots.get(generation).map(|c| c.as_slice())
    }
}
