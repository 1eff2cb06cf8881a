use std::fmt::Display;
use std::hash::Hash;
use std::hash::Hasher;
use std::time::Duration;

use fnv::FnvHasher;

use super::ConstraintAssignment;
use crate::blocksplit_assert_simple;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::model::ConstraintId;
use crate::model::IncidenceModel;
use crate::model::VariableId;

/// Identifies a [`Seeed`] within one run of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeeedId(u32);

impl StorageKey for SeeedId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        SeeedId(index as u32)
    }
}

impl Display for SeeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seeed {}", self.0)
    }
}

/// One step in the provenance of a seeed: which detector touched it, how long that took, and how
/// much of the model it moved out of the open part.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorStage {
    pub detector: String,
    pub duration: Duration,
    /// Percentage of all constraints which were open before and assigned after this stage.
    pub constraints_moved: f64,
    /// Percentage of all variables which were open before and no longer open after this stage.
    pub variables_moved: f64,
}

/// A partial decomposition.
///
/// Every constraint is either open, in the master, or in one of the blocks `0..num_blocks`. A
/// detector receives a frozen seeed, creates children with [`Seeed::child`], and assigns some of
/// the open constraints of the children. The scheduler freezes the children once the detector
/// returns; a frozen seeed is never mutated again.
#[derive(Clone, Debug)]
pub struct Seeed {
    id: Option<SeeedId>,
    parent: Option<SeeedId>,
    constraints: KeyedVec<ConstraintId, Option<ConstraintAssignment>>,
    num_blocks: usize,
    stages: Vec<DetectorStage>,
    hash: Option<u64>,
}

impl Seeed {
    /// A seeed in which every constraint of `model` is open.
    pub fn new<M: IncidenceModel>(model: &M) -> Seeed {
        Seeed {
            id: None,
            parent: None,
            constraints: KeyedVec::with_len(model.num_constraints(), None),
            num_blocks: 0,
            stages: Vec::new(),
            hash: None,
        }
    }

    /// An unfrozen copy of this seeed which remembers this seeed as its parent.
    pub fn child(&self) -> Seeed {
        Seeed {
            id: None,
            parent: self.id,
            constraints: self.constraints.clone(),
            num_blocks: self.num_blocks,
            stages: self.stages.clone(),
            hash: None,
        }
    }

    pub fn id(&self) -> Option<SeeedId> {
        self.id
    }

    pub fn parent(&self) -> Option<SeeedId> {
        self.parent
    }

    pub fn is_frozen(&self) -> bool {
        self.hash.is_some()
    }

    /// The deduplication hash, available once the seeed is frozen.
    pub fn hash(&self) -> Option<u64> {
        self.hash
    }

    pub fn stages(&self) -> &[DetectorStage] {
        &self.stages
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Open a new, empty block and return its id.
    pub fn new_block(&mut self) -> usize {
        blocksplit_assert_simple!(!self.is_frozen(), "frozen seeeds cannot be modified");
        self.num_blocks += 1;
        self.num_blocks - 1
    }

    /// The assignment of `constraint`, [`None`] when it is open.
    pub fn assignment(&self, constraint: ConstraintId) -> Option<ConstraintAssignment> {
        self.constraints[constraint]
    }

    /// The assignment of every constraint, in increasing id order.
    pub fn assignments(&self) -> impl Iterator<Item = Option<ConstraintAssignment>> + '_ {
        self.constraints.iter().copied()
    }

    pub fn is_open(&self, constraint: ConstraintId) -> bool {
        self.constraints[constraint].is_none()
    }

    pub fn set_master(&mut self, constraint: ConstraintId) {
        blocksplit_assert_simple!(!self.is_frozen(), "frozen seeeds cannot be modified");
        self.constraints[constraint] = Some(ConstraintAssignment::Master);
    }

    pub fn set_block(&mut self, constraint: ConstraintId, block: usize) {
        blocksplit_assert_simple!(!self.is_frozen(), "frozen seeeds cannot be modified");
        blocksplit_assert_simple!(block < self.num_blocks, "block {block} was never opened");
        self.constraints[constraint] = Some(ConstraintAssignment::Block(block));
    }

    /// Replace the blocks of this seeed by the given labelling. Constraints without a label keep
    /// their current assignment.
    pub(crate) fn set_blocks(
        &mut self,
        labels: &KeyedVec<ConstraintId, Option<usize>>,
        num_blocks: usize,
    ) {
        blocksplit_assert_simple!(!self.is_frozen(), "frozen seeeds cannot be modified");
        self.num_blocks = num_blocks;
        for (constraint, label) in labels.enumerate() {
            if let Some(block) = label {
                self.constraints[constraint] = Some(ConstraintAssignment::Block(*block));
            }
        }
    }

    pub fn open_constraints(&self) -> impl Iterator<Item = ConstraintId> + '_ {
        self.constraints
            .enumerate()
            .filter(|(_, assignment)| assignment.is_none())
            .map(|(constraint, _)| constraint)
    }

    pub fn num_open_constraints(&self) -> usize {
        self.open_constraints().count()
    }

    pub fn master_constraints(&self) -> impl Iterator<Item = ConstraintId> + '_ {
        self.constraints
            .enumerate()
            .filter(|(_, assignment)| matches!(assignment, Some(ConstraintAssignment::Master)))
            .map(|(constraint, _)| constraint)
    }

    /// The constraints of every block, each in increasing id order.
    pub fn blocks(&self) -> Vec<Vec<ConstraintId>> {
        let mut blocks = vec![Vec::new(); self.num_blocks];
        for (constraint, assignment) in self.constraints.enumerate() {
            if let Some(ConstraintAssignment::Block(block)) = assignment {
                blocks[*block].push(constraint);
            }
        }
        blocks
    }

    /// The labelling of the block constraints, [`None`] for open and master constraints.
    pub(crate) fn block_labels(&self) -> KeyedVec<ConstraintId, Option<usize>> {
        self.constraints
            .iter()
            .map(|assignment| match assignment {
                Some(ConstraintAssignment::Block(block)) => Some(*block),
                _ => None,
            })
            .collect()
    }

    /// Whether no constraint is open anymore.
    pub fn is_complete(&self) -> bool {
        self.constraints.iter().all(Option::is_some)
    }

    /// The variables which occur in at least one open constraint.
    pub fn open_variables<M: IncidenceModel>(&self, model: &M) -> Vec<VariableId> {
        let mut open = KeyedVec::with_len(model.num_variables(), false);
        for constraint in self.open_constraints() {
            for (variable, _) in model.variables_of(constraint) {
                open[variable] = true;
            }
        }
        open.enumerate()
            .filter(|(_, &is_open)| is_open)
            .map(|(variable, _)| variable)
            .collect()
    }

    /// Drop blocks without constraints and renumber the remaining ones, keeping their relative
    /// order.
    pub fn prune_empty_blocks(&mut self) {
        let mut used = vec![false; self.num_blocks];
        for assignment in self.constraints.iter() {
            if let Some(ConstraintAssignment::Block(block)) = assignment {
                used[*block] = true;
            }
        }
        let mut next = 0;
        let new_id: Vec<Option<usize>> = used
            .into_iter()
            .map(|used| {
                used.then(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect();

        for assignment in self.constraints.iter_mut() {
            if let Some(ConstraintAssignment::Block(block)) = assignment {
                if let Some(id) = new_id[*block] {
                    *block = id;
                }
            }
        }
        self.num_blocks = next;
    }

    /// Freeze the seeed: empty blocks are pruned, the stage is appended to the provenance, and
    /// the deduplication hash is computed.
    pub fn freeze(&mut self, id: SeeedId, stage: Option<DetectorStage>) {
        blocksplit_assert_simple!(!self.is_frozen(), "seeeds are frozen only once");
        self.prune_empty_blocks();
        self.id = Some(id);
        if let Some(stage) = stage {
            self.stages.push(stage);
        }

        let mut hasher = FnvHasher::default();
        self.canonical_form().hash(&mut hasher);
        self.hash = Some(hasher.finish());
    }

    /// Append the provenance of a seeed with the same structure found along another chain.
    pub(crate) fn merge_provenance(&mut self, stages: &[DetectorStage]) {
        for stage in stages {
            if !self.stages.contains(stage) {
                self.stages.push(stage.clone());
            }
        }
    }

    /// The structure of the seeed independent of block numbering: the open constraints, the
    /// master constraints, and the sorted list of blocks.
    pub(crate) fn canonical_form(&self) -> CanonicalForm {
        let mut blocks = self.blocks();
        blocks.sort();

        CanonicalForm {
            open: self.open_constraints().collect(),
            master: self.master_constraints().collect(),
            blocks,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CanonicalForm {
    open: Vec<ConstraintId>,
    master: Vec<ConstraintId>,
    blocks: Vec<Vec<ConstraintId>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::KeyGenerator;
    use crate::model::test_models::three_constraints_with_linking;

    #[test]
    fn hash_does_not_depend_on_block_numbering() {
        let (model, [c0, c1, c2]) = three_constraints_with_linking();
        let mut ids = KeyGenerator::<SeeedId>::default();

        let mut first = Seeed::new(&model);
        let b0 = first.new_block();
        let b1 = first.new_block();
        first.set_block(c0, b0);
        first.set_block(c1, b1);
        first.set_master(c2);

        let mut second = Seeed::new(&model);
        let b0 = second.new_block();
        let b1 = second.new_block();
        second.set_block(c0, b1);
        second.set_block(c1, b0);
        second.set_master(c2);

        first.freeze(ids.next_key(), None);
        second.freeze(ids.next_key(), None);

        assert_eq!(first.hash(), second.hash());
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn freezing_prunes_empty_blocks() {
        let (model, [c0, c1, _]) = three_constraints_with_linking();

        let mut seeed = Seeed::new(&model);
        let _ = seeed.new_block();
        let b1 = seeed.new_block();
        let _ = seeed.new_block();
        let b3 = seeed.new_block();
        seeed.set_block(c0, b3);
        seeed.set_block(c1, b1);
        seeed.freeze(SeeedId::create_from_index(0), None);

        assert_eq!(seeed.num_blocks(), 2);
        assert_eq!(seeed.blocks(), vec![vec![c1], vec![c0]]);
        assert!(!seeed.is_complete());
    }

    #[test]
    fn children_remember_their_parent() {
        let (model, [_, _, c2]) = three_constraints_with_linking();
        let mut root = Seeed::new(&model);
        root.freeze(SeeedId::create_from_index(7), None);

        let mut child = root.child();
        child.set_master(c2);

        assert_eq!(child.parent(), Some(SeeedId::create_from_index(7)));
        assert!(!child.is_frozen());
        assert_eq!(child.num_open_constraints(), 2);
        assert_eq!(root.num_open_constraints(), 3);
    }

    #[test]
    fn open_variables_touch_open_constraints() {
        let (model, [c0, _, c2]) = three_constraints_with_linking();
        let mut seeed = Seeed::new(&model);
        seeed.set_master(c2);
        let block = seeed.new_block();
        seeed.set_block(c0, block);

        let names: Vec<&str> = seeed
            .open_variables(&model)
            .into_iter()
            .map(|variable| model.variable_name(variable))
            .collect();
        assert_eq!(names, vec!["x3", "x4"]);
    }
}
