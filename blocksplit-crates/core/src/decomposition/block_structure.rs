use std::fmt::Display;

use super::DetectorStage;
use super::Seeed;
use crate::basic_types::DetectorDefect;
use crate::blocksplit_assert_advanced;
use crate::containers::KeyedVec;
use crate::model::ConstraintId;
use crate::model::IncidenceModel;
use crate::model::Model;
use crate::model::VariableId;

/// Where a constraint ends up in a decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintAssignment {
    /// The constraint belongs to the given block.
    Block(usize),
    /// The constraint is a linking constraint and stays in the master.
    Master,
}

/// Where a variable ends up in a decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableAssignment {
    /// The variable only occurs in constraints of the given block.
    Block(usize),
    /// The variable occurs in at least two blocks, or in one block and a linking constraint.
    Linking,
    /// The variable only occurs in linking constraints.
    MasterOnly,
    /// The variable does not occur in any constraint.
    Excluded,
}

/// The shape of the constraint matrix once rows and columns are permuted by block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecompositionType {
    /// Independent blocks without linking constraints or variables shared between blocks.
    Diagonal,
    /// Linking constraints, but no variable is shared between blocks.
    Bordered,
    /// No linking constraints; blocks only share variables with the next block.
    Staircase,
    /// Linking constraints and variables shared between blocks, or shared variables in a pattern
    /// which is not a chain.
    Arrowhead,
}

impl Display for DecompositionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DecompositionType::Diagonal => "diagonal",
            DecompositionType::Bordered => "bordered",
            DecompositionType::Staircase => "staircase",
            DecompositionType::Arrowhead => "arrowhead",
        };
        write!(f, "{name}")
    }
}

/// A complete decomposition of a model into a master and independent blocks.
///
/// Every constraint is either in exactly one block or in the master. Every variable is either
/// local to one block, linking, master-only, or excluded. Block ids are contiguous from `0` and
/// no block is empty.
#[derive(Clone, Debug)]
pub struct Decomposition {
    block_constraints: Vec<Vec<ConstraintId>>,
    block_variables: Vec<Vec<VariableId>>,
    linking_constraints: Vec<ConstraintId>,
    linking_variables: Vec<VariableId>,
    master_only_variables: Vec<VariableId>,
    constraint_map: KeyedVec<ConstraintId, ConstraintAssignment>,
    variable_map: KeyedVec<VariableId, VariableAssignment>,
    decomposition_type: DecompositionType,
    stages: Vec<DetectorStage>,
    presolved: bool,
}

impl Decomposition {
    /// Materialise a decomposition from a complete per-constraint assignment.
    ///
    /// Fails when the assignment does not cover every constraint of the model, or when the
    /// block ids are not contiguous or some block is empty.
    pub fn from_assignment<M: IncidenceModel>(
        model: &M,
        constraint_map: KeyedVec<ConstraintId, ConstraintAssignment>,
        stages: Vec<DetectorStage>,
    ) -> Result<Decomposition, DetectorDefect> {
        if constraint_map.len() != model.num_constraints() {
            return Err(DetectorDefect::LengthMismatch {
                what: "constraint assignment",
                expected: model.num_constraints(),
                actual: constraint_map.len(),
            });
        }

        let num_blocks = constraint_map
            .iter()
            .filter_map(|assignment| match assignment {
                ConstraintAssignment::Block(block) => Some(block + 1),
                ConstraintAssignment::Master => None,
            })
            .max()
            .unwrap_or(0);

        let mut block_constraints = vec![Vec::new(); num_blocks];
        let mut linking_constraints = Vec::new();
        for (constraint, assignment) in constraint_map.enumerate() {
            match assignment {
                ConstraintAssignment::Block(block) => block_constraints[*block].push(constraint),
                ConstraintAssignment::Master => linking_constraints.push(constraint),
            }
        }

        if let Some(empty) = block_constraints.iter().position(Vec::is_empty) {
            return Err(DetectorDefect::InconsistentPartition(format!(
                "block {empty} of {num_blocks} has no constraints"
            )));
        }

        // For every variable: the blocks it occurs in, and whether it occurs in the master.
        let mut variable_blocks: KeyedVec<VariableId, Vec<usize>> =
            KeyedVec::with_len(model.num_variables(), Vec::new());
        let mut in_master = KeyedVec::with_len(model.num_variables(), false);
        for (constraint, assignment) in constraint_map.enumerate() {
            for (variable, _) in model.variables_of(constraint) {
                match assignment {
                    ConstraintAssignment::Block(block) => {
                        let blocks = &mut variable_blocks[variable];
                        if !blocks.contains(block) {
                            blocks.push(*block);
                        }
                    }
                    ConstraintAssignment::Master => in_master[variable] = true,
                }
            }
        }

        let mut block_variables = vec![Vec::new(); num_blocks];
        let mut linking_variables = Vec::new();
        let mut master_only_variables = Vec::new();
        let variable_map: KeyedVec<VariableId, VariableAssignment> = variable_blocks
            .enumerate()
            .map(|(variable, blocks)| {
                for &block in blocks {
                    block_variables[block].push(variable);
                }

                match (blocks.as_slice(), in_master[variable]) {
                    ([], false) => VariableAssignment::Excluded,
                    ([], true) => {
                        master_only_variables.push(variable);
                        VariableAssignment::MasterOnly
                    }
                    ([block], false) => VariableAssignment::Block(*block),
                    _ => {
                        linking_variables.push(variable);
                        VariableAssignment::Linking
                    }
                }
            })
            .collect();

        let decomposition_type =
            classify(&variable_blocks, !linking_constraints.is_empty());

        let decomposition = Decomposition {
            block_constraints,
            block_variables,
            linking_constraints,
            linking_variables,
            master_only_variables,
            constraint_map,
            variable_map,
            decomposition_type,
            stages,
            presolved: false,
        };
        blocksplit_assert_advanced!(decomposition.is_consistent());

        Ok(decomposition)
    }

    /// Materialise a complete seeed.
    pub fn from_seeed<M: IncidenceModel>(
        model: &M,
        seeed: &Seeed,
    ) -> Result<Decomposition, DetectorDefect> {
        if let Some(open) = seeed.open_constraints().next() {
            return Err(DetectorDefect::InconsistentPartition(format!(
                "constraint {open} is still open"
            )));
        }

        let constraint_map = seeed
            .assignments()
            .map(|assignment| assignment.unwrap_or(ConstraintAssignment::Master))
            .collect();

        Decomposition::from_assignment(model, constraint_map, seeed.stages().to_vec())
    }

    pub fn num_blocks(&self) -> usize {
        self.block_constraints.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraint_map.len()
    }

    pub fn num_variables(&self) -> usize {
        self.variable_map.len()
    }

    /// The constraints of `block`, in increasing id order.
    pub fn block_constraints(&self, block: usize) -> &[ConstraintId] {
        &self.block_constraints[block]
    }

    /// Every variable occurring in a constraint of `block`, including the linking ones.
    pub fn block_variables(&self, block: usize) -> &[VariableId] {
        &self.block_variables[block]
    }

    pub fn linking_constraints(&self) -> &[ConstraintId] {
        &self.linking_constraints
    }

    pub fn linking_variables(&self) -> &[VariableId] {
        &self.linking_variables
    }

    pub fn master_only_variables(&self) -> &[VariableId] {
        &self.master_only_variables
    }

    pub fn constraint_assignment(&self, constraint: ConstraintId) -> ConstraintAssignment {
        self.constraint_map[constraint]
    }

    pub fn variable_assignment(&self, variable: VariableId) -> VariableAssignment {
        self.variable_map[variable]
    }

    pub fn decomposition_type(&self) -> DecompositionType {
        self.decomposition_type
    }

    /// The detector stages which produced this decomposition, in order.
    pub fn stages(&self) -> &[DetectorStage] {
        &self.stages
    }

    /// The names of the detectors which contributed, each listed once.
    pub fn detectors(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for stage in &self.stages {
            if !names.contains(&stage.detector.as_str()) {
                names.push(&stage.detector);
            }
        }
        names
    }

    /// Whether the decomposition refers to the presolved model.
    pub fn is_presolved(&self) -> bool {
        self.presolved
    }

    pub fn set_presolved(&mut self, presolved: bool) {
        self.presolved = presolved;
    }

    /// Whether both decompositions partition the constraints in the same way, up to renumbering
    /// of the blocks.
    pub fn has_same_partition(&self, other: &Decomposition) -> bool {
        if self.num_blocks() != other.num_blocks()
            || self.linking_constraints.len() != other.linking_constraints.len()
        {
            return false;
        }

        let mut own = self.block_constraints.clone();
        let mut others = other.block_constraints.clone();
        own.sort();
        others.sort();

        own == others && self.linking_constraints == other.linking_constraints
    }

    /// Record that the same partition was also found through the stages of `other`.
    pub fn merge_provenance(&mut self, other: &Decomposition) {
        for stage in &other.stages {
            if !self.stages.contains(stage) {
                self.stages.push(stage.clone());
            }
        }
    }

    /// Write the blocks of this decomposition to the model: block constraints and local
    /// variables receive their block, every other constraint and variable is reset.
    pub fn apply_to_model(&self, model: &mut Model) {
        for (constraint, assignment) in self.constraint_map.enumerate() {
            let block = match assignment {
                ConstraintAssignment::Block(block) => Some(*block),
                ConstraintAssignment::Master => None,
            };
            model.set_constraint_block(constraint, block);
        }

        for (variable, assignment) in self.variable_map.enumerate() {
            let block = match assignment {
                VariableAssignment::Block(block) => Some(*block),
                _ => None,
            };
            model.set_variable_block(variable, block);
        }
    }

    fn is_consistent(&self) -> bool {
        let constraints_in_blocks: usize = self.block_constraints.iter().map(Vec::len).sum();

        constraints_in_blocks + self.linking_constraints.len() == self.num_constraints()
            && self.block_constraints.iter().all(|block| !block.is_empty())
            && self.block_constraints.iter().enumerate().all(|(block, constraints)| {
                constraints
                    .iter()
                    .all(|&c| self.constraint_map[c] == ConstraintAssignment::Block(block))
            })
    }
}

/// Classify the shape of a decomposition from the blocks each variable occurs in.
fn classify(
    variable_blocks: &KeyedVec<VariableId, Vec<usize>>,
    has_linking_constraints: bool,
) -> DecompositionType {
    let mut has_shared = false;
    let mut chain_like = true;
    for blocks in variable_blocks.iter() {
        if blocks.len() < 2 {
            continue;
        }
        has_shared = true;
        if blocks.len() > 2 || blocks[0].abs_diff(blocks[1]) != 1 {
            chain_like = false;
        }
    }

    match (has_linking_constraints, has_shared) {
        (false, false) => DecompositionType::Diagonal,
        (true, false) => DecompositionType::Bordered,
        (false, true) if chain_like => DecompositionType::Staircase,
        _ => DecompositionType::Arrowhead,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_models::binaries;
    use crate::model::test_models::linear;
    use crate::model::test_models::three_constraints_with_linking;

    fn assignment(
        entries: &[ConstraintAssignment],
    ) -> KeyedVec<ConstraintId, ConstraintAssignment> {
        entries.iter().copied().collect()
    }

    #[test]
    fn linking_variables_of_a_bordered_decomposition() {
        let (model, [c0, c1, c2]) = three_constraints_with_linking();
        let decomposition = Decomposition::from_assignment(
            &model,
            assignment(&[
                ConstraintAssignment::Block(0),
                ConstraintAssignment::Block(1),
                ConstraintAssignment::Master,
            ]),
            vec![],
        )
        .unwrap();

        let names = |variables: &[VariableId]| {
            variables
                .iter()
                .map(|&variable| model.variable_name(variable))
                .collect::<Vec<_>>()
        };

        assert_eq!(decomposition.block_constraints(0), &[c0]);
        assert_eq!(decomposition.block_constraints(1), &[c1]);
        assert_eq!(decomposition.linking_constraints(), &[c2]);
        assert_eq!(names(decomposition.block_variables(0)), vec!["x1", "x2"]);
        assert_eq!(names(decomposition.block_variables(1)), vec!["x3", "x4"]);
        assert_eq!(names(decomposition.linking_variables()), vec!["x1", "x3"]);
        assert_eq!(
            decomposition.decomposition_type(),
            DecompositionType::Bordered
        );
    }

    #[test]
    fn empty_blocks_are_rejected() {
        let (model, _) = three_constraints_with_linking();
        let result = Decomposition::from_assignment(
            &model,
            assignment(&[
                ConstraintAssignment::Block(0),
                ConstraintAssignment::Block(2),
                ConstraintAssignment::Master,
            ]),
            vec![],
        );

        assert!(matches!(
            result,
            Err(DetectorDefect::InconsistentPartition(_))
        ));
    }

    #[test]
    fn chain_of_shared_variables_is_a_staircase() {
        let mut model = Model::default();
        let x = binaries(&mut model, &["a", "b", "c", "d"]);
        let _ = linear(&mut model, "r0", 0.0, 1.0, &[(x[0], 1.0), (x[1], 1.0)]);
        let _ = linear(&mut model, "r1", 0.0, 1.0, &[(x[1], 1.0), (x[2], 1.0)]);
        let _ = linear(&mut model, "r2", 0.0, 1.0, &[(x[2], 1.0), (x[3], 1.0)]);

        let decomposition = Decomposition::from_assignment(
            &model,
            assignment(&[
                ConstraintAssignment::Block(0),
                ConstraintAssignment::Block(1),
                ConstraintAssignment::Block(2),
            ]),
            vec![],
        )
        .unwrap();

        assert_eq!(
            decomposition.decomposition_type(),
            DecompositionType::Staircase
        );
        assert_eq!(decomposition.linking_variables(), &[x[1], x[2]]);
    }

    #[test]
    fn unused_variables_are_excluded_and_master_only_variables_distinguished() {
        let mut model = Model::default();
        let x = binaries(&mut model, &["a", "b", "unused"]);
        let r0 = linear(&mut model, "r0", 0.0, 1.0, &[(x[0], 1.0)]);
        let _ = linear(&mut model, "r1", 0.0, 1.0, &[(x[1], 1.0)]);

        let decomposition = Decomposition::from_assignment(
            &model,
            assignment(&[ConstraintAssignment::Block(0), ConstraintAssignment::Master]),
            vec![],
        )
        .unwrap();

        assert_eq!(decomposition.variable_assignment(x[0]), VariableAssignment::Block(0));
        assert_eq!(decomposition.variable_assignment(x[1]), VariableAssignment::MasterOnly);
        assert_eq!(decomposition.variable_assignment(x[2]), VariableAssignment::Excluded);
        assert_eq!(decomposition.master_only_variables(), &[x[1]]);
        assert_eq!(decomposition.block_constraints(0), &[r0]);
    }

    #[test]
    fn partitions_are_compared_up_to_block_numbering() {
        let (model, _) = three_constraints_with_linking();
        let first = Decomposition::from_assignment(
            &model,
            assignment(&[
                ConstraintAssignment::Block(0),
                ConstraintAssignment::Block(1),
                ConstraintAssignment::Master,
            ]),
            vec![],
        )
        .unwrap();
        let second = Decomposition::from_assignment(
            &model,
            assignment(&[
                ConstraintAssignment::Block(1),
                ConstraintAssignment::Block(0),
                ConstraintAssignment::Master,
            ]),
            vec![],
        )
        .unwrap();
        let third = Decomposition::from_assignment(
            &model,
            assignment(&[
                ConstraintAssignment::Block(0),
                ConstraintAssignment::Block(0),
                ConstraintAssignment::Master,
            ]),
            vec![],
        )
        .unwrap();

        assert!(first.has_same_partition(&second));
        assert!(!first.has_same_partition(&third));
    }

    #[test]
    fn applying_writes_blocks_to_the_model() {
        let (mut model, [c0, c1, c2]) = three_constraints_with_linking();
        let decomposition = Decomposition::from_assignment(
            &model,
            assignment(&[
                ConstraintAssignment::Block(0),
                ConstraintAssignment::Block(1),
                ConstraintAssignment::Master,
            ]),
            vec![],
        )
        .unwrap();

        decomposition.apply_to_model(&mut model);

        assert_eq!(model.constraint_block(c0), Some(0));
        assert_eq!(model.constraint_block(c1), Some(1));
        assert_eq!(model.constraint_block(c2), None);
        let x1 = model.variable_by_name("x1").unwrap();
        let x2 = model.variable_by_name("x2").unwrap();
        assert_eq!(model.variable_block(x1), None);
        assert_eq!(model.variable_block(x2), Some(0));
    }
}
