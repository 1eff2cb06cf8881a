use super::ConstraintAssignment;
use super::Decomposition;
use super::Seeed;
use crate::basic_types::BlockUnionFind;
use crate::basic_types::DetectorDefect;
use crate::containers::KeyedVec;
use crate::model::ConstraintId;
use crate::model::IncidenceModel;
use crate::model::ModelSubset;
use crate::model::VariableId;

/// The outcome of [`label_blocks`]: a dense block label for every labelled constraint.
#[derive(Clone, Debug)]
pub(crate) struct BlockLabels {
    pub(crate) labels: KeyedVec<ConstraintId, Option<usize>>,
    pub(crate) num_blocks: usize,
}

/// Which blocks the variables of a prelabelled or labelled constraint are bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Binding {
    Free,
    Block(usize),
    /// The variable occurs in two or more prelabelled blocks.
    Shared,
}

/// Label the constraints of `model` with blocks such that two constraints sharing a variable end
/// up in the same block.
///
/// Constraints with a label in `prelabelled` keep that block, and two prelabelled blocks are
/// never merged. Every other constraint joins the smallest block among its variables which are
/// already bound, or opens a new block when none is; the blocks it touches are merged. A
/// constraint touching two or more prelabelled blocks, and a constraint without variables,
/// receives no label.
pub(crate) fn label_blocks<M: IncidenceModel>(
    model: &M,
    prelabelled: &KeyedVec<ConstraintId, Option<usize>>,
    num_prelabelled_blocks: usize,
) -> BlockLabels {
    let mut union_find = BlockUnionFind::with_blocks(num_prelabelled_blocks);
    let mut binding: KeyedVec<VariableId, Binding> =
        KeyedVec::with_len(model.num_variables(), Binding::Free);
    let mut labels: KeyedVec<ConstraintId, Option<usize>> =
        KeyedVec::with_len(model.num_constraints(), None);

    for constraint in model.constraints() {
        let Some(block) = prelabelled.get(constraint).copied().flatten() else {
            continue;
        };
        labels[constraint] = Some(block);

        for (variable, _) in model.variables_of(constraint) {
            binding[variable] = match binding[variable] {
                Binding::Free => Binding::Block(block),
                Binding::Block(other) if other == block => Binding::Block(block),
                _ => Binding::Shared,
            };
        }
    }

    for constraint in model.constraints() {
        if labels[constraint].is_some() {
            continue;
        }

        let variables: Vec<VariableId> = model
            .variables_of(constraint)
            .map(|(variable, _)| variable)
            .collect();
        if variables.is_empty() {
            continue;
        }

        let mut touched = Vec::new();
        let mut links_prelabelled_blocks = false;
        for &variable in &variables {
            match binding[variable] {
                Binding::Free => {}
                Binding::Block(block) => touched.push(union_find.find(block)),
                Binding::Shared => links_prelabelled_blocks = true,
            }
        }
        touched.sort_unstable();
        touched.dedup();

        // Prelabelled roots stay below `num_prelabelled_blocks`, since unions keep the smaller
        // label.
        let num_prelabelled_touched = touched
            .iter()
            .take_while(|&&root| root < num_prelabelled_blocks)
            .count();
        if links_prelabelled_blocks || num_prelabelled_touched > 1 {
            continue;
        }

        let block = match touched.split_first() {
            Some((&smallest, others)) => {
                for &other in others {
                    let _ = union_find.union(smallest, other);
                }
                smallest
            }
            None => union_find.new_block(),
        };
        labels[constraint] = Some(block);

        for variable in variables {
            binding[variable] = Binding::Block(block);
        }
    }

    let num_blocks = union_find.renumber_contiguous(&mut labels);

    BlockLabels { labels, num_blocks }
}

/// Completes partial block assignments into decompositions.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecompositionBuilder;

impl DecompositionBuilder {
    /// Build the decomposition in which `master` are the linking constraints and the blocks are
    /// the connected components of the remaining constraints. Constraints without variables are
    /// put in the master.
    pub fn build_from_master_constraints<M: IncidenceModel>(
        model: &M,
        master: impl IntoIterator<Item = ConstraintId>,
    ) -> Result<Decomposition, DetectorDefect> {
        let mut is_master = KeyedVec::with_len(model.num_constraints(), false);
        for constraint in master {
            is_master[constraint] = true;
        }

        let remainder = ModelSubset::new(
            model,
            model.constraints().filter(|&constraint| !is_master[constraint]),
        );
        let BlockLabels { labels, .. } = label_blocks(&remainder, &KeyedVec::new(), 0);

        let constraint_map = labels
            .iter()
            .map(|label| match label {
                Some(block) => ConstraintAssignment::Block(*block),
                None => ConstraintAssignment::Master,
            })
            .collect();

        Decomposition::from_assignment(model, constraint_map, Vec::new())
    }

    /// Assign every open constraint of `seeed` to a block, merging new blocks which become
    /// connected through the open constraints. Blocks already assigned in `seeed` are never
    /// merged: an open constraint linking two of them is put in the master, as is an open
    /// constraint without variables.
    pub fn complete<M: IncidenceModel>(model: &M, seeed: &mut Seeed) {
        let view = ModelSubset::new(
            model,
            model.constraints().filter(|&constraint| {
                !matches!(
                    seeed.assignment(constraint),
                    Some(ConstraintAssignment::Master)
                )
            }),
        );

        let BlockLabels { labels, num_blocks } =
            label_blocks(&view, &seeed.block_labels(), seeed.num_blocks());
        seeed.set_blocks(&labels, num_blocks);

        let unlabelled: Vec<ConstraintId> = seeed.open_constraints().collect();
        for constraint in unlabelled {
            seeed.set_master(constraint);
        }
    }
}
