use dec_format::BlockFile;
use dec_format::PartitionFile;

use super::ConstraintAssignment;
use super::Decomposition;
use super::Seeed;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::model::ConstraintId;
use crate::model::Model;
use crate::model::VariableId;

/// Errors when matching a parsed file against a [`Model`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecFileError {
    #[error("unknown constraint '{0}'")]
    UnknownConstraint(String),
    #[error("constraint '{0}' is listed more than once")]
    ConstraintListedTwice(String),
    #[error("the partition refers to node {node}, but the graph only has {num_nodes} nodes")]
    NodeOutOfRange { node: usize, num_nodes: usize },
}

/// Which nodes of the graph a partition file assigns blocks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum PartitionGraphKind {
    /// One node per constraint, in constraint id order.
    #[default]
    Constraints,
    /// One node per variable, in variable id order. A constraint whose variables lie in several
    /// blocks becomes a master constraint.
    Variables,
}

/// Turn a parsed block file into a seeed of `model`.
///
/// Constraints which the file does not mention stay open, unless the file sets
/// `CONSDEFAULTMASTER`, in which case they are put in the master.
pub fn seeed_from_block_file(model: &Model, file: &BlockFile) -> Result<Seeed, DecFileError> {
    let mut seeed = Seeed::new(model);
    let mut listed = KeyedVec::with_len(model.num_constraints(), false);

    let mut lookup = |name: &str| -> Result<ConstraintId, DecFileError> {
        let constraint = model
            .constraint_by_name(name)
            .ok_or_else(|| DecFileError::UnknownConstraint(name.to_owned()))?;
        if listed[constraint] {
            return Err(DecFileError::ConstraintListedTwice(name.to_owned()));
        }
        listed[constraint] = true;
        Ok(constraint)
    };

    for constraints in &file.blocks {
        let block = seeed.new_block();
        for name in constraints {
            let constraint = lookup(name)?;
            seeed.set_block(constraint, block);
        }
    }
    for name in &file.master_constraints {
        let constraint = lookup(name)?;
        seeed.set_master(constraint);
    }

    if file.constraints_default_master {
        let unlisted: Vec<ConstraintId> = seeed.open_constraints().collect();
        for constraint in unlisted {
            seeed.set_master(constraint);
        }
    }

    Ok(seeed)
}

/// Describe `decomposition` as a block file with the constraint names of `model`.
pub fn block_file_from_decomposition(model: &Model, decomposition: &Decomposition) -> BlockFile {
    let name = |constraint: &ConstraintId| model.constraint_name(*constraint).to_owned();

    BlockFile {
        presolved: Some(decomposition.is_presolved()),
        blocks: (0..decomposition.num_blocks())
            .map(|block| {
                decomposition
                    .block_constraints(block)
                    .iter()
                    .map(name)
                    .collect()
            })
            .collect(),
        master_constraints: decomposition
            .linking_constraints()
            .iter()
            .map(name)
            .collect(),
        constraints_default_master: false,
    }
}

/// Turn an externally computed partition of the constraint graph or the variable graph of
/// `model` into a seeed.
///
/// For a constraint partition, every listed constraint is put in its block and unlisted
/// constraints stay open. For a variable partition, a constraint is put in the block of its
/// variables when they all share one block, and in the master when they span several blocks;
/// constraints with unlisted variables stay open.
pub fn seeed_from_partition(
    model: &Model,
    partition: &PartitionFile,
    kind: PartitionGraphKind,
) -> Result<Seeed, DecFileError> {
    let num_nodes = match kind {
        PartitionGraphKind::Constraints => model.num_constraints(),
        PartitionGraphKind::Variables => model.num_variables(),
    };
    if let Some(node) = partition
        .node_blocks
        .iter()
        .enumerate()
        .rposition(|(node, block)| block.is_some() && node >= num_nodes)
    {
        return Err(DecFileError::NodeOutOfRange { node, num_nodes });
    }

    let mut seeed = Seeed::new(model);
    for _ in 0..partition.num_blocks {
        let _ = seeed.new_block();
    }

    for constraint in model.all_constraints() {
        let assignment = match kind {
            PartitionGraphKind::Constraints => partition
                .block_of(constraint.index())
                .map(ConstraintAssignment::Block),
            PartitionGraphKind::Variables => variable_partition_assignment(
                model.entries(constraint).iter().map(|&(variable, _)| variable),
                partition,
            ),
        };

        match assignment {
            Some(ConstraintAssignment::Block(block)) => seeed.set_block(constraint, block),
            Some(ConstraintAssignment::Master) => seeed.set_master(constraint),
            None => {}
        }
    }

    Ok(seeed)
}

fn variable_partition_assignment(
    variables: impl Iterator<Item = VariableId>,
    partition: &PartitionFile,
) -> Option<ConstraintAssignment> {
    let mut common_block = None;
    for variable in variables {
        let block = partition.block_of(variable.index())?;
        match common_block {
            None => common_block = Some(block),
            Some(common) if common == block => {}
            Some(_) => return Some(ConstraintAssignment::Master),
        }
    }

    common_block.map(ConstraintAssignment::Block)
}

#[cfg(test)]
mod tests {
    use dec_format::Indexing;

    use super::*;
    use crate::decomposition::DecompositionBuilder;
    use crate::model::test_models::binaries;
    use crate::model::test_models::linear;
    use crate::model::test_models::three_constraints_with_linking;

    #[test]
    fn block_file_round_trip_preserves_the_constraint_map() {
        let (model, [_, _, c2]) = three_constraints_with_linking();
        let decomposition =
            DecompositionBuilder::build_from_master_constraints(&model, [c2]).unwrap();

        let mut output = Vec::new();
        block_file_from_decomposition(&model, &decomposition)
            .write(&mut output)
            .unwrap();
        let parsed = BlockFile::parse(output.as_slice()).unwrap();
        let seeed = seeed_from_block_file(&model, &parsed).unwrap();
        let reparsed = Decomposition::from_seeed(&model, &seeed).unwrap();

        for constraint in model.all_constraints() {
            assert_eq!(
                reparsed.constraint_assignment(constraint),
                decomposition.constraint_assignment(constraint)
            );
        }
    }

    #[test]
    fn constraints_named_like_keywords_survive_the_round_trip() {
        let mut model = Model::default();
        let x = binaries(&mut model, &["x1", "x2", "x3"]);
        let block = linear(&mut model, "block", 0.0, 1.0, &[(x[0], 1.0)]);
        let r1 = linear(&mut model, "r1", 0.0, 1.0, &[(x[1], 1.0)]);
        let link = linear(&mut model, "link", 0.0, 2.0, &[(x[0], 1.0), (x[1], 1.0)]);
        let _ = linear(&mut model, "Presolved", 0.0, 1.0, &[(x[2], 1.0)]);

        let decomposition =
            DecompositionBuilder::build_from_master_constraints(&model, [link]).unwrap();
        assert_eq!(decomposition.num_blocks(), 3);

        let mut output = Vec::new();
        block_file_from_decomposition(&model, &decomposition)
            .write(&mut output)
            .unwrap();
        let parsed = BlockFile::parse(output.as_slice()).unwrap();
        let seeed = seeed_from_block_file(&model, &parsed).unwrap();

        assert!(seeed.is_complete());
        assert_eq!(seeed.assignment(link), Some(ConstraintAssignment::Master));
        assert_eq!(
            seeed.assignment(block),
            Some(decomposition.constraint_assignment(block))
        );
        assert_eq!(
            seeed.assignment(r1),
            Some(decomposition.constraint_assignment(r1))
        );
    }

    #[test]
    fn unlisted_constraints_stay_open_or_go_to_master() {
        let (model, [c0, c1, c2]) = three_constraints_with_linking();
        let mut file = BlockFile {
            presolved: None,
            blocks: vec![vec!["c0".to_owned()]],
            master_constraints: vec![],
            constraints_default_master: false,
        };

        let seeed = seeed_from_block_file(&model, &file).unwrap();
        assert_eq!(seeed.assignment(c0), Some(ConstraintAssignment::Block(0)));
        assert_eq!(seeed.open_constraints().collect::<Vec<_>>(), vec![c1, c2]);

        file.constraints_default_master = true;
        let seeed = seeed_from_block_file(&model, &file).unwrap();
        assert!(seeed.is_complete());
        assert_eq!(seeed.master_constraints().collect::<Vec<_>>(), vec![c1, c2]);
    }

    #[test]
    fn unknown_and_repeated_constraints_are_rejected() {
        let (model, _) = three_constraints_with_linking();
        let unknown = BlockFile {
            blocks: vec![vec!["c9".to_owned()]],
            ..Default::default()
        };
        let repeated = BlockFile {
            blocks: vec![vec!["c0".to_owned()]],
            master_constraints: vec!["c0".to_owned()],
            ..Default::default()
        };

        assert_eq!(
            seeed_from_block_file(&model, &unknown).unwrap_err(),
            DecFileError::UnknownConstraint("c9".to_owned())
        );
        assert_eq!(
            seeed_from_block_file(&model, &repeated).unwrap_err(),
            DecFileError::ConstraintListedTwice("c0".to_owned())
        );
    }

    #[test]
    fn variable_partition_puts_spanning_constraints_in_master() {
        let (model, [c0, c1, c2]) = three_constraints_with_linking();
        let partition =
            PartitionFile::parse("1 1\n2 1\n3 2\n4 2\n".as_bytes(), Indexing::OneBased).unwrap();

        let seeed =
            seeed_from_partition(&model, &partition, PartitionGraphKind::Variables).unwrap();

        assert_eq!(seeed.assignment(c0), Some(ConstraintAssignment::Block(0)));
        assert_eq!(seeed.assignment(c1), Some(ConstraintAssignment::Block(1)));
        assert_eq!(seeed.assignment(c2), Some(ConstraintAssignment::Master));
    }

    #[test]
    fn constraint_partition_out_of_range() {
        let (model, _) = three_constraints_with_linking();
        let partition =
            PartitionFile::parse("0 0\n5 1\n".as_bytes(), Indexing::ZeroBased).unwrap();

        assert_eq!(
            seeed_from_partition(&model, &partition, PartitionGraphKind::Constraints).unwrap_err(),
            DecFileError::NodeOutOfRange {
                node: 5,
                num_nodes: 3
            }
        );
    }
}
