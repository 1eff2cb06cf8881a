use std::cmp::Ordering;

use super::Decomposition;

/// A light-weight quality estimate used to order decompositions. It is never used to discard
/// one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecompositionScore {
    /// The fraction of constraints and variables which are in the border, i.e. linking
    /// constraints, linking variables, and master-only variables.
    pub border_fraction: f64,
    /// The ratio between the smallest and the largest block, measured in constraints plus
    /// variables. `1.0` for perfectly balanced blocks, `0.0` without blocks.
    pub balance: f64,
}

impl DecompositionScore {
    pub fn of(decomposition: &Decomposition) -> Self {
        let size = decomposition.num_constraints() + decomposition.num_variables();
        let border = decomposition.linking_constraints().len()
            + decomposition.linking_variables().len()
            + decomposition.master_only_variables().len();
        let border_fraction = if size == 0 {
            0.0
        } else {
            border as f64 / size as f64
        };

        let block_sizes = (0..decomposition.num_blocks()).map(|block| {
            decomposition.block_constraints(block).len()
                + decomposition.block_variables(block).len()
        });
        let balance = match (block_sizes.clone().min(), block_sizes.max()) {
            (Some(smallest), Some(largest)) if largest > 0 => smallest as f64 / largest as f64,
            _ => 0.0,
        };

        DecompositionScore {
            border_fraction,
            balance,
        }
    }

    /// The combined score in `[0, 1]`; higher is better.
    pub fn total(&self) -> f64 {
        (1.0 - self.border_fraction) * (0.5 + 0.5 * self.balance)
    }

    /// Orders better scores first.
    pub fn compare(&self, other: &DecompositionScore) -> Ordering {
        other.total().total_cmp(&self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposition::DecompositionBuilder;
    use crate::model::test_models::three_constraints_with_linking;

    #[test]
    fn smaller_border_scores_better() {
        let (model, [c0, c1, c2]) = three_constraints_with_linking();

        let bordered = DecompositionBuilder::build_from_master_constraints(&model, [c2]).unwrap();
        let mostly_master =
            DecompositionBuilder::build_from_master_constraints(&model, [c0, c2]).unwrap();
        let all_master =
            DecompositionBuilder::build_from_master_constraints(&model, [c0, c1, c2]).unwrap();

        let bordered = DecompositionScore::of(&bordered);
        let mostly_master = DecompositionScore::of(&mostly_master);
        let all_master = DecompositionScore::of(&all_master);

        assert_eq!(bordered.balance, 1.0);
        assert_eq!(bordered.compare(&mostly_master), Ordering::Less);
        assert_eq!(all_master.balance, 0.0);
        assert_eq!(mostly_master.compare(&all_master), Ordering::Less);
    }
}
