use crate::basic_types::DetectorDefect;
use crate::basic_types::TotalF64;
use crate::containers::HashMap;
use crate::containers::KeyedVec;
use crate::model::relevant_variable_list;
use crate::model::ConstraintHandler;
use crate::model::ConstraintId;
use crate::model::IncidenceModel;
use crate::model::VariableId;
use crate::model::VariableType;

/// An undirected graph with a color on every node.
///
/// Nodes are `0..num_nodes`; colors are `0..num_colors`. Automorphisms must map every node to a
/// node of the same color.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColoredGraph {
    adjacency: Vec<Vec<usize>>,
    colors: Vec<usize>,
}

impl ColoredGraph {
    pub fn new(colors: Vec<usize>) -> Self {
        ColoredGraph {
            adjacency: vec![Vec::new(); colors.len()],
            colors,
        }
    }

    pub fn add_edge(&mut self, a: usize, b: usize) {
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
    }

    pub fn num_nodes(&self) -> usize {
        self.colors.len()
    }

    pub fn num_colors(&self) -> usize {
        self.colors.iter().max().map_or(0, |&color| color + 1)
    }

    pub fn color(&self, node: usize) -> usize {
        self.colors[node]
    }

    pub fn neighbours(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    /// Sort and deduplicate the adjacency lists; required before [`ColoredGraph::is_automorphism`].
    pub fn normalise(&mut self) {
        for neighbours in &mut self.adjacency {
            neighbours.sort_unstable();
            neighbours.dedup();
        }
    }

    /// Whether `permutation` maps nodes to nodes of the same color and edges to edges.
    pub fn is_automorphism(&self, permutation: &[usize]) -> bool {
        if permutation.len() != self.num_nodes() {
            return false;
        }

        (0..self.num_nodes()).all(|node| {
            let image = permutation[node];
            self.colors[node] == self.colors[image]
                && self.adjacency[node].len() == self.adjacency[image].len()
                && self.adjacency[node].iter().all(|&neighbour| {
                    self.adjacency[image]
                        .binary_search(&permutation[neighbour])
                        .is_ok()
                })
        })
    }
}

/// What a node of the [`AutomorphismGraph`] stands for. Nodes with equal signatures receive the
/// same color.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeSignature {
    Constraint {
        handler: ConstraintHandler,
        lhs: TotalF64,
        rhs: TotalF64,
    },
    Variable {
        variable_type: VariableType,
        lower_bound: TotalF64,
        upper_bound: TotalF64,
        objective: TotalF64,
    },
    Coefficient(TotalF64),
}

/// The colored graph of a model: one node per constraint, one per variable occurring in a
/// constraint, and one per distinct coefficient value within a constraint. A coefficient node is
/// connected to its constraint and to every variable with that coefficient in the constraint.
///
/// The constraint nodes come first, so node `i < num_constraint_nodes()` is the `i`-th
/// constraint of the model.
#[derive(Clone, Debug)]
pub struct AutomorphismGraph {
    graph: ColoredGraph,
    constraints: Vec<ConstraintId>,
}

impl AutomorphismGraph {
    /// Build the graph of `model`. When `sign_only` is set, coefficients, sides, bounds, and
    /// objective coefficients are reduced to their sign before coloring.
    pub fn build<M: IncidenceModel>(model: &M, sign_only: bool) -> Result<Self, DetectorDefect> {
        let quantise = |value: f64| {
            if sign_only {
                TotalF64::sign_of(value)
            } else {
                TotalF64::new(value)
            }
        };

        let constraints: Vec<ConstraintId> = model.constraints().collect();
        let variables = relevant_variable_list(model);

        let mut signatures: Vec<NodeSignature> = constraints
            .iter()
            .map(|&constraint| NodeSignature::Constraint {
                handler: model.handler_type(constraint).clone(),
                lhs: quantise(model.lhs(constraint)),
                rhs: quantise(model.rhs(constraint)),
            })
            .collect();

        let mut variable_node: KeyedVec<VariableId, Option<usize>> =
            KeyedVec::with_len(model.num_variables(), None);
        for &variable in &variables {
            let (lower_bound, upper_bound) = model.variable_bounds(variable);
            variable_node[variable] = Some(signatures.len());
            signatures.push(NodeSignature::Variable {
                variable_type: model.variable_type(variable),
                lower_bound: quantise(lower_bound),
                upper_bound: quantise(upper_bound),
                objective: quantise(model.objective(variable)),
            });
        }

        let mut edges = Vec::new();
        let mut coefficient_nodes: HashMap<TotalF64, usize> = HashMap::default();
        for (constraint_node, &constraint) in constraints.iter().enumerate() {
            coefficient_nodes.clear();
            for (variable, coefficient) in model.variables_of(constraint) {
                let value = quantise(coefficient);
                let coefficient_node = *coefficient_nodes.entry(value).or_insert_with(|| {
                    edges.push((constraint_node, signatures.len()));
                    signatures.push(NodeSignature::Coefficient(value));
                    signatures.len() - 1
                });
                if let Some(variable_node) = variable_node[variable] {
                    edges.push((coefficient_node, variable_node));
                }
            }
        }

        let mut palette = signatures.clone();
        palette.sort();
        palette.dedup();
        let color_of: HashMap<&NodeSignature, usize> = palette
            .iter()
            .enumerate()
            .map(|(color, signature)| (signature, color))
            .collect();

        let colors = signatures
            .iter()
            .enumerate()
            .map(|(node, signature)| {
                color_of
                    .get(signature)
                    .copied()
                    .ok_or(DetectorDefect::MissingColor { node })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let mut graph = ColoredGraph::new(colors);
        for (a, b) in edges {
            graph.add_edge(a, b);
        }
        graph.normalise();

        Ok(AutomorphismGraph { graph, constraints })
    }

    pub fn graph(&self) -> &ColoredGraph {
        &self.graph
    }

    pub fn num_constraint_nodes(&self) -> usize {
        self.constraints.len()
    }

    /// The constraint of the constraint node `node`.
    pub fn constraint(&self, node: usize) -> ConstraintId {
        self.constraints[node]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_models::symmetric_packing;

    #[test]
    fn graph_has_a_node_per_constraint_variable_and_coefficient_value() {
        let (model, [c0, _, c2, _]) = symmetric_packing();
        let graph = AutomorphismGraph::build(&model, false).unwrap();

        // c1 has the coefficient values 3 and 2, every other constraint a single value.
        assert_eq!(graph.num_constraint_nodes(), 4);
        assert_eq!(graph.graph().num_nodes(), 4 + 5 + 5);
        assert_eq!(graph.constraint(0), c0);
        assert_eq!(graph.constraint(2), c2);
        assert_eq!(graph.graph().color(0), graph.graph().color(2));
        assert_ne!(graph.graph().color(1), graph.graph().color(3));
    }

    #[test]
    fn equal_coefficients_of_a_constraint_share_a_node() {
        let (model, _) = symmetric_packing();
        let graph = AutomorphismGraph::build(&model, false).unwrap();

        // Constraint node 1 is c1, whose y-variables all have the coefficient 3.
        let coefficient_nodes = graph.graph().neighbours(1);
        assert_eq!(coefficient_nodes.len(), 2);
        let degrees: Vec<usize> = coefficient_nodes
            .iter()
            .map(|&node| graph.graph().neighbours(node).len())
            .collect();
        assert!(degrees.contains(&5));
        assert!(degrees.contains(&2));
    }

    #[test]
    fn sign_only_merges_colors() {
        let (model, _) = symmetric_packing();
        let exact = AutomorphismGraph::build(&model, false).unwrap();
        let sign_only = AutomorphismGraph::build(&model, true).unwrap();

        assert!(sign_only.graph().num_colors() < exact.graph().num_colors());
    }

    #[test]
    fn swapping_symmetric_constraints_is_an_automorphism() {
        let mut graph = ColoredGraph::new(vec![0, 0, 1, 1]);
        graph.add_edge(0, 2);
        graph.add_edge(1, 3);
        graph.normalise();

        assert!(graph.is_automorphism(&[1, 0, 3, 2]));
        assert!(!graph.is_automorphism(&[1, 0, 2, 3]));
        assert!(!graph.is_automorphism(&[2, 3, 0, 1]));
    }
}
