use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;

use super::ColoredGraph;
use crate::basic_types::BlockUnionFind;

/// Computes generators of the automorphism group of a [`ColoredGraph`].
pub trait AutomorphismSearch {
    /// Permutations of the nodes of `graph` which generate (a subgroup of) its automorphism group.
    /// Every returned permutation is an automorphism; the identity is never returned.
    fn generators(&mut self, graph: &ColoredGraph) -> Vec<Vec<usize>>;
}

/// An ordered partition of the nodes.
type Partition = Vec<Vec<usize>>;

/// Individualisation-refinement search for automorphisms.
///
/// The search follows a first path down the search tree, always individualising the first node of
/// the first non-singleton cell, to a first leaf. Then, from the deepest level upwards, it explores
/// the subtrees of the other nodes of the target cell. A leaf of such a subtree which maps onto the
/// first leaf by an automorphism contributes a generator. Nodes already known to be in the orbit of
/// the node on the first path are skipped.
///
/// The number of visited search nodes is bounded; when the budget runs out, the generators found
/// so far are returned.
#[derive(Clone, Copy, Debug)]
pub struct RefinementSearch {
    node_budget: usize,
    nodes_visited: usize,
    budget_exhausted: bool,
}

/// The first path through the search tree.
struct FirstPath {
    /// The refined partition at every depth; the last one is discrete.
    partitions: Vec<Partition>,
    /// The cell sizes of every partition in `partitions`.
    shapes: Vec<Vec<usize>>,
    /// The index of the target cell at every non-leaf depth.
    targets: Vec<usize>,
    /// The node individualised at every non-leaf depth.
    chosen: Vec<usize>,
    leaf: Vec<usize>,
}

impl RefinementSearch {
    pub fn new(node_budget: usize) -> Self {
        RefinementSearch {
            node_budget,
            nodes_visited: 0,
            budget_exhausted: false,
        }
    }

    /// The number of search nodes visited by the last call to
    /// [`AutomorphismSearch::generators`].
    pub fn nodes_visited(&self) -> usize {
        self.nodes_visited
    }

    /// Whether the last search stopped because the node budget ran out.
    pub fn budget_exhausted(&self) -> bool {
        self.budget_exhausted
    }

    fn first_path(&mut self, graph: &ColoredGraph) -> FirstPath {
        let mut partitions = vec![refine(graph, initial_partition(graph))];
        let mut targets = Vec::new();
        let mut chosen = Vec::new();

        while let Some(target) = partitions.last().and_then(|partition| target_cell(partition)) {
            let partition = &partitions[partitions.len() - 1];
            let node = partition[target][0];
            let next = refine(graph, individualise(partition, target, node));

            targets.push(target);
            chosen.push(node);
            partitions.push(next);
            self.nodes_visited += 1;
        }

        let shapes = partitions.iter().map(|partition| shape(partition)).collect();
        let leaf = partitions
            .last()
            .map(|partition| partition.iter().map(|cell| cell[0]).collect())
            .unwrap_or_default();

        FirstPath {
            partitions,
            shapes,
            targets,
            chosen,
            leaf,
        }
    }

    /// Explore the subtree below `partition`, which was reached by individualising `node` instead
    /// of the first-path node at `level`. Returns true once `node` is in the orbit of the
    /// first-path node, or when the budget is exhausted.
    #[allow(
        clippy::too_many_arguments,
        reason = "the search state is threaded through the recursion"
    )]
    fn explore(
        &mut self,
        graph: &ColoredGraph,
        path: &FirstPath,
        level: usize,
        node: usize,
        partition: Partition,
        depth: usize,
        orbits: &mut BlockUnionFind,
        generators: &mut Vec<Vec<usize>>,
    ) -> bool {
        self.nodes_visited += 1;
        if self.nodes_visited > self.node_budget {
            self.budget_exhausted = true;
            return true;
        }

        if path.shapes.get(depth) != Some(&shape(&partition)) {
            return false;
        }

        let Some(target) = target_cell(&partition) else {
            let mut permutation = vec![0; graph.num_nodes()];
            for (&from, cell) in path.leaf.iter().zip(&partition) {
                permutation[from] = cell[0];
            }

            let fixes_prefix = path.chosen[..level]
                .iter()
                .all(|&fixed| permutation[fixed] == fixed);
            let is_identity = permutation.iter().enumerate().all(|(i, &image)| i == image);

            if fixes_prefix && !is_identity && graph.is_automorphism(&permutation) {
                for (from, &to) in permutation.iter().enumerate() {
                    let _ = orbits.union(from, to);
                }
                generators.push(permutation);
            }

            return orbits.find(node) == orbits.find(path.chosen[level]);
        };

        for &next in &partition[target] {
            let child = refine(graph, individualise(&partition, target, next));
            if self.explore(
                graph,
                path,
                level,
                node,
                child,
                depth + 1,
                orbits,
                generators,
            ) {
                return true;
            }
        }

        false
    }
}

impl AutomorphismSearch for RefinementSearch {
    fn generators(&mut self, graph: &ColoredGraph) -> Vec<Vec<usize>> {
        self.nodes_visited = 0;
        self.budget_exhausted = false;

        if graph.num_nodes() == 0 {
            return Vec::new();
        }

        let path = self.first_path(graph);
        let mut orbits = BlockUnionFind::with_blocks(graph.num_nodes());
        let mut generators = Vec::new();

        for level in (0..path.chosen.len()).rev() {
            let parent = &path.partitions[level];
            let target = path.targets[level];

            for &node in &parent[target] {
                if orbits.find(node) == orbits.find(path.chosen[level]) {
                    continue;
                }

                let start = refine(graph, individualise(parent, target, node));
                let _ = self.explore(
                    graph,
                    &path,
                    level,
                    node,
                    start,
                    level + 1,
                    &mut orbits,
                    &mut generators,
                );

                if self.budget_exhausted {
                    debug!(
                        "automorphism search stopped after {} nodes with {} generators",
                        self.nodes_visited,
                        generators.len()
                    );
                    return generators;
                }
            }
        }

        generators
    }
}

fn initial_partition(graph: &ColoredGraph) -> Partition {
    let mut cells = vec![Vec::new(); graph.num_colors()];
    for node in 0..graph.num_nodes() {
        cells[graph.color(node)].push(node);
    }
    cells.retain(|cell| !cell.is_empty());
    cells
}

/// Split cells until every node of a cell has the same number of neighbours in every cell.
///
/// Every cell is split by the neighbour counts of its nodes; the parts replace the cell in the
/// order of their counts. The result only depends on the structure of the graph, so it commutes
/// with automorphisms.
fn refine(graph: &ColoredGraph, mut cells: Partition) -> Partition {
    let mut cell_of = vec![0; graph.num_nodes()];

    loop {
        for (index, cell) in cells.iter().enumerate() {
            for &node in cell {
                cell_of[node] = index;
            }
        }

        let mut refined = Vec::with_capacity(cells.len());
        for cell in &cells {
            if cell.len() == 1 {
                refined.push(cell.clone());
                continue;
            }

            let mut parts: BTreeMap<Vec<(usize, usize)>, Vec<usize>> = BTreeMap::new();
            for &node in cell {
                parts
                    .entry(neighbour_counts(graph, &cell_of, node))
                    .or_default()
                    .push(node);
            }
            refined.extend(parts.into_values());
        }

        if refined.len() == cells.len() {
            return refined;
        }
        cells = refined;
    }
}

/// For every cell containing a neighbour of `node`: the cell and the number of neighbours in it.
fn neighbour_counts(graph: &ColoredGraph, cell_of: &[usize], node: usize) -> Vec<(usize, usize)> {
    graph
        .neighbours(node)
        .iter()
        .map(|&neighbour| cell_of[neighbour])
        .sorted_unstable()
        .dedup_with_count()
        .map(|(count, cell)| (cell, count))
        .collect()
}

fn individualise(partition: &Partition, target: usize, node: usize) -> Partition {
    let mut individualised = Vec::with_capacity(partition.len() + 1);
    for (index, cell) in partition.iter().enumerate() {
        if index == target {
            individualised.push(vec![node]);
            individualised.push(cell.iter().copied().filter(|&other| other != node).collect());
        } else {
            individualised.push(cell.clone());
        }
    }
    individualised
}

fn target_cell(partition: &Partition) -> Option<usize> {
    partition.iter().position(|cell| cell.len() > 1)
}

fn shape(partition: &Partition) -> Vec<usize> {
    partition.iter().map(Vec::len).collect()
}
