//! Spanning tree selection: twigs (tree branches) and links (co-tree branches).

use petgraph::unionfind::UnionFind;

use crate::circuit::{Branch, Circuit};
use crate::error::{Result, TopologyError};
use crate::topology::CircuitGraph;

/// Partition of the branch list into twigs and links.
///
/// Both lists hold branch positions in the circuit's input order. The working
/// order for every matrix built afterwards is twigs followed by links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePartition {
    twigs: Vec<usize>,
    links: Vec<usize>,
}

impl TreePartition {
    /// Twig positions, in input order.
    pub fn twigs(&self) -> &[usize] {
        &self.twigs
    }

    /// Link positions, in input order.
    pub fn links(&self) -> &[usize] {
        &self.links
    }

    pub fn num_twigs(&self) -> usize {
        self.twigs.len()
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Working branch order: twigs followed by links.
    pub fn ordered(&self) -> Vec<usize> {
        self.twigs.iter().chain(self.links.iter()).copied().collect()
    }

    /// Working branch order resolved against the circuit.
    pub fn ordered_branches<'a>(&self, circuit: &'a Circuit) -> Vec<&'a Branch> {
        self.ordered()
            .into_iter()
            .filter_map(|position| circuit.branch(position))
            .collect()
    }

    pub fn is_twig(&self, position: usize) -> bool {
        self.twigs.contains(&position)
    }
}

/// Select a minimum-weight spanning tree using [`BranchKind::tree_weight`].
///
/// Kruskal's algorithm over the branches sorted by weight. The sort is stable,
/// so among equal weights the branch that appears first in the input wins.
/// For a fixed input ordering the result is therefore reproducible.
///
/// [`BranchKind::tree_weight`]: crate::circuit::BranchKind::tree_weight
pub fn select_tree(graph: &CircuitGraph, circuit: &Circuit) -> Result<TreePartition> {
    let mut candidates: Vec<(usize, &Branch)> = circuit.branches().enumerate().collect();
    candidates.sort_by_key(|(_, branch)| branch.kind().tree_weight());

    let mut components = UnionFind::<usize>::new(graph.num_nodes());
    let mut in_tree = vec![false; circuit.num_branches()];
    let mut found = 0;

    for (position, _) in candidates {
        let Some((a, b)) = graph.endpoints(position) else {
            continue;
        };
        if components.union(a.index(), b.index()) {
            in_tree[position] = true;
            found += 1;
        }
    }

    let expected = graph.num_nodes().saturating_sub(1);
    if found != expected {
        return Err(TopologyError::SpanningTreeUnavailable { found, expected }.into());
    }

    let (twigs, links): (Vec<usize>, Vec<usize>) =
        (0..circuit.num_branches()).partition(|&position| in_tree[position]);

    log::debug!(
        "tree selected: {} twigs, {} links",
        twigs.len(),
        links.len()
    );

    Ok(TreePartition { twigs, links })
}
