//! Circuit graph: nodes and branches as an undirected multigraph.

use indexmap::IndexMap;
use petgraph::algo::connected_components;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::Dfs;

use crate::circuit::Circuit;
use crate::error::{InputError, Result, TopologyError};

/// Undirected multigraph over the declared nodes.
///
/// Node weights are node identifiers, edge weights are branch positions in
/// the circuit's input order, so parallel branches stay distinct.
#[derive(Debug, Clone)]
pub struct CircuitGraph {
    graph: UnGraph<String, usize>,
    node_index: IndexMap<String, NodeIndex>,
}

impl CircuitGraph {
    /// Build the graph and check that it is a single connected component.
    pub fn build(circuit: &Circuit) -> Result<Self> {
        let mut graph: UnGraph<String, usize> =
            UnGraph::with_capacity(circuit.num_nodes(), circuit.num_branches());
        let mut node_index = IndexMap::with_capacity(circuit.num_nodes());

        for name in circuit.nodes() {
            let idx = graph.add_node(name.clone());
            node_index.insert(name.clone(), idx);
        }

        // Edge index must equal branch position; a missing endpoint is an error.
        for (position, branch) in circuit.branches().enumerate() {
            let lookup = |node: &str| {
                node_index
                    .get(node)
                    .copied()
                    .ok_or_else(|| InputError::UnknownNode {
                        branch: branch.id().to_string(),
                        node: node.to_string(),
                    })
            };
            let (a, b) = (lookup(branch.from())?, lookup(branch.to())?);
            graph.add_edge(a, b, position);
        }

        let components = connected_components(&graph);
        if components > 1 {
            let unreachable = unreachable_from_first(&graph);
            return Err(TopologyError::Unconnected {
                components,
                unreachable,
            }
            .into());
        }

        log::debug!(
            "circuit graph: {} nodes, {} branches",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self { graph, node_index })
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_branches(&self) -> usize {
        self.graph.edge_count()
    }

    /// Graph index of a node identifier.
    pub fn node(&self, name: &str) -> Option<NodeIndex> {
        self.node_index.get(name).copied()
    }

    /// Branch positions incident to a node, in insertion order.
    pub fn incident_branches(&self, name: &str) -> Vec<usize> {
        let Some(idx) = self.node(name) else {
            return Vec::new();
        };
        let mut positions: Vec<usize> = self.graph.edges(idx).map(|e| *e.weight()).collect();
        positions.sort_unstable();
        positions
    }

    /// Endpoints (as graph indices) of the branch at an input position.
    pub fn endpoints(&self, position: usize) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(EdgeIndex::new(position))
    }

    /// Access to the underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<String, usize> {
        &self.graph
    }
}

/// Names of nodes not reachable from the first declared node.
fn unreachable_from_first(graph: &UnGraph<String, usize>) -> Vec<String> {
    let Some(start) = graph.node_indices().next() else {
        return Vec::new();
    };
    let mut reached = vec![false; graph.node_count()];
    let mut dfs = Dfs::new(graph, start);
    while let Some(nx) = dfs.next(graph) {
        reached[nx.index()] = true;
    }
    graph
        .node_indices()
        .filter(|nx| !reached[nx.index()])
        .map(|nx| graph[nx].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Branch;
    use crate::error::Error;

    #[test]
    fn test_undeclared_endpoint_is_an_error() {
        let circuit = Circuit::from_parts_unchecked(
            ["0", "1"],
            vec![
                Branch::voltage_source("V1", "1", "0", 1.0),
                Branch::resistor("R1", "1", "9", 1.0),
                Branch::resistor("R2", "1", "0", 1.0),
            ],
        );
        let err = CircuitGraph::build(&circuit).unwrap_err();
        assert_eq!(
            err,
            Error::Input(InputError::UnknownNode {
                branch: "R1".to_string(),
                node: "9".to_string(),
            })
        );
    }

    #[test]
    fn test_connected_graph() {
        let circuit = Circuit::new(
            ["0", "1", "2"],
            vec![
                Branch::voltage_source("V1", "1", "0", 10.0),
                Branch::resistor("R1", "1", "2", 5.0),
                Branch::capacitor("C1", "2", "0", 0.1),
            ],
        )
        .unwrap();

        let graph = CircuitGraph::build(&circuit).unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_branches(), 3);
        assert_eq!(graph.incident_branches("1"), vec![0, 1]);
        assert_eq!(graph.incident_branches("0"), vec![0, 2]);
        assert!(graph.incident_branches("9").is_empty());

        let (a, b) = graph.endpoints(1).unwrap();
        assert_eq!(graph.inner()[a], "1");
        assert_eq!(graph.inner()[b], "2");
    }

    #[test]
    fn test_parallel_branches_are_distinct() {
        let circuit = Circuit::new(
            ["0", "1"],
            vec![
                Branch::resistor("R1", "1", "0", 1.0),
                Branch::resistor("R2", "1", "0", 2.0),
                Branch::capacitor("C1", "0", "1", 1e-6),
            ],
        )
        .unwrap();
        let graph = CircuitGraph::build(&circuit).unwrap();
        assert_eq!(graph.num_branches(), 3);
        assert_eq!(graph.incident_branches("1"), vec![0, 1, 2]);
    }

    #[test]
    fn test_two_nodes_without_branch_unconnected() {
        let circuit = Circuit::new(["0", "1"], vec![]).unwrap();
        let err = CircuitGraph::build(&circuit).unwrap_err();
        match err {
            Error::Topology(TopologyError::Unconnected {
                components,
                unreachable,
            }) => {
                assert_eq!(components, 2);
                assert_eq!(unreachable, vec!["1".to_string()]);
            }
            other => panic!("expected Unconnected, got {other:?}"),
        }
    }

    #[test]
    fn test_unconnected_message_names_reference() {
        let circuit = Circuit::new(
            ["0", "1", "2", "3"],
            vec![
                Branch::resistor("R1", "0", "1", 1.0),
                Branch::resistor("R2", "2", "3", 1.0),
            ],
        )
        .unwrap();
        let err = CircuitGraph::build(&circuit).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("not connected"), "{message}");
        assert!(message.contains("'0'"), "{message}");
        assert!(message.contains("2, 3"), "{message}");
    }

    #[test]
    fn test_single_node_is_connected() {
        let circuit = Circuit::new(["0"], vec![]).unwrap();
        let graph = CircuitGraph::build(&circuit).unwrap();
        assert_eq!(graph.num_nodes(), 1);
        assert_eq!(graph.num_branches(), 0);
    }
}
