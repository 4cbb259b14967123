//! Dependency graph snapshot built with petgraph.
//!
//! A [`DependencyGraph`] is rebuilt from a [`TaskCollection`] for each
//! operation. Edges point from a dependent node to its dependency and only
//! cover resolvable, non-self references; dangling ids and self-loops are
//! reported by validation instead of being part of the graph.

use crate::{TaskCollection, TaskId};
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// One dependency cycle.
///
/// Every node depends on the next one and the last node depends on the
/// first, so `[1, 2]` means `1 -> 2 -> 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Cycle(Vec<TaskId>);

impl Cycle {
    /// Create a cycle from its node sequence.
    #[must_use]
    pub const fn new(nodes: Vec<TaskId>) -> Self {
        Self(nodes)
    }

    /// The nodes in dependency order.
    #[must_use]
    pub fn nodes(&self) -> &[TaskId] {
        &self.0
    }

    /// Number of nodes (and edges) in the cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cycle has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `id` lies on the cycle.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.0.contains(id)
    }

    /// The edge repair removes to break this cycle.
    ///
    /// Returns `(from, to)` where `from` is the greatest id on the cycle and
    /// `to` is its successor in cycle order.
    #[must_use]
    pub fn breaking_edge(&self) -> Option<(&TaskId, &TaskId)> {
        let (position, from) = self
            .0
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.cmp(b))?;
        let to = self.0.get((position + 1) % self.0.len())?;
        Some((from, to))
    }

    /// The cycle as a closed path, e.g. `[1, 2, 1]`.
    #[must_use]
    pub fn closed_path(&self) -> Vec<TaskId> {
        let mut path = self.0.clone();
        if let Some(first) = self.0.first() {
            path.push(first.clone());
        }
        path
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .closed_path()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        f.write_str(&rendered)
    }
}

/// Arena of graph nodes with edges in dependency-list order.
pub(crate) struct DependencyGraph {
    /// Node weights are qualified ids; edges point dependent -> dependency.
    graph: DiGraph<TaskId, ()>,
    /// Map from ids to node indices.
    index: HashMap<TaskId, NodeIndex>,
    /// Outgoing edges per node, in list order with duplicates removed.
    successors: Vec<Vec<NodeIndex>>,
}

impl DependencyGraph {
    /// Snapshot the collection's nodes and resolvable edges.
    pub(crate) fn build(collection: &TaskCollection) -> Self {
        let mut graph = DiGraph::with_capacity(collection.node_count(), 0);
        let mut index = HashMap::with_capacity(collection.node_count());

        for node in collection.nodes() {
            let ix = graph.add_node(node.id.clone());
            index.insert(node.id, ix);
        }

        let mut successors = vec![Vec::new(); graph.node_count()];
        for node in collection.nodes() {
            let Some(&from) = index.get(&node.id) else {
                continue;
            };
            for dep in node.dependencies {
                let Some(&to) = index.get(dep) else {
                    continue;
                };
                if from == to || successors[from.index()].contains(&to) {
                    continue;
                }
                successors[from.index()].push(to);
                graph.add_edge(from, to, ());
            }
        }

        trace!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built dependency graph snapshot"
        );

        Self {
            graph,
            index,
            successors,
        }
    }

    pub(crate) fn node(&self, id: &TaskId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub(crate) fn id(&self, ix: NodeIndex) -> &TaskId {
        &self.graph[ix]
    }

    pub(crate) fn ids(&self, indices: &[NodeIndex]) -> Vec<TaskId> {
        indices.iter().map(|&ix| self.id(ix).clone()).collect()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    pub(crate) fn successors(&self, ix: NodeIndex) -> &[NodeIndex] {
        self.successors
            .get(ix.index())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Nodes with an edge pointing at `ix`, i.e. its direct dependents.
    pub(crate) fn predecessors(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(ix, Direction::Incoming)
    }

    pub(crate) fn inner(&self) -> &DiGraph<TaskId, ()> {
        &self.graph
    }

    /// Find a path `from -> ... -> to` following dependency edges.
    ///
    /// Uses an explicit stack, so deep chains cannot overflow the call stack.
    pub(crate) fn path_between(&self, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
        let mut visited = vec![false; self.node_count()];
        let mut came_from: Vec<Option<NodeIndex>> = vec![None; self.node_count()];
        let mut stack = vec![from];
        visited[from.index()] = true;

        while let Some(current) = stack.pop() {
            if current == to {
                let mut path = vec![current];
                let mut cursor = current;
                while let Some(prev) = came_from[cursor.index()] {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }

            // Reverse so the first listed dependency is explored first.
            for &next in self.successors(current).iter().rev() {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    came_from[next.index()] = Some(current);
                    stack.push(next);
                }
            }
        }

        None
    }

    /// Enumerate cycles with a single depth-first pass.
    ///
    /// Roots are taken in collection order and edges in list order, so the
    /// result is deterministic. Each back edge to a node still on the stack
    /// yields the stack slice from that node to the top. Every node is
    /// visited once; a graph with overlapping cycles may need another pass
    /// after edges are removed.
    pub(crate) fn find_cycles(&self) -> Vec<Vec<NodeIndex>> {
        let count = self.node_count();
        let mut visited = vec![false; count];
        let mut on_stack = vec![false; count];
        let mut cycles = Vec::new();

        for root in self.node_indices() {
            if visited[root.index()] {
                continue;
            }
            visited[root.index()] = true;
            on_stack[root.index()] = true;

            // Frames hold the node and the position of its next edge.
            let mut stack: Vec<(NodeIndex, usize)> = vec![(root, 0)];

            while let Some(&(current, edge)) = stack.last() {
                let Some(&next) = self.successors(current).get(edge) else {
                    on_stack[current.index()] = false;
                    stack.pop();
                    continue;
                };
                if let Some(frame) = stack.last_mut() {
                    frame.1 += 1;
                }

                if on_stack[next.index()] {
                    if let Some(start) = stack.iter().position(|&(ix, _)| ix == next) {
                        cycles.push(stack[start..].iter().map(|&(ix, _)| ix).collect());
                    }
                } else if !visited[next.index()] {
                    visited[next.index()] = true;
                    on_stack[next.index()] = true;
                    stack.push((next, 0));
                }
            }
        }

        cycles
    }

    /// Every node that lies on some cycle, in collection order.
    ///
    /// Strongly connected components with more than one member are exactly
    /// the nodes on a cycle once self-loops are left out of the graph.
    pub(crate) fn cyclic_nodes(&self) -> Vec<NodeIndex> {
        let mut cyclic = vec![false; self.node_count()];
        for component in tarjan_scc(&self.graph) {
            if component.len() > 1 {
                for ix in component {
                    cyclic[ix.index()] = true;
                }
            }
        }
        self.node_indices().filter(|ix| cyclic[ix.index()]).collect()
    }

    /// Cycles as id sequences.
    pub(crate) fn cycles(&self) -> Vec<Cycle> {
        self.find_cycles()
            .iter()
            .map(|indices| Cycle::new(self.ids(indices)))
            .collect()
    }
}
