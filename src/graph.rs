//! Dependency graph over registered templates
//!
//! A graph is a snapshot built on demand from the registry: every node is a
//! template name and every edge `a -> b` means `a`'s body references `b`.
//! Nothing is cached, so edits to a body show up the next time a graph is
//! built.
//!
//! Construction is a single depth-first traversal that follows references in
//! first-occurrence order. The traversal tracks the current path for cycle
//! detection and records nodes in post-order, which is the topological order
//! used for compilation (dependencies before dependents).

use std::collections::{HashMap, HashSet};

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

use crate::error::QueryError;
use crate::registry::TemplateRegistry;

/// How the traversal treats dangling references and cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Unregistered references and cycles are errors
    Strict,
    /// Unregistered references become leaves and cycles are kept as edges
    Lenient,
}

/// Color states for cycle detection using DFS.
///
/// Unvisited nodes have no entry in the color map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node is on the current DFS path
    Gray,
    /// Node and all of its dependencies are done
    Black,
}

/// Dependency graph between templates
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    /// Nodes in DFS post-order
    order: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph of everything reachable from `root`
    pub fn from_root(
        registry: &TemplateRegistry,
        root: &str,
        mode: Resolution,
    ) -> Result<Self, QueryError> {
        Self::from_root_with_leaves(registry, root, mode, &HashSet::new())
    }

    /// Build the graph of everything reachable from `root`, skipping `leaves`
    ///
    /// References to a name in `leaves` are neither looked up nor added to the
    /// graph. The compiler uses this for literal parameters.
    pub fn from_root_with_leaves(
        registry: &TemplateRegistry,
        root: &str,
        mode: Resolution,
        leaves: &HashSet<&str>,
    ) -> Result<Self, QueryError> {
        if !registry.contains(root) {
            return Err(QueryError::not_found(root));
        }

        let mut builder = GraphBuilder::new(registry, mode, leaves);
        let index = builder.ensure_node(root);
        builder.visit(index)?;

        let graph = builder.finish();
        tracing::debug!(
            root,
            ?mode,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built dependency graph"
        );
        Ok(graph)
    }

    /// Build the graph of the whole registry
    ///
    /// Roots are visited in name order so the resulting order does not depend
    /// on hash map iteration.
    pub fn from_registry(
        registry: &TemplateRegistry,
        mode: Resolution,
    ) -> Result<Self, QueryError> {
        let mut names: Vec<&str> = registry.names().collect();
        names.sort_unstable();

        let leaves = HashSet::new();
        let mut builder = GraphBuilder::new(registry, mode, &leaves);
        for name in names {
            let index = builder.ensure_node(name);
            if !builder.colors.contains_key(&index) {
                builder.visit(index)?;
            }
        }

        let graph = builder.finish();
        tracing::debug!(
            ?mode,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built registry dependency graph"
        );
        Ok(graph)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `to` is reachable from `from`; a node always reaches itself
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    /// Every node, dependencies before dependents
    pub fn topological_order(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.graph[i].as_str()).collect()
    }

    /// Nodes reachable from `name` (excluding itself) in topological order
    pub fn transitive_dependencies(&self, name: &str) -> Vec<&str> {
        let Some(&start) = self.node_map.get(name) else {
            return Vec::new();
        };

        let mut reachable = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            reachable.insert(node);
        }

        self.order
            .iter()
            .filter(|&&i| i != start && reachable.contains(&i))
            .map(|&i| self.graph[i].as_str())
            .collect()
    }

    /// Direct dependencies of `name` in first-reference order
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        let Some(&index) = self.node_map.get(name) else {
            return Vec::new();
        };
        // petgraph yields the most recently added edge first
        let mut deps: Vec<&str> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .map(|i| self.graph[i].as_str())
            .collect();
        deps.reverse();
        deps
    }

    /// Nodes that reference `name` directly, sorted by name
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        let Some(&index) = self.node_map.get(name) else {
            return Vec::new();
        };
        let mut dependents: Vec<&str> = self
            .graph
            .neighbors_directed(index, Direction::Incoming)
            .map(|i| self.graph[i].as_str())
            .collect();
        dependents.sort_unstable();
        dependents
    }
}

/// A template whose references are still being walked
struct Frame {
    index: NodeIndex,
    dependencies: std::vec::IntoIter<String>,
}

/// Traversal state while a graph is being built
struct GraphBuilder<'a> {
    registry: &'a TemplateRegistry,
    mode: Resolution,
    leaves: &'a HashSet<&'a str>,
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    colors: HashMap<NodeIndex, Color>,
    path: Vec<NodeIndex>,
    order: Vec<NodeIndex>,
}

impl<'a> GraphBuilder<'a> {
    fn new(
        registry: &'a TemplateRegistry,
        mode: Resolution,
        leaves: &'a HashSet<&'a str>,
    ) -> Self {
        Self {
            registry,
            mode,
            leaves,
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            colors: HashMap::new(),
            path: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Add a node to the graph if it doesn't already exist.
    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Visit a registered template and everything it references.
    ///
    /// The traversal keeps its own stack of frames instead of recursing, so
    /// chain length is bounded by memory rather than by the thread's stack.
    fn visit(&mut self, root: NodeIndex) -> Result<(), QueryError> {
        let mut stack = vec![self.enter(root)?];

        while let Some(frame) = stack.last_mut() {
            let index = frame.index;
            let Some(dependency) = frame.dependencies.next() else {
                stack.pop();
                self.path.pop();
                self.colors.insert(index, Color::Black);
                self.order.push(index);
                continue;
            };

            if self.leaves.contains(dependency.as_str()) {
                continue;
            }

            let registered = self.registry.contains(&dependency);
            if !registered && self.mode == Resolution::Strict {
                return Err(QueryError::unknown_dependency(
                    dependency,
                    self.graph[index].as_str(),
                ));
            }

            let dep_index = self.ensure_node(&dependency);
            self.graph.add_edge(index, dep_index, ());

            match self.colors.get(&dep_index).copied() {
                None if registered => stack.push(self.enter(dep_index)?),
                None => {
                    // Dangling reference in lenient mode
                    self.colors.insert(dep_index, Color::Black);
                    self.order.push(dep_index);
                }
                Some(Color::Gray) if self.mode == Resolution::Strict => {
                    return Err(self.cycle_through(dep_index));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Mark a node as on the current path and read its references
    fn enter(&mut self, index: NodeIndex) -> Result<Frame, QueryError> {
        let name = self.graph[index].as_str();
        self.colors.insert(index, Color::Gray);
        self.path.push(index);
        tracing::trace!(name, depth = self.path.len(), "visiting template");

        let dependencies = self
            .registry
            .get(name)?
            .dependency_names()
            .map_err(|source| QueryError::parse(name, source))?;

        Ok(Frame {
            index,
            dependencies: dependencies.into_iter(),
        })
    }

    /// Cycle error for the path from `repeated` back to itself
    fn cycle_through(&self, repeated: NodeIndex) -> QueryError {
        let start = self
            .path
            .iter()
            .position(|&i| i == repeated)
            .unwrap_or(0);
        let mut cycle: Vec<String> = self.path[start..]
            .iter()
            .map(|&i| self.graph[i].clone())
            .collect();
        cycle.push(self.graph[repeated].clone());
        QueryError::cycle(cycle)
    }

    fn finish(self) -> DependencyGraph {
        DependencyGraph {
            graph: self.graph,
            node_map: self.node_map,
            order: self.order,
        }
    }
}
