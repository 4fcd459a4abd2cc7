use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

use crate::schema::types::DatabaseSchema;

/// A directed graph of table dependencies derived from foreign keys.
///
/// Edges point from the referenced table to the referencing table
/// (parent → child). Several foreign keys between the same pair of tables
/// collapse into one edge, so each dependent is listed once.
/// Self-referencing foreign keys are kept aside and never become edges.
pub struct DependencyGraph {
    pub graph: DiGraph<String, EdgeInfo>,
    pub node_indices: HashMap<String, NodeIndex>,
    pub self_references: Vec<SelfReference>,
}

/// The foreign key columns behind one parent → child edge.
#[derive(Debug, Clone, Default)]
pub struct EdgeInfo {
    /// (referencing column, referenced column) pairs.
    pub columns: Vec<(String, String)>,
}

/// A foreign key whose target is its own table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfReference {
    pub table: String,
    pub column: String,
    pub referenced_column: String,
}

impl DependencyGraph {
    /// Build a dependency graph from a database schema.
    /// Nodes are added in schema discovery order.
    pub fn from_schema(schema: &DatabaseSchema) -> Self {
        let mut graph: DiGraph<String, EdgeInfo> = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut self_references = Vec::new();

        for table_name in schema.tables.keys() {
            let idx = graph.add_node(table_name.clone());
            node_indices.insert(table_name.clone(), idx);
        }

        for (table_name, table) in &schema.tables {
            for (column, fk) in &table.foreign_keys {
                if fk.table == *table_name {
                    self_references.push(SelfReference {
                        table: table_name.clone(),
                        column: column.clone(),
                        referenced_column: fk.column.clone(),
                    });
                    continue;
                }

                let (Some(&parent), Some(&child)) =
                    (node_indices.get(&fk.table), node_indices.get(table_name))
                else {
                    continue;
                };

                let pair = (column.clone(), fk.column.clone());
                match graph.find_edge(parent, child) {
                    Some(edge) => graph[edge].columns.push(pair),
                    None => {
                        graph.add_edge(
                            parent,
                            child,
                            EdgeInfo {
                                columns: vec![pair],
                            },
                        );
                    }
                }
            }
        }

        Self {
            graph,
            node_indices,
            self_references,
        }
    }

    /// Get the table name for a node index.
    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// Get node index for a table name.
    pub fn node_index(&self, table_name: &str) -> Option<NodeIndex> {
        self.node_indices.get(table_name).copied()
    }

    /// Tables that reference `idx`, in discovery order.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort_unstable();
        children
    }

    /// Tables that reference `table`, in discovery order.
    pub fn dependents(&self, table: &str) -> Vec<&str> {
        self.node_index(table)
            .map(|idx| {
                self.dependents_of(idx)
                    .into_iter()
                    .map(|child| self.table_name(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of distinct other tables `table` depends on.
    pub fn indegree(&self, table: &str) -> usize {
        self.node_index(table)
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Get the number of tables.
    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
