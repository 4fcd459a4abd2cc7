use std::collections::VecDeque;

use petgraph::algo::tarjan_scc;
use petgraph::Direction;

use crate::error::{Result, SeedError};
use crate::graph::dag::DependencyGraph;

/// Tables in the order they must be populated (parents before children).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOrder {
    pub tables: Vec<String>,
}

impl GenerationOrder {
    pub fn position(&self, table: &str) -> Option<usize> {
        self.tables.iter().position(|t| t == table)
    }
}

/// Order tables with Kahn's algorithm.
///
/// Tables with no dependencies start the queue in discovery order, and
/// dependents are released in discovery order, so the result is
/// deterministic for a given schema. A cycle between tables is an error
/// naming every table caught in one; nothing is returned partially.
pub fn topological_sort(graph: &DependencyGraph) -> Result<GenerationOrder> {
    let mut indegree: Vec<usize> = graph
        .graph
        .node_indices()
        .map(|idx| {
            graph
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .count()
        })
        .collect();

    let mut queue: VecDeque<_> = graph
        .graph
        .node_indices()
        .filter(|idx| indegree[idx.index()] == 0)
        .collect();

    let mut tables = Vec::with_capacity(graph.table_count());
    while let Some(idx) = queue.pop_front() {
        tables.push(graph.table_name(idx).to_string());
        for child in graph.dependents_of(idx) {
            let remaining = &mut indegree[child.index()];
            *remaining -= 1;
            if *remaining == 0 {
                queue.push_back(child);
            }
        }
    }

    if tables.len() < graph.table_count() {
        return Err(SeedError::CircularDependency {
            tables: describe_cycles(graph),
        });
    }

    Ok(GenerationOrder { tables })
}

/// Describe each strongly connected component with more than one table,
/// e.g. `"authors -> books -> authors"`, joined with `"; "`.
fn describe_cycles(graph: &DependencyGraph) -> String {
    let mut cycles: Vec<Vec<_>> = tarjan_scc(&graph.graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|mut scc| {
            scc.sort_unstable();
            scc
        })
        .collect();
    cycles.sort_unstable_by_key(|scc| scc[0]);

    cycles
        .iter()
        .map(|scc| {
            let mut names: Vec<&str> = scc.iter().map(|&idx| graph.table_name(idx)).collect();
            names.push(names[0]);
            names.join(" -> ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;

    fn schema(tables: &[(&str, &[&str])]) -> DatabaseSchema {
        let mut s = DatabaseSchema::new(DatabaseType::PostgreSQL, "public".to_string());
        for (name, parents) in tables {
            let mut t = Table::new(name.to_string());
            t.columns.insert(
                "id".to_string(),
                Column::new("id".to_string(), DataType::Integer, "integer".to_string()),
            );
            for parent in *parents {
                let col = format!("{}_id", parent);
                t.columns.insert(
                    col.clone(),
                    Column::new(col.clone(), DataType::Integer, "integer".to_string()),
                );
                t.foreign_keys.insert(
                    col,
                    ForeignKeyRef {
                        table: parent.to_string(),
                        column: "id".to_string(),
                    },
                );
            }
            s.tables.insert(name.to_string(), t);
        }
        s
    }

    #[test]
    fn test_topological_sort_simple() {
        let s = schema(&[("orders", &["users"]), ("users", &[])]);
        let order = topological_sort(&DependencyGraph::from_schema(&s)).unwrap();

        let users_pos = order.position("users").unwrap();
        let orders_pos = order.position("orders").unwrap();
        assert!(users_pos < orders_pos, "users must come before orders");
    }

    #[test]
    fn test_independent_tables_keep_discovery_order() {
        let s = schema(&[("c", &[]), ("a", &[]), ("b", &[])]);
        let order = topological_sort(&DependencyGraph::from_schema(&s)).unwrap();
        assert_eq!(order.tables, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_every_parent_precedes_child() {
        let s = schema(&[
            ("order_items", &["orders", "products"]),
            ("orders", &["customers"]),
            ("products", &["categories"]),
            ("customers", &[]),
            ("categories", &[]),
            ("reviews", &["customers", "products"]),
        ]);
        let graph = DependencyGraph::from_schema(&s);
        let order = topological_sort(&graph).unwrap();
        assert_eq!(order.tables.len(), 6);

        for (name, table) in &s.tables {
            for fk in table.foreign_keys.values() {
                assert!(
                    order.position(&fk.table) < order.position(name),
                    "{} must precede {}",
                    fk.table,
                    name
                );
            }
        }
    }

    #[test]
    fn test_self_reference_does_not_block() {
        let s = schema(&[("employees", &["employees"])]);
        let order = topological_sort(&DependencyGraph::from_schema(&s)).unwrap();
        assert_eq!(order.tables, vec!["employees"]);
    }

    #[test]
    fn test_two_table_cycle_is_an_error() {
        let s = schema(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);
        let err = topological_sort(&DependencyGraph::from_schema(&s)).unwrap_err();
        match err {
            SeedError::CircularDependency { tables } => {
                assert_eq!(tables, "a -> b -> a");
            }
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_tables_behind_cycle_are_not_reported_as_cyclic() {
        let s = schema(&[("a", &["b"]), ("b", &["a"]), ("d", &["a"])]);
        let err = topological_sort(&DependencyGraph::from_schema(&s)).unwrap_err();
        let SeedError::CircularDependency { tables } = err else {
            panic!("expected CircularDependency");
        };
        assert_eq!(tables, "a -> b -> a", "d only sits downstream of the cycle");
    }
}
