use crate::graph::dag::DependencyGraph;
use petgraph::visit::EdgeRef;

/// Output format for graph visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Mermaid,
    Dot,
}

/// Render the dependency graph. Arrows point from the referenced table to
/// the table that references it, i.e. in population order.
pub fn visualize(graph: &DependencyGraph, format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => generate_mermaid(graph),
        GraphFormat::Dot => generate_dot(graph),
    }
}

fn edge_label(columns: &[(String, String)]) -> String {
    columns
        .iter()
        .map(|(col, _)| col.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn generate_mermaid(graph: &DependencyGraph) -> String {
    let mut output = String::from("graph TD\n");

    for node in graph.graph.node_indices() {
        let name = graph.table_name(node);
        output.push_str(&format!("    {}[{}]\n", name, name));
    }

    output.push('\n');

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        let label = edge_label(&edge.weight().columns);
        output.push_str(&format!("    {} -->|{}| {}\n", from, label, to));
    }

    for self_ref in &graph.self_references {
        output.push_str(&format!(
            "    {} -.->|{}| {}\n",
            self_ref.table, self_ref.column, self_ref.table
        ));
    }

    output
}

fn generate_dot(graph: &DependencyGraph) -> String {
    let mut output = String::from("digraph dependencies {\n");
    output.push_str("    rankdir=TB;\n");
    output.push_str("    node [shape=box, style=rounded];\n\n");

    for node in graph.graph.node_indices() {
        output.push_str(&format!("    \"{}\";\n", graph.table_name(node)));
    }

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        let label = edge_label(&edge.weight().columns);
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
            from, to, label
        ));
    }

    for self_ref in &graph.self_references {
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\", style=dashed];\n",
            self_ref.table, self_ref.table, self_ref.column
        ));
    }

    output.push_str("}\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;

    fn schema() -> DatabaseSchema {
        let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "public".to_string());
        schema
            .tables
            .insert("users".to_string(), Table::new("users".to_string()));

        let mut posts = Table::new("posts".to_string());
        posts.columns.insert(
            "author_id".to_string(),
            Column::new("author_id".to_string(), DataType::Integer, "integer".to_string()),
        );
        posts.columns.insert(
            "reply_to".to_string(),
            Column::new("reply_to".to_string(), DataType::Integer, "integer".to_string()),
        );
        posts.foreign_keys.insert(
            "author_id".to_string(),
            ForeignKeyRef {
                table: "users".to_string(),
                column: "id".to_string(),
            },
        );
        posts.foreign_keys.insert(
            "reply_to".to_string(),
            ForeignKeyRef {
                table: "posts".to_string(),
                column: "id".to_string(),
            },
        );
        schema.tables.insert("posts".to_string(), posts);
        schema
    }

    #[test]
    fn test_mermaid_output() {
        let graph = DependencyGraph::from_schema(&schema());
        let output = visualize(&graph, GraphFormat::Mermaid);

        assert!(output.starts_with("graph TD"));
        assert!(output.contains("users -->|author_id| posts"));
        assert!(output.contains("posts -.->|reply_to| posts"));
    }

    #[test]
    fn test_dot_output() {
        let graph = DependencyGraph::from_schema(&schema());
        let output = visualize(&graph, GraphFormat::Dot);

        assert!(output.starts_with("digraph dependencies {"));
        assert!(output.contains("\"users\" -> \"posts\" [label=\"author_id\"];"));
        assert!(output.trim_end().ends_with('}'));
    }
}
