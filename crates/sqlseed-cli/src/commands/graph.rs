use anyhow::Result;

use sqlseed_core::graph::dag::DependencyGraph;
use sqlseed_core::graph::topo::topological_sort;
use sqlseed_core::graph::visualize::{self, GraphFormat as VizFormat};
use sqlseed_core::schema::introspect::introspect;

use crate::args::{GraphArgs, GraphFormat};

pub async fn run(args: &GraphArgs) -> Result<()> {
    let config = super::load_config(&args.connection)?;
    let mut backend = super::connect(&config).await?;
    let schema = introspect(&mut backend).await?;
    let dep_graph = DependencyGraph::from_schema(&schema);

    let output = match args.format {
        GraphFormat::Mermaid => visualize::visualize(&dep_graph, VizFormat::Mermaid),
        GraphFormat::Dot => visualize::visualize(&dep_graph, VizFormat::Dot),
        GraphFormat::Order => {
            let run_config = config.to_run_config()?;
            let order = topological_sort(&dep_graph)?;
            order
                .tables
                .iter()
                .enumerate()
                .map(|(i, table)| {
                    let marker = if run_config.filter.allows(table) { "" } else { "  (filtered out)" };
                    format!("{:>3}. {}{}", i + 1, table, marker)
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    };
    println!("{}", output);

    Ok(())
}
