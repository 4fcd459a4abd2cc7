use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "sqlseed",
    about = "Populate a relational database with synthetic rows that respect its keys",
    version,
    after_help = "Examples:\n  sqlseed generate --config seed.json\n  sqlseed generate --url postgres://localhost/shop --rows 500 --seed 42\n  sqlseed introspect --url sqlite://shop.db\n  sqlseed graph --config seed.json --format mermaid"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert generated rows into every selected table
    Generate(GenerateArgs),

    /// Show tables, columns, primary keys and foreign keys
    Introspect(IntrospectArgs),

    /// Show the table dependency graph or generation order
    Graph(GraphArgs),
}

/// Connection settings shared by every command. Each flag overrides the
/// matching field of the configuration file.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Configuration file (.json or .toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Full connection URL (postgres://, mysql://, sqlite://)
    #[arg(long, env = "DATABASE_URL")]
    pub url: Option<String>,

    /// Database backend: postgresql, mysql, sqlite, sqlserver
    #[arg(long)]
    pub backend: Option<String>,

    /// Database server host name
    #[arg(long)]
    pub host: Option<String>,

    /// Database server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Database name
    #[arg(long)]
    pub database: Option<String>,

    /// Schema to introspect (default: public for Postgres)
    #[arg(long)]
    pub schema: Option<String>,

    /// User name
    #[arg(long)]
    pub user: Option<String>,

    /// Password
    #[arg(long, env = "SQLSEED_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Rows per table when the table has no override
    #[arg(long)]
    pub rows: Option<usize>,

    /// Random seed for deterministic generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct IntrospectArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: IntrospectFormat,
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output format for the dependency graph
    #[arg(long, default_value = "mermaid")]
    pub format: GraphFormat,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum IntrospectFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum GraphFormat {
    Mermaid,
    Dot,
    /// One table per line, in generation order
    Order,
}
