pub mod backend;
pub mod cancel;
pub mod classify;
pub mod config;
pub mod error;
pub mod generate;
pub mod graph;
pub mod report;
pub mod schema;

// Re-export key types for convenience
pub use backend::SchemaBackend;
pub use cancel::CancelFlag;
pub use error::{Result, SeedError};
pub use generate::orchestrator::run;
pub use report::{RunReport, TableReport, TableStatus};
pub use schema::types::{DatabaseSchema, DatabaseType};
