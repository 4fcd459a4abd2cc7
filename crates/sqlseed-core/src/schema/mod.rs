pub mod introspect;
pub mod types;
