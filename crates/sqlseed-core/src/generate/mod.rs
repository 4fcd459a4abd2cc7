pub mod batch;
pub mod context;
pub mod engine;
pub mod orchestrator;
pub mod plan;
pub mod providers;
pub mod reference;
pub mod synth;
pub mod value;
