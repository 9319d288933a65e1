pub mod availability;
pub mod config;
pub mod constraints;
pub mod data;
pub mod error;
pub mod requirement;
pub mod runner;
pub mod solver;
pub mod store;
pub mod workload;

pub use config::EngineConfig;
pub use data::{Dataset, RunResult};
pub use runner::Runner;
pub use store::{InMemoryStore, SchedulingStore};
