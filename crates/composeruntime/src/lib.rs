//! Graph assembly and execution runtime
//!
//! This crate provides the engine that turns a declarative [`GraphSpec`]
//! into an executable pipeline: the module registry, the graph builder,
//! the dataflow scheduler, the sequential executor, and the YAML config
//! reader.
//!
//! [`GraphSpec`]: composecore::GraphSpec

pub mod config;
mod executor;
mod graph;
mod registry;
mod schedule;

pub use executor::GraphOutput;
pub use graph::{ComposedGraph, CompositeFactory, GraphBuilder, GraphPlan};
pub use registry::{CollisionPolicy, ModuleFactory, ModuleRegistry};
