//! Standard module library
//!
//! Collection of built-in modules for composing small numeric models

mod debug;
mod math;
mod vector;

pub use debug::TraceModule;
pub use math::{AddModule, ScaleModule};
pub use vector::{ConcatModule, LinearModule, ReluModule, SplitModule};

use composecore::GraphError;
use composeruntime::ModuleRegistry;
use std::sync::Arc;

/// Register all standard modules with a registry
pub fn register_all(registry: &mut ModuleRegistry) -> Result<(), GraphError> {
    registry.register(Arc::new(debug::TraceModuleFactory))?;
    registry.register(Arc::new(math::AddModuleFactory))?;
    registry.register(Arc::new(math::ScaleModuleFactory))?;
    registry.register(Arc::new(vector::ConcatModuleFactory))?;
    registry.register(Arc::new(vector::LinearModuleFactory))?;
    registry.register(Arc::new(vector::ReluModuleFactory))?;
    registry.register(Arc::new(vector::SplitModuleFactory))?;
    Ok(())
}
