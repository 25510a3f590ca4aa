use composecore::{ConfigMap, GraphError, Module, ModuleError};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating module instances
pub trait ModuleFactory: Send + Sync {
    /// Type identifier the factory is registered under (e.g. "math.scale")
    fn type_name(&self) -> &str;

    /// Create a new instance of the module with the given configuration
    fn create(&self, config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError>;
}

/// What `register` does when a type name is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Log a warning and replace the previous factory
    #[default]
    Overwrite,
    /// Refuse the registration
    Reject,
}

/// Registry of available module types
///
/// An explicit instance the assembling code passes around; there is no
/// process-wide registry. Shared read-only across invocations once the
/// graph is built.
pub struct ModuleRegistry {
    factories: HashMap<String, Arc<dyn ModuleFactory>>,
    collision: CollisionPolicy,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::with_collision_policy(CollisionPolicy::default())
    }

    pub fn with_collision_policy(collision: CollisionPolicy) -> Self {
        Self {
            factories: HashMap::new(),
            collision,
        }
    }

    /// Register a module factory under its type name
    pub fn register(&mut self, factory: Arc<dyn ModuleFactory>) -> Result<(), GraphError> {
        let type_name = factory.type_name().to_string();
        if self.factories.contains_key(&type_name) {
            match self.collision {
                CollisionPolicy::Reject => return Err(GraphError::DuplicateType(type_name)),
                CollisionPolicy::Overwrite => {
                    tracing::warn!("overwriting registered module type: {}", type_name);
                }
            }
        }
        tracing::info!("registering module type: {}", type_name);
        self.factories.insert(type_name, factory);
        Ok(())
    }

    /// Look up the factory for a type name
    pub fn factory(&self, type_name: &str) -> Option<&Arc<dyn ModuleFactory>> {
        self.factories.get(type_name)
    }

    /// Create a module instance from a type name and config
    pub fn build(
        &self,
        type_name: &str,
        config: &ConfigMap,
    ) -> Result<Box<dyn Module>, GraphError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| GraphError::UnknownType(type_name.to_string()))?;

        factory.create(config).map_err(|source| GraphError::Construction {
            module: type_name.to_string(),
            source,
        })
    }

    /// All registered type names, sorted
    pub fn list_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
