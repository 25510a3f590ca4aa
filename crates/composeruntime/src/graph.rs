use crate::config;
use crate::registry::{ModuleFactory, ModuleRegistry};
use crate::schedule;
use composecore::{
    ComposeError, ConfigMap, ConfigSource, GraphError, GraphSpec, InputSpec, Module, ModuleDecl,
    ModuleError, ENTRY, EXIT,
};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// One consumer slot awaiting a published value
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotRef {
    pub module: String,
    pub slot: usize,
}

/// Immutable wiring tables plus the cached execution order
///
/// Built once from a [`GraphSpec`] and never mutated afterwards. A plan on
/// its own carries no module instances; it is what skip-build validation
/// produces.
#[derive(Debug)]
pub struct GraphPlan {
    name: String,
    /// Per-module input bindings, in declaration order
    pub(crate) inputs: IndexMap<String, InputSpec>,
    /// Declared output arity per module
    pub(crate) out_num: HashMap<String, usize>,
    /// Published output names per module, in slot order
    pub(crate) out_names: IndexMap<String, Vec<String>>,
    /// Reverse-dependency index: published name -> consumer slots
    pub(crate) consumers: HashMap<String, Vec<SlotRef>>,
    /// Cached execution order over non-sentinel modules
    pub(crate) order: Vec<String>,
    /// Whether `exit` was declared with keyed bindings
    pub(crate) returns_map: bool,
}

impl GraphPlan {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fixed execution order the scheduler computed
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn returns_map(&self) -> bool {
        self.returns_map
    }

    /// Declared input arity of a module
    pub fn input_arity(&self, module: &str) -> Option<usize> {
        self.inputs.get(module).map(InputSpec::len)
    }

    /// Names a module publishes its outputs under
    pub fn output_names(&self, module: &str) -> Option<&[String]> {
        self.out_names.get(module).map(Vec::as_slice)
    }

    /// Consumer count currently waiting on a published name
    pub fn consumer_count(&self, varname: &str) -> usize {
        self.consumers.get(varname).map(Vec::len).unwrap_or(0)
    }
}

/// An executable graph: a plan plus its instantiated modules
#[derive(Debug)]
pub struct ComposedGraph {
    pub(crate) plan: GraphPlan,
    pub(crate) modules: HashMap<String, Box<dyn Module>>,
}

impl ComposedGraph {
    pub fn plan(&self) -> &GraphPlan {
        &self.plan
    }
}

/// Validated wiring tables, not yet scheduled
struct Wiring {
    name: String,
    inputs: IndexMap<String, InputSpec>,
    out_num: HashMap<String, usize>,
    out_names: IndexMap<String, Vec<String>>,
    consumers: HashMap<String, Vec<SlotRef>>,
    returns_map: bool,
}

impl Wiring {
    /// Run the dataflow dry run and freeze everything into a plan
    fn schedule(self) -> GraphPlan {
        let order = schedule::schedule(&self.inputs, &self.out_names, &self.consumers);
        tracing::debug!("scheduled execution order: {:?}", order);
        GraphPlan {
            name: self.name,
            inputs: self.inputs,
            out_num: self.out_num,
            out_names: self.out_names,
            consumers: self.consumers,
            order,
            returns_map: self.returns_map,
        }
    }
}

/// Assembles a [`GraphSpec`] into a plan or an executable graph
pub struct GraphBuilder<'r> {
    registry: &'r ModuleRegistry,
}

impl<'r> GraphBuilder<'r> {
    pub fn new(registry: &'r ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Validate wiring and compute the execution order without
    /// instantiating any module ("skip build" mode)
    pub fn validate(&self, spec: &GraphSpec) -> Result<GraphPlan, ComposeError> {
        Ok(self.wire(spec)?.schedule())
    }

    /// Build the full executable graph
    ///
    /// Wiring and instantiation errors both surface before any scheduling
    /// happens; scheduling itself cannot fail.
    pub fn build(&self, spec: &GraphSpec) -> Result<ComposedGraph, ComposeError> {
        let wiring = self.wire(spec)?;
        let modules = self.instantiate(spec)?;
        Ok(ComposedGraph {
            plan: wiring.schedule(),
            modules,
        })
    }

    /// Parse and validate the declarative wiring
    fn wire(&self, spec: &GraphSpec) -> Result<Wiring, ComposeError> {
        for sentinel in [ENTRY, EXIT] {
            if !spec.modules.contains_key(sentinel) {
                return Err(GraphError::MissingSentinel(sentinel).into());
            }
        }

        let mut inputs: IndexMap<String, InputSpec> = IndexMap::new();
        let mut out_num: HashMap<String, usize> = HashMap::new();
        let mut out_names: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut consumers: HashMap<String, Vec<SlotRef>> = HashMap::new();
        let mut returns_map = false;

        for (name, decl) in &spec.modules {
            tracing::debug!("wiring module {}", name);
            let sentinel = GraphSpec::is_sentinel(name);

            let (bindings, declared_out) = match (sentinel, decl) {
                (true, ModuleDecl::Wiring(bindings)) => (bindings, bindings.len()),
                (true, ModuleDecl::Component(_)) => {
                    let which = if name == ENTRY { ENTRY } else { EXIT };
                    return Err(GraphError::SentinelShape(which).into());
                }
                (false, ModuleDecl::Component(component)) => {
                    let bindings = component
                        .inp_src
                        .as_ref()
                        .ok_or_else(|| GraphError::MissingSources(name.clone()))?;
                    (bindings, component.out_num)
                }
                // a bare wiring mapping carries no component type
                (false, ModuleDecl::Wiring(_)) => {
                    return Err(GraphError::MissingClass(name.clone()).into());
                }
            };

            for src in bindings.sources() {
                validate_source_ref(src)?;
            }

            if !sentinel {
                for (slot, src) in bindings.sources().enumerate() {
                    consumers.entry(src.to_string()).or_default().push(SlotRef {
                        module: name.clone(),
                        slot,
                    });
                }
            }

            if name == EXIT && bindings.is_keyed() {
                returns_map = true;
            }

            out_names.insert(name.clone(), output_names(name, bindings, declared_out));
            out_num.insert(name.clone(), declared_out);
            inputs.insert(name.clone(), bindings.clone());
        }

        Ok(Wiring {
            name: spec.name.clone().unwrap_or_else(|| "model".to_string()),
            inputs,
            out_num,
            out_names,
            consumers,
            returns_map,
        })
    }

    /// Instantiate every non-sentinel module through the registry
    fn instantiate(&self, spec: &GraphSpec) -> Result<HashMap<String, Box<dyn Module>>, ComposeError> {
        let mut modules: HashMap<String, Box<dyn Module>> = HashMap::new();

        for (name, decl) in &spec.modules {
            if GraphSpec::is_sentinel(name) {
                continue;
            }
            let ModuleDecl::Component(component) = decl else {
                return Err(GraphError::MissingClass(name.clone()).into());
            };
            let cls = component
                .cls
                .as_deref()
                .ok_or_else(|| GraphError::MissingClass(name.clone()))?;

            let config = match &component.config {
                None => ConfigMap::new(),
                Some(ConfigSource::Inline(map)) => map.clone(),
                Some(ConfigSource::Path(path)) => config::read_module_config(path)?,
            };

            tracing::debug!("building module {} ({})", name, cls);
            let factory = self
                .registry
                .factory(cls)
                .ok_or_else(|| GraphError::UnknownType(cls.to_string()))?;
            let module = factory
                .create(&config)
                .map_err(|source| GraphError::Construction {
                    module: name.clone(),
                    source,
                })?;
            modules.insert(name.clone(), module);
        }

        Ok(modules)
    }
}

/// Check a source reference against the grammar: a bare name, or a name
/// with one trailing `.<nonneg int>` slot selector.
fn validate_source_ref(src: &str) -> Result<(), GraphError> {
    let parts: Vec<&str> = src.split('.').collect();
    match parts.as_slice() {
        [_] => Ok(()),
        [_, index] if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        _ => Err(GraphError::InvalidSourceRef(src.to_string())),
    }
}

/// Names a module publishes its outputs under (see the graph format docs):
/// `entry` republishes its arguments, keyed modules publish their local
/// names, and positional modules publish `name` or `name.0 .. name.(N-1)`.
fn output_names(name: &str, bindings: &InputSpec, out_num: usize) -> Vec<String> {
    if name == ENTRY {
        return match bindings {
            InputSpec::Positional(sources) => sources.clone(),
            InputSpec::Keyed(keyed) => keyed.keys().cloned().collect(),
        };
    }
    if let InputSpec::Keyed(keyed) = bindings {
        return keyed.keys().cloned().collect();
    }
    if out_num == 1 {
        vec![name.to_string()]
    } else {
        (0..out_num).map(|i| format!("{name}.{i}")).collect()
    }
}

/// Factory that builds a nested [`ComposedGraph`] from a graph-spec config
/// blob, letting composed graphs appear as modules of an outer graph.
pub struct CompositeFactory {
    type_name: String,
    registry: Arc<ModuleRegistry>,
}

impl CompositeFactory {
    /// `registry` supplies the module types available inside the nested
    /// graphs this factory builds.
    pub fn new(type_name: impl Into<String>, registry: Arc<ModuleRegistry>) -> Self {
        Self {
            type_name: type_name.into(),
            registry,
        }
    }
}

impl ModuleFactory for CompositeFactory {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn create(&self, config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        let spec = GraphSpec::from_config(config)
            .map_err(|e| ModuleError::Configuration(e.to_string()))?;
        let graph = GraphBuilder::new(&self.registry)
            .build(&spec)
            .map_err(|e| ModuleError::Configuration(e.to_string()))?;
        Ok(Box::new(graph))
    }
}

#[cfg(test)]
mod tests {
    use super::validate_source_ref;

    #[test]
    fn bare_name_is_valid() {
        assert!(validate_source_ref("encoder").is_ok());
    }

    #[test]
    fn single_slot_suffix_is_valid() {
        assert!(validate_source_ref("encoder.0").is_ok());
        assert!(validate_source_ref("encoder.12").is_ok());
    }

    #[test]
    fn non_integer_suffix_is_invalid() {
        assert!(validate_source_ref("encoder.first").is_err());
        assert!(validate_source_ref("encoder.-1").is_err());
        assert!(validate_source_ref("encoder.").is_err());
    }

    #[test]
    fn multiple_suffixes_are_invalid() {
        assert!(validate_source_ref("mod.1.2").is_err());
        assert!(validate_source_ref("a.b.c").is_err());
    }
}
