use crate::graph::ComposedGraph;
use composecore::{
    ComposeError, GraphError, InputSpec, Module, ModuleError, ModuleOutput, Value, ENTRY, EXIT,
};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Result of a forward pass
///
/// A single positional exit source comes back as the bare value, several
/// come back as a tuple, and keyed exit bindings come back as a mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GraphOutput {
    Single(Value),
    Tuple(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl ComposedGraph {
    /// Replay the cached execution order against live input values.
    ///
    /// The value table lives for this invocation only; the graph itself
    /// stays reusable whether or not the pass succeeds.
    pub fn forward(&self, args: &[Value]) -> Result<GraphOutput, ComposeError> {
        let entry = self
            .plan
            .inputs
            .get(ENTRY)
            .ok_or(GraphError::MissingSentinel(ENTRY))?;
        if args.len() != entry.len() {
            return Err(GraphError::InputArity {
                expected: entry.len(),
                actual: args.len(),
            }
            .into());
        }

        let mut values: HashMap<String, Value> = HashMap::new();
        if let Some(entry_names) = self.plan.out_names.get(ENTRY) {
            for (varname, arg) in entry_names.iter().zip(args) {
                values.insert(varname.clone(), arg.clone());
            }
        }

        for name in &self.plan.order {
            let (Some(bindings), Some(module)) =
                (self.plan.inputs.get(name), self.modules.get(name))
            else {
                return Err(GraphError::MissingInstance(name.clone()).into());
            };

            let mut resolved = Vec::with_capacity(bindings.len());
            for src in bindings.sources() {
                resolved.push(lookup(&values, name, src)?.clone());
            }

            let output = match module.call(&resolved) {
                Ok(output) => output,
                Err(e) => {
                    tracing::error!("error in module {}: {}", name, e);
                    return Err(e.into());
                }
            };

            let expected = self.plan.out_num.get(name).copied().unwrap_or(1);
            if output.arity() != expected {
                return Err(GraphError::OutputArity {
                    module: name.clone(),
                    expected,
                    actual: output.arity(),
                }
                .into());
            }

            if let Some(varnames) = self.plan.out_names.get(name) {
                for (varname, value) in varnames.iter().zip(output.into_values()) {
                    values.insert(varname.clone(), value);
                }
            }
        }

        let exit = self
            .plan
            .inputs
            .get(EXIT)
            .ok_or(GraphError::MissingSentinel(EXIT))?;
        match exit {
            InputSpec::Keyed(bindings) => {
                let mut result = IndexMap::with_capacity(bindings.len());
                for (local, src) in bindings {
                    result.insert(local.clone(), lookup(&values, EXIT, src)?.clone());
                }
                Ok(GraphOutput::Map(result))
            }
            InputSpec::Positional(sources) => {
                let mut result = Vec::with_capacity(sources.len());
                for src in sources {
                    result.push(lookup(&values, EXIT, src)?.clone());
                }
                if result.len() == 1 {
                    Ok(GraphOutput::Single(result.pop().unwrap_or(Value::Null)))
                } else {
                    Ok(GraphOutput::Tuple(result))
                }
            }
        }
    }
}

fn lookup<'v>(
    values: &'v HashMap<String, Value>,
    module: &str,
    reference: &str,
) -> Result<&'v Value, GraphError> {
    values.get(reference).ok_or_else(|| GraphError::UnresolvedValue {
        module: module.to_string(),
        reference: reference.to_string(),
    })
}

/// A composed graph is itself a module, so graphs nest inside graphs.
/// A keyed exit collapses to a single mapping value when nested.
impl Module for ComposedGraph {
    fn type_name(&self) -> &str {
        "composed"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        match self.forward(inputs) {
            Ok(GraphOutput::Single(value)) => Ok(ModuleOutput::Single(value)),
            Ok(GraphOutput::Tuple(values)) => Ok(ModuleOutput::Tuple(values)),
            Ok(GraphOutput::Map(map)) => Ok(ModuleOutput::Single(Value::Map(map))),
            Err(e) => Err(ModuleError::ExecutionFailed(e.to_string())),
        }
    }
}
