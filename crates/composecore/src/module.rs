use crate::{ModuleError, Value};

/// Core trait that all executable modules implement
///
/// A module is an opaque computation taking fixed-arity positional inputs
/// and returning fixed-arity outputs. Execution is synchronous; a graph
/// replays its modules strictly in sequence, so implementations never see
/// overlapping calls for the same invocation.
pub trait Module: Send + Sync + std::fmt::Debug {
    /// Type identifier the module was registered under (e.g. "math.scale")
    fn type_name(&self) -> &str;

    /// Run the computation on the resolved positional inputs
    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError>;
}

/// Output of a module call
///
/// `Single` is a bare return value and always has arity 1; `Tuple` carries
/// one value per declared output slot. The executor checks the arity
/// against the module's declaration before publishing anything.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleOutput {
    Single(Value),
    Tuple(Vec<Value>),
}

impl ModuleOutput {
    pub fn single(value: impl Into<Value>) -> Self {
        ModuleOutput::Single(value.into())
    }

    pub fn tuple(values: Vec<Value>) -> Self {
        ModuleOutput::Tuple(values)
    }

    pub fn arity(&self) -> usize {
        match self {
            ModuleOutput::Single(_) => 1,
            ModuleOutput::Tuple(values) => values.len(),
        }
    }

    /// Normalize to a flat list of output values
    pub fn into_values(self) -> Vec<Value> {
        match self {
            ModuleOutput::Single(value) => vec![value],
            ModuleOutput::Tuple(values) => values,
        }
    }
}

impl From<Value> for ModuleOutput {
    fn from(value: Value) -> Self {
        ModuleOutput::Single(value)
    }
}
