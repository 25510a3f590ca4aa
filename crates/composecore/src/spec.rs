use crate::{ConfigError, ConfigMap, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved name of the pseudo-module publishing the graph's arguments
pub const ENTRY: &str = "entry";
/// Reserved name of the pseudo-module collecting the graph's results
pub const EXIT: &str = "exit";

/// Complete declarative graph definition
///
/// The top-level `modules` mapping is ordered; declaration order drives
/// output naming for `entry` and the determinism of the schedule. Unknown
/// sibling keys (`hyper_params` written by the config generator, for
/// instance) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub modules: IndexMap<String, ModuleDecl>,
}

impl GraphSpec {
    /// Whether `name` is one of the reserved pseudo-modules
    pub fn is_sentinel(name: &str) -> bool {
        name == ENTRY || name == EXIT
    }

    /// Deserialize a spec out of an already-loaded value tree
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let raw = serde_yaml::to_value(value)
            .map_err(|e| ConfigError::Structure(e.to_string()))?;
        serde_yaml::from_value(raw).map_err(|e| ConfigError::Structure(e.to_string()))
    }

    /// Deserialize a spec out of a construction-configuration blob,
    /// as handed to a composite-module factory
    pub fn from_config(config: &ConfigMap) -> Result<Self, ConfigError> {
        Self::from_value(&Value::Map(config.clone()))
    }
}

/// One entry of the `modules` mapping
///
/// `entry` and `exit` are declared as a bare input-source collection;
/// every other module carries a component declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleDecl {
    Component(ComponentDecl),
    Wiring(InputSpec),
}

/// Declaration of a real (non-sentinel) module
///
/// `cls` and `inp_src` are optional at the serde layer so that their
/// absence surfaces as a configuration error naming the module, not as an
/// opaque parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDecl {
    #[serde(default)]
    pub cls: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigSource>,
    #[serde(default)]
    pub inp_src: Option<InputSpec>,
    #[serde(default = "default_out_num")]
    pub out_num: usize,
}

fn default_out_num() -> usize {
    1
}

/// Input-source collection: positional sequence or keyed mapping
///
/// For keyed bindings the mapping values are the source references,
/// resolved in declaration order; the keys are caller-chosen local names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    Positional(Vec<String>),
    Keyed(IndexMap<String, String>),
}

impl InputSpec {
    /// Declared input arity
    pub fn len(&self) -> usize {
        match self {
            InputSpec::Positional(sources) => sources.len(),
            InputSpec::Keyed(bindings) => bindings.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self, InputSpec::Keyed(_))
    }

    /// Source references in declaration order
    pub fn sources(&self) -> impl Iterator<Item = &str> + '_ {
        match self {
            InputSpec::Positional(sources) => {
                Box::new(sources.iter().map(String::as_str)) as Box<dyn Iterator<Item = &str> + '_>
            }
            InputSpec::Keyed(bindings) => Box::new(bindings.values().map(String::as_str)),
        }
    }

    /// Local names for keyed bindings, in declaration order
    pub fn local_names(&self) -> Option<impl Iterator<Item = &str> + '_> {
        match self {
            InputSpec::Positional(_) => None,
            InputSpec::Keyed(bindings) => Some(bindings.keys().map(String::as_str)),
        }
    }
}

/// Construction configuration: inline mapping or a path to another file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigSource {
    Path(String),
    Inline(ConfigMap),
}
