use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("module error: {0}")]
    Module(#[from] ModuleError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while building, scheduling or executing a graph
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("'{0}' module not found in the graph config")]
    MissingSentinel(&'static str),

    #[error("'{0}' must be declared as a bare input-source list or mapping")]
    SentinelShape(&'static str),

    #[error("'cls' field not found for module '{0}'")]
    MissingClass(String),

    #[error("'inp_src' field not found for module '{0}'")]
    MissingSources(String),

    #[error("invalid input source format: {0}")]
    InvalidSourceRef(String),

    #[error("unknown module type '{0}'")]
    UnknownType(String),

    #[error("module type '{0}' is already registered")]
    DuplicateType(String),

    #[error("failed to construct module '{module}': {source}")]
    Construction {
        module: String,
        #[source]
        source: ModuleError,
    },

    #[error("expected {expected} input arguments for 'entry', got {actual}")]
    InputArity { expected: usize, actual: usize },

    #[error("output arity mismatch for module '{module}': expected {expected}, got {actual}")]
    OutputArity {
        module: String,
        expected: usize,
        actual: usize,
    },

    #[error("module '{module}' requires value '{reference}' which was never produced")]
    UnresolvedValue { module: String, reference: String },

    #[error("no instance registered for module '{0}'")]
    MissingInstance(String),
}

/// Failures internal to a single module or its factory
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("missing required input at slot {0}")]
    MissingInput(usize),

    #[error("invalid input for '{field}': expected {expected}")]
    InvalidInput { field: String, expected: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// Errors from the configuration-file reader
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("{0} is not a regular file")]
    NotAFile(PathBuf),

    #[error("{0} is not a yaml file")]
    NotYaml(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config structure: {0}")]
    Structure(String),
}
