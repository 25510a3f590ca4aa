//! YAML configuration reader
//!
//! Loads a config tree from disk and recursively resolves any module
//! `config` field that is itself a path reference, relative to the
//! referencing file's directory, before the builder ever sees it.

use composecore::{ConfigError, ConfigMap, GraphSpec, Value};
use std::path::Path;

/// Read a YAML file into a value tree, resolving nested config paths.
pub fn read_config(path: impl AsRef<Path>) -> Result<Value, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path.to_path_buf()));
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => {}
        _ => return Err(ConfigError::NotYaml(path.to_path_buf())),
    }

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut tree: Value = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    resolve_nested(&mut tree, base)?;
    Ok(tree)
}

/// Replace every `modules.*.config` string with the tree read from that
/// path. Referenced files go through `read_config` again, so nesting
/// resolves to arbitrary depth.
fn resolve_nested(tree: &mut Value, base: &Path) -> Result<(), ConfigError> {
    let Value::Map(map) = tree else {
        return Ok(());
    };
    let Some(Value::Map(modules)) = map.get_mut("modules") else {
        return Ok(());
    };
    for (_name, decl) in modules.iter_mut() {
        let Value::Map(fields) = decl else {
            continue;
        };
        if let Some(config) = fields.get_mut("config") {
            let referenced = match config {
                Value::Str(reference) => Some(read_config(base.join(reference.as_str()))?),
                _ => None,
            };
            if let Some(tree) = referenced {
                *config = tree;
            }
        }
    }
    Ok(())
}

/// Read a module construction config; the file must hold a mapping.
pub fn read_module_config(path: impl AsRef<Path>) -> Result<ConfigMap, ConfigError> {
    let path = path.as_ref();
    match read_config(path)? {
        Value::Map(map) => Ok(map),
        _ => Err(ConfigError::Structure(format!(
            "{} does not contain a mapping",
            path.display()
        ))),
    }
}

/// Load a graph spec from a YAML file, nested configs resolved.
pub fn load_graph(path: impl AsRef<Path>) -> Result<GraphSpec, ConfigError> {
    let tree = read_config(path)?;
    GraphSpec::from_value(&tree)
}
