use composecore::{ConfigMap, Module, ModuleError, ModuleOutput, Value};
use composeruntime::ModuleFactory;

/// Multiply a scalar or vector by a constant factor
#[derive(Debug)]
pub struct ScaleModule {
    factor: f64,
}

impl Module for ScaleModule {
    fn type_name(&self) -> &str {
        "math.scale"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let value = inputs.first().ok_or(ModuleError::MissingInput(0))?;
        match value {
            Value::List(items) => {
                let scaled = items
                    .iter()
                    .map(|item| {
                        item.as_f64()
                            .map(|n| Value::Float(n * self.factor))
                            .ok_or_else(|| numeric_err("input"))
                    })
                    .collect::<Result<Vec<Value>, ModuleError>>()?;
                Ok(ModuleOutput::single(scaled))
            }
            _ => {
                let n = value.as_f64().ok_or_else(|| numeric_err("input"))?;
                Ok(ModuleOutput::single(n * self.factor))
            }
        }
    }
}

pub struct ScaleModuleFactory;

impl ModuleFactory for ScaleModuleFactory {
    fn type_name(&self) -> &str {
        "math.scale"
    }

    fn create(&self, config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        let factor = config.get("factor").and_then(Value::as_f64).unwrap_or(1.0);
        Ok(Box::new(ScaleModule { factor }))
    }
}

/// Add two scalars, or two vectors elementwise
#[derive(Debug)]
pub struct AddModule;

impl Module for AddModule {
    fn type_name(&self) -> &str {
        "math.add"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let lhs = inputs.first().ok_or(ModuleError::MissingInput(0))?;
        let rhs = inputs.get(1).ok_or(ModuleError::MissingInput(1))?;
        match (lhs, rhs) {
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Err(ModuleError::InvalidInput {
                        field: "inputs".to_string(),
                        expected: format!("vectors of equal length, got {} and {}", a.len(), b.len()),
                    });
                }
                let sum = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| {
                        match (x.as_f64(), y.as_f64()) {
                            (Some(x), Some(y)) => Ok(Value::Float(x + y)),
                            _ => Err(numeric_err("inputs")),
                        }
                    })
                    .collect::<Result<Vec<Value>, ModuleError>>()?;
                Ok(ModuleOutput::single(sum))
            }
            _ => {
                let x = lhs.as_f64().ok_or_else(|| numeric_err("lhs"))?;
                let y = rhs.as_f64().ok_or_else(|| numeric_err("rhs"))?;
                Ok(ModuleOutput::single(x + y))
            }
        }
    }
}

pub struct AddModuleFactory;

impl ModuleFactory for AddModuleFactory {
    fn type_name(&self) -> &str {
        "math.add"
    }

    fn create(&self, _config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        Ok(Box::new(AddModule))
    }
}

fn numeric_err(field: &str) -> ModuleError {
    ModuleError::InvalidInput {
        field: field.to_string(),
        expected: "a number or a list of numbers".to_string(),
    }
}
