use composecore::{ConfigMap, Module, ModuleError, ModuleOutput, Value};
use composeruntime::ModuleFactory;

/// Affine map: `y = W x + b`
#[derive(Debug)]
pub struct LinearModule {
    weight: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl Module for LinearModule {
    fn type_name(&self) -> &str {
        "nn.linear"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let x = as_vector(inputs.first().ok_or(ModuleError::MissingInput(0))?)?;
        let mut y = Vec::with_capacity(self.weight.len());
        for (row, b) in self.weight.iter().zip(&self.bias) {
            if row.len() != x.len() {
                return Err(ModuleError::InvalidInput {
                    field: "input".to_string(),
                    expected: format!("a vector of length {}, got {}", row.len(), x.len()),
                });
            }
            let dot: f64 = row.iter().zip(&x).map(|(w, v)| w * v).sum();
            y.push(Value::Float(dot + b));
        }
        Ok(ModuleOutput::single(y))
    }
}

pub struct LinearModuleFactory;

impl ModuleFactory for LinearModuleFactory {
    fn type_name(&self) -> &str {
        "nn.linear"
    }

    fn create(&self, config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        let weight = config
            .get("weight")
            .and_then(Value::as_list)
            .ok_or_else(|| ModuleError::Configuration("missing 'weight' matrix".to_string()))?
            .iter()
            .map(|row| {
                row.as_list()
                    .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<f64>>>())
                    .ok_or_else(|| {
                        ModuleError::Configuration(
                            "'weight' must be a list of numeric rows".to_string(),
                        )
                    })
            })
            .collect::<Result<Vec<Vec<f64>>, ModuleError>>()?;

        let bias = match config.get("bias").and_then(Value::as_list) {
            Some(items) => items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| {
                    ModuleError::Configuration("'bias' must be a list of numbers".to_string())
                })?,
            None => vec![0.0; weight.len()],
        };
        if bias.len() != weight.len() {
            return Err(ModuleError::Configuration(format!(
                "'bias' length {} does not match {} weight rows",
                bias.len(),
                weight.len()
            )));
        }
        Ok(Box::new(LinearModule { weight, bias }))
    }
}

/// Elementwise `max(0, x)`
#[derive(Debug)]
pub struct ReluModule;

impl Module for ReluModule {
    fn type_name(&self) -> &str {
        "nn.relu"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let value = inputs.first().ok_or(ModuleError::MissingInput(0))?;
        match value {
            Value::List(_) => {
                let x = as_vector(value)?;
                let y: Vec<Value> = x.iter().map(|n| Value::Float(n.max(0.0))).collect();
                Ok(ModuleOutput::single(y))
            }
            _ => {
                let n = value.as_f64().ok_or_else(|| vector_err("input"))?;
                Ok(ModuleOutput::single(n.max(0.0)))
            }
        }
    }
}

pub struct ReluModuleFactory;

impl ModuleFactory for ReluModuleFactory {
    fn type_name(&self) -> &str {
        "nn.relu"
    }

    fn create(&self, _config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        Ok(Box::new(ReluModule))
    }
}

/// Join two vectors end to end
#[derive(Debug)]
pub struct ConcatModule;

impl Module for ConcatModule {
    fn type_name(&self) -> &str {
        "tensor.concat"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let lhs = inputs.first().ok_or(ModuleError::MissingInput(0))?;
        let rhs = inputs.get(1).ok_or(ModuleError::MissingInput(1))?;
        let (Value::List(a), Value::List(b)) = (lhs, rhs) else {
            return Err(vector_err("inputs"));
        };
        let mut joined = a.clone();
        joined.extend(b.iter().cloned());
        Ok(ModuleOutput::single(joined))
    }
}

pub struct ConcatModuleFactory;

impl ModuleFactory for ConcatModuleFactory {
    fn type_name(&self) -> &str {
        "tensor.concat"
    }

    fn create(&self, _config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        Ok(Box::new(ConcatModule))
    }
}

/// Split a vector at a fixed index into two outputs
#[derive(Debug)]
pub struct SplitModule {
    index: usize,
}

impl Module for SplitModule {
    fn type_name(&self) -> &str {
        "tensor.split"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let value = inputs.first().ok_or(ModuleError::MissingInput(0))?;
        let Value::List(items) = value else {
            return Err(vector_err("input"));
        };
        if self.index > items.len() {
            return Err(ModuleError::InvalidInput {
                field: "input".to_string(),
                expected: format!("a list of at least {} items, got {}", self.index, items.len()),
            });
        }
        let (head, tail) = items.split_at(self.index);
        Ok(ModuleOutput::tuple(vec![
            Value::List(head.to_vec()),
            Value::List(tail.to_vec()),
        ]))
    }
}

pub struct SplitModuleFactory;

impl ModuleFactory for SplitModuleFactory {
    fn type_name(&self) -> &str {
        "tensor.split"
    }

    fn create(&self, config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        let index = config
            .get("index")
            .and_then(Value::as_i64)
            .ok_or_else(|| ModuleError::Configuration("missing 'index'".to_string()))?;
        if index < 0 {
            return Err(ModuleError::Configuration(
                "'index' must be non-negative".to_string(),
            ));
        }
        Ok(Box::new(SplitModule {
            index: index as usize,
        }))
    }
}

fn as_vector(value: &Value) -> Result<Vec<f64>, ModuleError> {
    value
        .as_list()
        .and_then(|items| {
            items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<f64>>>()
        })
        .ok_or_else(|| vector_err("input"))
}

fn vector_err(field: &str) -> ModuleError {
    ModuleError::InvalidInput {
        field: field.to_string(),
        expected: "a list of numbers".to_string(),
    }
}
