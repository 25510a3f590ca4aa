use composecore::{ConfigMap, Module, ModuleError, ModuleOutput, Value};
use composeruntime::ModuleFactory;

/// Passthrough module that logs the value flowing through it
#[derive(Debug)]
pub struct TraceModule {
    label: String,
}

impl Module for TraceModule {
    fn type_name(&self) -> &str {
        "debug.trace"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let value = inputs.first().ok_or(ModuleError::MissingInput(0))?;
        tracing::info!("[{}] {:?}", self.label, value);
        Ok(ModuleOutput::Single(value.clone()))
    }
}

pub struct TraceModuleFactory;

impl ModuleFactory for TraceModuleFactory {
    fn type_name(&self) -> &str {
        "debug.trace"
    }

    fn create(&self, config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        let label = config
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or("trace")
            .to_string();
        Ok(Box::new(TraceModule { label }))
    }
}
