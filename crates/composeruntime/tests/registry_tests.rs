use composecore::{ConfigMap, GraphError, Module, ModuleError, ModuleOutput, Value};
use composeruntime::{CollisionPolicy, ModuleFactory, ModuleRegistry};
use std::sync::Arc;

#[derive(Debug)]
struct Constant(i64);

impl Module for Constant {
    fn type_name(&self) -> &str {
        "test.constant"
    }

    fn call(&self, _inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        Ok(ModuleOutput::single(self.0))
    }
}

struct ConstantFactory {
    name: &'static str,
    value: i64,
}

impl ModuleFactory for ConstantFactory {
    fn type_name(&self) -> &str {
        self.name
    }

    fn create(&self, _config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        Ok(Box::new(Constant(self.value)))
    }
}

struct FailingFactory;

impl ModuleFactory for FailingFactory {
    fn type_name(&self) -> &str {
        "test.failing"
    }

    fn create(&self, _config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        Err(ModuleError::Configuration("cannot build".to_string()))
    }
}

#[test]
fn duplicate_registration_overwrites_by_default() {
    let mut registry = ModuleRegistry::new();
    registry
        .register(Arc::new(ConstantFactory {
            name: "test.constant",
            value: 1,
        }))
        .unwrap();
    registry
        .register(Arc::new(ConstantFactory {
            name: "test.constant",
            value: 2,
        }))
        .unwrap();

    let module = registry.build("test.constant", &ConfigMap::new()).unwrap();
    assert_eq!(
        module.call(&[]).unwrap(),
        ModuleOutput::Single(Value::Int(2)),
        "the later registration wins"
    );
}

#[test]
fn duplicate_registration_can_be_rejected() {
    let mut registry = ModuleRegistry::with_collision_policy(CollisionPolicy::Reject);
    registry
        .register(Arc::new(ConstantFactory {
            name: "test.constant",
            value: 1,
        }))
        .unwrap();
    let err = registry
        .register(Arc::new(ConstantFactory {
            name: "test.constant",
            value: 2,
        }))
        .unwrap_err();
    match err {
        GraphError::DuplicateType(name) => assert_eq!(name, "test.constant"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_type_is_reported() {
    let registry = ModuleRegistry::new();
    let err = registry.build("test.nope", &ConfigMap::new()).unwrap_err();
    match err {
        GraphError::UnknownType(name) => assert_eq!(name, "test.nope"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn factory_failures_surface_as_construction_errors() {
    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(FailingFactory)).unwrap();
    let err = registry.build("test.failing", &ConfigMap::new()).unwrap_err();
    assert!(matches!(err, GraphError::Construction { .. }));
    assert!(err.to_string().contains("cannot build"));
}

#[test]
fn list_types_is_sorted() {
    let mut registry = ModuleRegistry::new();
    registry
        .register(Arc::new(ConstantFactory {
            name: "test.b",
            value: 0,
        }))
        .unwrap();
    registry
        .register(Arc::new(ConstantFactory {
            name: "test.a",
            value: 0,
        }))
        .unwrap();
    assert_eq!(registry.list_types(), ["test.a", "test.b"]);
}
