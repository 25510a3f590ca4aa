use composecore::{
    ComposeError, ConfigMap, GraphError, GraphSpec, Module, ModuleError, ModuleOutput, Value,
};
use composeruntime::{
    ComposedGraph, CompositeFactory, GraphBuilder, GraphOutput, ModuleFactory, ModuleRegistry,
};
use std::sync::Arc;

// Minimal modules exercising every wiring shape

#[derive(Debug)]
struct Passthrough;

impl Module for Passthrough {
    fn type_name(&self) -> &str {
        "test.passthrough"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let value = inputs.first().ok_or(ModuleError::MissingInput(0))?;
        Ok(ModuleOutput::Single(value.clone()))
    }
}

#[derive(Debug)]
struct Double;

impl Module for Double {
    fn type_name(&self) -> &str {
        "test.double"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let n = inputs
            .first()
            .and_then(Value::as_f64)
            .ok_or(ModuleError::MissingInput(0))?;
        Ok(ModuleOutput::single(n * 2.0))
    }
}

#[derive(Debug)]
struct Sum;

impl Module for Sum {
    fn type_name(&self) -> &str {
        "test.sum"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let mut total = 0.0;
        for (slot, value) in inputs.iter().enumerate() {
            total += value.as_f64().ok_or(ModuleError::MissingInput(slot))?;
        }
        Ok(ModuleOutput::single(total))
    }
}

/// One value in, the value and ten times the value out
#[derive(Debug)]
struct FanOut;

impl Module for FanOut {
    fn type_name(&self) -> &str {
        "test.fanout"
    }

    fn call(&self, inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let n = inputs
            .first()
            .and_then(Value::as_f64)
            .ok_or(ModuleError::MissingInput(0))?;
        Ok(ModuleOutput::tuple(vec![
            Value::Float(n),
            Value::Float(n * 10.0),
        ]))
    }
}

/// Always returns a single value, whatever its declared arity says
#[derive(Debug)]
struct Lone;

impl Module for Lone {
    fn type_name(&self) -> &str {
        "test.lone"
    }

    fn call(&self, _inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        Ok(ModuleOutput::single(1i64))
    }
}

#[derive(Debug)]
struct Boom;

impl Module for Boom {
    fn type_name(&self) -> &str {
        "test.boom"
    }

    fn call(&self, _inputs: &[Value]) -> Result<ModuleOutput, ModuleError> {
        Err(ModuleError::ExecutionFailed("boom".to_string()))
    }
}

struct StaticFactory {
    name: &'static str,
    make: fn() -> Box<dyn Module>,
}

impl ModuleFactory for StaticFactory {
    fn type_name(&self) -> &str {
        self.name
    }

    fn create(&self, _config: &ConfigMap) -> Result<Box<dyn Module>, ModuleError> {
        Ok((self.make)())
    }
}

fn register(registry: &mut ModuleRegistry, name: &'static str, make: fn() -> Box<dyn Module>) {
    registry
        .register(Arc::new(StaticFactory { name, make }))
        .expect("fresh registry");
}

fn test_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    register(&mut registry, "test.passthrough", || Box::new(Passthrough));
    register(&mut registry, "test.double", || Box::new(Double));
    register(&mut registry, "test.sum", || Box::new(Sum));
    register(&mut registry, "test.fanout", || Box::new(FanOut));
    register(&mut registry, "test.lone", || Box::new(Lone));
    register(&mut registry, "test.boom", || Box::new(Boom));
    registry
}

fn spec(yaml: &str) -> GraphSpec {
    serde_yaml::from_str(yaml).expect("valid test spec")
}

fn build(yaml: &str) -> ComposedGraph {
    let registry = test_registry();
    GraphBuilder::new(&registry)
        .build(&spec(yaml))
        .expect("graph builds")
}

#[test]
fn entry_exit_identity() {
    let graph = build(
        r#"
modules:
  entry: [x]
  m:
    cls: test.passthrough
    inp_src: [x]
  exit: [m]
"#,
    );
    let out = graph.forward(&[Value::Int(42)]).unwrap();
    assert_eq!(out, GraphOutput::Single(Value::Int(42)));
}

#[test]
fn schedule_is_deterministic() {
    let yaml = r#"
modules:
  entry: [x]
  a:
    cls: test.double
    inp_src: [x]
  b:
    cls: test.double
    inp_src: [x]
  c:
    cls: test.sum
    inp_src: [a, b]
  exit: [c]
"#;
    let registry = test_registry();
    let builder = GraphBuilder::new(&registry);
    let first = builder.validate(&spec(yaml)).unwrap();
    let second = builder.validate(&spec(yaml)).unwrap();
    assert_eq!(first.order(), second.order());
    assert_eq!(first.order(), ["a", "b", "c"]);
}

#[test]
fn schedule_is_breadth_first_from_entry() {
    // declared in reverse of their dependency order
    let graph = build(
        r#"
modules:
  entry: [x]
  c:
    cls: test.double
    inp_src: [b]
  b:
    cls: test.double
    inp_src: [a]
  a:
    cls: test.double
    inp_src: [x]
  exit: [c]
"#,
    );
    assert_eq!(graph.plan().order(), ["a", "b", "c"]);
    let out = graph.forward(&[Value::Float(1.0)]).unwrap();
    assert_eq!(out, GraphOutput::Single(Value::Float(8.0)));
}

#[test]
fn shuffled_declarations_compute_the_same_result() {
    let shuffles = [
        r#"
modules:
  entry: [x]
  a:
    cls: test.double
    inp_src: [x]
  b:
    cls: test.double
    inp_src: [x]
  c:
    cls: test.sum
    inp_src: [a, b]
  exit: [c]
"#,
        r#"
modules:
  entry: [x]
  c:
    cls: test.sum
    inp_src: [a, b]
  b:
    cls: test.double
    inp_src: [x]
  a:
    cls: test.double
    inp_src: [x]
  exit: [c]
"#,
        r#"
modules:
  entry: [x]
  b:
    cls: test.double
    inp_src: [x]
  c:
    cls: test.sum
    inp_src: [a, b]
  a:
    cls: test.double
    inp_src: [x]
  exit: [c]
"#,
    ];
    for yaml in shuffles {
        let graph = build(yaml);
        let out = graph.forward(&[Value::Float(3.0)]).unwrap();
        assert_eq!(out, GraphOutput::Single(Value::Float(12.0)), "for {yaml}");
    }
}

#[test]
fn multi_output_fan_out() {
    let graph = build(
        r#"
modules:
  entry: [x]
  pair:
    cls: test.fanout
    inp_src: [x]
    out_num: 2
  second:
    cls: test.passthrough
    inp_src: [pair.1]
  exit: [second]
"#,
    );
    assert_eq!(
        graph.plan().output_names("pair").unwrap(),
        ["pair.0", "pair.1"]
    );
    let out = graph.forward(&[Value::Float(3.0)]).unwrap();
    assert_eq!(out, GraphOutput::Single(Value::Float(30.0)));
}

#[test]
fn both_output_slots_are_consumable() {
    let graph = build(
        r#"
modules:
  entry: [x]
  pair:
    cls: test.fanout
    inp_src: [x]
    out_num: 2
  total:
    cls: test.sum
    inp_src: [pair.0, pair.1]
  exit: [total]
"#,
    );
    let out = graph.forward(&[Value::Float(2.0)]).unwrap();
    assert_eq!(out, GraphOutput::Single(Value::Float(22.0)));
}

#[test]
fn keyed_exit_returns_a_mapping() {
    let graph = build(
        r#"
modules:
  entry: [x]
  a:
    cls: test.double
    inp_src: [x]
  b:
    cls: test.passthrough
    inp_src: [x]
  exit:
    first: a
    second: b
"#,
    );
    assert!(graph.plan().returns_map());
    let out = graph.forward(&[Value::Int(2)]).unwrap();
    let GraphOutput::Map(map) = out else {
        panic!("expected a mapping, got {out:?}");
    };
    assert_eq!(
        map.keys().collect::<Vec<_>>(),
        ["first", "second"],
        "result keys follow declaration order"
    );
    assert_eq!(map["first"], Value::Float(4.0));
    assert_eq!(map["second"], Value::Int(2));
}

#[test]
fn positional_exit_with_several_sources_returns_a_tuple() {
    let graph = build(
        r#"
modules:
  entry: [x]
  a:
    cls: test.double
    inp_src: [x]
  b:
    cls: test.passthrough
    inp_src: [x]
  exit: [a, b]
"#,
    );
    assert!(!graph.plan().returns_map());
    let out = graph.forward(&[Value::Int(5)]).unwrap();
    assert_eq!(
        out,
        GraphOutput::Tuple(vec![Value::Float(10.0), Value::Int(5)])
    );
}

#[test]
fn output_arity_mismatch_names_the_module() {
    let graph = build(
        r#"
modules:
  entry: [x]
  wide:
    cls: test.lone
    inp_src: [x]
    out_num: 2
  exit: [wide.0]
"#,
    );
    let err = graph.forward(&[Value::Int(1)]).unwrap_err();
    match &err {
        ComposeError::Graph(GraphError::OutputArity {
            module,
            expected,
            actual,
        }) => {
            assert_eq!(module, "wide");
            assert_eq!((*expected, *actual), (2, 1));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("expected 2, got 1"));
}

#[test]
fn malformed_reference_is_rejected_verbatim() {
    let registry = test_registry();
    let err = GraphBuilder::new(&registry)
        .validate(&spec(
            r#"
modules:
  entry: [x]
  m:
    cls: test.passthrough
    inp_src: ["mod.1.2"]
  exit: [m]
"#,
        ))
        .unwrap_err();
    match err {
        ComposeError::Graph(GraphError::InvalidSourceRef(reference)) => {
            assert_eq!(reference, "mod.1.2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreachable_module_is_unscheduled_and_fails_forward() {
    let graph = build(
        r#"
modules:
  entry: [x]
  stray:
    cls: test.double
    inp_src: [ghost]
  exit: [stray]
"#,
    );
    assert!(
        !graph.plan().order().contains(&"stray".to_string()),
        "a module whose inputs never resolve must not be scheduled"
    );
    let err = graph.forward(&[Value::Int(1)]).unwrap_err();
    match err {
        ComposeError::Graph(GraphError::UnresolvedValue { module, reference }) => {
            assert_eq!(module, "exit");
            assert_eq!(reference, "stray");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_sources_from_one_producer_schedule_once() {
    let graph = build(
        r#"
modules:
  entry: [x]
  twice:
    cls: test.sum
    inp_src: [x, x]
  exit: [twice]
"#,
    );
    let scheduled: Vec<_> = graph
        .plan()
        .order()
        .iter()
        .filter(|name| name.as_str() == "twice")
        .collect();
    assert_eq!(scheduled.len(), 1);
    let out = graph.forward(&[Value::Float(3.0)]).unwrap();
    assert_eq!(out, GraphOutput::Single(Value::Float(6.0)));
}

#[test]
fn missing_sentinels_fail_the_build() {
    let registry = test_registry();
    let builder = GraphBuilder::new(&registry);

    let err = builder
        .validate(&spec("modules:\n  exit: [x]\n"))
        .unwrap_err();
    assert!(matches!(
        err,
        ComposeError::Graph(GraphError::MissingSentinel("entry"))
    ));

    let err = builder
        .validate(&spec("modules:\n  entry: [x]\n"))
        .unwrap_err();
    assert!(matches!(
        err,
        ComposeError::Graph(GraphError::MissingSentinel("exit"))
    ));
}

#[test]
fn missing_class_fails_the_build() {
    let registry = test_registry();
    let err = GraphBuilder::new(&registry)
        .build(&spec(
            r#"
modules:
  entry: [x]
  m:
    inp_src: [x]
  exit: [m]
"#,
        ))
        .unwrap_err();
    match err {
        ComposeError::Graph(GraphError::MissingClass(module)) => assert_eq!(module, "m"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_sources_fail_the_build() {
    let registry = test_registry();
    let err = GraphBuilder::new(&registry)
        .validate(&spec(
            r#"
modules:
  entry: [x]
  m:
    cls: test.passthrough
  exit: [m]
"#,
        ))
        .unwrap_err();
    match err {
        ComposeError::Graph(GraphError::MissingSources(module)) => assert_eq!(module, "m"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_type_fails_the_build_but_not_validation() {
    let yaml = r#"
modules:
  entry: [x]
  m:
    cls: test.unknown
    inp_src: [x]
  exit: [m]
"#;
    let registry = test_registry();
    let builder = GraphBuilder::new(&registry);

    // skip-build validation never consults the registry
    assert!(builder.validate(&spec(yaml)).is_ok());

    let err = builder.build(&spec(yaml)).unwrap_err();
    match err {
        ComposeError::Graph(GraphError::UnknownType(name)) => assert_eq!(name, "test.unknown"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn entry_arity_is_checked_before_anything_runs() {
    let graph = build(
        r#"
modules:
  entry: [x, y]
  total:
    cls: test.sum
    inp_src: [x, y]
  exit: [total]
"#,
    );
    let err = graph.forward(&[Value::Int(1)]).unwrap_err();
    match err {
        ComposeError::Graph(GraphError::InputArity { expected, actual }) => {
            assert_eq!((expected, actual), (2, 1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn component_failure_propagates_and_leaves_the_graph_reusable() {
    let graph = build(
        r#"
modules:
  entry: [x]
  bad:
    cls: test.boom
    inp_src: [x]
  exit: [bad]
"#,
    );
    for _ in 0..2 {
        let err = graph.forward(&[Value::Int(1)]).unwrap_err();
        match err {
            ComposeError::Module(ModuleError::ExecutionFailed(message)) => {
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    let healthy = build(
        r#"
modules:
  entry: [x]
  m:
    cls: test.double
    inp_src: [x]
  exit: [m]
"#,
    );
    assert_eq!(
        healthy.forward(&[Value::Float(1.0)]).unwrap(),
        healthy.forward(&[Value::Float(1.0)]).unwrap()
    );
}

#[test]
fn composed_graphs_nest_as_modules() {
    let mut outer = test_registry();
    outer
        .register(Arc::new(CompositeFactory::new(
            "test.composed",
            Arc::new(test_registry()),
        )))
        .unwrap();

    let graph = GraphBuilder::new(&outer)
        .build(&spec(
            r#"
modules:
  entry: [x]
  sub:
    cls: test.composed
    config:
      modules:
        entry: [v]
        d:
          cls: test.double
          inp_src: [v]
        exit: [d]
    inp_src: [x]
  outer_double:
    cls: test.double
    inp_src: [sub]
  exit: [outer_double]
"#,
        ))
        .unwrap();

    let out = graph.forward(&[Value::Float(5.0)]).unwrap();
    assert_eq!(out, GraphOutput::Single(Value::Float(20.0)));
}
