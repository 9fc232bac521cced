use fibre_injector::{
  Export, Factory, Injector, InjectorError, Locals, ModuleTable, ParseError, Value,
};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;

// --- Advanced Test Fixtures ---

struct Node {
  me: &'static str,
  deps: Vec<Rc<Node>>,
}

/// A factory building a `Node` from every argument, parsed from `source`.
fn node(me: &'static str, source: &str) -> Factory {
  Factory::constructor(move |args| {
    let deps = (0..args.len())
      .map(|i| args.get::<Node>(i))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Node { me, deps })
  })
  .with_source(source.to_owned())
}

fn noop() -> Factory {
  Factory::function(|_| Ok(Rc::new(()) as Value))
}

// --- Advanced Tests ---

#[test]
fn test_multi_level_dependency_chaining() {
  // Arrange
  let injector = Injector::new();
  injector.register("a", node("a", "function () {}")).unwrap();
  injector.register("b", node("b", "function (a) {}")).unwrap();
  injector.register("c", node("c", "(b) => ({ b })")).unwrap();
  injector
    .register("d", node("d", "class D { constructor(a, c) {} }"))
    .unwrap();

  // Act
  let a = injector.get::<Node>("a").unwrap();
  let b = injector.get::<Node>("b").unwrap();
  let c = injector.get::<Node>("c").unwrap();
  let d = injector.get::<Node>("d").unwrap();

  // Assert
  assert_eq!(a.me, "a");
  assert_eq!(b.me, "b");
  assert!(Rc::ptr_eq(&b.deps[0], &a));
  assert_eq!(c.me, "c");
  assert!(Rc::ptr_eq(&c.deps[0], &b));
  assert_eq!(d.me, "d");
  assert!(Rc::ptr_eq(&d.deps[0], &a));
  assert!(Rc::ptr_eq(&d.deps[1], &c));
}

#[test]
fn test_circular_dependency_is_reported_with_cycle() {
  let injector = Injector::new();
  injector.register("a", noop().inject(["b"])).unwrap();
  injector.register("b", noop().inject(["a"])).unwrap();

  let err = injector.resolve("a").unwrap_err();

  assert!(err.is_circular());
  assert!(err.to_string().contains("a -> b -> a"), "{err}");
}

#[test]
fn test_circular_dependency_includes_context() {
  let injector = Injector::new();
  injector.register("a", noop().inject(["b"])).unwrap();
  injector.register("b", noop().inject(["c"])).unwrap();
  injector.register("c", noop().inject(["a"])).unwrap();

  let err = injector.resolve_with_context("a", "main").unwrap_err();

  assert_eq!(
    err.to_string(),
    "circular dependency found: main -> a -> b -> c -> a"
  );
}

#[test]
fn test_optional_does_not_suppress_cycles() {
  let injector = Injector::new();
  injector.register("a", noop().inject(["b?"])).unwrap();
  injector.register("b", noop().inject(["a?"])).unwrap();

  assert!(injector.resolve("a").unwrap_err().is_circular());
}

#[test]
fn test_missing_dependency_reports_path() {
  let injector = Injector::new();
  injector.register("c", noop().inject(["b"])).unwrap();
  injector.register("b", noop().inject(["missing"])).unwrap();

  let err = injector.resolve("c").unwrap_err();

  match err {
    InjectorError::DependencyNotFound { name, path } => {
      assert_eq!(name, "missing");
      assert_eq!(path.to_string(), "c -> b -> missing");
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_comment_marks_parameter_optional() {
  // Arrange
  let injector = Injector::new();
  injector.register_value("a", Rc::new(1_u32));
  injector.register_value("c", Rc::new(3_u32));
  injector
    .register(
      "sum",
      Factory::constructor(|args| {
        let b = args.optional::<u32>(1)?.map_or(0, |b| *b);
        Ok(*args.get::<u32>(0)? + b + *args.get::<u32>(2)?)
      })
      .with_source("function (a, /* optional */ b, c) {}"),
    )
    .unwrap();

  // Act & Assert
  assert_eq!(*injector.get::<u32>("sum").unwrap(), 4);
}

#[test]
fn test_resolve_many_stops_at_first_failure() {
  // Arrange
  let injector = Injector::new();
  let calls = Rc::new(Cell::new(0));
  let counter = Rc::clone(&calls);
  injector.register_value("a", Rc::new(1_u8));
  injector
    .register(
      "counted",
      Factory::constructor(move |_| {
        counter.set(counter.get() + 1);
        Ok(())
      }),
    )
    .unwrap();

  // Act
  let err = injector
    .resolve_many(["a", "missing", "counted"])
    .unwrap_err();

  // Assert
  assert!(err.is_not_found());
  assert_eq!(calls.get(), 0);
}

#[test]
fn test_failed_factory_can_be_retried() {
  // Arrange
  let injector = Injector::new();
  let attempts = Rc::new(Cell::new(0));
  let counter = Rc::clone(&attempts);
  injector
    .register(
      "flaky",
      Factory::function(move |_| {
        counter.set(counter.get() + 1);
        if counter.get() == 1 {
          Err(InjectorError::factory("not ready yet"))
        } else {
          Ok(Rc::new("ready") as Value)
        }
      }),
    )
    .unwrap();

  // Act
  let first = injector.resolve("flaky");
  let second = injector.get::<&str>("flaky").unwrap();
  let third = injector.get::<&str>("flaky").unwrap();

  // Assert
  assert!(matches!(first, Err(InjectorError::Factory(_))));
  assert_eq!(*second, "ready");
  assert!(Rc::ptr_eq(&second, &third));
  assert_eq!(attempts.get(), 2);
}

#[test]
fn test_locals_override_without_registering() {
  // Arrange
  let injector = Injector::new();
  injector.register_value("someNum", Rc::new(2_i32));
  injector.register_value("otherNum", Rc::new(3_i32));
  let add = Factory::constructor(|args| Ok(*args.get::<i32>(0)? + *args.get::<i32>(1)?))
    .with_source("function (someNum, otherNum) { return someNum + otherNum; }");
  let mut locals = Locals::new();
  locals.insert("otherNum".into(), Rc::new(0_i32));
  locals.insert("unused".into(), Rc::new(9_i32));

  // Act
  let plain = injector.invoke(&add, None, None).unwrap();
  let overridden = injector.invoke(&add, Some(&locals), None).unwrap();

  // Assert
  assert_eq!(*plain.downcast::<i32>().unwrap(), 5);
  assert_eq!(*overridden.downcast::<i32>().unwrap(), 2);
  assert!(!injector.is_registered("unused"));
  assert_eq!(*injector.get::<i32>("otherNum").unwrap(), 3);
}

#[test]
fn test_invoke_does_not_cache() {
  let injector = Injector::new();
  let make = Factory::constructor(|_| Ok(String::from("fresh")));

  let first = injector.invoke(&make, None, None).unwrap();
  let second = injector.invoke(&make, None, None).unwrap();

  assert!(!Rc::ptr_eq(&first, &second));
}

#[test]
fn test_injector_can_be_injected() {
  // Arrange: a factory that resolves lazily through `$injector`.
  let injector = Injector::new();
  injector.register_value("config", Rc::new(String::from("cfg")));
  injector
    .register(
      "service",
      Factory::constructor(|args| {
        let container = args.get::<Injector>(0)?;
        let config = container.get::<String>("config")?;
        Ok(format!("service with {config}"))
      })
      .with_source("($injector) => {}"),
    )
    .unwrap();

  // Act
  let service = injector.get::<String>("service").unwrap();

  // Assert
  assert_eq!(*service, "service with cfg");
}

#[test]
fn test_reentrant_resolution_is_circular() {
  // Arrange: `a` resolves `b` imperatively while `b` declares `a`.
  let injector = Injector::new();
  injector
    .register(
      "a",
      Factory::function(|args| {
        let container = args.get::<Injector>(0)?;
        container.resolve("b")?;
        Ok(Rc::new(()) as Value)
      })
      .inject(["$injector"]),
    )
    .unwrap();
  injector.register("b", noop().inject(["a"])).unwrap();

  // Act
  let err = injector.resolve("a").unwrap_err();

  // Assert
  assert!(err.is_circular());
  assert!(err.to_string().contains("a -> b -> a"), "{err}");
  // Nothing is left marked as in progress.
  injector.register("a", noop()).unwrap();
  assert!(injector.resolve("b").is_ok());
}

#[test]
fn test_unparseable_source_fails_registration() {
  let injector = Injector::new();

  let err = injector
    .register("broken", noop().with_source("not a function"))
    .unwrap_err();

  assert!(matches!(
    err,
    InjectorError::Parse {
      source: ParseError::NoParameterList,
      ..
    }
  ));
  assert!(!injector.is_registered("broken"));
}

#[test]
fn test_class_without_constructor_has_no_dependencies() {
  let injector = Injector::new();
  injector
    .register(
      "plain",
      Factory::constructor(|args| Ok(args.len())).with_source("class Plain { run(x) {} }"),
    )
    .unwrap();

  assert_eq!(*injector.get::<usize>("plain").unwrap(), 0);
}

#[test]
fn test_overwriting_registration_is_successful() {
  let injector = Injector::new();
  injector.register_value("overwrite", Rc::new("first value"));
  assert_eq!(*injector.get::<&str>("overwrite").unwrap(), "first value");

  injector.register_value("overwrite", Rc::new("second value"));

  assert_eq!(*injector.get::<&str>("overwrite").unwrap(), "second value");
}

#[test]
fn test_register_requires() {
  // Arrange
  let modules = Rc::new(ModuleTable::new());
  let fs: Value = Rc::new(String::from("fs module"));
  let path_module: Value = Rc::new(String::from("path module"));
  modules.define_value("fs", fs.clone());
  modules.define_value("path", path_module.clone());
  let injector = Injector::builder().loader(modules).build();

  // Act
  injector
    .register_requires([("foo", "fs"), ("bar", "path")])
    .unwrap();

  // Assert
  assert!(Rc::ptr_eq(&injector.resolve("foo").unwrap().unwrap(), &fs));
  assert!(Rc::ptr_eq(&injector.resolve("bar").unwrap().unwrap(), &path_module));
  assert!(matches!(
    injector.register_requires([("baz", "nope")]),
    Err(InjectorError::ModuleNotFound(_))
  ));
}

#[test]
fn test_resolve_path() {
  // Arrange
  let dir = tempfile::tempdir().unwrap();
  let file = dir.path().join("a.js");
  std::fs::write(&file, "module.exports = (dep) => ({ me: 'a' });").unwrap();
  let modules = Rc::new(ModuleTable::new());
  modules.define(
    file.to_string_lossy(),
    Export::Factory(
      Factory::constructor(|args| Ok(format!("a with {}", args.get::<String>(0)?)))
        .with_source("(dep) => ({ me: 'a' })"),
    ),
  );
  modules.define_value(dir.path().join("value.json").to_string_lossy(), Rc::new(1_u8));
  let injector = Injector::builder()
    .loader(modules)
    .base_dir(dir.path())
    .build();

  // Act & Assert: the path is the default context for errors.
  let err = injector.resolve_path("a.js", None, None).unwrap_err();
  assert_eq!(err.to_string(), "dependency not found: a.js -> dep");

  let mut locals = Locals::new();
  locals.insert("dep".into(), Rc::new(String::from("local dep")));
  let resolved = injector.resolve_path("a.js", Some(&locals), None).unwrap();
  assert_eq!(*resolved.downcast::<String>().unwrap(), "a with local dep");

  assert!(matches!(
    injector.resolve_path("value.json", None, None),
    Err(InjectorError::NotAFactory(_))
  ));
}
