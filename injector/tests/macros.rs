//! Tests for the resolution macros and the per-test fixture:
//! - `resolve!` against the current fixture
//! - `resolve_from!` against an explicit injector

use fibre_injector::{fixture, resolve, resolve_from, Factory, Injector};
use std::rc::Rc;

// --- Test Fixtures ---

struct MacroTestService {
  value: i32,
}

trait Greeter {
  fn greet(&self) -> String;
}

struct English;

impl Greeter for English {
  fn greet(&self) -> String {
    "Hello".to_string()
  }
}

// --- Fixture Macro Tests ---

#[test]
fn test_resolve_from_fixture() {
  // Arrange
  let test = fixture::install();
  test
    .register(
      "service",
      Factory::constructor(|_| Ok(MacroTestService { value: 42 })),
    )
    .unwrap();

  // Act
  let r1 = resolve!(MacroTestService, "service");
  let r2 = resolve!(MacroTestService, "service");

  // Assert
  assert_eq!(r1.value, 42);
  assert!(Rc::ptr_eq(&r1, &r2));
}

#[test]
fn test_resolve_trait_object_behind_box() {
  let test = fixture::install();
  test.register_value("greeter", Rc::new(Box::new(English) as Box<dyn Greeter>));

  let greeter = resolve!(Box<dyn Greeter>, "greeter");

  assert_eq!(greeter.greet(), "Hello");
}

#[test]
#[should_panic(expected = "Failed to resolve required service 'missing'")]
fn test_resolve_panics_on_missing() {
  let _test = fixture::install();
  resolve!(MacroTestService, "missing");
}

#[test]
#[should_panic(expected = "No injector fixture is installed")]
fn test_resolve_panics_without_fixture() {
  resolve!(MacroTestService, "service");
}

#[test]
fn test_fixture_is_discarded_after_use() {
  {
    let test = fixture::install();
    test.register_value("scoped", Rc::new(1_u8));
    assert_eq!(*resolve!(u8, "scoped"), 1);
  }

  let next = fixture::install();
  assert!(!next.is_registered("scoped"));
}

// --- Explicit Injector Macro Tests ---

#[test]
fn test_resolve_from_explicit_injector() {
  let injector = Injector::new();
  injector.register_value("port", Rc::new(8080_u16));

  assert_eq!(*resolve_from!(injector, u16, "port"), 8080);
}

#[test]
#[should_panic(expected = "Failed to resolve required service 'port'")]
fn test_resolve_from_panics_on_wrong_type() {
  let injector = Injector::new();
  injector.register_value("port", Rc::new(8080_u16));

  resolve_from!(injector, String, "port");
}
