//! Factories and the arguments they are invoked with.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::core::Dependency;
use crate::error::{InjectorError, ParseError, Result};
use crate::signature;

/// A resolved value. Shared, type-erased, compared by identity.
pub type Value = Rc<dyn Any>;

/// Per-invocation overrides, keyed by registry name.
pub type Locals = HashMap<String, Value>;

type CallFn = dyn Fn(&Arguments) -> Result<Value>;
type ConstructFn = dyn Fn(&Arguments) -> Result<Box<dyn Any>>;

#[derive(Clone)]
enum Invocation {
  Call(Rc<CallFn>),
  Construct(Rc<ConstructFn>),
}

/// How a factory turns its arguments into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryKind {
  /// Called with the arguments; its return value is used as is.
  Function,
  /// Builds a new owned instance that the container then shares.
  Constructor,
}

/// Something the container can invoke to produce a node's value.
///
/// Cloning a factory is cheap and keeps its identity.
#[derive(Clone)]
pub struct Factory {
  invocation: Invocation,
  manifest: Option<Vec<Dependency>>,
  source: Option<Rc<str>>,
  name: Option<String>,
}

impl Factory {
  /// A factory whose result is returned to the caller unchanged.
  ///
  /// ```
  /// use fibre_injector::{Factory, Injector, Value};
  /// use std::rc::Rc;
  ///
  /// let injector = Injector::new();
  /// injector.register_value("base", Rc::new(40_u32));
  /// injector
  ///   .register(
  ///     "answer",
  ///     Factory::function(|args| {
  ///       let base = args.get::<u32>(0)?;
  ///       Ok(Rc::new(*base + 2) as Value)
  ///     })
  ///     .inject(["base"]),
  ///   )
  ///   .unwrap();
  ///
  /// assert_eq!(*injector.get::<u32>("answer").unwrap(), 42);
  /// ```
  pub fn function<F>(f: F) -> Self
  where
    F: Fn(&Arguments) -> Result<Value> + 'static,
  {
    Self::with_invocation(Invocation::Call(Rc::new(f)))
  }

  /// A factory that constructs a new `T` on each invocation.
  pub fn constructor<T, F>(f: F) -> Self
  where
    T: Any,
    F: Fn(&Arguments) -> Result<T> + 'static,
  {
    Self::with_invocation(Invocation::Construct(Rc::new(
      move |args: &Arguments| -> Result<Box<dyn Any>> {
        Ok(Box::new(f(args)?) as Box<dyn Any>)
      },
    )))
  }

  /// A zero-dependency factory that always hands out the same value.
  pub fn value(value: Value) -> Self {
    Self::function(move |_| Ok(Rc::clone(&value))).inject(Vec::<Dependency>::new())
  }

  fn with_invocation(invocation: Invocation) -> Self {
    Self {
      invocation,
      manifest: None,
      source: None,
      name: None,
    }
  }

  /// Attaches an explicit dependency list. Takes precedence over source text.
  pub fn inject<I, D>(mut self, dependencies: I) -> Self
  where
    I: IntoIterator<Item = D>,
    D: Into<Dependency>,
  {
    self.manifest = Some(dependencies.into_iter().map(Into::into).collect());
    self
  }

  /// Attaches declaration text from which dependency names are parsed when
  /// no explicit list is given.
  pub fn with_source(mut self, source: impl Into<Rc<str>>) -> Self {
    self.source = Some(source.into());
    self
  }

  /// Attaches a self-declared name, preferred by `register_path` over the
  /// file name.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn source(&self) -> Option<&str> {
    self.source.as_deref()
  }

  pub fn kind(&self) -> FactoryKind {
    match self.invocation {
      Invocation::Call(_) => FactoryKind::Function,
      Invocation::Construct(_) => FactoryKind::Constructor,
    }
  }

  /// The dependency list: the explicit one if attached, else the one parsed
  /// from the source text, else empty.
  pub fn dependencies(&self) -> std::result::Result<Vec<Dependency>, ParseError> {
    match (&self.manifest, &self.source) {
      (Some(manifest), _) => Ok(manifest.clone()),
      (None, Some(source)) => signature::extract_dependency_names(source),
      (None, None) => Ok(Vec::new()),
    }
  }

  /// Whether two handles refer to the same factory.
  pub fn ptr_eq(&self, other: &Factory) -> bool {
    match (&self.invocation, &other.invocation) {
      (Invocation::Call(a), Invocation::Call(b)) => Rc::ptr_eq(a, b),
      (Invocation::Construct(a), Invocation::Construct(b)) => Rc::ptr_eq(a, b),
      _ => false,
    }
  }

  pub(crate) fn invoke(&self, args: &Arguments) -> Result<Value> {
    match &self.invocation {
      Invocation::Call(call) => call(args),
      Invocation::Construct(construct) => Ok(Rc::from(construct(args)?)),
    }
  }
}

impl fmt::Debug for Factory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Factory")
      .field("kind", &self.kind())
      .field("name", &self.name)
      .field("manifest", &self.manifest)
      .field("source", &self.source)
      .finish()
  }
}

/// The resolved dependencies a factory is invoked with, in declared order.
///
/// An optional dependency with no registration is present as an absent entry.
pub struct Arguments {
  entries: Vec<(Dependency, Option<Value>)>,
}

impl Arguments {
  pub(crate) fn new(entries: Vec<(Dependency, Option<Value>)>) -> Self {
    Self { entries }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Declared names, in order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(dep, _)| dep.name())
  }

  /// The raw value at `index`; `None` when absent or out of range.
  pub fn value(&self, index: usize) -> Option<&Value> {
    self.entries.get(index).and_then(|(_, value)| value.as_ref())
  }

  /// The value at `index` as a `T`. Fails if absent or of another type.
  pub fn get<T: Any>(&self, index: usize) -> Result<Rc<T>> {
    self
      .optional(index)?
      .ok_or_else(|| InjectorError::ArgumentMissing {
        index,
        name: self.name_at(index),
      })
  }

  /// The value at `index` as a `T`, or `None` if it was not provided.
  pub fn optional<T: Any>(&self, index: usize) -> Result<Option<Rc<T>>> {
    match self.value(index) {
      None => Ok(None),
      Some(value) => Rc::clone(value)
        .downcast::<T>()
        .map(Some)
        .map_err(|_| InjectorError::ArgumentType {
          index,
          name: self.name_at(index),
          expected: type_name::<T>(),
        }),
    }
  }

  /// Looks an argument up by its declared name.
  pub fn named<T: Any>(&self, name: &str) -> Result<Rc<T>> {
    match self.entries.iter().position(|(dep, _)| dep.name() == name) {
      Some(index) => self.get(index),
      None => Err(InjectorError::ArgumentMissing {
        index: self.entries.len(),
        name: name.to_owned(),
      }),
    }
  }

  pub fn into_values(self) -> Vec<Option<Value>> {
    self.entries.into_iter().map(|(_, value)| value).collect()
  }

  fn name_at(&self, index: usize) -> String {
    self
      .entries
      .get(index)
      .map(|(dep, _)| dep.name().to_owned())
      .unwrap_or_default()
  }
}

impl fmt::Debug for Arguments {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list()
      .entries(
        self
          .entries
          .iter()
          .map(|(dep, value)| (dep.to_string(), value.is_some())),
      )
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args() -> Arguments {
    Arguments::new(vec![
      (Dependency::required("port"), Some(Rc::new(8080_u16) as Value)),
      (Dependency::optional("host"), None),
    ])
  }

  #[test]
  fn test_typed_access() {
    let args = args();
    assert_eq!(*args.get::<u16>(0).unwrap(), 8080);
    assert_eq!(*args.named::<u16>("port").unwrap(), 8080);
    assert!(args.optional::<String>(1).unwrap().is_none());
    assert_eq!(args.names().collect::<Vec<_>>(), vec!["port", "host"]);
  }

  #[test]
  fn test_missing_and_mistyped() {
    let args = args();
    assert!(matches!(
      args.get::<String>(1),
      Err(InjectorError::ArgumentMissing { index: 1, .. })
    ));
    assert!(matches!(
      args.get::<String>(0),
      Err(InjectorError::ArgumentType { index: 0, .. })
    ));
    assert!(matches!(
      args.get::<u16>(7),
      Err(InjectorError::ArgumentMissing { index: 7, .. })
    ));
  }

  #[test]
  fn test_manifest_wins_over_source() {
    let factory = Factory::function(|_| Ok(Rc::new(()) as Value))
      .with_source("function (a, b) {}")
      .inject(["c?"]);
    assert_eq!(factory.dependencies().unwrap(), vec![Dependency::optional("c")]);

    let parsed = Factory::function(|_| Ok(Rc::new(()) as Value)).with_source("(a, b) => a");
    assert_eq!(
      parsed.dependencies().unwrap(),
      vec![Dependency::required("a"), Dependency::required("b")]
    );
  }

  #[test]
  fn test_constructor_builds_fresh_instances() {
    let factory = Factory::constructor(|_| Ok(String::from("built")));
    assert_eq!(factory.kind(), FactoryKind::Constructor);
    let empty = Arguments::new(Vec::new());
    let first = factory.invoke(&empty).unwrap();
    let second = factory.invoke(&empty).unwrap();
    assert!(!Rc::ptr_eq(&first, &second));
    assert_eq!(*first.downcast::<String>().unwrap(), "built");
  }

  #[test]
  fn test_clone_keeps_identity() {
    let factory = Factory::value(Rc::new(1_i32));
    assert!(factory.clone().ptr_eq(&factory));
    assert!(!factory.ptr_eq(&Factory::value(Rc::new(1_i32))));
  }
}
