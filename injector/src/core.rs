//! Core data structures shared by the parser and the container.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;
use std::str::FromStr;

use once_cell::unsync::OnceCell;

use crate::container::Injector;
use crate::error::{InjectorError, Result};
use crate::factory::{Factory, Value};

/// Suffix marking a dependency name as optional in an explicit manifest.
pub const OPTIONAL_SUFFIX: char = '?';

/// One entry of a factory's dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
  name: String,
  optional: bool,
}

impl Dependency {
  pub fn required(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: false,
    }
  }

  pub fn optional(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: true,
    }
  }

  /// Reads a manifest entry; a trailing `?` marks the entry optional.
  pub fn parse(spec: &str) -> Self {
    match spec.strip_suffix(OPTIONAL_SUFFIX) {
      Some(name) => Self::optional(name),
      None => Self::required(spec),
    }
  }

  /// The name as declared, without the optional suffix.
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn is_optional(&self) -> bool {
    self.optional
  }

  /// The registry key this dependency refers to.
  ///
  /// A name wrapped in underscores (`_foo_`) looks up `foo`, so a factory can
  /// take a parameter whose plain name collides with one of its locals.
  pub fn lookup_name(&self) -> &str {
    unwrap_underscores(&self.name)
  }
}

impl From<&str> for Dependency {
  fn from(spec: &str) -> Self {
    Dependency::parse(spec)
  }
}

impl From<String> for Dependency {
  fn from(spec: String) -> Self {
    Dependency::parse(&spec)
  }
}

impl FromStr for Dependency {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    Ok(Dependency::parse(s))
  }
}

impl fmt::Display for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.optional {
      write!(f, "{}{}", self.name, OPTIONAL_SUFFIX)
    } else {
      f.write_str(&self.name)
    }
  }
}

pub(crate) fn unwrap_underscores(name: &str) -> &str {
  if name.len() > 2 && name.starts_with('_') && name.ends_with('_') {
    &name[1..name.len() - 1]
  } else {
    name
  }
}

/// The chain of names being resolved, outermost first.
///
/// Rendered as `a -> b -> c` in error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPath {
  names: Vec<String>,
}

impl ResolutionPath {
  pub fn new() -> Self {
    Self::default()
  }

  /// A path that starts with a caller-supplied label.
  pub fn with_context(context: Option<&str>) -> Self {
    Self {
      names: context.map(|c| vec![c.to_owned()]).unwrap_or_default(),
    }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.names.iter().any(|n| n == name)
  }

  /// A copy of this path extended by `name`.
  pub fn extended(&self, name: &str) -> Self {
    let mut names = self.names.clone();
    names.push(name.to_owned());
    Self { names }
  }

  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

impl fmt::Display for ResolutionPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.names.join(" -> "))
  }
}

/// Marks a node as under construction for as long as the guard lives.
///
/// Declared cycles are caught by the resolution path. This guard catches the
/// rest: a factory that, while running, asks the container for something that
/// leads back to a node still being built.
pub(crate) struct ConstructionGuard<'a> {
  stack: &'a RefCell<Vec<String>>,
}

impl<'a> ConstructionGuard<'a> {
  pub(crate) fn enter(stack: &'a RefCell<Vec<String>>, name: &str) -> Result<Self> {
    let mut active = stack.borrow_mut();
    if let Some(start) = active.iter().position(|n| n == name) {
      let mut names = active[start..].to_vec();
      names.push(name.to_owned());
      return Err(InjectorError::CircularDependency {
        name: name.to_owned(),
        cycle: ResolutionPath { names },
      });
    }
    active.push(name.to_owned());
    drop(active);
    Ok(Self { stack })
  }
}

impl Drop for ConstructionGuard<'_> {
  fn drop(&mut self) {
    self.stack.borrow_mut().pop();
  }
}

pub(crate) enum Provider {
  Factory {
    factory: Factory,
    dependencies: Vec<Dependency>,
    cell: OnceCell<Value>,
  },
  /// The container's reference to itself, registered as `$injector`.
  Injector(Weak<Injector>),
}

pub(crate) struct Node {
  pub(crate) provider: Provider,
}

impl Node {
  pub(crate) fn new(factory: Factory, dependencies: Vec<Dependency>) -> Self {
    Self {
      provider: Provider::Factory {
        factory,
        dependencies,
        cell: OnceCell::new(),
      },
    }
  }

  pub(crate) fn injector(this: Weak<Injector>) -> Self {
    Self {
      provider: Provider::Injector(this),
    }
  }
}
