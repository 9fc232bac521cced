//! The main `Injector` struct and its associated methods.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::builder::InjectorBuilder;
use crate::core::{ConstructionGuard, Dependency, Node, Provider, ResolutionPath};
use crate::error::{InjectorError, Result};
use crate::factory::{Arguments, Factory, Locals, Value};
use crate::loader::{Export, ModuleLoader};
#[cfg(feature = "paths")]
use crate::matcher::IntoPatterns;

/// The name under which every injector registers itself.
pub const INJECTOR_NAME: &str = "$injector";

/// Name → node, in registration order.
#[derive(Default)]
struct Registry {
  nodes: HashMap<String, Rc<Node>>,
  order: Vec<String>,
}

impl Registry {
  fn insert(&mut self, name: String, node: Node) {
    if self.nodes.insert(name.clone(), Rc::new(node)).is_none() {
      self.order.push(name);
    }
  }

  fn get(&self, name: &str) -> Option<Rc<Node>> {
    self.nodes.get(name).cloned()
  }
}

/// A dependency-injection container.
///
/// Names map to factories or fixed values. Resolution is lazy: a factory runs
/// the first time its name (or anything depending on it) is resolved, and its
/// result is cached for the lifetime of the container.
///
/// The container is single-threaded. It is always handed out behind an `Rc`
/// so that it can register itself as `$injector`.
pub struct Injector {
  registry: RefCell<Registry>,
  constructing: RefCell<Vec<String>>,
  loader: Rc<dyn ModuleLoader>,
  base_dir: PathBuf,
}

impl Injector {
  /// Creates a new injector with the default configuration.
  pub fn new() -> Rc<Self> {
    InjectorBuilder::new().build()
  }

  pub fn builder() -> InjectorBuilder {
    InjectorBuilder::new()
  }

  pub(crate) fn with_parts(loader: Rc<dyn ModuleLoader>, base_dir: PathBuf) -> Rc<Self> {
    Rc::new_cyclic(|this| {
      let mut registry = Registry::default();
      registry.insert(INJECTOR_NAME.to_owned(), Node::injector(this.clone()));
      Self {
        registry: RefCell::new(registry),
        constructing: RefCell::new(Vec::new()),
        loader,
        base_dir,
      }
    })
  }

  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  // --- Registration ---

  /// Registers `factory` under `name`, replacing any previous registration.
  ///
  /// Nothing is resolved here. Fails only if the factory carries no explicit
  /// dependency list and its source text cannot be parsed.
  pub fn register(&self, name: impl Into<String>, factory: Factory) -> Result<()> {
    let name = name.into();
    let dependencies = factory
      .dependencies()
      .map_err(|source| InjectorError::Parse {
        name: name.clone(),
        source,
      })?;

    debug!(
      dependency = %name,
      kind = ?factory.kind(),
      dependencies = dependencies.len(),
      "registering factory"
    );
    self
      .registry
      .borrow_mut()
      .insert(name, Node::new(factory, dependencies));
    Ok(())
  }

  /// Registers a fixed value. Every resolve of `name` yields this handle.
  pub fn register_value(&self, name: impl Into<String>, value: Value) {
    let name = name.into();
    trace!(dependency = %name, "registering value");
    self
      .registry
      .borrow_mut()
      .insert(name, Node::new(Factory::value(value), Vec::new()));
  }

  /// Loads each module through the configured loader and registers its
  /// export as a fixed value under the paired name.
  pub fn register_requires<I, K, M>(&self, requires: I) -> Result<()>
  where
    I: IntoIterator<Item = (K, M)>,
    K: Into<String>,
    M: AsRef<str>,
  {
    for (name, module) in requires {
      let value = match self.loader.load(module.as_ref())? {
        Export::Value(value) => value,
        Export::Factory(factory) => Rc::new(factory) as Value,
      };
      self.register_value(name, value);
    }
    Ok(())
  }

  /// Registers every factory module matched by `patterns`.
  ///
  /// Each factory is named after its self-declared name, or the stem of its
  /// file name. Modules exporting a plain value are skipped. Returns the
  /// registered names in match order.
  ///
  /// `patterns` is a single pattern (`"lib/*.js"`) or an ordered list of them
  /// (`["*.js", "!test.js"]`).
  #[cfg(feature = "paths")]
  pub fn register_path(&self, patterns: impl IntoPatterns) -> Result<Vec<String>> {
    self.register_path_with(patterns, |_, _, _| None)
  }

  /// Like [`register_path`](Self::register_path), with `name_maker` asked
  /// for each module's name. It receives the default name, the module's
  /// canonical path and the factory; `None` or an empty name keeps the
  /// default.
  #[cfg(feature = "paths")]
  pub fn register_path_with<P, F>(&self, patterns: P, name_maker: F) -> Result<Vec<String>>
  where
    P: IntoPatterns,
    F: Fn(&str, &Path, &Factory) -> Option<String>,
  {
    let files = crate::matcher::expand_patterns(patterns, &self.base_dir)?;
    let mut registered = Vec::with_capacity(files.len());

    for file in files {
      let factory = match self.loader.load(&file.to_string_lossy())? {
        Export::Factory(factory) => factory,
        Export::Value(_) => {
          trace!(path = %file.display(), "skipping module without a factory export");
          continue;
        }
      };

      let default_name = match factory.name() {
        Some(name) => name.to_owned(),
        None => file
          .file_stem()
          .map(|stem| stem.to_string_lossy().into_owned())
          .unwrap_or_default(),
      };
      let name = name_maker(&default_name, &file, &factory)
        .filter(|name| !name.is_empty())
        .unwrap_or(default_name);

      self.register(name.clone(), factory)?;
      registered.push(name);
    }

    Ok(registered)
  }

  // --- Inspection ---

  pub fn is_registered(&self, name: &str) -> bool {
    self.registry.borrow().nodes.contains_key(name)
  }

  /// Registered names in registration order, `$injector` first.
  pub fn registered_names(&self) -> Vec<String> {
    self.registry.borrow().order.clone()
  }

  // --- Resolution ---

  /// Resolves one name.
  ///
  /// `name` may end in `?` to make it optional, in which case a missing
  /// registration yields `Ok(None)`. Required names always yield `Some`.
  pub fn resolve(&self, name: &str) -> Result<Option<Value>> {
    self.resolve_one(&Dependency::parse(name), &ResolutionPath::new())
  }

  /// Like [`resolve`](Self::resolve), with `context` leading the path shown
  /// in errors.
  pub fn resolve_with_context(&self, name: &str, context: &str) -> Result<Option<Value>> {
    self.resolve_one(
      &Dependency::parse(name),
      &ResolutionPath::with_context(Some(context)),
    )
  }

  /// Resolves several names, in order. Stops at the first failure.
  pub fn resolve_many<I, S>(&self, names: I) -> Result<Vec<Option<Value>>>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.resolve_all(names, &ResolutionPath::new())
  }

  pub fn resolve_many_with_context<I, S>(
    &self,
    names: I,
    context: &str,
  ) -> Result<Vec<Option<Value>>>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.resolve_all(names, &ResolutionPath::with_context(Some(context)))
  }

  /// Resolves a required name as a `T`.
  pub fn get<T: Any>(&self, name: &str) -> Result<Rc<T>> {
    let dependency = Dependency::parse(name);
    let name = dependency.lookup_name();
    let value = self
      .resolve_one(&dependency, &ResolutionPath::new())?
      .ok_or_else(|| InjectorError::DependencyNotFound {
        name: name.to_owned(),
        path: ResolutionPath::new().extended(name),
      })?;
    value.downcast::<T>().map_err(|_| InjectorError::ValueType {
      name: name.to_owned(),
      expected: type_name::<T>(),
    })
  }

  /// Resolves the dependencies of `factory` and invokes it.
  ///
  /// The result is returned, not cached. Names present in `locals` are taken
  /// from there instead of the registry; this applies to the factory's own
  /// parameters only.
  pub fn invoke(
    &self,
    factory: &Factory,
    locals: Option<&Locals>,
    context: Option<&str>,
  ) -> Result<Value> {
    let dependencies = factory
      .dependencies()
      .map_err(|source| InjectorError::Parse {
        name: context.unwrap_or("<invoked>").to_owned(),
        source,
      })?;
    let path = ResolutionPath::with_context(context);

    let mut arguments = Vec::with_capacity(dependencies.len());
    for dependency in dependencies {
      let local = locals.and_then(|locals| locals.get(dependency.lookup_name()));
      let value = match local {
        Some(value) => Some(Rc::clone(value)),
        None => self.resolve_one(&dependency, &path)?,
      };
      arguments.push((dependency, value));
    }

    factory.invoke(&Arguments::new(arguments))
  }

  /// Loads the module at `path` (relative to the base directory) and
  /// invokes its factory export. `context` defaults to `path`.
  pub fn resolve_path(
    &self,
    path: &str,
    locals: Option<&Locals>,
    context: Option<&str>,
  ) -> Result<Value> {
    let full = self.base_dir.join(path);
    match self.loader.load(&full.to_string_lossy())? {
      Export::Factory(factory) => self.invoke(&factory, locals, Some(context.unwrap_or(path))),
      Export::Value(_) => Err(InjectorError::NotAFactory(path.to_owned())),
    }
  }

  // --- PRIVATE HELPERS ---

  fn resolve_all<I, S>(&self, names: I, path: &ResolutionPath) -> Result<Vec<Option<Value>>>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    names
      .into_iter()
      .map(|name| self.resolve_one(&Dependency::parse(name.as_ref()), path))
      .collect()
  }

  fn resolve_one(&self, dependency: &Dependency, path: &ResolutionPath) -> Result<Option<Value>> {
    let name = dependency.lookup_name();

    // The registry borrow must end here: factories may register or resolve.
    let node = self.registry.borrow().get(name);
    let Some(node) = node else {
      if dependency.is_optional() {
        trace!(dependency = name, "optional dependency is not registered");
        return Ok(None);
      }
      let path = path.extended(name);
      debug!(%path, "dependency not found");
      return Err(InjectorError::DependencyNotFound {
        name: name.to_owned(),
        path,
      });
    };

    match &node.provider {
      Provider::Injector(this) => this
        .upgrade()
        .map(|injector| Some(injector as Value))
        .ok_or(InjectorError::ContainerDropped),
      Provider::Factory {
        factory,
        dependencies,
        cell,
      } => {
        if let Some(value) = cell.get() {
          trace!(dependency = name, "resolved from cache");
          return Ok(Some(Rc::clone(value)));
        }

        if path.contains(name) {
          let cycle = path.extended(name);
          debug!(%cycle, "circular dependency");
          return Err(InjectorError::CircularDependency {
            name: name.to_owned(),
            cycle,
          });
        }

        let _guard = ConstructionGuard::enter(&self.constructing, name)?;
        let current = path.extended(name);

        let mut arguments = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
          let value = self.resolve_one(dependency, &current)?;
          arguments.push((dependency.clone(), value));
        }

        debug!(dependency = name, "invoking factory");
        let value = factory.invoke(&Arguments::new(arguments))?;
        Ok(Some(Rc::clone(cell.get_or_init(|| value))))
      }
    }
  }
}

impl fmt::Debug for Injector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Injector")
      .field("registered", &self.registry.borrow().order)
      .field("base_dir", &self.base_dir)
      .finish()
  }
}
