//! Loading exported values by path or logical module name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use tracing::trace;

use crate::error::{InjectorError, Result};
use crate::factory::{Factory, Value};

/// What a module exports.
#[derive(Debug, Clone)]
pub enum Export {
  Factory(Factory),
  Value(Value),
}

impl Export {
  pub fn as_factory(&self) -> Option<&Factory> {
    match self {
      Export::Factory(factory) => Some(factory),
      Export::Value(_) => None,
    }
  }
}

/// Maps a path or logical module name to its export.
///
/// Loading the same specifier twice within one process must yield the same
/// export (same factory, same value handle).
pub trait ModuleLoader {
  fn load(&self, specifier: &str) -> Result<Export>;
}

/// An in-memory table of modules.
///
/// Specifiers naming an existing file are stored and looked up by their
/// canonical path, so `./a.js`, `a.js` and `/abs/a.js` all reach the same
/// module. Other specifiers are used verbatim.
#[derive(Default)]
pub struct ModuleTable {
  modules: RefCell<HashMap<String, Export>>,
}

impl ModuleTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn define(&self, specifier: impl AsRef<str>, export: Export) {
    let key = normalize(specifier.as_ref());
    trace!(module = %key, "defining module");
    self.modules.borrow_mut().insert(key, export);
  }

  pub fn define_factory(&self, specifier: impl AsRef<str>, factory: Factory) {
    self.define(specifier, Export::Factory(factory));
  }

  pub fn define_value(&self, specifier: impl AsRef<str>, value: Value) {
    self.define(specifier, Export::Value(value));
  }

  pub fn len(&self) -> usize {
    self.modules.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.borrow().is_empty()
  }
}

impl ModuleLoader for ModuleTable {
  fn load(&self, specifier: &str) -> Result<Export> {
    self
      .modules
      .borrow()
      .get(&normalize(specifier))
      .cloned()
      .ok_or_else(|| InjectorError::ModuleNotFound(specifier.to_owned()))
  }
}

fn normalize(specifier: &str) -> String {
  match Path::new(specifier).canonicalize() {
    Ok(real) => real.to_string_lossy().into_owned(),
    Err(_) => specifier.to_owned(),
  }
}
