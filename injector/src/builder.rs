//! Container configuration.

use std::path::PathBuf;
use std::rc::Rc;

use crate::container::Injector;
use crate::loader::{ModuleLoader, ModuleTable};

/// Configures and creates an [`Injector`].
///
/// ```
/// use fibre_injector::{Injector, ModuleTable};
/// use std::rc::Rc;
///
/// let modules = Rc::new(ModuleTable::new());
/// let injector = Injector::builder()
///   .loader(modules.clone())
///   .base_dir("/srv/app")
///   .build();
/// assert!(injector.is_registered("$injector"));
/// ```
#[derive(Default)]
pub struct InjectorBuilder {
  loader: Option<Rc<dyn ModuleLoader>>,
  base_dir: Option<PathBuf>,
}

impl InjectorBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// The loader used by `register_requires`, `register_path` and
  /// `resolve_path`. Defaults to an empty [`ModuleTable`].
  pub fn loader(mut self, loader: Rc<dyn ModuleLoader>) -> Self {
    self.loader = Some(loader);
    self
  }

  /// The directory relative patterns and paths are resolved against.
  /// Defaults to the working directory at build time.
  pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.base_dir = Some(dir.into());
    self
  }

  pub fn build(self) -> Rc<Injector> {
    let loader = self
      .loader
      .unwrap_or_else(|| Rc::new(ModuleTable::new()));
    let base_dir = self
      .base_dir
      .or_else(|| std::env::current_dir().ok())
      .unwrap_or_default();
    Injector::with_parts(loader, base_dir)
  }
}
