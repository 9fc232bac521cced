use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::ResolutionPath;

/// Errors produced while reading dependency names out of declaration text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("unable to locate a parameter list in declaration")]
  NoParameterList,

  #[error("unterminated {what} starting at byte {offset}")]
  Unterminated { what: &'static str, offset: usize },

  #[error("unbalanced delimiters in parameter list")]
  Unbalanced,

  #[error("parameter `{0}` is not a bare identifier")]
  UnsupportedParameter(String),
}

/// The main error type for `fibre_injector`.
#[derive(Debug, Error)]
pub enum InjectorError {
  #[error("failed to parse dependencies of `{name}`: {source}")]
  Parse {
    name: String,
    #[source]
    source: ParseError,
  },

  #[error("dependency not found: {path}")]
  DependencyNotFound { name: String, path: ResolutionPath },

  #[error("circular dependency found: {cycle}")]
  CircularDependency { name: String, cycle: ResolutionPath },

  #[error("argument {index} (`{name}`) was not provided")]
  ArgumentMissing { index: usize, name: String },

  #[error("argument {index} (`{name}`) is not a `{expected}`")]
  ArgumentType {
    index: usize,
    name: String,
    expected: &'static str,
  },

  #[error("`{name}` resolved to a value that is not a `{expected}`")]
  ValueType { name: String, expected: &'static str },

  #[error("factory failed: {0}")]
  Factory(#[source] Box<dyn StdError + 'static>),

  #[error("module not found: {0}")]
  ModuleNotFound(String),

  #[error("module `{0}` does not export a factory")]
  NotAFactory(String),

  #[error("the injector behind `$injector` has been dropped")]
  ContainerDropped,

  #[cfg(feature = "paths")]
  #[error("invalid path pattern: {0}")]
  Pattern(#[from] glob::PatternError),

  #[error("I/O error on {path:?}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl InjectorError {
  /// Wraps an error raised by user factory code.
  pub fn factory<E>(err: E) -> Self
  where
    E: Into<Box<dyn StdError + 'static>>,
  {
    InjectorError::Factory(err.into())
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, InjectorError::DependencyNotFound { .. })
  }

  pub fn is_circular(&self) -> bool {
    matches!(self, InjectorError::CircularDependency { .. })
  }
}

/// A specialized `Result` type for `fibre_injector` operations.
pub type Result<T, E = InjectorError> = std::result::Result<T, E>;
