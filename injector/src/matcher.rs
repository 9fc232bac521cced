//! Expands path patterns into concrete files.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{InjectorError, Result};

/// One pattern or an ordered list of them.
pub trait IntoPatterns {
  fn into_patterns(self) -> Vec<String>;
}

impl IntoPatterns for &str {
  fn into_patterns(self) -> Vec<String> {
    vec![self.to_owned()]
  }
}

impl IntoPatterns for String {
  fn into_patterns(self) -> Vec<String> {
    vec![self]
  }
}

impl<S: AsRef<str>, const N: usize> IntoPatterns for [S; N] {
  fn into_patterns(self) -> Vec<String> {
    self.iter().map(|p| p.as_ref().to_owned()).collect()
  }
}

impl<S: AsRef<str>> IntoPatterns for &[S] {
  fn into_patterns(self) -> Vec<String> {
    self.iter().map(|p| p.as_ref().to_owned()).collect()
  }
}

impl<S: AsRef<str>> IntoPatterns for Vec<S> {
  fn into_patterns(self) -> Vec<String> {
    self.iter().map(|p| p.as_ref().to_owned()).collect()
  }
}

/// Expands glob `patterns` relative to `base_dir`.
///
/// Patterns apply in order. A plain pattern appends the files it matches that
/// are not already collected; a `!`-prefixed pattern drops collected files
/// whose absolute or base-relative path it matches. Returned paths are
/// canonical and unique, in match order.
pub fn expand_patterns(patterns: impl IntoPatterns, base_dir: &Path) -> Result<Vec<PathBuf>> {
  let base = base_dir
    .canonicalize()
    .unwrap_or_else(|_| base_dir.to_path_buf());
  let mut paths: Vec<PathBuf> = Vec::new();

  // The base directory is literal text, not pattern syntax.
  let escaped_base = PathBuf::from(glob::Pattern::escape(&base.to_string_lossy()));

  for pattern in patterns.into_patterns() {
    let pattern = pattern.as_str();

    if let Some(excluded) = pattern.strip_prefix('!') {
      let matcher = glob::Pattern::new(excluded)?;
      paths.retain(|path| {
        let relative = path.strip_prefix(&base).unwrap_or(path);
        !(matcher.matches_path(path) || matcher.matches_path(relative))
      });
      continue;
    }

    let absolute = escaped_base.join(pattern);
    for entry in glob::glob(&absolute.to_string_lossy())? {
      let path = entry.map_err(|err| InjectorError::Io {
        path: err.path().to_path_buf(),
        source: err.into_error(),
      })?;
      if !path.is_file() {
        continue;
      }
      let real = path
        .canonicalize()
        .map_err(|source| InjectorError::Io { path, source })?;
      if !paths.contains(&real) {
        paths.push(real);
      }
    }
  }

  trace!(count = paths.len(), "expanded path patterns");
  Ok(paths)
}
