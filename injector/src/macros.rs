//! Public macros for typed resolution.

/// Resolves a required name as a given type from the current fixture.
///
/// # Panics
///
/// Panics if no fixture is installed on this thread, or if the name cannot
/// be resolved as the requested type. For a non-panicking version, use
/// `fixture::current()` and [`Injector::get`](crate::Injector::get).
///
/// # Examples
///
/// ```
/// use fibre_injector::{fixture, resolve};
/// use std::rc::Rc;
///
/// let test = fixture::install();
/// test.register_value("greeting", Rc::new(String::from("hello")));
///
/// let greeting = resolve!(String, "greeting");
/// assert_eq!(*greeting, "hello");
/// ```
#[macro_export]
macro_rules! resolve {
  ($type:ty, $name:expr) => {{
    let name: &str = $name;
    $crate::fixture::current()
      .unwrap_or_else(|| panic!("No injector fixture is installed on this thread"))
      .get::<$type>(name)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required service '{}' as {}: {}",
          name,
          std::any::type_name::<$type>(),
          err
        )
      })
  }};
}

/// Resolves a required name as a given type from an explicit injector.
///
/// # Panics
///
/// Panics if the name cannot be resolved as the requested type.
///
/// ```
/// use fibre_injector::{resolve_from, Injector};
/// use std::rc::Rc;
///
/// let injector = Injector::new();
/// injector.register_value("port", Rc::new(8080_u16));
/// assert_eq!(*resolve_from!(injector, u16, "port"), 8080);
/// ```
#[macro_export]
macro_rules! resolve_from {
  ($injector:expr, $type:ty, $name:expr) => {{
    let name: &str = $name;
    $injector.get::<$type>(name).unwrap_or_else(|err| {
      panic!(
        "Failed to resolve required service '{}' as {}: {}",
        name,
        std::any::type_name::<$type>(),
        err
      )
    })
  }};
}
