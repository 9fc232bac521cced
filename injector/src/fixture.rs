//! A fresh injector per test case.
//!
//! [`install`] creates a new injector and makes it the current one for this
//! thread until the returned [`Fixture`] is dropped. The `resolve!` macro
//! resolves against it.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use crate::builder::InjectorBuilder;
use crate::container::Injector;

thread_local! {
  // The injector installed by the innermost live fixture on this thread.
  static CURRENT: RefCell<Option<Rc<Injector>>> = const { RefCell::new(None) };
}

/// Keeps an injector installed as the current one.
///
/// Dropping the fixture discards its injector and restores whichever one was
/// current before.
pub struct Fixture {
  injector: Rc<Injector>,
  previous: Option<Rc<Injector>>,
}

/// Installs a fresh, default-configured injector.
///
/// ```
/// use fibre_injector::{fixture, resolve};
/// use std::rc::Rc;
///
/// let test = fixture::install();
/// test.register_value("answer", Rc::new(42_u32));
/// assert_eq!(*resolve!(u32, "answer"), 42);
/// ```
pub fn install() -> Fixture {
  install_with(InjectorBuilder::new())
}

/// Installs a fresh injector built from `builder`.
pub fn install_with(builder: InjectorBuilder) -> Fixture {
  let injector = builder.build();
  let previous = CURRENT.with(|current| current.borrow_mut().replace(Rc::clone(&injector)));
  Fixture { injector, previous }
}

/// The injector of the innermost live fixture, if any.
pub fn current() -> Option<Rc<Injector>> {
  CURRENT.with(|current| current.borrow().clone())
}

impl Fixture {
  pub fn injector(&self) -> &Rc<Injector> {
    &self.injector
  }
}

impl Deref for Fixture {
  type Target = Injector;

  fn deref(&self) -> &Injector {
    &self.injector
  }
}

impl Drop for Fixture {
  fn drop(&mut self) {
    let previous = self.previous.take();
    CURRENT.with(|current| *current.borrow_mut() = previous);
  }
}
