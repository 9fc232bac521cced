//! # Fibre Injector
//!
//! A small, single-threaded dependency-injection container that wires
//! services together by name.
//!
//! Factories are registered under string names together with the ordered list
//! of names they depend on. Resolving a name builds its dependencies first,
//! depth-first, then invokes the factory and caches the result, so every
//! factory runs at most once per container.
//!
//! ## Core Concepts
//!
//! - **Injector**: the container. Owns a registry of named nodes and registers
//!   itself as `$injector`.
//! - **Factory**: either a function (its result is used as is) or a
//!   constructor (its new instance is moved into a shared handle).
//! - **Dependencies**: given explicitly with [`Factory::inject`], or parsed
//!   from declaration text attached with [`Factory::with_source`]. A trailing
//!   `?` (or a block comment before a parsed parameter) makes a dependency
//!   optional.
//! - **Errors**: missing names, cycles and unparseable declarations are
//!   reported as [`InjectorError`] values carrying the resolution path.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_injector::{Factory, Injector};
//! use std::rc::Rc;
//!
//! struct Database {
//!   url: String,
//! }
//!
//! struct UserService {
//!   db: Rc<Database>,
//! }
//!
//! let injector = Injector::new();
//! injector.register_value("url", Rc::new(String::from("postgres://localhost/app")));
//! injector
//!   .register(
//!     "db",
//!     Factory::constructor(|args| {
//!       Ok(Database {
//!         url: args.get::<String>(0)?.to_string(),
//!       })
//!     })
//!     .inject(["url"]),
//!   )
//!   .unwrap();
//! injector
//!   .register(
//!     "users",
//!     Factory::constructor(|args| Ok(UserService { db: args.get(0)? }))
//!       .with_source("class UserService { constructor(db) {} }"),
//!   )
//!   .unwrap();
//!
//! let users = injector.get::<UserService>("users").unwrap();
//! assert_eq!(users.db.url, "postgres://localhost/app");
//! assert!(Rc::ptr_eq(&users.db, &injector.get::<Database>("db").unwrap()));
//! ```

mod builder;
mod container;
mod core;
mod error;
mod factory;
pub mod fixture;
mod loader;
mod macros;
#[cfg(feature = "paths")]
mod matcher;
pub mod signature;

pub use builder::InjectorBuilder;
pub use container::{Injector, INJECTOR_NAME};
pub use crate::core::{Dependency, ResolutionPath, OPTIONAL_SUFFIX};
pub use error::{InjectorError, ParseError, Result};
pub use factory::{Arguments, Factory, FactoryKind, Locals, Value};
pub use loader::{Export, ModuleLoader, ModuleTable};
#[cfg(feature = "paths")]
pub use matcher::{expand_patterns, IntoPatterns};
pub use signature::{extract_dependency_names, parse_signature, DeclarationShape, Signature};
