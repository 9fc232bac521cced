use fibre_injector::{Factory, Injector, Value};
use std::rc::Rc;

fn main() {
  let injector = Injector::new();
  injector
    .register(
      "reports",
      Factory::function(|_| Ok(Rc::new("reports") as Value))
        .with_source("function (db, /* cache */ cache) {}"),
    )
    .expect("registration failed");
  injector
    .register(
      "app",
      Factory::function(|_| Ok(Rc::new("app") as Value)).inject(["reports"]),
    )
    .expect("registration failed");

  // --- A missing required dependency reports the full path ---
  match injector.resolve_with_context("app", "main") {
    Ok(_) => panic!("Should not have resolved the app!"),
    Err(err) => println!("{err}"),
  }

  // --- Optional dependencies resolve to `None` instead ---
  let cache = injector.resolve("cache?").expect("optional lookup");
  assert!(cache.is_none());
  println!("Optional `cache` is absent, as expected.");

  // --- Cycles are detected rather than overflowing the stack ---
  injector
    .register("db", Factory::function(|_| Ok(Rc::new(()) as Value)).inject(["app"]))
    .expect("registration failed");
  let err = injector.resolve("app").expect_err("cycle");
  assert!(err.is_circular());
  println!("{err}");
}
