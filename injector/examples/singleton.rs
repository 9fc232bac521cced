use fibre_injector::{Factory, Injector};
use std::cell::Cell;
use std::rc::Rc;

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

fn main() {
  let injector = Injector::new();
  let created = Rc::new(Cell::new(0));

  // --- Registration ---
  // The factory runs at most once, on first resolution.
  let counter = Rc::clone(&created);
  injector
    .register(
      "tracker",
      Factory::constructor(move |_| {
        println!("Creating RequestTracker...");
        counter.set(counter.get() + 1);
        Ok(RequestTracker { id: counter.get() })
      }),
    )
    .expect("registration failed");
  assert_eq!(created.get(), 0, "factories are lazy");

  // --- Resolution ---
  let t1 = injector.get::<RequestTracker>("tracker").expect("tracker");
  let t2 = injector.get::<RequestTracker>("tracker").expect("tracker");
  println!("Tracker 1 ID: {}, Tracker 2 ID: {}", t1.id, t2.id);
  assert!(Rc::ptr_eq(&t1, &t2), "instances should be identical");

  // --- Invocation ---
  // `invoke` runs a factory against the container without caching it.
  let fresh = Factory::constructor(|_| Ok(RequestTracker { id: 99 }));
  let f1 = injector.invoke(&fresh, None, None).expect("invoke");
  let f2 = injector.invoke(&fresh, None, None).expect("invoke");
  assert!(!Rc::ptr_eq(&f1, &f2), "invoked values are not cached");
  println!("Created {} cached tracker(s).", created.get());
}
