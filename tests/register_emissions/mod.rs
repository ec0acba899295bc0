#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use rxkit::subscribe::Subscriber;

/// Records every signal delivered to the subscribers it hands out.
pub struct Emissions<T> {
    pub nexts: Arc<Mutex<Vec<T>>>,
    pub completes: Arc<Mutex<usize>>,
    pub errors: Arc<Mutex<Vec<String>>>,
}

impl<T: Send + 'static> Emissions<T> {
    pub fn new() -> Self {
        Emissions {
            nexts: Arc::new(Mutex::new(Vec::new())),
            completes: Arc::new(Mutex::new(0)),
            errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscriber(&self) -> Subscriber<T> {
        let nexts = Arc::clone(&self.nexts);
        let errors = Arc::clone(&self.errors);
        let completes = Arc::clone(&self.completes);
        Subscriber::new(
            move |v| nexts.lock().push(v),
            move |e| errors.lock().push(e.to_string()),
            move || *completes.lock() += 1,
        )
    }

    pub fn completes(&self) -> usize {
        *self.completes.lock()
    }

    pub fn errors(&self) -> usize {
        self.errors.lock().len()
    }
}

impl<T: Clone + Send + 'static> Emissions<T> {
    pub fn values(&self) -> Vec<T> {
        self.nexts.lock().clone()
    }
}
