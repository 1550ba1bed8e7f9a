use std::cell::Cell;

use super::{BucketState, StateStorage};

/// Non thread-safe implementation of [`StateStorage`]. This is intended for
/// single threaded scenarios and uses [`Cell`] internally.
#[derive(Debug)]
pub struct LocalStorage(Cell<BucketState>);

impl StateStorage for LocalStorage {
    fn new(initial: BucketState) -> Self {
        Self(Cell::new(initial))
    }

    fn load(&self) -> BucketState {
        self.0.get()
    }

    fn update<R>(&self, f: impl FnOnce(&mut BucketState) -> R) -> R {
        let mut state = self.0.get();
        let result = f(&mut state);
        self.0.set(state);
        result
    }
}
