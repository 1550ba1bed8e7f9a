use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{BucketState, StateStorage};

// The state is two integers and every writer leaves it consistent, so a
// poisoned lock still guards valid data.
fn lock(state: &Mutex<BucketState>) -> MutexGuard<'_, BucketState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe implementation of [`StateStorage`] guarded by a per-bucket
/// [`Mutex`].
#[derive(Debug)]
pub struct SyncStorage(Mutex<BucketState>);

impl StateStorage for SyncStorage {
    fn new(initial: BucketState) -> Self {
        Self(Mutex::new(initial))
    }

    fn load(&self) -> BucketState {
        *lock(&self.0)
    }

    fn update<R>(&self, f: impl FnOnce(&mut BucketState) -> R) -> R {
        f(&mut lock(&self.0))
    }
}

/// Like [`SyncStorage`], but clones share the same state. Cloning a bucket
/// built on this storage hands out another handle to the same budget.
#[derive(Debug, Clone)]
pub struct SharedStorage(Arc<Mutex<BucketState>>);

impl StateStorage for SharedStorage {
    fn new(initial: BucketState) -> Self {
        Self(Arc::new(Mutex::new(initial)))
    }

    fn load(&self) -> BucketState {
        *lock(&self.0)
    }

    fn update<R>(&self, f: impl FnOnce(&mut BucketState) -> R) -> R {
        f(&mut lock(&self.0))
    }
}
