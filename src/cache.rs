//! Compute-on-first-access memoization.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// A lazily filled slot holding a shared, immutable value.
///
/// The slot is either empty or holds a fully built value; a failed build
/// leaves it empty. It uses interior mutability and is not `Sync`, so a
/// cache can only be filled from the thread that owns it.
pub struct Cache<T> {
    slot: RefCell<Option<Arc<T>>>,
}

impl<T> Cache<T> {
    pub fn new() -> Self {
        Self { slot: RefCell::new(None) }
    }

    /// Return the cached value, building it with `build` if the slot is empty.
    ///
    /// The slot is not borrowed while `build` runs, so builders may read
    /// other caches freely.
    pub fn get_or_try_init<E>(&self, build: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        if let Some(value) = self.slot.borrow().as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(build()?);
        *self.slot.borrow_mut() = Some(Arc::clone(&value));
        Ok(value)
    }

    pub fn invalidate(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn is_valid(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones start empty; cached values are never shared between owners.
impl<T> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").field("valid", &self.is_valid()).finish()
    }
}
