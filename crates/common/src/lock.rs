//! `lock_api`-based lock type aliases.
//!
//! The interpreter this is grounded on supports a non-threading,
//! single-core configuration via a `cell_lock` backend; that mode, and the
//! post-`fork()` lock-reset helper built on top of it, have no use here —
//! the factory lock is load-bearing precisely because more than one thread
//! can race to define a type, so only the `parking_lot` backend is kept.

use lock_api::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, Mutex, MutexGuard, RwLock, RwLockReadGuard,
    RwLockUpgradableReadGuard, RwLockWriteGuard,
};
pub use once_cell::sync::{Lazy, OnceCell};
pub use parking_lot::{RawMutex, RawRwLock};

pub type PyMutex<T> = Mutex<RawMutex, T>;
pub type PyMutexGuard<'a, T> = MutexGuard<'a, RawMutex, T>;

pub type PyRwLock<T> = RwLock<RawRwLock, T>;
pub type PyRwLockUpgradableReadGuard<'a, T> = RwLockUpgradableReadGuard<'a, RawRwLock, T>;
pub type PyRwLockReadGuard<'a, T> = RwLockReadGuard<'a, RawRwLock, T>;
pub type PyMappedRwLockReadGuard<'a, T> = MappedRwLockReadGuard<'a, RawRwLock, T>;
pub type PyRwLockWriteGuard<'a, T> = RwLockWriteGuard<'a, RawRwLock, T>;
pub type PyMappedRwLockWriteGuard<'a, T> = MappedRwLockWriteGuard<'a, RawRwLock, T>;

/// A mutex that the owning thread may re-acquire any number of times
/// without deadlocking itself, while every other thread blocks until the
/// owner's outermost acquisition is released. Built directly on
/// `parking_lot::{Mutex, Condvar}` rather than `lock_api`'s generic
/// wrappers, since reentrancy-by-thread-identity isn't something
/// `lock_api`'s `RawMutex` trait models.
///
/// Exists for `TypeFactory`'s publication lock: a native class's exposer
/// can recursively call back into the factory while its own type is
/// still being defined, and that recursive call must not block on a
/// lock the same thread already holds.
pub struct ReentrantLock {
    state: parking_lot::Mutex<ReentrantLockState>,
    released: parking_lot::Condvar,
}

struct ReentrantLockState {
    owner: Option<std::thread::ThreadId>,
    depth: u32,
}

impl Default for ReentrantLock {
    fn default() -> Self {
        Self::new()
    }
}

impl ReentrantLock {
    pub fn new() -> Self {
        Self {
            state: parking_lot::Mutex::new(ReentrantLockState { owner: None, depth: 0 }),
            released: parking_lot::Condvar::new(),
        }
    }

    /// Blocks until this thread holds the lock, then returns a guard.
    /// Reentrant: if the calling thread already holds it, returns
    /// immediately with the depth counter bumped.
    pub fn acquire(&self) -> ReentrantLockGuard<'_> {
        let me = std::thread::current().id();
        let mut state = self.state.lock();
        loop {
            match state.owner {
                Some(owner) if owner == me => {
                    state.depth += 1;
                    break;
                }
                None => {
                    state.owner = Some(me);
                    state.depth = 1;
                    break;
                }
                Some(_) => {
                    self.released.wait(&mut state);
                }
            }
        }
        ReentrantLockGuard { lock: self }
    }

    /// `true` if the calling thread currently holds the lock (at any
    /// reentrancy depth).
    pub fn held_by_current_thread(&self) -> bool {
        self.state.lock().owner == Some(std::thread::current().id())
    }
}

pub struct ReentrantLockGuard<'a> {
    lock: &'a ReentrantLock,
}

impl Drop for ReentrantLockGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            drop(state);
            self.lock.released.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rwlock_allows_concurrent_reads() {
        let lock = PyRwLock::new(5);
        let a = lock.read();
        let b = lock.read();
        assert_eq!(*a, 5);
        assert_eq!(*b, 5);
    }

    #[test]
    fn mutex_round_trips() {
        let m = PyMutex::new(vec![1, 2, 3]);
        m.lock().push(4);
        assert_eq!(*m.lock(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn reentrant_lock_allows_same_thread_to_reacquire() {
        let lock = ReentrantLock::new();
        let outer = lock.acquire();
        assert!(lock.held_by_current_thread());
        let inner = lock.acquire();
        drop(inner);
        assert!(lock.held_by_current_thread());
        drop(outer);
        assert!(!lock.held_by_current_thread());
    }

    #[test]
    fn reentrant_lock_blocks_other_threads() {
        use std::sync::Arc;
        let lock = Arc::new(ReentrantLock::new());
        let guard = lock.acquire();
        let other = Arc::clone(&lock);
        let handle = std::thread::spawn(move || {
            let _g = other.acquire();
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!handle.is_finished());
        drop(guard);
        handle.join().unwrap();
    }
}
