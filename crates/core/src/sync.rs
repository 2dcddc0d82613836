//! Lock helpers that recover from poisoning.
//!
//! A panicking subscriber must not take a property or source down with it,
//! so poisoned locks are logged and recovered. The guarded data is always a
//! whole value replaced in one assignment, so it is never left half-written.

use log::warn;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!("RwLock was poisoned, recovering");
        poisoned.into_inner()
    })
}

pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!("RwLock was poisoned, recovering");
        poisoned.into_inner()
    })
}
