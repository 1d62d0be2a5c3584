//! Stateful wrappers around async operations, shared by every page.
//!
//! State lives in `tokio::sync::watch` channels so renderers can either
//! read a snapshot or subscribe to changes.

mod use_async;
mod use_paginated;

pub use use_async::{AsyncCall, AsyncOptions, CallState};
pub use use_paginated::{FilterPatch, PaginatedFetch, PaginatedState};

use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
