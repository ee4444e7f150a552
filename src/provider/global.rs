//! Process-wide pointer to the most recently published runtime.
//!
//! Code outside a rendering context (background jobs, legacy helpers) can read
//! the "current" runtime here. Prefer passing the runtime explicitly: the
//! pointer has single-writer-at-a-time semantics, is overwritten (never
//! cleared) by each publish, and readers may observe a stale instance.

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::runtime::Runtime;

/// Process-wide holder for the current runtime.
static CURRENT_INSTANCE: OnceLock<RwLock<Option<Arc<Runtime>>>> = OnceLock::new();

/// Get a reference to the global lock, initializing it if needed.
fn slot() -> &'static RwLock<Option<Arc<Runtime>>> {
    CURRENT_INSTANCE.get_or_init(|| RwLock::new(None))
}

/// What: Make `runtime` the process-wide current instance.
pub fn publish(runtime: &Arc<Runtime>) {
    let mut current = slot().write().unwrap_or_else(PoisonError::into_inner);
    *current = Some(Arc::clone(runtime));
}

/// What: Most recently published runtime, if any.
#[must_use]
pub fn current_instance() -> Option<Arc<Runtime>> {
    slot()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[cfg(test)]
/// What: Drop the published runtime so tests start from a clean pointer.
pub(crate) fn clear_for_tests() {
    *slot().write().unwrap_or_else(PoisonError::into_inner) = None;
}

#[cfg(test)]
static TEST_MUTEX: OnceLock<std::sync::Mutex<()>> = OnceLock::new();

#[cfg(test)]
/// What: Serialize tests that publish to or read the global pointer.
pub(crate) fn test_mutex() -> &'static std::sync::Mutex<()> {
    TEST_MUTEX.get_or_init(|| std::sync::Mutex::new(()))
}
