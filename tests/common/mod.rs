use std::sync::{Mutex, MutexGuard, Once, OnceLock};

static INIT: Once = Once::new();

/// Runs `recordpool::init()` exactly once for the whole test binary.
/// Safe to call from every test: `init` only ever needs to run once per
/// process, and re-running it is defined to be a no-op.
pub fn ensure_init() {
    INIT.call_once(recordpool::init);
}

static API_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serializes access to the process-wide registry for tests that exercise
/// the public API directly (`register`/`alloc`/`free`/introspection).
/// The crate's single-threaded contract means concurrent calls across test
/// threads are not meaningful to test in the first place; this just keeps
/// the test binary's default multi-threaded runner from racing on it.
pub fn serialize_api() -> MutexGuard<'static, ()> {
    let lock = API_LOCK.get_or_init(|| Mutex::new(()));
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
