//! Integration Test: Thread Prohibition
//!
//! **Policy**: The navigator is single-threaded and cooperative. Transitions
//! are state machines advanced per tick, never background threads or tasks.
//! The only cross-thread entry point is `CancelHandle`, an atomic counter.

use architectural_enforcement::{report, scan};

#[test]
fn test_no_threads_in_navigator_core() {
    let violations = scan(
        &["navigator/core/src"],
        &["thread::spawn", "std::thread", "tokio::spawn", "spawn_blocking"],
    );
    report("threads or tasks spawned in navigator-core", &violations);
}

#[test]
fn test_no_locks_in_navigator_core() {
    let violations = scan(&["navigator/core/src"], &["Mutex<", "RwLock<"]);
    report("locks in navigator-core (state is owned by the handlers)", &violations);
}
