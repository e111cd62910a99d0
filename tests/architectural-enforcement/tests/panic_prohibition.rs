//! Integration Test: Panic Prohibition
//!
//! **Policy**: Navigation failures are policy no-ops (logged) and loading
//! failures are `Result`s. Production code MUST NOT `unwrap()` or `expect()`.
//! Test modules are exempt.

use architectural_enforcement::{report, scan, PRODUCTION_DIRS};

#[test]
fn test_no_unwrap_in_production_code() {
    let violations = scan(PRODUCTION_DIRS, &[".unwrap()", ".expect("]);
    report("unwrap/expect in production code", &violations);
}

#[test]
fn test_no_panic_macros_in_navigator_core() {
    let violations = scan(&["navigator/core/src"], &["panic!(", "unreachable!(", "todo!("]);
    report("panic macros in navigator-core", &violations);
}
