//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Navigation is driven by the host's frame tick. Production code
//! MUST NOT sleep to wait for a fade; elapsed time arrives through `tick()`.

use architectural_enforcement::{report, scan, PRODUCTION_DIRS};

#[test]
fn test_no_sleep_in_production_code() {
    let violations = scan(PRODUCTION_DIRS, &["::sleep(", ".sleep("]);
    report("sleep calls in production code (advance fades from tick)", &violations);
}
