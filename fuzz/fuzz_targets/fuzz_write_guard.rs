#![no_main]

use libfuzzer_sys::fuzz_target;
use openclaw_gate::policy::write_guard::WRITE_METHODS;
use openclaw_gate::WriteGuard;
use std::sync::OnceLock;

static GUARD: OnceLock<Option<WriteGuard>> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let Some(guard) = GUARD.get_or_init(|| WriteGuard::gmail().ok()) else {
        return;
    };
    let path = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };

    // Reads never match, whatever the path
    assert!(!guard.is_blocked("GET", path));
    for method in WRITE_METHODS {
        let _ = guard.is_blocked(method, path);
    }

    // Custom prefixes compile or fail cleanly
    let _ = WriteGuard::with_prefix(path);
});
