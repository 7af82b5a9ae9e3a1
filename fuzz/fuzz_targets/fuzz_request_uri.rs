#![no_main]

use hyper::Uri;
use libfuzzer_sys::fuzz_target;
use openclaw_gate::{AllowlistStore, PolicyEngine, RequestInfo, WriteGuard};
use std::sync::{Arc, OnceLock};

static ENGINE: OnceLock<Option<PolicyEngine>> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let Some(engine) = ENGINE.get_or_init(|| {
        let store = AllowlistStore::in_memory(["googleapis.com", "example.com"]);
        WriteGuard::gmail()
            .ok()
            .map(|guard| PolicyEngine::new(Arc::new(store), guard))
    }) else {
        return;
    };

    // Any URI the HTTP layer accepts must evaluate without panicking
    let Ok(uri) = Uri::try_from(data) else {
        return;
    };
    for method in ["GET", "POST", "DELETE"] {
        let request = RequestInfo::from_uri(method, &uri);
        let decision = engine.evaluate(&request);
        let _ = decision.request.full_url();
    }
});
