#![no_main]
use libfuzzer_sys::fuzz_target;

use elterm::elterm_core::dummy_backend::{DrawOp, DummyRenderer};
use elterm::{TerminalConfig, TerminalCore};

fuzz_target!(|data: &[u8]| {
    let data = &data[..data.len().min(4_096)];

    let config = TerminalConfig::default().without_banner().with_flush_budget(97);
    let mut core = match TerminalCore::new(config) {
        Ok(core) => core,
        Err(_) => return,
    };
    let mut renderer = DummyRenderer::new();

    core.process_bytes(data);
    // every flush but the last hits the budget, so this terminates
    while core.terminal().is_dirty() {
        assert!(core.flush(&mut renderer) <= 97);
    }

    renderer.clear();
    assert_eq!(core.flush(&mut renderer), 0);
    assert!(!renderer.ops().iter().any(|op| matches!(op, DrawOp::Glyph { .. })));
});
