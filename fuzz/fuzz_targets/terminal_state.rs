#![no_main]
use libfuzzer_sys::fuzz_target;

use elterm::{TerminalConfig, TerminalCore};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Limit input size to prevent timeouts
    let data = &data[..data.len().min(10_000)];

    let config = TerminalConfig::default().without_banner();
    let rows = config.rows;
    let buffer_rows = config.buffer_rows();
    let mut core = match TerminalCore::new(config) {
        Ok(core) => core,
        Err(_) => return,
    };

    for chunk in data.chunks(64) {
        core.process_bytes(chunk);

        let terminal = core.terminal();
        let cursor = terminal.cursor();
        assert!(cursor.x < terminal.width(), "cursor x {} out of range", cursor.x);
        assert!(cursor.y < rows, "cursor y {} out of range", cursor.y);
        assert!(terminal.screen().row_offset() < buffer_rows);
    }

    // status replies are well-formed escape sequences
    let output = core.take_output();
    assert!(output.is_empty() || output[0] == 0x1b);
});
