//! Fuzzing target for ANSI parser state management
//!
//! Feeds the same input whole and split at a fuzzer-chosen point; both runs
//! must produce the same calls on the grid.

#![no_main]
use libfuzzer_sys::fuzz_target;

use elterm_ansi::{AnsiGrid, AnsiParser, Attrs, Erase, Mode};

#[derive(Default, PartialEq, Debug)]
struct LogGrid {
    log: Vec<String>,
    row: usize,
    col: usize,
}

impl LogGrid {
    fn op(&mut self, s: String) {
        self.log.push(s);
    }

    fn clamp(&mut self) {
        self.row = self.row.min(23);
        self.col = self.col.min(79);
    }
}

impl AnsiGrid for LogGrid {
    fn print(&mut self, byte: u8) { self.op(format!("p{byte}")); self.col += 1; self.clamp(); }
    fn backspace(&mut self) { self.op("bs".into()); self.col = self.col.saturating_sub(1); }
    fn carriage_return(&mut self) { self.op("cr".into()); self.col = 0; }
    fn linefeed(&mut self) { self.op("lf".into()); self.row += 1; self.clamp(); }
    fn tab(&mut self) { self.op("ht".into()); }
    fn back_tab(&mut self) { self.op("cbt".into()); }
    fn index(&mut self) { self.op("ind".into()); }
    fn next_line(&mut self) { self.op("nel".into()); }
    fn reverse_index(&mut self) { self.op("ri".into()); }
    fn save_cursor(&mut self) { self.op("sc".into()); }
    fn restore_cursor(&mut self) { self.op("rc".into()); }
    fn reset(&mut self) { self.op("ris".into()); self.row = 0; self.col = 0; }
    fn up(&mut self, n: usize) { self.op(format!("up{n}")); self.row = self.row.saturating_sub(n); }
    fn down(&mut self, n: usize) { self.op(format!("dn{n}")); self.row = self.row.saturating_add(n); self.clamp(); }
    fn right(&mut self, n: usize) { self.op(format!("rt{n}")); self.col = self.col.saturating_add(n); self.clamp(); }
    fn left(&mut self, n: usize) { self.op(format!("lt{n}")); self.col = self.col.saturating_sub(n); }
    fn move_to_column(&mut self, col: usize) { self.op(format!("col{col}")); self.col = col; self.clamp(); }
    fn move_to_row(&mut self, row: usize) { self.op(format!("row{row}")); self.row = row; self.clamp(); }
    fn move_abs(&mut self, row: usize, col: usize) { self.op(format!("cup{row},{col}")); self.row = row; self.col = col; self.clamp(); }
    fn cursor_position(&self) -> (usize, usize) { (self.row, self.col) }
    fn erase_in_line(&mut self, extent: Erase) { self.op(format!("el{extent:?}")); }
    fn erase_in_display(&mut self, extent: Erase) { self.op(format!("ed{extent:?}")); }
    fn insert_lines(&mut self, n: usize) { self.op(format!("il{n}")); }
    fn delete_lines(&mut self, n: usize) { self.op(format!("dl{n}")); }
    fn insert_chars(&mut self, n: usize) { self.op(format!("ich{n}")); }
    fn delete_chars(&mut self, n: usize) { self.op(format!("dch{n}")); }
    fn erase_chars(&mut self, n: usize) { self.op(format!("ech{n}")); }
    fn scroll_up(&mut self, n: usize) { self.op(format!("su{n}")); }
    fn scroll_down(&mut self, n: usize) { self.op(format!("sd{n}")); }
    fn reset_attrs(&mut self) { self.op("sgr0".into()); }
    fn set_attr(&mut self, attr: Attrs, enable: bool) { self.op(format!("attr{attr:?}{enable}")); }
    fn set_fg(&mut self, index: u8) { self.op(format!("fg{index}")); }
    fn set_bg(&mut self, index: u8) { self.op(format!("bg{index}")); }
    fn set_mode(&mut self, mode: Mode, enable: bool) { self.op(format!("mode{mode:?}{enable}")); }
    fn respond(&mut self, bytes: &[u8]) { self.op(format!("resp{bytes:?}")); }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let split = usize::from(data[0]) % data.len();
    let data = &data[1..data.len().min(10_001)];
    let split = split.min(data.len());

    let mut whole = LogGrid::default();
    let mut parser = AnsiParser::new();
    parser.feed_bytes(data, &mut whole);

    let mut pieces = LogGrid::default();
    let mut parser = AnsiParser::new();
    parser.feed_bytes(&data[..split], &mut pieces);
    parser.feed_bytes(&data[split..], &mut pieces);

    assert_eq!(whole, pieces);
    assert!(parser.stats().max_args_seen <= 5, "argument limit exceeded");
});
