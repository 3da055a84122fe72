//! Streaming parser example
//!
//! Reads raw bytes from stdin in chunks and counts what the parser makes of
//! them. Sequences split across chunk boundaries are handled by the parser.

use std::io::{self, Read};

use elterm_ansi::{AnsiGrid, AnsiParser, Attrs, Erase, Mode};

// Counts printable bytes and control effects; keeps no screen
#[derive(Default)]
struct StreamProcessor {
    printed: usize,
    controls: usize,
    responses: usize,
}

impl StreamProcessor {
    fn control(&mut self) {
        self.controls += 1;
    }

    fn print_stats(&self) {
        println!("Printable bytes: {}", self.printed);
        println!("Control effects: {}", self.controls);
        println!("Host replies:    {}", self.responses);
    }
}

impl AnsiGrid for StreamProcessor {
    fn print(&mut self, _byte: u8) {
        self.printed += 1;
    }
    fn backspace(&mut self) { self.control() }
    fn carriage_return(&mut self) { self.control() }
    fn linefeed(&mut self) { self.control() }
    fn tab(&mut self) { self.control() }
    fn back_tab(&mut self) { self.control() }
    fn index(&mut self) { self.control() }
    fn next_line(&mut self) { self.control() }
    fn reverse_index(&mut self) { self.control() }
    fn save_cursor(&mut self) { self.control() }
    fn restore_cursor(&mut self) { self.control() }
    fn reset(&mut self) { self.control() }
    fn up(&mut self, _n: usize) { self.control() }
    fn down(&mut self, _n: usize) { self.control() }
    fn right(&mut self, _n: usize) { self.control() }
    fn left(&mut self, _n: usize) { self.control() }
    fn move_to_column(&mut self, _col: usize) { self.control() }
    fn move_to_row(&mut self, _row: usize) { self.control() }
    fn move_abs(&mut self, _row: usize, _col: usize) { self.control() }
    fn cursor_position(&self) -> (usize, usize) { (0, 0) }
    fn erase_in_line(&mut self, _extent: Erase) { self.control() }
    fn erase_in_display(&mut self, _extent: Erase) { self.control() }
    fn insert_lines(&mut self, _n: usize) { self.control() }
    fn delete_lines(&mut self, _n: usize) { self.control() }
    fn insert_chars(&mut self, _n: usize) { self.control() }
    fn delete_chars(&mut self, _n: usize) { self.control() }
    fn erase_chars(&mut self, _n: usize) { self.control() }
    fn scroll_up(&mut self, _n: usize) { self.control() }
    fn scroll_down(&mut self, _n: usize) { self.control() }
    fn reset_attrs(&mut self) { self.control() }
    fn set_attr(&mut self, _attr: Attrs, _enable: bool) { self.control() }
    fn set_fg(&mut self, _index: u8) { self.control() }
    fn set_bg(&mut self, _index: u8) { self.control() }
    fn set_mode(&mut self, _mode: Mode, _enable: bool) { self.control() }
    fn respond(&mut self, _bytes: &[u8]) {
        self.responses += 1;
    }
}

fn main() {
    println!("Streaming ANSI Parser Example");
    println!("Reading from stdin... (Ctrl+D to finish)\n");

    let errors = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = errors.clone();
    let mut parser = AnsiParser::new().with_error_callback(move |err| {
        eprintln!("parser: {}", err);
        counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    });
    let mut processor = StreamProcessor::default();
    let mut buffer = [0u8; 1024];
    let mut total = 0usize;

    loop {
        match io::stdin().read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                parser.feed_bytes(&buffer[..n], &mut processor);
            }
            Err(e) => {
                eprintln!("Error reading stdin: {}", e);
                break;
            }
        }
    }

    println!("Processed: {} bytes", total);
    processor.print_stats();

    let stats = parser.stats();
    println!("Parser stats:");
    println!("  - Sequences parsed: {}", stats.sequences_processed);
    println!("  - Errors: {}", stats.errors_encountered);
    println!("  - Max arguments seen: {}", stats.max_args_seen);
}
