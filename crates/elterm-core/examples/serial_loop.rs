//! Headless host loop
//!
//! A reader thread pushes stdin into the SPSC ring the way a UART interrupt
//! would, a timer thread ticks every 100 ms, and the main loop polls the core
//! until input ends. The final screen is printed as text.

use std::io::{self, Read};
use std::thread;
use std::time::{Duration, Instant};

use elterm_core::dummy_backend::DummyRenderer;
use elterm_core::{ByteRing, TerminalConfig, TerminalCore, TerminalResult};

fn main() -> TerminalResult<()> {
    let config = TerminalConfig::default();
    let (mut producer, mut consumer) = ByteRing::with_capacity(config.ring_capacity)?.split();
    let tick_interval = config.tick_interval;
    let mut core = TerminalCore::new(config)?;

    let reader = thread::spawn(move || {
        let mut buffer = [0u8; 256];
        while let Ok(n) = io::stdin().read(&mut buffer) {
            if n == 0 {
                break;
            }
            for &byte in &buffer[..n] {
                while !producer.push(byte) {
                    thread::yield_now();
                }
            }
        }
    });

    let ticks = core.tick_handle();
    thread::spawn(move || {
        loop {
            thread::sleep(tick_interval);
            ticks.tick();
        }
    });

    let mut renderer = DummyRenderer::new();
    let mut replies: Vec<u8> = Vec::new();
    loop {
        let finished = reader.is_finished();
        core.poll(&mut consumer, &mut replies, &mut renderer, Instant::now())?;
        renderer.clear();
        if finished && consumer.is_empty() {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }

    let terminal = core.terminal();
    for row in 0..terminal.rows() {
        println!("{}", terminal.row_text(row));
    }
    if !replies.is_empty() {
        eprintln!("replies to host: {:?}", String::from_utf8_lossy(&replies));
    }
    Ok(())
}
