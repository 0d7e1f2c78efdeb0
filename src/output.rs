//! Where `info` lines go. The search formats each line itself and hands it
//! to a sink, so the library never writes to stdout on its own and tests
//! can capture exactly what a GUI would see.

use std::sync::{Arc, Mutex};

pub trait InfoSink {
    fn send(&mut self, line: &str);
}

/// Production sink: one line of UCI traffic per call.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl InfoSink for StdoutSink {
    fn send(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Test sink collecting lines behind a shared handle.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CaptureSink {
    pub fn new() -> CaptureSink {
        CaptureSink::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("capture sink poisoned").clone()
    }
}

impl InfoSink for CaptureSink {
    fn send(&mut self, line: &str) {
        self.lines
            .lock()
            .expect("capture sink poisoned")
            .push(line.to_string());
    }
}
