//! In-memory destination, mainly for tests and embedding

use crate::core::{Destination, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct BufferState {
    lines: Vec<String>,
    flushes: usize,
    closes: usize,
}

/// Cloneable read handle onto a [`MemoryDestination`]
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    state: Arc<Mutex<BufferState>>,
}

impl MemoryBuffer {
    /// Lines delivered so far, in delivery order
    pub fn lines(&self) -> Vec<String> {
        self.state.lock().lines.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().lines.is_empty()
    }

    /// Everything delivered, newline-terminated
    pub fn contents(&self) -> String {
        self.state
            .lock()
            .lines
            .iter()
            .map(|line| format!("{}\n", line))
            .collect()
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closes > 0
    }

    pub fn clear(&self) {
        self.state.lock().lines.clear();
    }
}

/// Destination that collects lines in memory
#[derive(Debug)]
pub struct MemoryDestination {
    buffer: MemoryBuffer,
}

impl MemoryDestination {
    /// Create a destination and the handle used to read it back
    pub fn new() -> (Self, MemoryBuffer) {
        let buffer = MemoryBuffer::default();
        (
            Self {
                buffer: buffer.clone(),
            },
            buffer,
        )
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.buffer.state.lock().lines.push(line.to_string());
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.buffer.state.lock().flushes += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.buffer.state.lock().closes += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
