//! Destination over any `AsyncWrite` (stdout, stderr, sockets, pipes)

use crate::core::{Destination, LoggerError, Result};
use async_trait::async_trait;
use std::io::IsTerminal;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

pub struct WriterDestination<W: AsyncWrite + Unpin + Send> {
    writer: BufWriter<W>,
    name: String,
    terminal: bool,
}

impl<W: AsyncWrite + Unpin + Send> WriterDestination<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            name: name.into(),
            terminal: false,
        }
    }

    /// Mark the underlying stream as an interactive terminal
    #[must_use]
    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterDestination<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new("stdout", tokio::io::stdout()).with_terminal(std::io::stdout().is_terminal())
    }
}

impl WriterDestination<tokio::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new("stderr", tokio::io::stderr()).with_terminal(std::io::stderr().is_terminal())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Destination for WriterDestination<W> {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| LoggerError::io_operation("writing", self.name.clone(), e))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|e| LoggerError::io_operation("writing", self.name.clone(), e))?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| LoggerError::io_operation("flushing", self.name.clone(), e))
    }

    async fn close(&mut self) -> Result<()> {
        self.flush().await?;
        self.writer
            .shutdown()
            .await
            .map_err(|e| LoggerError::io_operation("closing", self.name.clone(), e))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_are_newline_terminated() {
        let mut destination = WriterDestination::new("vec", Vec::<u8>::new());

        destination.write_line("{\"a\":1}").await.unwrap();
        destination.write_line("{\"b\":2}").await.unwrap();
        destination.flush().await.unwrap();

        let bytes = destination.into_inner();
        assert_eq!(String::from_utf8(bytes).unwrap(), "{\"a\":1}\n{\"b\":2}\n");
    }

    #[test]
    fn test_plain_writer_is_not_a_terminal() {
        let destination = WriterDestination::new("vec", Vec::<u8>::new());
        assert!(!destination.is_terminal());
        assert!(destination.with_terminal(true).is_terminal());
    }

    #[test]
    fn test_standard_stream_names() {
        tokio_test::block_on(async {
            assert_eq!(WriterDestination::stdout().name(), "stdout");
            assert_eq!(WriterDestination::stderr().name(), "stderr");
        });
    }
}
