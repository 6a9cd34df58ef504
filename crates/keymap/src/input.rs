use anyhow::{Context, Result};
use std::io::Write;

/// Input side of a child process (usually a PTY master).
#[cfg_attr(test, mockall::automock)]
pub trait ChildInput {
    /// Deliver bytes to the child as if typed.
    fn feed_child(&mut self, bytes: &[u8]) -> Result<()>;
}

impl ChildInput for Vec<u8> {
    fn feed_child(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Adapts any [`Write`] (a PTY writer, stdout) into a [`ChildInput`].
///
/// Every feed is flushed so the child sees the whole snippet at once.
#[derive(Debug)]
pub struct WriterInput<W: Write> {
    writer: W,
}

impl<W: Write> WriterInput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChildInput for WriterInput<W> {
    fn feed_child(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .context("Failed to write snippet to child input")?;
        self.writer
            .flush()
            .context("Failed to flush child input")?;
        Ok(())
    }
}
