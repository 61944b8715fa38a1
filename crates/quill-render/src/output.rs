//! Chain of capture buffers in front of the output file.

use std::io::{self, Write};

use crate::error::DocumentError;

/// Root buffer size at which markup is streamed to the sink.
const FLUSH_THRESHOLD: usize = 16 * 1024;

/// Markup plus its parallel plain-text rendering.
#[derive(Debug, Default)]
pub(crate) struct Captured {
    pub(crate) markup: String,
    pub(crate) text: String,
}

impl Captured {
    pub(crate) fn is_empty(&self) -> bool {
        self.markup.is_empty() && self.text.is_empty()
    }
}

/// Stack of buffers; the last one is the active sink, the first one
/// streams into `sink`.
#[derive(Debug)]
pub(crate) struct OutputChain<W: Write> {
    sink: W,
    buffers: Vec<Captured>,
}

impl<W: Write> OutputChain<W> {
    pub(crate) fn new(sink: W) -> Self {
        Self {
            sink,
            buffers: vec![Captured::default()],
        }
    }

    pub(crate) fn current(&mut self) -> &mut Captured {
        let last = self.buffers.len() - 1;
        &mut self.buffers[last]
    }

    pub(crate) fn depth(&self) -> usize {
        self.buffers.len()
    }

    pub(crate) fn push(&mut self) {
        self.buffers.push(Captured::default());
    }

    pub(crate) fn pop(&mut self) -> Result<Captured, DocumentError> {
        if self.buffers.len() == 1 {
            return Err(DocumentError::Lifecycle(
                "cannot pop the root output buffer".to_owned(),
            ));
        }
        Ok(self.buffers.pop().unwrap_or_default())
    }

    /// Stream the root buffer once it is active and large enough.
    pub(crate) fn maybe_flush(&mut self) -> io::Result<()> {
        if self.buffers.len() == 1 && self.buffers[0].markup.len() >= FLUSH_THRESHOLD {
            self.drain_root()?;
        }
        Ok(())
    }

    fn drain_root(&mut self) -> io::Result<()> {
        let root = &mut self.buffers[0];
        self.sink.write_all(root.markup.as_bytes())?;
        root.markup.clear();
        root.text.clear();
        Ok(())
    }

    /// Write what is left in the root buffer and hand back the sink.
    pub(crate) fn finish(mut self) -> Result<W, DocumentError> {
        if self.depth() != 1 {
            return Err(DocumentError::Lifecycle(format!(
                "{} capture buffers still open",
                self.depth() - 1
            )));
        }
        self.drain_root()?;
        self.sink.flush()?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capture_is_separate_from_root() {
        let mut chain = OutputChain::new(Vec::new());
        chain.current().markup.push_str("<p>");
        chain.push();
        chain.current().markup.push_str("caption");
        chain.current().text.push_str("caption");
        assert_eq!(chain.depth(), 2);

        let captured = chain.pop().unwrap();
        assert_eq!(captured.markup, "caption");
        assert_eq!(captured.text, "caption");
        assert_eq!(chain.depth(), 1);

        let out = chain.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<p>");
    }

    #[test]
    fn test_pop_root_fails() {
        let mut chain = OutputChain::new(Vec::new());
        assert!(matches!(chain.pop(), Err(DocumentError::Lifecycle(_))));
    }

    #[test]
    fn test_finish_with_open_capture_fails() {
        let mut chain = OutputChain::new(Vec::new());
        chain.push();
        assert!(chain.finish().is_err());
    }

    #[test]
    fn test_large_root_is_streamed() {
        let mut chain = OutputChain::new(Vec::new());
        chain.current().markup.push_str(&"x".repeat(FLUSH_THRESHOLD));
        chain.maybe_flush().unwrap();
        assert!(chain.current().markup.is_empty());
        chain.current().markup.push_str("tail");
        let out = chain.finish().unwrap();
        assert_eq!(out.len(), FLUSH_THRESHOLD + 4);
    }

    #[test]
    fn test_capture_is_not_streamed() {
        let mut chain = OutputChain::new(Vec::new());
        chain.push();
        chain.current().markup.push_str(&"x".repeat(FLUSH_THRESHOLD));
        chain.maybe_flush().unwrap();
        assert_eq!(chain.current().markup.len(), FLUSH_THRESHOLD);
    }
}
