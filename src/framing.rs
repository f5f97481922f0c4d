//! # Line Framing
//!
//! Newline-delimited frames read as raw bytes. Both TCP surfaces speak one line per message,
//! but peers may send bytes that are not UTF-8 or lines that never end. [`LineReader`] hands
//! back whatever bytes arrived and caps how much of a single line it buffers.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Longest line kept in memory. Longer lines are skipped up to their newline.
pub const MAX_LINE_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// One line without its `\n` (or `\r\n`). Not necessarily UTF-8.
    Line(Vec<u8>),
    /// A line longer than the limit. Its bytes were discarded.
    Oversized,
}

/// Reads [`Frame`]s from a byte stream.
///
/// [`next_frame`](Self::next_frame) is cancel safe: partial lines are kept in the reader, so it
/// can sit in a `tokio::select!` next to other branches.
pub struct LineReader<R> {
    reader: BufReader<R>,
    max_len: usize,
    buf: Vec<u8>,
    discarding: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_len(inner, MAX_LINE_LEN)
    }

    pub fn with_max_len(inner: R, max_len: usize) -> Self {
        Self {
            reader: BufReader::new(inner),
            max_len,
            buf: Vec::new(),
            discarding: false,
        }
    }

    /// The next frame, or `None` at end of stream. A final line without a newline is still
    /// returned.
    pub async fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.discarding {
                    self.discarding = false;
                    return Ok(Some(Frame::Oversized));
                }
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_line()));
            }

            match available.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    if !self.discarding {
                        self.buf.extend_from_slice(&available[..end]);
                    }
                    self.reader.consume(end + 1);
                    if self.discarding || self.buf.len() > self.max_len {
                        self.discarding = false;
                        self.buf.clear();
                        return Ok(Some(Frame::Oversized));
                    }
                    return Ok(Some(self.take_line()));
                }
                None => {
                    let len = available.len();
                    if !self.discarding {
                        self.buf.extend_from_slice(available);
                    }
                    self.reader.consume(len);
                    if self.buf.len() > self.max_len {
                        self.discarding = true;
                        self.buf.clear();
                    }
                }
            }
        }
    }

    fn take_line(&mut self) -> Frame {
        let mut line = std::mem::take(&mut self.buf);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Frame::Line(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn frames(input: &[u8], max_len: usize) -> Vec<Frame> {
        let mut reader = LineReader::with_max_len(input, max_len);
        let mut frames = Vec::new();
        while let Some(frame) = reader.next_frame().await.unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test]
    async fn test_lines_keep_raw_bytes() {
        let frames = frames(b"one\r\n\xff\xfe hello\nlast", 64).await;
        assert_eq!(
            frames,
            vec![
                Frame::Line(b"one".to_vec()),
                Frame::Line(b"\xff\xfe hello".to_vec()),
                Frame::Line(b"last".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_long_line_is_skipped_and_reading_continues() {
        let mut input = vec![b'x'; 100];
        input.extend_from_slice(b"\nnext\n");

        let frames = frames(&input, 16).await;

        assert_eq!(frames, vec![Frame::Oversized, Frame::Line(b"next".to_vec())]);
    }

    #[tokio::test]
    async fn test_unterminated_long_line_at_end() {
        assert_eq!(frames(&[b'y'; 40], 8).await, vec![Frame::Oversized]);
    }

    #[tokio::test]
    async fn test_line_at_limit_is_kept() {
        assert_eq!(
            frames(b"12345678\n", 8).await,
            vec![Frame::Line(b"12345678".to_vec())]
        );
    }
}
