//! Line-oriented source reader: turns bytes from a path, buffer, or stream
//! into a sequence of [`RawLine`]s that preserve exact terminators.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

/// A single line of input, with its terminator (if any) still attached.
///
/// Line numbers are 1-based from the start of the stream. `is_eof` is only
/// ever set on the final, empty tick that closes out iteration — it never
/// accompanies real content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub line_number: usize,
    pub bytes: Vec<u8>,
    pub is_eof: bool,
}

impl RawLine {
    /// The line's content with any trailing `\n`, `\r\n`, or `\r` stripped.
    pub fn content(&self) -> &[u8] {
        strip_terminator(&self.bytes)
    }

    /// The raw terminator bytes at the end of this line, empty if the line
    /// has none (e.g. the last line of a file with no trailing newline).
    pub fn terminator(&self) -> &[u8] {
        let content_len = self.content().len();
        &self.bytes[content_len..]
    }
}

fn strip_terminator(bytes: &[u8]) -> &[u8] {
    if let Some(stripped) = bytes.strip_suffix(b"\r\n") {
        stripped
    } else if let Some(stripped) = bytes.strip_suffix(b"\n") {
        stripped
    } else if let Some(stripped) = bytes.strip_suffix(b"\r") {
        stripped
    } else {
        bytes
    }
}

/// Fatal failure to obtain patch bytes at all. Distinct from `ParseError`,
/// which covers structural problems once bytes are in hand.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not read patch source: {0}")]
    Io(#[from] io::Error),
    #[error("patch source is empty")]
    Empty,
}

/// A line-oriented cursor over an in-memory buffer.
///
/// This is the one reducible shape every accepted input (path, buffer,
/// stream) is turned into before parsing begins; see `spec.md` §4.1. URL
/// sources are a caller concern — by the time bytes reach `LineReader` they
/// have already been downloaded.
pub struct LineReader<'a> {
    buf: &'a [u8],
    pos: usize,
    next_line_number: usize,
    done: bool,
}

impl<'a> LineReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        LineReader {
            buf,
            pos: 0,
            next_line_number: 1,
            done: false,
        }
    }

    pub fn from_path(path: &Path) -> Result<Vec<u8>, InputError> {
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Err(InputError::Empty);
        }
        Ok(bytes)
    }
}

impl Iterator for LineReader<'_> {
    type Item = RawLine;

    fn next(&mut self) -> Option<RawLine> {
        if self.done {
            return None;
        }
        if self.pos >= self.buf.len() {
            self.done = true;
            return Some(RawLine {
                line_number: self.next_line_number,
                bytes: Vec::new(),
                is_eof: true,
            });
        }

        let rest = &self.buf[self.pos..];
        // Scan for whichever terminator byte (`\r` or `\n`) comes first; a
        // `\r` immediately followed by `\n` is one `\r\n` terminator, a bare
        // `\r` (old Mac style) ends the line on its own even mid-buffer.
        let line_end = match rest.iter().position(|&b| b == b'\r' || b == b'\n') {
            Some(idx) if rest[idx] == b'\n' => idx + 1,
            Some(idx) => {
                if rest.get(idx + 1) == Some(&b'\n') {
                    idx + 2
                } else {
                    idx + 1
                }
            }
            None => rest.len(),
        };

        let bytes = rest[..line_end].to_vec();
        let line_number = self.next_line_number;
        self.next_line_number += 1;
        self.pos += line_end;

        Some(RawLine {
            line_number,
            bytes,
            is_eof: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_mixed_terminators() {
        let data = b"a\nb\r\nc\rd";
        let lines: Vec<_> = LineReader::new(data).collect();
        // a\n, b\r\n, c\r, d, then the eof tick
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].content(), b"a");
        assert_eq!(lines[0].terminator(), b"\n");
        assert_eq!(lines[1].content(), b"b");
        assert_eq!(lines[1].terminator(), b"\r\n");
        assert_eq!(lines[2].content(), b"c");
        assert_eq!(lines[2].terminator(), b"\r");
        assert_eq!(lines[3].content(), b"d");
        assert_eq!(lines[3].terminator(), b"");
        assert!(lines[4].is_eof);
        assert!(lines[4].bytes.is_empty());
    }

    #[test]
    fn bare_cr_mid_buffer_ends_its_own_line() {
        let lines: Vec<_> = LineReader::new(b"a\rb\nc").collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].content(), b"a");
        assert_eq!(lines[0].terminator(), b"\r");
        assert_eq!(lines[1].content(), b"b");
        assert_eq!(lines[1].terminator(), b"\n");
        assert_eq!(lines[2].content(), b"c");
        assert_eq!(lines[2].terminator(), b"");
        assert!(lines[3].is_eof);
    }

    #[test]
    fn line_numbers_are_one_based() {
        let lines: Vec<_> = LineReader::new(b"x\ny\n").collect();
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[1].line_number, 2);
        assert_eq!(lines[2].line_number, 3);
        assert!(lines[2].is_eof);
    }

    #[test]
    fn empty_buffer_yields_only_eof() {
        let lines: Vec<_> = LineReader::new(b"").collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_eof);
    }
}
