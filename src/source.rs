//! Source input handling.
//!
//! [`SourceFile`] owns the program text and the byte-offset → line/column
//! mapping every later stage uses for diagnostics. Normalization happens
//! once, up front:
//!
//! - a UTF-8 byte-order mark is stripped,
//! - CRLF and lone CR line endings become LF,
//! - a final LF is appended if missing, so the lexer can rely on every
//!   line being newline-terminated.
//!
//! The input format is 7-bit ASCII; any byte outside that range is a
//! fatal error carrying the offending file offset.

use std::fs;
use std::path::Path;

use thiserror::Error;

/// Error produced while reading or decoding the input file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read at all.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Path we tried to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A byte outside the 7-bit ASCII range.
    #[error("invalid encoding: non-ASCII byte 0x{byte:02X} at offset {offset}")]
    InvalidEncoding {
        /// Offset of the first offending byte, relative to the file start.
        offset: usize,
        /// The offending byte.
        byte: u8,
    },
}

/// A normalized source file with position mapping.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name used in diagnostics (the path as given).
    pub name: String,
    /// Normalized text: LF line endings, trailing LF guaranteed.
    pub text: String,
    /// Byte offset of the start of each line (line N starts at `line_starts[N-1]`).
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Reads and normalizes a file from disk.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let bytes = fs::read(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&path.display().to_string(), &bytes)
    }

    /// Builds a source file from raw bytes.
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self, SourceError> {
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let bom_len = bytes.len() - body.len();

        if let Some(pos) = body.iter().position(|&b| b >= 0x80) {
            return Err(SourceError::InvalidEncoding {
                offset: bom_len + pos,
                byte: body[pos],
            });
        }

        // ASCII-clean, so this cannot fail.
        let raw = std::str::from_utf8(body).expect("ascii input");
        Ok(Self::from_text(name, raw))
    }

    /// Builds a source file from already-decoded text. Used directly by tests.
    pub fn from_text(name: &str, raw: &str) -> Self {
        let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");
        if !text.ends_with('\n') {
            text.push('\n');
        }

        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }

        Self {
            name: name.to_string(),
            text,
            line_starts,
        }
    }

    /// Maps a byte offset to a 1-based (line, column) pair.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[line_idx] + 1;
        (line_idx as u32 + 1, col as u32)
    }

    /// The text of a 1-based source line, without its newline.
    pub fn line_text(&self, line: u32) -> &str {
        let idx = line.saturating_sub(1) as usize;
        if idx >= self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[idx];
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&e| e - 1)
            .unwrap_or(self.text.len());
        &self.text[start..end.max(start)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_normalized() {
        let src = SourceFile::from_text("t.bas", "10 CLS\r\n20 END\r\n");
        assert_eq!(src.text, "10 CLS\n20 END\n");
    }

    #[test]
    fn test_trailing_newline_appended() {
        let src = SourceFile::from_text("t.bas", "10 CLS");
        assert_eq!(src.text, "10 CLS\n");
    }

    #[test]
    fn test_bom_stripped() {
        let src = SourceFile::from_bytes("t.bas", b"\xEF\xBB\xBF10 CLS\n").unwrap();
        assert_eq!(src.text, "10 CLS\n");
    }

    #[test]
    fn test_non_ascii_rejected_with_offset() {
        let err = SourceFile::from_bytes("t.bas", b"10 PRINT \"\xC3\xA9\"\n").unwrap_err();
        match err {
            SourceError::InvalidEncoding { offset, byte } => {
                assert_eq!(offset, 10);
                assert_eq!(byte, 0xC3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_line_col_mapping() {
        let src = SourceFile::from_text("t.bas", "10 CLS\n20 END\n");
        assert_eq!(src.line_col(0), (1, 1));
        assert_eq!(src.line_col(3), (1, 4));
        assert_eq!(src.line_col(7), (2, 1));
        assert_eq!(src.line_col(10), (2, 4));
    }

    #[test]
    fn test_line_text() {
        let src = SourceFile::from_text("t.bas", "10 CLS\n20 END\n");
        assert_eq!(src.line_text(1), "10 CLS");
        assert_eq!(src.line_text(2), "20 END");
    }
}
