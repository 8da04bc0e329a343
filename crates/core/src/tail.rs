//! Bounded tail reads of append-only sensor log files.
//!
//! Only the final [`TAIL_WINDOW_BYTES`] of a file are read. The window is
//! never grown: a file whose last record does not fit inside it yields
//! `None`, the same as a missing or unreadable file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::CoreError;

/// Number of trailing bytes read from each log file.
pub const TAIL_WINDOW_BYTES: u64 = 128;

/// Raw bytes from the end of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailWindow {
    pub bytes: Vec<u8>,
    /// `true` when the window begins at byte 0 or directly after a newline,
    /// so the first line in the window is complete.
    pub starts_at_line: bool,
}

/// Return the last complete, non-empty record of the file at `path`.
///
/// Errors are logged and reported as `None`.
pub fn read_last_record(path: &Path) -> Option<String> {
    read_last_record_within(path, TAIL_WINDOW_BYTES)
}

/// [`read_last_record`] with an explicit window size.
pub fn read_last_record_within(path: &Path, window: u64) -> Option<String> {
    match read_tail(path, window) {
        Ok(tail) => {
            let text = String::from_utf8_lossy(&tail.bytes);
            let record = last_record(&text, tail.starts_at_line);
            if record.is_none() {
                tracing::debug!(path = %path.display(), "No complete record in tail window");
            }
            record
        }
        Err(CoreError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Log file not found");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read log file tail");
            None
        }
    }
}

/// Read at most `window` bytes from the end of the file.
///
/// The byte just before the window is read too, to decide whether the
/// window starts on a line boundary; it is not part of the returned bytes.
pub fn read_tail(path: &Path, window: u64) -> Result<TailWindow, CoreError> {
    let io_err = |source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    let start = len.saturating_sub(window);
    let lead = start.saturating_sub(1);
    file.seek(SeekFrom::Start(lead)).map_err(io_err)?;

    let mut bytes = Vec::with_capacity((len - lead) as usize);
    file.read_to_end(&mut bytes).map_err(io_err)?;

    let starts_at_line = if start == 0 {
        true
    } else if bytes.is_empty() {
        // Truncated between metadata and read.
        false
    } else {
        bytes.remove(0) == b'\n'
    };

    Ok(TailWindow {
        bytes,
        starts_at_line,
    })
}

/// Extract the last non-empty line from a tail window.
///
/// NUL bytes left behind by a truncating writer are dropped. When the window
/// does not start on a line boundary, the text before the first newline is a
/// fragment of a longer line and is never returned.
pub fn last_record(window: &str, starts_at_line: bool) -> Option<String> {
    let cleaned: String = window.chars().filter(|&c| c != '\0').collect();

    let mut segments = cleaned.split('\n');
    if !starts_at_line {
        // Discard the leading fragment; with no newline at all nothing is complete.
        segments.next();
    }

    segments
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_newline_returns_previous_line() {
        assert_eq!(last_record("a\nb\nc\n", true).as_deref(), Some("c"));
    }

    #[test]
    fn skips_empty_trailing_lines() {
        assert_eq!(last_record("a\nb\n\n", true).as_deref(), Some("b"));
        assert_eq!(last_record("a\nb\n \r\n\n", true).as_deref(), Some("b"));
    }

    #[test]
    fn unterminated_last_line_is_returned() {
        assert_eq!(last_record("a\nb", true).as_deref(), Some("b"));
    }

    #[test]
    fn single_line_at_line_start() {
        assert_eq!(last_record("only\n", true).as_deref(), Some("only"));
    }

    #[test]
    fn strips_nul_bytes() {
        assert_eq!(last_record("a\nb\0\0\n\0\0", true).as_deref(), Some("b"));
    }

    #[test]
    fn leading_fragment_is_ignored_mid_file() {
        assert_eq!(last_record("ment\n", false), None);
        assert_eq!(last_record("ment\nfull\n", false).as_deref(), Some("full"));
        assert_eq!(last_record("no newline at all", false), None);
    }

    #[test]
    fn window_on_line_boundary_keeps_first_line() {
        assert_eq!(last_record("bbbb\n", true).as_deref(), Some("bbbb"));
        assert_eq!(last_record("bbbb\n", false), None);
    }

    #[test]
    fn empty_window_yields_none() {
        assert_eq!(last_record("", true), None);
        assert_eq!(last_record("\n\n\n", true), None);
    }
}
