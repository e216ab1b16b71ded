//! Reading the leading header line of a file.

use crate::error::{Result, SplitError};
use crate::fs::FileSystem;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Read the first line of `path`.
///
/// The line terminator (`\n` or `\r\n`) is stripped. Returns `Ok(None)` for an
/// empty file. The handle is dropped before returning, whatever the outcome.
///
/// # Errors
///
/// Returns [`SplitError::HeaderRead`] if the file cannot be opened or read, or if
/// its first line is not valid UTF-8.
pub fn try_read_header(fs: &dyn FileSystem, path: &Path) -> Result<Option<String>> {
    let header_err = |source| SplitError::HeaderRead {
        path: path.to_path_buf(),
        source,
    };
    let handle = fs.open(path).map_err(header_err)?;
    let mut reader = BufReader::new(handle);
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line).map_err(header_err)?;
    if n == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    let line = String::from_utf8(line)
        .map_err(|e| header_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    Ok(Some(line))
}

/// Read the first line of `path`, treating any failure as "no header".
pub fn read_header(fs: &dyn FileSystem, path: &Path) -> Option<String> {
    match try_read_header(fs, path) {
        Ok(header) => header,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "treating file as headerless");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    #[test]
    fn strips_crlf() {
        let fs = MemoryFs::new();
        fs.insert("/h.csv", b"a,b\r\n1,2\r\n");
        assert_eq!(read_header(&fs, Path::new("/h.csv")).as_deref(), Some("a,b"));
        assert_eq!(fs.live_handles(), 0);
    }

    #[test]
    fn last_line_without_newline() {
        let fs = MemoryFs::new();
        fs.insert("/one", b"only");
        assert_eq!(read_header(&fs, Path::new("/one")).as_deref(), Some("only"));
    }

    #[test]
    fn invalid_utf8_is_a_header_error() {
        let fs = MemoryFs::new();
        fs.insert("/bin", [0xff, 0xfe, b'\n']);
        let err = try_read_header(&fs, Path::new("/bin")).unwrap_err();
        assert!(matches!(err, SplitError::HeaderRead { .. }));
        assert_eq!(read_header(&fs, Path::new("/bin")), None);
        assert_eq!(fs.live_handles(), 0);
    }
}
