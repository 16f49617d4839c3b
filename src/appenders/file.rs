//! File appender implementation

use crate::core::{Appender, LogLevel, LoggerError, Result};
#[cfg(feature = "file")]
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only file sink
///
/// Lines are buffered and written whole. With the `file` feature an advisory
/// exclusive lock is held around every write so that several processes can
/// share one log file without interleaving.
pub struct FileAppender {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
}

impl FileAppender {
    /// Open `path` for appending, creating the file if needed
    ///
    /// The parent directory must exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    format!("cannot open '{}'", path.display()),
                    e,
                )
            })?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locked<T>(file: &File, op: impl FnOnce() -> std::io::Result<T>) -> std::io::Result<T> {
        #[cfg(feature = "file")]
        {
            file.lock_exclusive()?;
            let result = op();
            FileExt::unlock(file)?;
            result
        }
        #[cfg(not(feature = "file"))]
        {
            let _ = file;
            op()
        }
    }
}

impl Appender for FileAppender {
    fn append(&mut self, line: &str, _level: LogLevel) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            LoggerError::file_appender(self.path.display().to_string(), "writer not initialized")
        })?;

        // The whole buffer goes out under the lock once it cannot take the line.
        if writer.capacity() - writer.buffer().len() < line.len() {
            let file = writer.get_ref().try_clone()?;
            Self::locked(&file, || {
                writer.flush()?;
                writer.write_all(line.as_bytes())
            })?;
        } else {
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            let file = writer.get_ref().try_clone()?;
            Self::locked(&file, || writer.flush())?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_appends_whole_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");

        let mut appender = FileAppender::new(&path).unwrap();
        appender.append("level=info msg=\"one\"\n", LogLevel::Info).unwrap();
        appender.append("level=warn msg=\"two\"\n", LogLevel::Warn).unwrap();
        appender.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "level=info msg=\"one\"\nlevel=warn msg=\"two\"\n");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");

        {
            let mut appender = FileAppender::new(&path).unwrap();
            appender.append("first\n", LogLevel::Info).unwrap();
        }
        {
            let mut appender = FileAppender::new(&path).unwrap();
            appender.append("second\n", LogLevel::Info).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_large_line_bypasses_buffer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.log");

        let mut appender = FileAppender::new(&path).unwrap();
        let big = format!("{}\n", "x".repeat(64 * 1024));
        appender.append("small\n", LogLevel::Info).unwrap();
        appender.append(&big, LogLevel::Info).unwrap();
        appender.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with("small\n"));
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("app.log");

        let err = FileAppender::new(&path).err().unwrap();
        assert!(matches!(err, LoggerError::IoOperation { .. }));
    }
}
