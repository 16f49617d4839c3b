//! Console appender implementation

use crate::core::{Appender, LogLevel, Result};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;

/// Standard stream written by a [`ConsoleAppender`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

pub struct ConsoleAppender {
    stream: ConsoleStream,
    use_colors: bool,
    name: &'static str,
}

impl ConsoleAppender {
    /// Plain lines on stdout
    pub fn new() -> Self {
        Self::with_stream(ConsoleStream::Stdout)
    }

    /// Plain lines on stderr
    pub fn stderr() -> Self {
        Self::with_stream(ConsoleStream::Stderr)
    }

    pub fn with_stream(stream: ConsoleStream) -> Self {
        Self {
            stream,
            use_colors: false,
            name: match stream {
                ConsoleStream::Stdout => "stdout",
                ConsoleStream::Stderr => "stderr",
            },
        }
    }

    /// Color whole lines by level
    ///
    /// Only meant for interactive terminals; the escape codes end up in the
    /// output verbatim.
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }

    fn render(&self, line: &str, level: LogLevel) -> String {
        #[cfg(feature = "console")]
        if self.use_colors {
            let body = line.strip_suffix('\n').unwrap_or(line);
            return format!("{}\n", body.color(level.color_code()));
        }
        let _ = level;
        line.to_string()
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, line: &str, level: LogLevel) -> Result<()> {
        let output = self.render(line, level);
        match self.stream {
            ConsoleStream::Stdout => std::io::stdout().lock().write_all(output.as_bytes())?,
            ConsoleStream::Stderr => std::io::stderr().lock().write_all(output.as_bytes())?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.stream {
            ConsoleStream::Stdout => std::io::stdout().flush()?,
            ConsoleStream::Stderr => std::io::stderr().flush()?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }
}
