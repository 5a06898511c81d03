// src/scan/sink.rs
// =============================================================================
// Where newly found domains go.
//
// Every domain is printed to stdout. If an output file was given, the same
// line is appended there too. Both writes happen under one lock, so lines
// from different workers never interleave.
// =============================================================================

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

struct Writers {
    stdout: Box<dyn Write + Send>,
    file: Option<File>,
}

pub struct OutputSink {
    writers: Mutex<Writers>,
}

impl OutputSink {
    /// Stdout only
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()), None)
    }

    /// Stdout plus `path`. An existing file is truncated.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to open output file {}", path.display()))?;
        Ok(Self::with_writer(Box::new(io::stdout()), Some(file)))
    }

    pub fn with_writer(stdout: Box<dyn Write + Send>, file: Option<File>) -> Self {
        Self {
            writers: Mutex::new(Writers { stdout, file }),
        }
    }

    /// Writes one line to stdout and, if set, the output file.
    ///
    /// Returns the stdout error first if both writes fail.
    pub fn emit(&self, domain: &str) -> io::Result<()> {
        let mut guard = self.lock();
        let writers = &mut *guard;

        // Both writes are attempted; a closed stdout must not cost the file a line
        let stdout_result =
            writeln!(writers.stdout, "{}", domain).and_then(|()| writers.stdout.flush());

        let file_result = match writers.file.as_mut() {
            Some(file) => writeln!(file, "{}", domain),
            None => Ok(()),
        };

        stdout_result.and(file_result)
    }

    pub fn flush(&self) -> io::Result<()> {
        let mut writers = self.lock();
        writers.stdout.flush()?;
        if let Some(file) = writers.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Writers> {
        self.writers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// In-memory stand-in for stdout, shared between the sink and the test
#[cfg(test)]
#[derive(Clone, Default)]
pub struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Box<dyn Write + Send>?
//    - dyn Write means "any type that can be written to"
//    - In the real program it's stdout; in tests it's an in-memory buffer
//    - Send lets the sink move between the threads tokio runs workers on
//
// 2. What does `stdout_result.and(file_result)` do?
//    - If stdout failed, returns that error
//    - Otherwise returns the file result (Ok or the file's error)
//    - Both writes have already happened by this point
//
// 3. Why a std Mutex and not tokio's?
//    - emit() never awaits while holding the lock
//    - A plain blocking lock is fine (and cheaper) for short sections
// -----------------------------------------------------------------------------
