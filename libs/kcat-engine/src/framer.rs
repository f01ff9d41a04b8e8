use std::io::{self, BufRead};
use std::path::Path;

use kcat_api::{Ownership, Record};

/// Records longer than this are handed over by moving the read buffer
/// instead of copying out of it.
pub const TRANSFER_THRESHOLD: usize = 1024;

const INITIAL_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy)]
pub struct FramerConfig {
    /// Record delimiter, stripped from every record.
    pub delimiter: u8,
    /// Splits a record into key and value at its first occurrence.
    pub key_delimiter: Option<u8>,
    /// After a key split, an empty half becomes an explicit null.
    pub null_empty: bool,
    /// Records are echoed after sending, so the raw frame must survive.
    pub tee: bool,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            delimiter: b'\n',
            key_delimiter: None,
            null_empty: false,
            tee: false,
        }
    }
}

/// Splits a byte stream into [`Record`]s at a single-byte delimiter.
pub struct Framer<R> {
    reader: R,
    config: FramerConfig,
    buf: Vec<u8>,
    /// Raw length (delimiter included) of the frame still held in `buf`.
    frame_len: usize,
}

impl<R: BufRead> Framer<R> {
    pub fn new(reader: R, config: FramerConfig) -> Self {
        Self {
            reader,
            config,
            buf: Vec::with_capacity(INITIAL_CAPACITY),
            frame_len: 0,
        }
    }

    /// Read the next non-empty record. `Ok(None)` at end of input.
    pub fn next_record(&mut self) -> io::Result<Option<Record>> {
        loop {
            self.buf.clear();
            self.frame_len = 0;

            let n = self.reader.read_until(self.config.delimiter, &mut self.buf)?;
            if n == 0 {
                return Ok(None);
            }

            let mut len = n;
            if self.buf[len - 1] == self.config.delimiter {
                len -= 1;
            }
            if len == 0 {
                continue;
            }

            self.frame_len = n;
            return Ok(Some(self.frame(len)));
        }
    }

    /// Raw bytes of the last record, delimiter included.
    ///
    /// `None` when the last record took ownership of the read buffer.
    pub fn last_frame(&self) -> Option<&[u8]> {
        (self.frame_len > 0).then(|| &self.buf[..self.frame_len])
    }

    fn frame(&mut self, len: usize) -> Record {
        if let Some(key_delimiter) = self.config.key_delimiter {
            if let Some(pos) = self.buf[..len].iter().position(|&b| b == key_delimiter) {
                return self.split(pos, len);
            }
        }

        if len > TRANSFER_THRESHOLD && !self.config.tee {
            let mut owned = std::mem::replace(&mut self.buf, Vec::with_capacity(INITIAL_CAPACITY));
            owned.truncate(len);
            self.frame_len = 0;
            return Record {
                payload: Some(owned),
                key: None,
                ownership: Ownership::Transferred,
            };
        }

        Record {
            payload: Some(self.buf[..len].to_vec()),
            key: None,
            ownership: Ownership::Copied,
        }
    }

    /// Key and value share one buffer, so both halves are always copied.
    fn split(&self, pos: usize, len: usize) -> Record {
        let key = &self.buf[..pos];
        let value = &self.buf[pos + 1..len];
        let half = |bytes: &[u8]| {
            if self.config.null_empty && bytes.is_empty() {
                None
            } else {
                Some(bytes.to_vec())
            }
        };
        Record {
            payload: half(value),
            key: half(key),
            ownership: Ownership::Copied,
        }
    }
}

/// Result of reading one file in whole-file mode.
#[derive(Debug)]
pub enum FileOutcome {
    Record(Record),
    /// The file is empty; nothing to send.
    Empty,
}

/// Read a whole file as a single record, without delimiter processing.
pub fn read_file_record(path: &Path) -> io::Result<FileOutcome> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Ok(FileOutcome::Empty);
    }
    Ok(FileOutcome::Record(Record {
        payload: Some(bytes),
        key: None,
        ownership: Ownership::Transferred,
    }))
}
