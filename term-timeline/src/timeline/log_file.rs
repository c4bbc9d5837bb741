//! The single open handle a scanner owns for its whole lifetime.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use crate::error::{ErrorContext, Result, TimelineError};
use crate::reader::LogReader;

/// Initial window read backwards from EOF when looking for the last
/// timestamped line. Doubles until a timestamp is found or the file start is
/// reached.
const TAIL_WINDOW_BYTES: u64 = 4096;

/// An open server log with its first and last timestamps.
///
/// The handle is closed when the value is dropped.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    stream: BufReader<File>,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    len: u64,
}

impl LogFile {
    /// Opens `path` and resolves the first and last timestamps.
    ///
    /// Lines without a timestamp at the head or tail of the file are
    /// skipped. A file with no timestamped line at all is rejected.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, reader: &dyn LogReader) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        let len = file.metadata()?.len();
        let mut stream = BufReader::new(file);

        let start_time = first_timestamp(&mut stream, reader)?
            .ok_or_else(|| TimelineError::empty_log(&path))?;
        let end_time = last_timestamp(stream.get_mut(), len, reader)?
            .ok_or_else(|| TimelineError::empty_log(&path))?;
        stream.seek(SeekFrom::Start(0))?;

        debug!(%start_time, %end_time, len, "opened log file");
        Ok(Self {
            path,
            stream,
            start_time,
            end_time,
            len,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Timestamp of the first timestamped line.
    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    /// Timestamp of the last timestamped line.
    pub fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    /// File length in bytes at open time.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file was empty at open time.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Moves the cursor to an absolute byte offset.
    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.stream.seek(SeekFrom::Start(offset)).map(|_| ())
    }

    /// Reads whole lines until at least `min_bytes` bytes were consumed or
    /// EOF is hit. Returns an empty block at EOF.
    pub fn read_block(&mut self, min_bytes: usize) -> io::Result<Vec<String>> {
        let mut block = Vec::new();
        let mut consumed = 0usize;
        let mut buf = Vec::with_capacity(256);
        while consumed < min_bytes {
            buf.clear();
            let n = self.stream.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            consumed += n;
            block.push(decode_line(&buf));
        }
        Ok(block)
    }
}

/// Strips the line terminator and decodes lossily.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn first_timestamp(
    stream: &mut BufReader<File>,
    reader: &dyn LogReader,
) -> io::Result<Option<NaiveDateTime>> {
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        if stream.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        if let Some(tm) = reader.parse_timestamp(&decode_line(&buf)) {
            return Ok(Some(tm));
        }
    }
}

fn last_timestamp(
    file: &mut File,
    len: u64,
    reader: &dyn LogReader,
) -> io::Result<Option<NaiveDateTime>> {
    let mut window = TAIL_WINDOW_BYTES;
    loop {
        let start = len.saturating_sub(window);
        file.seek(SeekFrom::Start(start))?;
        let mut buf = Vec::with_capacity((len - start) as usize);
        file.by_ref().take(len - start).read_to_end(&mut buf)?;

        let text = String::from_utf8_lossy(&buf);
        // A window that does not begin at offset 0 may start mid-line.
        let skip = usize::from(start > 0);
        let found = text
            .split('\n')
            .skip(skip)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .find_map(|line| reader.parse_timestamp(line.trim_end_matches('\r')));
        if found.is_some() || start == 0 {
            return Ok(found);
        }
        window = window.saturating_mul(2);
    }
}
