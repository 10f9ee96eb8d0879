// HttpSleuth - platform/fs.rs
//
// Line source over a file on disk.

use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Lazy line reader over any byte source.
///
/// Invalid UTF-8 is replaced rather than rejected; `\n` and `\r\n`
/// terminators are stripped.
pub struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: Read> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }
}

impl<R: Read> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Open `path` as a lazy sequence of lines.
pub fn open_lines(path: &Path) -> io::Result<LossyLines<std::fs::File>> {
    let file = std::fs::File::open(path)?;
    tracing::debug!(path = %path.display(), "Opened log file");
    Ok(LossyLines::new(file))
}
