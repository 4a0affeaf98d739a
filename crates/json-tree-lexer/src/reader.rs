use std::fmt;
use std::io::{self, Read};

/// A byte offset and the corresponding line and column number.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub byte_offset: u64,
    pub line: u64,
    pub col: u64,
}

impl Location {
    fn advance_by_byte(&mut self, c: u8) {
        if c == b'\n' {
            self.col = 0;
            self.line += 1;
        } else {
            self.col += 1;
        }
        self.byte_offset += 1;
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "byte offset {} (line:{}, col:{})",
            self.byte_offset, self.line, self.col
        )
    }
}

/// One logical character as seen by the tokenizer.
///
/// `escaped` is set when the byte was preceded by a backslash in the input. The
/// backslash itself is never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadChar {
    pub byte: u8,
    pub escaped: bool,
}

impl ReadChar {
    fn plain(byte: u8) -> Self {
        ReadChar {
            byte,
            escaped: false,
        }
    }
}

/// Pulls logical characters out of a byte iterator.
///
/// A backslash is dropped and the byte after it is returned verbatim with the
/// `escaped` flag set. A backslash at the very end of the input reads as end of
/// input. One character can be pushed back with [`CharReader::push_back`].
pub struct CharReader<I: Iterator<Item = u8>> {
    bytes: I,
    location: Location,
    last_read_start: Location,
    pushed_back: Option<(ReadChar, Location)>,
}

impl<I: Iterator<Item = u8>> CharReader<I> {
    pub fn new(it: I) -> Self {
        CharReader {
            bytes: it,
            location: Location::default(),
            last_read_start: Location::default(),
            pushed_back: None,
        }
    }

    /// The location of the next character that `read()` will return.
    pub fn location(&self) -> Location {
        self.location
    }

    fn next_raw(&mut self) -> Option<u8> {
        let b = self.bytes.next()?;
        self.location.advance_by_byte(b);
        Some(b)
    }

    /// Returns the next logical character, or `None` once the input is exhausted.
    pub fn read(&mut self) -> Option<ReadChar> {
        self.last_read_start = self.location;
        if let Some((c, location_after)) = self.pushed_back.take() {
            self.location = location_after;
            return Some(c);
        }

        match self.next_raw()? {
            b'\\' => {
                let byte = self.next_raw()?;
                Some(ReadChar {
                    byte,
                    escaped: true,
                })
            }
            b => Some(ReadChar::plain(b)),
        }
    }

    /// Returns the most recently read character to the reader so that the next
    /// `read()` yields it again. Only one character of pushback is supported.
    pub fn push_back(&mut self, c: ReadChar) {
        debug_assert!(
            self.pushed_back.is_none(),
            "only one character of pushback is supported"
        );
        self.pushed_back = Some((c, self.location));
        self.location = self.last_read_start;
    }
}

/// Adapts an [`io::Read`] into a byte iterator, reading 4 KiB at a time.
///
/// The iterator ends at EOF or at the first I/O error. The error is kept and can
/// be retrieved with [`IoBytes::take_error`] once parsing is done.
pub struct IoBytes<R> {
    reader: R,
    buf: Vec<u8>,
    valid_slice_start: usize,
    valid_slice_end: usize,
    error: Option<io::Error>,
}

impl<R> IoBytes<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: vec![0; 4096],
            valid_slice_start: 0,
            valid_slice_end: 0,
            error: None,
        }
    }

    /// The I/O error that ended iteration, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl<R: Read> Iterator for IoBytes<R> {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.valid_slice_start != self.valid_slice_end {
            let b = self.buf[self.valid_slice_start];
            self.valid_slice_start += 1;
            return Some(b);
        }
        if self.error.is_some() {
            return None;
        }

        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return None,
                Ok(read_len) => {
                    self.valid_slice_start = 1;
                    self.valid_slice_end = read_len;
                    return Some(self.buf[0]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.error = Some(e);
                    return None;
                }
            }
        }
    }
}
