//! Character stream
//!
//! Pulls one character at a time from a source and tracks the 1-based line and
//! column of the current character. The only lookahead is a single buffered
//! character, used to recognize two-character comment delimiters.
//!
//! Any `Iterator<Item = io::Result<char>>` can be a source. [`str_chars`]
//! adapts string slices and [`Utf8Chars`] decodes any `std::io::Read`.

use std::io::{self, BufRead, BufReader, Read};
use std::iter::Map;
use std::str::Chars;

/// Characters of a string slice as an infallible source.
pub type StrChars<'a> = Map<Chars<'a>, fn(char) -> io::Result<char>>;

/// Adapt a string slice to a character source.
pub fn str_chars(source: &str) -> StrChars<'_> {
    source.chars().map(Ok as fn(char) -> io::Result<char>)
}

/// A cursor over a character source.
#[derive(Debug)]
pub struct CharStream<I> {
    chars: I,
    current: Option<char>,
    /// Single-slot lookahead buffer: `Some(next)` once the next character was peeked.
    peeked: Option<Option<char>>,
    position: usize,
    line: u64,
    column: u64,
}

impl<I> CharStream<I>
where
    I: Iterator<Item = io::Result<char>>,
{
    /// Create a stream positioned at the first character of `chars`.
    pub fn new(chars: I) -> io::Result<Self> {
        let mut stream = Self {
            chars,
            current: None,
            peeked: None,
            position: 0,
            line: 1,
            column: 1,
        };
        stream.current = stream.pull()?;
        Ok(stream)
    }

    /// `true` until the source is exhausted.
    #[inline]
    pub fn has_char(&self) -> bool {
        self.current.is_some()
    }

    /// The character at the cursor, or `None` past the end.
    #[inline]
    pub fn current_char(&self) -> Option<char> {
        self.current
    }

    /// 0-based index of the current character.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// 1-based line of the current character.
    #[inline]
    pub fn line(&self) -> u64 {
        self.line
    }

    /// 1-based column of the current character.
    #[inline]
    pub fn column(&self) -> u64 {
        self.column
    }

    /// Move the cursor one character forward.
    ///
    /// Must not be called past the end of the source.
    pub fn advance(&mut self) -> io::Result<()> {
        debug_assert!(
            self.has_char(),
            "no more characters to read at {}:{}",
            self.line,
            self.column
        );
        let Some(consumed) = self.current else {
            return Ok(());
        };

        if consumed == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;

        self.current = match self.peeked.take() {
            Some(next) => next,
            None => self.pull()?,
        };
        Ok(())
    }

    /// The character after the current one, without consuming anything.
    pub fn peek_next(&mut self) -> io::Result<Option<char>> {
        if self.current.is_none() {
            return Ok(None);
        }
        if let Some(next) = self.peeked {
            return Ok(next);
        }
        let next = self.pull()?;
        self.peeked = Some(next);
        Ok(next)
    }

    fn pull(&mut self) -> io::Result<Option<char>> {
        self.chars.next().transpose()
    }
}

impl<'a> CharStream<StrChars<'a>> {
    /// Create a stream over a string slice. Reading a string cannot fail.
    pub fn for_str(source: &'a str) -> Self {
        let mut chars = str_chars(source);
        let current = chars.next().and_then(Result::ok);
        Self {
            chars,
            current,
            peeked: None,
            position: 0,
            line: 1,
            column: 1,
        }
    }
}

/// Incremental UTF-8 decoder over any reader.
#[derive(Debug)]
pub struct Utf8Chars<R> {
    reader: BufReader<R>,
}

impl<R: Read> Utf8Chars<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = loop {
            match self.reader.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        if byte.is_some() {
            self.reader.consume(1);
        }
        Ok(byte)
    }

    fn decode_next(&mut self) -> io::Result<Option<char>> {
        let Some(lead) = self.read_byte()? else {
            return Ok(None);
        };
        let width = utf8_width(lead);
        if width == 0 {
            return Err(invalid_utf8(format!("invalid UTF-8 lead byte 0x{:02x}", lead)));
        }

        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            *slot = self
                .read_byte()?
                .ok_or_else(|| invalid_utf8("incomplete UTF-8 sequence at end of input".into()))?;
        }
        let decoded = std::str::from_utf8(&bytes[..width])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(decoded.chars().next())
    }
}

impl<R: Read> Iterator for Utf8Chars<R> {
    type Item = io::Result<char>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next().transpose()
    }
}

/// Length of the UTF-8 sequence introduced by `lead`, or 0 if it cannot start one.
fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn invalid_utf8(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
