//! Lexer
//!
//! Grammar primitives on top of a [`CharStream`]. Every `read_*` operation
//! either consumes what it recognizes and returns it, returns `None` (or
//! `false`) without consuming anything, or fails with a [`ParseError`].
//!
//! Names and text runs decode these escape sequences:
//! - `\[`, `\]`, `\\`: the literal character
//! - `\s`: space
//! - `\t`, `\r`, `\n`: tab, carriage return, line feed
//! - `\uHHHH`: a UTF-16 code unit; surrogates must come in `\uHHHH\uHHHH` pairs
//! - `\UHHHHHHHH`: any Unicode scalar value
//!
//! Comments are delimited by `[-` and `-]` and nest.

use std::io;

use tracing::trace;

use crate::error::{ErrorKind, ParseContext, ParseError, Result};
use crate::stream::{CharStream, StrChars};

pub const NODE_START: char = '[';
pub const NODE_END: char = ']';
pub const ESCAPE_CHAR: char = '\\';
/// Follows [`NODE_START`] to open a comment and precedes [`NODE_END`] to close it.
pub const COMMENT_SYMBOL: char = '-';

/// A PDML reader over a character source.
#[derive(Debug)]
pub struct Lexer<'ctx, I> {
    stream: CharStream<I>,
    ctx: &'ctx ParseContext,
}

impl<'ctx, 'src> Lexer<'ctx, StrChars<'src>> {
    /// Create a lexer reading a string slice.
    pub fn for_str(source: &'src str, ctx: &'ctx ParseContext) -> Self {
        Self {
            stream: CharStream::for_str(source),
            ctx,
        }
    }
}

impl<'ctx, I> Lexer<'ctx, I>
where
    I: Iterator<Item = io::Result<char>>,
{
    /// Create a lexer positioned at the first character of `chars`.
    pub fn new(chars: I, ctx: &'ctx ParseContext) -> Result<Self> {
        let stream = CharStream::new(chars).map_err(|e| ctx.io_error(e))?;
        Ok(Self { stream, ctx })
    }

    pub fn context(&self) -> &'ctx ParseContext {
        self.ctx
    }

    #[inline]
    pub fn has_char(&self) -> bool {
        self.stream.has_char()
    }

    #[inline]
    pub fn current_char(&self) -> Option<char> {
        self.stream.current_char()
    }

    #[inline]
    pub fn line(&self) -> u64 {
        self.stream.line()
    }

    #[inline]
    pub fn column(&self) -> u64 {
        self.stream.column()
    }

    /// Build an error located at the current character.
    pub fn error(&self, kind: ErrorKind) -> ParseError {
        kind.at(self.ctx, self.line(), self.column())
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    pub fn is_at_node_start(&self) -> bool {
        self.is_at(NODE_START)
    }

    pub fn is_at_node_end(&self) -> bool {
        self.is_at(NODE_END)
    }

    /// Consume a node start symbol if the cursor is at one.
    pub fn read_node_start(&mut self) -> Result<bool> {
        self.accept(NODE_START)
    }

    /// Consume a node end symbol if the cursor is at one.
    pub fn read_node_end(&mut self) -> Result<bool> {
        self.accept(NODE_END)
    }

    /// Read and decode a node name.
    ///
    /// A name starts with an ASCII letter or `_` and continues with ASCII
    /// letters, digits, `_`, `-` and `.`. Escape sequences may appear after
    /// the first character, so `a\sb` is the name `a b`.
    pub fn read_node_name(&mut self) -> Result<Option<String>> {
        match self.current_char() {
            Some(c) if is_name_start(c) => {}
            _ => return Ok(None),
        }

        let mut name = String::new();
        while let Some(c) = self.current_char() {
            if c == ESCAPE_CHAR {
                self.read_escape_sequence(&mut name)?;
            } else if is_name_char(c) {
                name.push(c);
                self.advance()?;
            } else {
                break;
            }
        }
        Ok(Some(name))
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Read and decode text up to the next node start, node end or end of input.
    ///
    /// Returns `None` if the cursor is already at one of those.
    pub fn read_node_text(&mut self) -> Result<Option<String>> {
        let mut text = String::new();
        while let Some(c) = self.current_char() {
            match c {
                NODE_START | NODE_END => break,
                ESCAPE_CHAR => self.read_escape_sequence(&mut text)?,
                _ => {
                    text.push(c);
                    self.advance()?;
                }
            }
        }
        Ok((!text.is_empty()).then_some(text))
    }

    /// Decode the escape sequence at the cursor and consume all of it.
    fn read_escape_sequence(&mut self, out: &mut String) -> Result<()> {
        self.advance()?; // consume '\'

        let Some(c) = self.current_char() else {
            return Err(self.error(ErrorKind::EscapeAtEnd));
        };
        match c {
            NODE_START | NODE_END | ESCAPE_CHAR => out.push(c),
            's' => out.push(' '),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'n' => out.push('\n'),
            'u' => {
                let unit = self.read_hex_digits(4)?;
                out.push(self.decode_utf16_unit(unit)?);
            }
            'U' => {
                let code = self.read_hex_digits(8)?;
                let decoded = char::from_u32(code)
                    .ok_or_else(|| self.error(ErrorKind::InvalidCodePoint(code)))?;
                out.push(decoded);
            }
            other => return Err(self.error(ErrorKind::UnrecognizedEscape(other))),
        }
        self.advance()
    }

    /// Read `count` hex digits following the cursor.
    ///
    /// Leaves the cursor at the last digit.
    fn read_hex_digits(&mut self, count: usize) -> Result<u32> {
        let mut value = 0u32;
        for found in 0..count {
            self.advance()?;
            let Some(c) = self.current_char() else {
                return Err(self.error(ErrorKind::MissingHexDigits {
                    expected: count,
                    found,
                }));
            };
            let digit = c
                .to_digit(16)
                .ok_or_else(|| self.error(ErrorKind::InvalidHexDigit(c)))?;
            value = (value << 4) | digit;
        }
        Ok(value)
    }

    /// Turn a `\u` code unit into a scalar value, reading the low half of a
    /// surrogate pair when `unit` is a high surrogate.
    fn decode_utf16_unit(&mut self, unit: u32) -> Result<char> {
        match unit {
            0xD800..=0xDBFF => {
                self.advance()?;
                if !self.is_at(ESCAPE_CHAR) || self.peek_next()? != Some('u') {
                    return Err(self.error(ErrorKind::UnpairedSurrogate(unit)));
                }
                self.advance()?; // onto 'u'
                let low = self.read_hex_digits(4)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error(ErrorKind::UnpairedSurrogate(unit)));
                }
                let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                char::from_u32(code).ok_or_else(|| self.error(ErrorKind::InvalidCodePoint(code)))
            }
            0xDC00..=0xDFFF => Err(self.error(ErrorKind::UnpairedSurrogate(unit))),
            _ => char::from_u32(unit).ok_or_else(|| self.error(ErrorKind::InvalidCodePoint(unit))),
        }
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Read a comment, including its delimiters and any nested comments.
    pub fn read_comment(&mut self) -> Result<Option<String>> {
        if !self.is_at_comment_start()? {
            return Ok(None);
        }

        let mut comment = String::new();
        // Opening positions of the comments that are still open.
        let mut open = vec![(self.line(), self.column())];
        self.consume_comment_delimiter(&mut comment)?;

        while let Some(&(line, column)) = open.last() {
            if !self.has_char() {
                return Err(ErrorKind::UnterminatedComment { line, column }.at(self.ctx, line, column));
            }
            if self.is_at_comment_end()? {
                self.consume_comment_delimiter(&mut comment)?;
                open.pop();
            } else if self.is_at_comment_start()? {
                open.push((self.line(), self.column()));
                self.consume_comment_delimiter(&mut comment)?;
            } else if let Some(c) = self.current_char() {
                comment.push(c);
                self.advance()?;
            }
        }

        trace!(line = self.line(), column = self.column(), "skipped comment");
        Ok(Some(comment))
    }

    /// Skip a single comment.
    pub fn skip_comment(&mut self) -> Result<bool> {
        Ok(self.read_comment()?.is_some())
    }

    /// Skip a sequence of adjacent comments.
    pub fn skip_comments(&mut self) -> Result<()> {
        while self.skip_comment()? {}
        Ok(())
    }

    fn is_at_comment_start(&mut self) -> Result<bool> {
        Ok(self.is_at(NODE_START) && self.peek_next()? == Some(COMMENT_SYMBOL))
    }

    fn is_at_comment_end(&mut self) -> Result<bool> {
        Ok(self.is_at(COMMENT_SYMBOL) && self.peek_next()? == Some(NODE_END))
    }

    /// Consume the two characters of `[-` or `-]`.
    fn consume_comment_delimiter(&mut self, out: &mut String) -> Result<()> {
        for _ in 0..2 {
            if let Some(c) = self.current_char() {
                out.push(c);
                self.advance()?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Whitespace
    // ========================================================================

    /// Skip one space, tab or new line. `\r\n` counts as one new line.
    pub fn skip_whitespace_char(&mut self) -> Result<bool> {
        match self.current_char() {
            Some(c) if is_whitespace(c) => {
                self.advance()?;
                if c == '\r' && self.is_at('\n') {
                    self.advance()?;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Skip a run of whitespace. Returns `true` if anything was skipped.
    pub fn skip_whitespace(&mut self) -> Result<bool> {
        if !self.skip_whitespace_char()? {
            return Ok(false);
        }
        while self.skip_whitespace_char()? {}
        Ok(true)
    }

    // ========================================================================
    // Utilities
    // ========================================================================

    #[inline]
    fn is_at(&self, c: char) -> bool {
        self.current_char() == Some(c)
    }

    fn accept(&mut self, c: char) -> Result<bool> {
        if !self.is_at(c) {
            return Ok(false);
        }
        self.advance()?;
        Ok(true)
    }

    fn advance(&mut self) -> Result<()> {
        self.stream.advance().map_err(|e| self.ctx.io_error(e))
    }

    fn peek_next(&mut self) -> Result<Option<char>> {
        self.stream.peek_next().map_err(|e| self.ctx.io_error(e))
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.'
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_name(source: &str) -> Option<String> {
        let ctx = ParseContext::default();
        Lexer::for_str(source, &ctx).read_node_name().unwrap()
    }

    fn read_text(source: &str) -> Result<Option<String>> {
        let ctx = ParseContext::default();
        Lexer::for_str(source, &ctx).read_node_text()
    }

    fn text_error(source: &str) -> ErrorKind {
        read_text(source).unwrap_err().kind().cloned().unwrap()
    }

    #[test]
    fn test_read_node_name() {
        assert_eq!(read_name("foo").as_deref(), Some("foo"));
        assert_eq!(read_name("_foo_-.2]").as_deref(), Some("_foo_-.2"));
        assert_eq!(read_name("bar[").as_deref(), Some("bar"));
        assert_eq!(read_name("name value").as_deref(), Some("name"));
        assert_eq!(read_name("qqq@").as_deref(), Some("qqq"));
        assert_eq!(read_name("_").as_deref(), Some("_"));
        assert_eq!(read_name("1abc"), None);
        assert_eq!(read_name("-abc"), None);
        assert_eq!(read_name("éa"), None);
    }

    #[test]
    fn test_read_escaped_node_name() {
        assert_eq!(read_name("a\\sb x").as_deref(), Some("a b"));
        assert_eq!(read_name("tag\\s4] ").as_deref(), Some("tag 4"));
        assert_eq!(read_name("x\\[y\\]").as_deref(), Some("x[y]"));
        assert_eq!(read_name("\\sa"), None);
        assert_eq!(read_name("\\u0031"), None);
        assert_eq!(read_name("a\\u00e9").as_deref(), Some("a\u{e9}"));

        let ctx = ParseContext::default();
        let err = Lexer::for_str("a\\q", &ctx).read_node_name().unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::UnrecognizedEscape('q')));
        assert_eq!((err.line(), err.column()), (Some(1), Some(3)));
    }

    #[test]
    fn test_read_node_name_around_delimiters() {
        let ctx = ParseContext::default();
        let mut lexer = Lexer::for_str("[foo]", &ctx);
        assert_eq!(lexer.read_node_name().unwrap(), None);
        assert!(lexer.read_node_start().unwrap());
        assert_eq!(lexer.read_node_name().unwrap().as_deref(), Some("foo"));
        assert_eq!(lexer.read_node_name().unwrap(), None);
        assert!(!lexer.read_node_start().unwrap());
        assert!(lexer.read_node_end().unwrap());
        assert_eq!(lexer.read_node_name().unwrap(), None);
        assert!(!lexer.has_char());
    }

    #[test]
    fn test_read_node_text() {
        let ctx = ParseContext::default();
        let mut lexer = Lexer::for_str("abc123_!#[s\t\r\ne]end", &ctx);

        assert_eq!(lexer.read_node_text().unwrap().as_deref(), Some("abc123_!#"));
        assert_eq!(lexer.read_node_text().unwrap(), None);
        assert!(lexer.read_node_start().unwrap());

        assert_eq!(lexer.read_node_text().unwrap().as_deref(), Some("s\t\r\ne"));
        assert_eq!(lexer.read_node_text().unwrap(), None);
        assert!(lexer.read_node_end().unwrap());

        assert_eq!(lexer.read_node_text().unwrap().as_deref(), Some("end"));
        assert_eq!(lexer.read_node_text().unwrap(), None);
    }

    #[test]
    fn test_escape_sequences() {
        let text = read_text("__\\[\\]\\\\__\\t\\r\\n__\\u0041__\\U00000041__\\U0001F600")
            .unwrap()
            .unwrap();
        assert_eq!(text, "__[]\\__\t\r\n__A__A__\u{1F600}");

        let text = read_text("a\\sb").unwrap().unwrap();
        assert_eq!(text, "a b");
        assert_eq!(text_error("x\\fy"), ErrorKind::UnrecognizedEscape('f'));
    }

    #[test]
    fn test_escape_stops_before_delimiter() {
        let ctx = ParseContext::default();
        let mut lexer = Lexer::for_str("a\\u00e9]", &ctx);
        assert_eq!(lexer.read_node_text().unwrap().as_deref(), Some("a\u{e9}"));
        assert!(lexer.is_at_node_end());
    }

    #[test]
    fn test_surrogate_pair() {
        let text = read_text("\\uD83D\\uDE00!").unwrap().unwrap();
        assert_eq!(text, "\u{1F600}!");
        let text = read_text("\\udbff\\udfff").unwrap().unwrap();
        assert_eq!(text, "\u{10FFFF}");
    }

    #[test]
    fn test_unpaired_surrogates() {
        assert_eq!(text_error("\\uD83D"), ErrorKind::UnpairedSurrogate(0xD83D));
        assert_eq!(text_error("\\uD83Dx"), ErrorKind::UnpairedSurrogate(0xD83D));
        assert_eq!(text_error("\\uD83D\\n"), ErrorKind::UnpairedSurrogate(0xD83D));
        assert_eq!(text_error("\\uD83D\\u0041"), ErrorKind::UnpairedSurrogate(0xD83D));
        assert_eq!(text_error("\\uDE00"), ErrorKind::UnpairedSurrogate(0xDE00));
    }

    #[test]
    fn test_invalid_escapes() {
        assert_eq!(text_error("__\\5__"), ErrorKind::UnrecognizedEscape('5'));
        assert_eq!(text_error("abc\\"), ErrorKind::EscapeAtEnd);
        assert_eq!(
            text_error("__\\u123"),
            ErrorKind::MissingHexDigits {
                expected: 4,
                found: 3
            }
        );
        assert_eq!(
            text_error("\\U0001F6"),
            ErrorKind::MissingHexDigits {
                expected: 8,
                found: 6
            }
        );
        assert_eq!(text_error("__\\u123__"), ErrorKind::InvalidHexDigit('_'));
        assert_eq!(text_error("\\U00110000"), ErrorKind::InvalidCodePoint(0x110000));
        assert_eq!(text_error("\\U0000D800"), ErrorKind::InvalidCodePoint(0xD800));
    }

    #[test]
    fn test_escape_error_position() {
        let err = read_text("ab\n c\\x").unwrap_err();
        assert_eq!((err.line(), err.column()), (Some(2), Some(4)));
    }

    #[test]
    fn test_read_comment() {
        let ctx = ParseContext::default();
        let mut lexer = Lexer::for_str("[- comment -]", &ctx);
        assert_eq!(lexer.read_comment().unwrap().as_deref(), Some("[- comment -]"));

        let mut lexer = Lexer::for_str("[- [- nested -] -]", &ctx);
        assert_eq!(
            lexer.read_comment().unwrap().as_deref(),
            Some("[- [- nested -] -]")
        );
        assert!(!lexer.has_char());

        let mut lexer = Lexer::for_str("1[--]2", &ctx);
        assert_eq!(lexer.read_comment().unwrap(), None);
        lexer.read_node_text().unwrap();
        assert_eq!(lexer.read_comment().unwrap().as_deref(), Some("[--]"));
        assert_eq!(lexer.read_comment().unwrap(), None);
        lexer.read_node_text().unwrap();
        assert_eq!(lexer.read_comment().unwrap(), None);
    }

    #[test]
    fn test_node_start_is_not_a_comment() {
        let ctx = ParseContext::default();
        let mut lexer = Lexer::for_str("[a]", &ctx);
        assert_eq!(lexer.read_comment().unwrap(), None);
        assert!(lexer.is_at_node_start());
    }

    #[test]
    fn test_skip_comments() {
        let ctx = ParseContext::default();
        let mut lexer = Lexer::for_str("[- a -][- b [- c -] -]text", &ctx);
        lexer.skip_comments().unwrap();
        assert_eq!(lexer.read_node_text().unwrap().as_deref(), Some("text"));
    }

    #[test]
    fn test_unterminated_comment_reports_its_start() {
        let ctx = ParseContext::default();
        let err = Lexer::for_str("[- comment", &ctx).read_comment().unwrap_err();
        assert_eq!(
            err.kind(),
            Some(&ErrorKind::UnterminatedComment { line: 1, column: 1 })
        );

        let err = Lexer::for_str("[- [- nested -] -", &ctx)
            .read_comment()
            .unwrap_err();
        assert_eq!((err.line(), err.column()), (Some(1), Some(1)));

        let err = Lexer::for_str("[- a\n  [- nested -", &ctx)
            .read_comment()
            .unwrap_err();
        assert_eq!(
            err.kind(),
            Some(&ErrorKind::UnterminatedComment { line: 2, column: 3 })
        );
        assert_eq!((err.line(), err.column()), (Some(2), Some(3)));
    }

    #[test]
    fn test_deeply_nested_comment() {
        let ctx = ParseContext::default();
        let source = format!("{}{}", "[-".repeat(10_000), "-]".repeat(10_000));
        let comment = Lexer::for_str(&source, &ctx).read_comment().unwrap().unwrap();
        assert_eq!(comment.len(), source.len());
    }

    #[test]
    fn test_skip_whitespace() {
        let ctx = ParseContext::default();
        let mut lexer = Lexer::for_str(" \t\r\n\r\nx", &ctx);
        assert!(lexer.skip_whitespace_char().unwrap());
        assert!(lexer.skip_whitespace_char().unwrap());
        assert!(lexer.skip_whitespace_char().unwrap());
        assert_eq!(lexer.line(), 2);
        assert!(lexer.skip_whitespace().unwrap());
        assert_eq!(lexer.current_char(), Some('x'));
        assert_eq!((lexer.line(), lexer.column()), (3, 1));
        assert!(!lexer.skip_whitespace().unwrap());
    }
}
