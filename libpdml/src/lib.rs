//! PDML (Practical Data and Markup Language) parser implementation.
//!
//! PDML is a compact markup made of bracket-delimited, named nodes that
//! contain text and other nodes:
//!
//! ```text
//! [doc
//!     [title Hello]
//!     [- a comment [- nested -] -]
//!     [p Some \[escaped\] text and a [b bold] word.]
//! ]
//! ```
//!
//! # Parsing Pipeline
//!
//! 1. **Character stream**: Pulls characters from a string or reader and
//!    tracks line and column numbers.
//!
//! 2. **Lexer**: Recognizes delimiters, names, text (decoding escape
//!    sequences), comments and whitespace.
//!
//! 3. **Tree builder**: Drives the lexer recursively and assembles the
//!    [`Document`] tree.

mod error;
pub mod lexer;
mod node;
mod parser;
pub mod stream;
pub mod visit;

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub use error::{Diagnostic, ErrorKind, ParseContext, ParseError, Result};
pub use node::{Descendants, Document, Node, NodeId, NodeKind, PATH_SEPARATOR};

use lexer::Lexer;
use stream::Utf8Chars;

/// Parse a PDML document from a string.
///
/// # Example
///
/// ```
/// use libpdml::parse;
///
/// let doc = parse("[root [child foo bar]]").unwrap();
/// let child = doc.root().children().next().unwrap();
/// assert_eq!(child.path(), "root/child");
/// ```
pub fn parse(input: &str) -> Result<Document> {
    parse_with_resource(input, None)
}

/// Parse a PDML document from a string with a resource name for error messages.
pub fn parse_with_resource(input: &str, resource: Option<&str>) -> Result<Document> {
    parse_with_context(input, &ParseContext::new(resource))
}

/// Parse a PDML document from a string with explicit parse settings.
pub fn parse_with_context(input: &str, ctx: &ParseContext) -> Result<Document> {
    parser::parse_document(Lexer::for_str(input, ctx))
}

/// Parse a UTF-8 encoded PDML document from a reader.
///
/// Read failures and invalid UTF-8 are reported as [`ParseError::Io`].
pub fn parse_reader<R: Read>(reader: R, ctx: &ParseContext) -> Result<Document> {
    parser::parse_document(Lexer::new(Utf8Chars::new(reader), ctx)?)
}

/// Parse a UTF-8 encoded PDML file.
///
/// The path is used as the resource name in diagnostics.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let ctx = ParseContext::new(Some(&path.display().to_string()));
    let file = File::open(path).map_err(|e| ctx.io_error(e))?;
    parse_reader(file, &ctx)
}
