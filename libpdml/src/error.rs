//! Error types for PDML parsing.

use std::fmt;
use std::io;

use thiserror::Error;

/// Result type for PDML parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse context carrying the resource name and limits used while parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseContext {
    /// Name of the parsed resource (usually a file path), used in diagnostics.
    pub resource: Option<String>,
    /// Maximum nesting depth of nodes. The root node is at depth 1.
    pub max_depth: usize,
}

impl ParseContext {
    /// Nesting limit used unless overridden with [`ParseContext::with_max_depth`].
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    /// Create a new parse context.
    pub fn new(resource: Option<&str>) -> Self {
        Self {
            resource: resource.map(String::from),
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Wrap an I/O failure of the underlying source.
    pub(crate) fn io_error(&self, source: io::Error) -> ParseError {
        ParseError::Io {
            resource: self.resource.clone(),
            source,
        }
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new(None)
    }
}

/// The grammar violation found in a document.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input does not start with a node.
    #[error("A PDML document must start with a node (e.g. \"[root\").")]
    MissingRootNode,

    /// Something other than whitespace follows the root node.
    #[error("No more text expected.")]
    TrailingContent,

    /// A node start is not followed by a valid name.
    #[error("Valid node name expected.")]
    NameExpected,

    /// A node name is followed by a character that is not a separator.
    #[error("Illegal character '{0}'. A space, tab, new line, '[' or ']' must follow the node name.")]
    IllegalCharacter(char),

    /// The input ends right after a node name.
    #[error("More text expected.")]
    MoreTextExpected,

    /// A node body holds neither text nor a node at the cursor. Text accepts
    /// every character except node delimiters, so well-formed lexing never
    /// produces this.
    #[error("Invalid character '{0}'.")]
    InvalidCharacter(char),

    /// The input ends before a node is closed.
    #[error("Node end expected.")]
    NodeEndExpected,

    /// The escape character is the last character of the input.
    #[error("Expecting another character after the escape character '\\' at the end of the document.")]
    EscapeAtEnd,

    /// The escape character is followed by an unsupported character.
    #[error("Invalid character escape sequence \"\\{0}\".")]
    UnrecognizedEscape(char),

    /// The input ends inside a `\u` or `\U` escape.
    #[error("Expecting {expected} hex digits to define a Unicode escape sequence. But found only {found}.")]
    MissingHexDigits { expected: usize, found: usize },

    /// A `\u` or `\U` escape contains a non-hexadecimal character.
    #[error("Invalid hexadecimal character '{0}'. Only 0..9, a..f, and A..F are allowed.")]
    InvalidHexDigit(char),

    /// A `\U` escape names a value that is not a Unicode scalar value.
    #[error("Invalid Unicode code point U+{0:04X}.")]
    InvalidCodePoint(u32),

    /// A `\u` escape names a surrogate that is not part of a valid pair.
    #[error("Unpaired UTF-16 surrogate U+{0:04X} in Unicode escape sequence.")]
    UnpairedSurrogate(u32),

    /// A comment is still open at the end of the input.
    #[error("The comment starting at line {line}, column {column} is never closed.")]
    UnterminatedComment { line: u64, column: u64 },

    /// Nodes are nested deeper than [`ParseContext::max_depth`].
    #[error("Maximum nesting depth of {0} exceeded.")]
    NestingTooDeep(usize),
}

impl ErrorKind {
    /// Create an error located at a 1-based line and column.
    pub fn at(self, ctx: &ParseContext, line: u64, column: u64) -> ParseError {
        ParseError::Syntax(Diagnostic {
            kind: self,
            resource: ctx.resource.clone(),
            line: Some(line),
            column: Some(column),
        })
    }
}

/// A syntax error with its position in the source.
///
/// Rendered as `<resource> <line>,<column> <message>`; absent parts are left out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub resource: Option<String>,
    /// 1-based line number.
    pub line: Option<u64>,
    /// 1-based column number.
    pub column: Option<u64>,
}

impl Diagnostic {
    /// Create a diagnostic without resource or position.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            resource: None,
            line: None,
            column: None,
        }
    }

    /// The human readable message, without resource or position.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(resource) = &self.resource {
            write!(f, "{} ", resource)?;
        }
        if let Some(line) = self.line {
            write!(f, "{},", line)?;
        }
        if let Some(column) = self.column {
            write!(f, "{} ", column)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Diagnostic {}

/// Error type for PDML parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The document violates the PDML grammar.
    #[error(transparent)]
    Syntax(#[from] Diagnostic),

    /// The source could not be opened or read.
    #[error("{}{}", resource_prefix(.resource), .source)]
    Io {
        resource: Option<String>,
        source: io::Error,
    },
}

fn resource_prefix(resource: &Option<String>) -> String {
    match resource {
        Some(name) => format!("{}: ", name),
        None => String::new(),
    }
}

impl ParseError {
    /// The diagnostic of a syntax error.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            ParseError::Syntax(diagnostic) => Some(diagnostic),
            ParseError::Io { .. } => None,
        }
    }

    /// The grammar violation of a syntax error.
    pub fn kind(&self) -> Option<&ErrorKind> {
        self.diagnostic().map(|d| &d.kind)
    }

    /// Name of the resource being parsed, if known.
    pub fn resource(&self) -> Option<&str> {
        match self {
            ParseError::Syntax(diagnostic) => diagnostic.resource.as_deref(),
            ParseError::Io { resource, .. } => resource.as_deref(),
        }
    }

    /// 1-based line of a syntax error. I/O errors have no position.
    pub fn line(&self) -> Option<u64> {
        self.diagnostic().and_then(|d| d.line)
    }

    /// 1-based column of a syntax error. I/O errors have no position.
    pub fn column(&self) -> Option<u64> {
        self.diagnostic().and_then(|d| d.column)
    }
}
