//! Tree builder
//!
//! Recursive descent over the [`Lexer`] primitives:
//!
//! ```text
//! document   := WS? node WS? END-OF-INPUT
//! node       := '[' name separator children ']'
//! separator  := WS-char | lookahead('[') | lookahead(']')
//! children   := ( COMMENT | text | node )*
//! ```
//!
//! The first violation aborts the parse; no partial tree is returned.

use std::io;

use tracing::{debug, trace};

use crate::error::{ErrorKind, Result};
use crate::lexer::Lexer;
use crate::node::{Document, NodeId};

/// Parse a whole document from a lexer positioned at the start of the input.
pub fn parse_document<I>(lexer: Lexer<'_, I>) -> Result<Document>
where
    I: Iterator<Item = io::Result<char>>,
{
    Parser {
        lexer,
        document: Document::new(),
    }
    .parse_root()
}

struct Parser<'ctx, I> {
    lexer: Lexer<'ctx, I>,
    document: Document,
}

impl<I> Parser<'_, I>
where
    I: Iterator<Item = io::Result<char>>,
{
    fn parse_root(mut self) -> Result<Document> {
        debug!(resource = ?self.lexer.context().resource, "parsing document");

        self.lexer.skip_whitespace()?;
        if self.parse_node(None, 1)?.is_none() {
            return Err(self.lexer.error(ErrorKind::MissingRootNode));
        }
        self.lexer.skip_whitespace()?;
        if self.lexer.has_char() {
            return Err(self.lexer.error(ErrorKind::TrailingContent));
        }

        debug!(nodes = self.document.len(), "parsed document");
        Ok(self.document)
    }

    /// Parse a node if the cursor is at a node start.
    ///
    /// `parent` is `None` for the root node.
    fn parse_node(&mut self, parent: Option<NodeId>, depth: usize) -> Result<Option<NodeId>> {
        if !self.lexer.read_node_start()? {
            return Ok(None);
        }
        let max_depth = self.lexer.context().max_depth;
        if depth > max_depth {
            return Err(self.lexer.error(ErrorKind::NestingTooDeep(max_depth)));
        }

        let (line, column) = (self.lexer.line(), self.lexer.column());
        let Some(name) = self.lexer.read_node_name()? else {
            return Err(self.lexer.error(ErrorKind::NameExpected));
        };
        self.require_separator()?;
        trace!(%name, depth, line, column, "node");

        let id = match parent {
            None => self.document.push_root(name),
            Some(parent) => self.document.append_branch(parent, name),
        };
        self.parse_children(id, depth)?;

        if !self.lexer.read_node_end()? {
            return Err(self.lexer.error(ErrorKind::NodeEndExpected));
        }
        Ok(Some(id))
    }

    /// A name must be followed by whitespace unless the body starts with a
    /// node or the node ends right away.
    fn require_separator(&mut self) -> Result<()> {
        if self.lexer.is_at_node_start()
            || self.lexer.is_at_node_end()
            || self.lexer.skip_whitespace_char()?
        {
            return Ok(());
        }
        Err(match self.lexer.current_char() {
            Some(c) => self.lexer.error(ErrorKind::IllegalCharacter(c)),
            None => self.lexer.error(ErrorKind::MoreTextExpected),
        })
    }

    fn parse_children(&mut self, parent: NodeId, depth: usize) -> Result<()> {
        loop {
            self.lexer.skip_comments()?;
            if !self.lexer.has_char() || self.lexer.is_at_node_end() {
                return Ok(());
            }

            if let Some(text) = self.lexer.read_node_text()? {
                self.document.append_text(parent, text);
            } else if self.parse_node(Some(parent), depth + 1)?.is_none() {
                // Text only stops at `[`, `]` or end of input; the last two return above.
                debug_assert!(false, "children loop stalled at {:?}", self.lexer.current_char());
                let c = self.lexer.current_char().unwrap_or_default();
                return Err(self.lexer.error(ErrorKind::InvalidCharacter(c)));
            }
        }
    }
}
