//! Tree-sitter Python parsing with error recovery.
//!
//! Macros are Python source. This wrapper exposes the parsed tree together
//! with every ERROR or MISSING node the grammar produced, converted to
//! one-based positions for user-facing messages. A tree without such nodes
//! is then checked for structure the grammar tolerates but Python rejects.

use crate::error::SyntaxError;
use crate::structure;

/// Context snippets longer than this are truncated.
const CONTEXT_LIMIT: usize = 50;

/// Result of parsing macro source.
///
/// Tree-sitter is error-tolerant, so a tree is produced even for broken
/// source.
#[derive(Debug)]
pub(crate) struct ParseResult {
    tree: tree_sitter::Tree,
    source: String,
}

impl ParseResult {
    /// Collects every syntax error in document order.
    ///
    /// Grammar errors come first; structural problems are only reported
    /// once the tree is free of them.
    #[must_use]
    pub(crate) fn errors(&self) -> Vec<SyntaxErrorInfo> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return structure::check(root, &self.source);
        }
        let mut errors = Vec::new();
        collect_error_nodes(root, &self.source, &mut errors);
        errors
    }
}

/// A syntax error located in the parsed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxErrorInfo {
    /// One-based line where the error starts.
    pub line: u32,
    /// One-based column where the error starts.
    pub column: u32,
    /// Snippet of the offending source.
    pub context: String,
    /// Human-readable description.
    pub message: String,
}

impl SyntaxErrorInfo {
    fn from_node(node: tree_sitter::Node<'_>, source: &str) -> Self {
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "invalid syntax".to_owned()
        };
        Self::at_node(node, source, &message)
    }

    pub(crate) fn at_node(node: tree_sitter::Node<'_>, source: &str, message: &str) -> Self {
        let context = source
            .get(node.byte_range())
            .map(snippet)
            .unwrap_or_default();

        let (line, column) = point_to_one_based(node.start_position());

        Self {
            line,
            column,
            context,
            message: message.to_owned(),
        }
    }
}

fn snippet(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > CONTEXT_LIMIT {
        let truncated: String = first_line.chars().take(CONTEXT_LIMIT - 3).collect();
        format!("{truncated}...")
    } else {
        first_line.to_owned()
    }
}

/// Tree-sitter zero-based positions become one-based display coordinates.
fn point_to_one_based(pos: tree_sitter::Point) -> (u32, u32) {
    let line = u32::try_from(pos.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(pos.column.saturating_add(1)).unwrap_or(u32::MAX);
    (line, column)
}

/// Tree-sitter parser configured for Python.
pub(crate) struct Parser {
    inner: tree_sitter::Parser,
}

impl Parser {
    /// Creates a parser with the Python grammar loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar is incompatible with the linked
    /// Tree-sitter runtime.
    pub(crate) fn new() -> Result<Self, SyntaxError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| SyntaxError::parser_init(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parses `source`; syntax errors are reported through the result.
    ///
    /// # Errors
    ///
    /// Returns an error only if Tree-sitter produces no tree at all.
    pub(crate) fn parse(&mut self, source: &str) -> Result<ParseResult, SyntaxError> {
        let tree = self
            .inner
            .parse(source, None)
            .ok_or_else(|| SyntaxError::parse("parser returned no tree"))?;

        Ok(ParseResult {
            tree,
            source: source.to_owned(),
        })
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser").finish_non_exhaustive()
    }
}

fn collect_error_nodes(
    node: tree_sitter::Node<'_>,
    source: &str,
    errors: &mut Vec<SyntaxErrorInfo>,
) {
    if node.is_error() || node.is_missing() {
        errors.push(SyntaxErrorInfo::from_node(node, source));
        // Nested errors inside an ERROR node only repeat the same location.
        return;
    }
    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, source, errors);
    }
}
