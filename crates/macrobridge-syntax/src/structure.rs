//! Structural checks the Python grammar accepts but the interpreter rejects.
//!
//! Tree-sitter's Python grammar is permissive: it keeps Python 2 statements,
//! lets an unexpected indent through as a plain statement, and turns a
//! missing suite into an empty `block`. This pass walks an error-free tree
//! and reports those shapes as issues so that such code is refused before
//! it reaches the host.

use tree_sitter::Node;

use crate::parser::SyntaxErrorInfo;

/// Walks `root` and returns every structural problem in document order.
pub(crate) fn check(root: Node<'_>, source: &str) -> Vec<SyntaxErrorInfo> {
    let mut walker = Walker {
        source,
        issues: Vec::new(),
    };
    walker.visit(root, Scope::Module);
    walker.issues
}

/// What encloses the node being visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Module,
    Class,
    Function,
    Lambda,
}

impl Scope {
    const fn allows_return(self) -> bool {
        matches!(self, Self::Function)
    }

    const fn allows_yield(self) -> bool {
        matches!(self, Self::Function | Self::Lambda)
    }
}

struct Walker<'s> {
    source: &'s str,
    issues: Vec<SyntaxErrorInfo>,
}

impl Walker<'_> {
    fn visit(&mut self, node: Node<'_>, scope: Scope) {
        match node.kind() {
            "module" => self.check_suite(node, Some(0)),
            "block" => self.check_block(node),
            "print_statement" => self.report(node, "Python 2 print statement; use print(...)"),
            "exec_statement" => self.report(node, "Python 2 exec statement; use exec(...)"),
            "return_statement" if !scope.allows_return() => {
                self.report(node, "'return' outside function");
            }
            "yield" if !scope.allows_yield() => self.report(node, "'yield' outside function"),
            "for_in_clause" => self.check_comprehension_iterable(node),
            _ => {}
        }

        let inner = match node.kind() {
            "function_definition" => Scope::Function,
            "class_definition" => Scope::Class,
            "lambda" => Scope::Lambda,
            _ => scope,
        };

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, inner);
        }
    }

    /// A suite must hold at least one statement, indented past its header.
    fn check_block(&mut self, block: Node<'_>) {
        let Some(header) = block.parent() else {
            return;
        };
        let Some(first) = statements(block).next() else {
            self.report(header, "expected an indented block");
            return;
        };

        let header_row = header.start_position().row;
        let header_column = header.start_position().column;
        if first.start_position().row > header_row && first.start_position().column <= header_column
        {
            self.report(first, "expected an indented block");
            return;
        }

        let expected = self.starts_line(first).then(|| first.start_position().column);
        self.check_suite(block, expected);
    }

    /// Every statement that opens a line must start at `expected`.
    fn check_suite(&mut self, suite: Node<'_>, expected: Option<usize>) {
        let Some(expected) = expected else {
            return;
        };
        for statement in statements(suite) {
            if !self.starts_line(statement) {
                continue;
            }
            let column = statement.start_position().column;
            if column > expected {
                self.report(statement, "unexpected indent");
            } else if column < expected {
                self.report(
                    statement,
                    "unindent does not match any outer indentation level",
                );
            }
        }
    }

    /// Python 3 needs parentheses around a tuple iterated by a comprehension.
    ///
    /// The grammar also folds `f(x for x in y, 1)` into a single generator
    /// whose iterable is `y, 1`, so this rule covers that call shape too.
    fn check_comprehension_iterable(&mut self, clause: Node<'_>) {
        let mut cursor = clause.walk();
        let comma = clause
            .children(&mut cursor)
            .find(|child| !child.is_named() && child.kind() == ",");
        if comma.is_some() {
            self.report(
                clause,
                "generator expression must be parenthesized or iterable must be a single expression",
            );
        }
    }

    /// Whether only whitespace precedes `node` on its first line.
    fn starts_line(&self, node: Node<'_>) -> bool {
        let start = node.start_byte();
        let line_start = start.saturating_sub(node.start_position().column);
        self.source
            .get(line_start..start)
            .is_some_and(|prefix| prefix.trim().is_empty())
    }

    fn report(&mut self, node: Node<'_>, message: &str) {
        self.issues
            .push(SyntaxErrorInfo::at_node(node, self.source, message));
    }
}

/// Statement children of a suite, skipping comments.
fn statements<'t>(suite: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    let mut cursor = suite.walk();
    let children: Vec<_> = suite
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children.into_iter()
}
