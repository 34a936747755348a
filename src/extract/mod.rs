//! Snippet extraction module
//!
//! Turns the text of one Python source file into documented units:
//! - Parses with tree-sitter and gives up on files that do not parse cleanly
//! - Finds every function and class whose body opens with a string literal
//! - Reconstructs each definition's source with and without that literal
//! - Normalizes the literal into wrapped documentation text

mod docstring;
mod wrap;

pub use docstring::{normalize_documentation, strip_documentation, CONTINUATION_INDENT};
pub use wrap::{fill, wrap};

use thiserror::Error;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator};

/// Extension of files the extractor understands
pub const SOURCE_EXTENSION: &str = ".py";

/// Files whose repository path starts with this are packaging scripts, not library code
pub const EXCLUDED_PREFIX: &str = "setup";

/// Statements the grammar still accepts but Python 3 rejects
const LEGACY_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

const DEFINITIONS_QUERY: &str = r#"
(function_definition) @function
(class_definition) @class
"#;

/// Errors raised while setting up the parser
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to load grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("Failed to compile definitions query: {0}")]
    Query(#[from] tree_sitter::QueryError),
}

/// The kind of a documented definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Function,
    Class,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
        }
    }
}

/// A documented function or class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedUnit {
    pub kind: UnitKind,
    pub name: String,
    /// Normalized, wrapped documentation; never empty
    pub documentation: String,
    /// Full source of the definition, decorators included
    pub source: String,
    /// Source with documentation literals removed
    pub source_without_documentation: String,
}

/// Every documented unit found in one file, split by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFile {
    pub functions: Vec<ExtractedUnit>,
    pub classes: Vec<ExtractedUnit>,
}

impl ExtractedFile {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.classes.is_empty()
    }
}

/// Returns true if a repository path names a source file worth extracting
pub fn is_source_file(path: &str) -> bool {
    path.ends_with(SOURCE_EXTENSION) && !path.starts_with(EXCLUDED_PREFIX)
}

/// Tree-sitter based snippet extractor
///
/// Owns its parser, so each worker keeps one instance.
pub struct SnippetExtractor {
    parser: Parser,
    query: Query,
    wrap_width: usize,
}

impl SnippetExtractor {
    /// Creates an extractor wrapping documentation at `wrap_width` columns
    pub fn new(wrap_width: usize) -> Result<Self, ExtractError> {
        let grammar: Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser.set_language(&grammar)?;
        let query = Query::new(&grammar, DEFINITIONS_QUERY)?;

        Ok(Self {
            parser,
            query,
            wrap_width,
        })
    }

    pub fn wrap_width(&self) -> usize {
        self.wrap_width
    }

    /// Extracts documented functions (methods and nested functions included)
    pub fn extract_functions(&mut self, text: &str) -> Vec<ExtractedUnit> {
        self.extract(text).functions
    }

    /// Extracts documented classes (nested classes included)
    pub fn extract_classes(&mut self, text: &str) -> Vec<ExtractedUnit> {
        self.extract(text).classes
    }

    /// Parses `text` once and extracts both functions and classes
    ///
    /// Text that does not parse cleanly, or that only parses as Python 2,
    /// yields an empty result.
    pub fn extract(&mut self, text: &str) -> ExtractedFile {
        let Some(tree) = self.parser.parse(text, None) else {
            return ExtractedFile::default();
        };

        let root = tree.root_node();
        if root.has_error() {
            tracing::trace!("Skipping unparseable source ({} bytes)", text.len());
            return ExtractedFile::default();
        }
        if contains_legacy_statement(root) {
            tracing::trace!("Skipping Python 2 source ({} bytes)", text.len());
            return ExtractedFile::default();
        }

        let mut file = ExtractedFile::default();
        let mut cursor = QueryCursor::new();
        let capture_names = self.query.capture_names();
        let mut matches = cursor.matches(&self.query, root, text.as_bytes());

        while let Some(match_) = matches.next() {
            for cap in match_.captures {
                let kind = match capture_names[cap.index as usize] {
                    "function" => UnitKind::Function,
                    "class" => UnitKind::Class,
                    _ => continue,
                };

                if let Some(unit) = build_unit(cap.node, kind, text, self.wrap_width) {
                    match kind {
                        UnitKind::Function => file.functions.push(unit),
                        UnitKind::Class => file.classes.push(unit),
                    }
                }
            }
        }

        file
    }
}

fn build_unit(node: Node<'_>, kind: UnitKind, text: &str, wrap_width: usize) -> Option<ExtractedUnit> {
    let src = text.as_bytes();
    let literal = documentation_literal(node, src)?;
    let raw_literal = literal.utf8_text(src).ok()?;

    let documentation = normalize_documentation(raw_literal, wrap_width);
    if documentation.is_empty() {
        return None;
    }

    let name = node
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(src).ok())
        .unwrap_or_default()
        .to_string();

    let span = definition_span(node);
    let column = span.start_position().column;
    let source = dedent(&text[span.start_byte()..span.end_byte()], column);

    // Offsets of the literal inside the dedented source
    let literal_start = dedent(&text[span.start_byte()..literal.start_byte()], column).len();
    let literal_end = dedent(&text[span.start_byte()..literal.end_byte()], column).len();
    let source_without_documentation =
        strip_documentation(&source, literal_start..literal_end);

    Some(ExtractedUnit {
        kind,
        name,
        documentation,
        source,
        source_without_documentation,
    })
}

/// Finds the string literal opening a definition's body, if any
fn documentation_literal<'t>(node: Node<'t>, src: &[u8]) -> Option<Node<'t>> {
    let body = node.child_by_field_name("body")?;

    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }

    let mut cursor = first.walk();
    let mut expressions = first
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment");
    let literal = expressions.next()?;
    if expressions.next().is_some() {
        return None;
    }

    let is_text = match literal.kind() {
        "string" => is_text_string(literal, src),
        "concatenated_string" => {
            let mut cursor = literal.walk();
            let all_text = literal
                .named_children(&mut cursor)
                .filter(|part| part.kind() != "comment")
                .all(|part| part.kind() == "string" && is_text_string(part, src));
            all_text
        }
        _ => false,
    };

    is_text.then_some(literal)
}

/// Byte and f-strings never count as documentation
fn is_text_string(literal: Node<'_>, src: &[u8]) -> bool {
    let Ok(text) = literal.utf8_text(src) else {
        return false;
    };
    !text
        .chars()
        .take_while(|c| *c != '"' && *c != '\'')
        .any(|c| matches!(c, 'f' | 'F' | 'b' | 'B'))
}

/// Returns true if any node in the tree is a Python 2 only statement
fn contains_legacy_statement(root: Node<'_>) -> bool {
    let mut cursor = root.walk();
    loop {
        if LEGACY_STATEMENTS.contains(&cursor.node().kind()) {
            return true;
        }
        if cursor.goto_first_child() || cursor.goto_next_sibling() {
            continue;
        }
        loop {
            if !cursor.goto_parent() {
                return false;
            }
            if cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

/// The node whose text is a definition's source, decorators included
fn definition_span(node: Node<'_>) -> Node<'_> {
    match node.parent() {
        Some(parent) if parent.kind() == "decorated_definition" => parent,
        _ => node,
    }
}

/// Removes up to `column` leading blanks from every line after the first
fn dedent(raw: &str, column: usize) -> String {
    let mut lines = raw.split('\n');
    let mut out = String::with_capacity(raw.len());
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        out.push_str(dedent_line(line, column));
    }
    out
}

fn dedent_line(line: &str, column: usize) -> &str {
    let removable = line
        .bytes()
        .take(column)
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    &line[removable..]
}
