//! Conversion of extracted units into persisted rows

use crate::extract::ExtractedUnit;
use crate::storage::prompts::choose_prompt;
use rand::Rng;

const CODE_OPEN: &str = "<code>\n";
const CODE_CLOSE: &str = "\n</code>";

/// One persisted (title, code, source) row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRecord {
    pub title: String,
    /// Code wrapped as `<code>\n...\n</code>`
    pub code: String,
    /// URL of the repository the code came from
    pub source: String,
}

impl SnippetRecord {
    /// Creates a record, wrapping `body` in code tags
    pub fn new(title: impl Into<String>, body: &str, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            code: wrap_code(body),
            source: source.into(),
        }
    }
}

/// Wraps a code body as `<code>\n{body}\n</code>`
pub fn wrap_code(body: &str) -> String {
    let mut code = String::with_capacity(body.len() + CODE_OPEN.len() + CODE_CLOSE.len());
    code.push_str(CODE_OPEN);
    code.push_str(body);
    code.push_str(CODE_CLOSE);
    code
}

/// Builds every row one source file contributes
///
/// Each documented unit yields two rows:
/// 1. title = documentation, code = source without documentation
/// 2. title = random instruction prefix + source without documentation,
///    code = full source
///
/// When any class is documented, one more row carries the whole file under
/// the concatenated class documentation.
pub fn build_records<R: Rng + ?Sized>(
    functions: &[ExtractedUnit],
    classes: &[ExtractedUnit],
    source: &str,
    file_text: &str,
    rng: &mut R,
) -> Vec<SnippetRecord> {
    let mut records = Vec::with_capacity((functions.len() + classes.len()) * 2 + 1);

    for unit in functions {
        push_unit_records(&mut records, unit, source, rng);
    }

    let mut class_docs: Vec<&str> = Vec::new();
    for unit in classes {
        if push_unit_records(&mut records, unit, source, rng) {
            class_docs.push(unit.documentation.trim());
        }
    }

    if !class_docs.is_empty() {
        records.push(SnippetRecord::new(class_docs.join("\n"), file_text, source));
    }

    records
}

fn push_unit_records<R: Rng + ?Sized>(
    records: &mut Vec<SnippetRecord>,
    unit: &ExtractedUnit,
    source: &str,
    rng: &mut R,
) -> bool {
    let documentation = unit.documentation.trim();
    if documentation.is_empty() {
        return false;
    }

    let with_doc = unit.source.trim();
    let without_doc = unit.source_without_documentation.trim();

    records.push(SnippetRecord::new(documentation, without_doc, source));
    records.push(SnippetRecord::new(
        format!("{}\n{}", choose_prompt(rng), without_doc),
        with_doc,
        source,
    ));
    true
}
