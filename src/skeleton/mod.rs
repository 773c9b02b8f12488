//! Skeleton extraction — compact structural summaries per source file.
//!
//! Three tiers of fidelity, selected by file extension:
//!
//! - **Structured**: tree-sitter parses for Rust and Python, emitting import
//!   roots and one-line signatures with bodies elided.
//! - **Pattern**: line-anchored regexes for the JS/TS family.
//! - **Generic**: cross-language declaration keywords for everything else.
//!
//! Extraction never fails: any parse problem degrades to the first
//! [`MAX_FALLBACK_LINES`] lines of raw content with no imports.

mod javascript;
mod python;
mod rust;

use std::cell::RefCell;
use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::{Node, Parser};

/// Raw-content fallback keeps this many leading lines.
pub const MAX_FALLBACK_LINES: usize = 60;

/// Generic tier scans at most this many lines.
const GENERIC_SCAN_LINES: usize = 300;

/// Generic tier needs at least this many hits before trusting itself.
const GENERIC_MIN_HITS: usize = 3;

// Thread-local parser caching to avoid re-initialization overhead.
// Parser initialization can fail (grammar load); library code stays
// panic-free throughout.
thread_local! {
    static RUST_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static PYTHON_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn init_rust_parser() -> Result<Parser, ()> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_rust::LANGUAGE.into())
        .map_err(|_| ())?;
    Ok(p)
}

fn init_python_parser() -> Result<Parser, ()> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|_| ())?;
    Ok(p)
}

fn with_cached_parser<F, R>(
    cell: &'static std::thread::LocalKey<RefCell<Option<Parser>>>,
    init: fn() -> Result<Parser, ()>,
    f: F,
) -> Result<R, String>
where
    F: FnOnce(&mut Parser) -> R,
{
    cell.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(init().map_err(|()| "failed to initialize parser".to_string())?);
        }

        let parser = slot
            .as_mut()
            .ok_or_else(|| "failed to initialize parser".to_string())?;
        Ok(f(parser))
    })
}

/// Execute a function with a cached Rust parser.
pub(crate) fn with_rust_parser<F, R>(f: F) -> Result<R, String>
where
    F: FnOnce(&mut Parser) -> R,
{
    with_cached_parser(&RUST_PARSER, init_rust_parser, f)
}

/// Execute a function with a cached Python parser.
pub(crate) fn with_python_parser<F, R>(f: F) -> Result<R, String>
where
    F: FnOnce(&mut Parser) -> R,
{
    with_cached_parser(&PYTHON_PARSER, init_python_parser, f)
}

/// Find a child node by kind.
pub(crate) fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    node.children(&mut node.walk()).find(|c| c.kind() == kind)
}

/// Extract node text from content.
pub(crate) fn node_text(node: Node, content: &str) -> String {
    content[node.byte_range()].to_string()
}

/// Structural summary of one source file.
///
/// A pure function of the file's content: same input, same skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    /// Repository-relative path.
    pub path: String,
    /// Rendered skeleton text (signatures, declarations, doc first-lines).
    pub text: String,
    /// Import identifiers in source order.
    pub imports: Vec<String>,
}

fn extension(path: &str) -> String {
    match path.rfind('.') {
        Some(dot) => path[dot..].to_lowercase(),
        None => String::new(),
    }
}

/// First `MAX_FALLBACK_LINES` lines of raw content.
fn raw_head(content: &str) -> String {
    content
        .lines()
        .take(MAX_FALLBACK_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

static GENERIC_DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:def |fn |func |class |struct |pub |package |module |type |interface |impl |enum |#include |using |namespace )",
    )
    .expect("generic declaration regex is valid")
});

/// Generic tier: keep declaration-looking and comment-opening lines from the
/// head of the file. No imports.
fn extract_generic(content: &str) -> (String, Vec<String>) {
    let mut meaningful: Vec<&str> = Vec::new();

    for line in content.lines().take(GENERIC_SCAN_LINES) {
        let stripped = line.trim();
        if GENERIC_DECLARATION_RE.is_match(line)
            || stripped.starts_with("//")
            || stripped.starts_with('#')
            || stripped.starts_with("/*")
        {
            meaningful.push(stripped);
        }
    }

    if meaningful.len() < GENERIC_MIN_HITS {
        return (raw_head(content), Vec::new());
    }

    (meaningful.join("\n"), Vec::new())
}

/// Extract a structural skeleton from a source file.
///
/// Never raises: parse failures fall back to the raw head of the file with
/// an empty import list.
pub fn extract_skeleton(path: &str, content: &str) -> Skeleton {
    let ext = extension(path);

    let result = match ext.as_str() {
        ".rs" => rust::extract(content),
        ".py" | ".pyw" => python::extract(content),
        ".js" | ".jsx" | ".ts" | ".tsx" | ".mjs" | ".cjs" => Ok(javascript::extract(content)),
        _ => Ok(extract_generic(content)),
    };

    let (text, imports) = result.unwrap_or_else(|_| (raw_head(content), Vec::new()));

    Skeleton {
        path: path.to_string(),
        text,
        imports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("src/main.rs"), ".rs");
        assert_eq!(extension("a/B.PY"), ".py");
        assert_eq!(extension("Makefile"), "");
    }

    #[test]
    fn test_generic_tier_collects_declarations() {
        let code = "\
// frontmatter comment
package main

func Run() error {
\treturn nil
}

type Config struct {
\tName string
}
";
        let sk = extract_skeleton("cmd/run.go", code);
        assert!(sk.text.contains("func Run() error {"));
        assert!(sk.text.contains("type Config struct {"));
        assert!(!sk.text.contains("return nil"));
        assert!(sk.imports.is_empty());
    }

    #[test]
    fn test_generic_tier_falls_back_below_three_hits() {
        let content = "just\nsome\nplain\nprose\nwith no declarations\n";
        let sk = extract_skeleton("notes.txt", content);
        assert_eq!(sk.text, raw_head(content));
    }

    #[test]
    fn test_fallback_caps_line_count() {
        let content = (0..200).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let sk = extract_skeleton("data.csv", &content);
        assert_eq!(sk.text.lines().count(), MAX_FALLBACK_LINES);
    }

    #[test]
    fn test_init_module_keeps_import_roots() {
        let sk = extract_skeleton(
            "pkg/__init__.py",
            "import os\nimport sys\nfrom collections import OrderedDict\n",
        );
        assert_eq!(sk.imports, vec!["os", "sys", "collections"]);
    }

    #[test]
    fn test_skeleton_is_deterministic() {
        let code = "def f(x: int) -> int:\n    return x\n";
        let a = extract_skeleton("m.py", code);
        let b = extract_skeleton("m.py", code);
        assert_eq!(a, b);
    }
}
