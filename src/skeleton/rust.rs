//! Rust skeleton extraction using tree-sitter.

use tree_sitter::Node;

use super::{node_text, raw_head, with_rust_parser};

/// Extract a rendered skeleton and import roots from Rust source.
pub fn extract(content: &str) -> Result<(String, Vec<String>), String> {
    with_rust_parser(|parser| {
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| "failed to parse".to_string())?;

        let root = tree.root_node();
        let mut imports: Vec<String> = Vec::new();
        let mut parts: Vec<String> = Vec::new();

        if let Some(doc) = module_doc_first_line(content) {
            parts.push(doc);
        }

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "use_declaration" => {
                    if let Some(seg) = import_root(&node_text(child, content)) {
                        imports.push(seg);
                    }
                }
                "function_item" => {
                    parts.push(with_doc(child, content, function_signature(child, content)));
                }
                "struct_item" | "enum_item" | "trait_item" | "impl_item" | "mod_item"
                | "union_item" => {
                    parts.push(with_doc(child, content, header_line(&node_text(child, content))));
                }
                "type_item" | "const_item" | "static_item" => {
                    let first = node_text(child, content)
                        .lines()
                        .next()
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    parts.push(first);
                }
                _ => {}
            }
        }

        // A file of only `use`/`pub use` lines renders nothing; keep the
        // imports so re-export modules still feed the graph.
        if parts.is_empty() {
            return Ok((raw_head(content), imports));
        }

        Ok((parts.join("\n\n"), imports))
    })?
}

/// First `//!` line of the module, if any.
fn module_doc_first_line(content: &str) -> Option<String> {
    content
        .lines()
        .take_while(|l| l.trim().starts_with("//!") || l.trim().is_empty())
        .find(|l| l.trim().starts_with("//!"))
        .map(|l| l.trim().to_string())
}

/// Prepend the first `///` line of the item's doc block, if present.
fn with_doc(node: Node, content: &str, rendered: String) -> String {
    match doc_first_line(node, content) {
        Some(doc) => format!("{doc}\n{rendered}"),
        None => rendered,
    }
}

fn doc_first_line(node: Node, content: &str) -> Option<String> {
    let mut sib = node.prev_sibling()?;
    let mut first: Option<Node> = None;

    loop {
        let is_doc =
            sib.kind() == "line_comment" && node_text(sib, content).starts_with("///");
        let is_attr = sib.kind() == "attribute_item";

        if is_doc {
            first = Some(sib);
        } else if !is_attr {
            break;
        }

        match sib.prev_sibling() {
            Some(prev) => sib = prev,
            None => break,
        }
    }

    first.map(|n| node_text(n, content).trim().to_string())
}

/// Signature up to the body, with the body replaced by a placeholder.
fn function_signature(node: Node, content: &str) -> String {
    let body = node
        .children(&mut node.walk())
        .find(|c| c.kind() == "block");

    match body {
        Some(body) => {
            let sig = content[node.start_byte()..body.start_byte()].trim_end();
            format!("{sig} {{ ... }}")
        }
        None => node_text(node, content).trim().to_string(),
    }
}

/// Item header up to its first brace, with the body elided.
fn header_line(text: &str) -> String {
    match text.find('{') {
        Some(brace) => format!("{} {{ ... }}", text[..brace].trim_end()),
        None => text.trim().to_string(),
    }
}

/// Root segment of a `use` path, with `crate`/`self`/`super` stripped so
/// intra-crate imports resolve to sibling modules.
fn import_root(text: &str) -> Option<String> {
    let mut path = text
        .trim()
        .trim_start_matches("pub ")
        .trim_start_matches("use ")
        .trim_end_matches(';')
        .trim()
        .trim_start_matches("::");

    loop {
        let stripped = path
            .strip_prefix("crate::")
            .or_else(|| path.strip_prefix("self::"))
            .or_else(|| path.strip_prefix("super::"));
        match stripped {
            Some(rest) => path = rest,
            None => break,
        }
    }

    let root: String = path
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    if root.is_empty() {
        None
    } else {
        Some(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_body_elided() {
        let code = r#"
/// Say hello.
pub fn greet(name: &str) -> String {
    format!("Hello, {name}")
}
"#;
        let (text, _) = extract(code).unwrap();
        assert!(text.contains("/// Say hello."));
        assert!(text.contains("pub fn greet(name: &str) -> String { ... }"));
        assert!(!text.contains("format!"));
    }

    #[test]
    fn test_struct_and_impl_headers() {
        let code = r#"
pub struct Config {
    pub name: String,
}

impl Config {
    pub fn new() -> Self {
        Self { name: String::new() }
    }
}
"#;
        let (text, _) = extract(code).unwrap();
        assert!(text.contains("pub struct Config { ... }"));
        assert!(text.contains("impl Config { ... }"));
    }

    #[test]
    fn test_module_doc_first_line() {
        let code = "//! Widget registry.\n//! More detail.\n\npub fn f() {}\n";
        let (text, _) = extract(code).unwrap();
        assert!(text.starts_with("//! Widget registry."));
        assert!(!text.contains("More detail"));
    }

    #[test]
    fn test_import_roots() {
        let code = "
use std::collections::BTreeMap;
use crate::tokens::count_tokens;
use super::helpers;
use serde::{Serialize, Deserialize};

pub fn f() {}
";
        let (_, imports) = extract(code).unwrap();
        assert_eq!(imports, vec!["std", "tokens", "helpers", "serde"]);
    }

    #[test]
    fn test_empty_file_degrades_to_empty_skeleton() {
        let (text, imports) = extract("").unwrap();
        assert!(text.is_empty());
        assert!(imports.is_empty());
    }

    #[test]
    fn test_reexport_module_keeps_imports() {
        let code = "pub use crate::filter::classify;\npub use crate::tokens::count_tokens;\n";
        let (text, imports) = extract(code).unwrap();
        assert_eq!(imports, vec!["filter", "tokens"]);
        assert!(text.contains("pub use crate::filter::classify;"));
    }
}
