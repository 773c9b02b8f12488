//! Python skeleton extraction using tree-sitter.

use tree_sitter::Node;

use super::{find_child_by_kind, node_text, raw_head, with_python_parser};

/// Extract a rendered skeleton and import roots from Python source.
pub fn extract(content: &str) -> Result<(String, Vec<String>), String> {
    with_python_parser(|parser| {
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| "failed to parse".to_string())?;

        let root = tree.root_node();
        let mut imports: Vec<String> = Vec::new();
        let mut parts: Vec<String> = Vec::new();

        let mut cursor = root.walk();
        for (idx, child) in root.children(&mut cursor).enumerate() {
            match child.kind() {
                "expression_statement" if idx == 0 => {
                    if let Some(doc) = docstring_first_line(child, content) {
                        parts.push(format!("\"\"\"{doc}\"\"\""));
                    }
                }
                "import_statement" => {
                    collect_import_roots(&node_text(child, content), &mut imports);
                }
                "import_from_statement" => {
                    if let Some(root_seg) = from_import_root(&node_text(child, content)) {
                        imports.push(root_seg);
                    }
                }
                "function_definition" => {
                    parts.push(render_function(child, content, ""));
                }
                "decorated_definition" => {
                    if let Some(def) = find_child_by_kind(child, "function_definition") {
                        parts.push(render_function(def, content, ""));
                    } else if let Some(class) = find_child_by_kind(child, "class_definition") {
                        parts.push(render_class(class, content));
                    }
                }
                "class_definition" => {
                    parts.push(render_class(child, content));
                }
                _ => {}
            }
        }

        // Re-export modules have imports but nothing to render. Keep the
        // imports so they still feed the graph, and fall back on text only.
        if parts.is_empty() {
            return Ok((raw_head(content), imports));
        }

        Ok((parts.join("\n\n"), imports))
    })?
}

/// `import a.b, c` yields the roots `a` and `c`.
fn collect_import_roots(text: &str, imports: &mut Vec<String>) {
    let Some(rest) = text.trim().strip_prefix("import ") else {
        return;
    };
    for item in rest.split(',') {
        let name = item.trim().split(" as ").next().unwrap_or_default();
        if let Some(root) = name.split('.').next().filter(|s| !s.is_empty()) {
            imports.push(root.to_string());
        }
    }
}

/// `from a.b import c` yields `a`; `from .utils import c` yields `utils`.
fn from_import_root(text: &str) -> Option<String> {
    let rest = text.trim().strip_prefix("from ")?;
    let module = rest.split(" import").next()?.trim().trim_start_matches('.');
    module
        .split('.')
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn render_function(node: Node, content: &str, indent: &str) -> String {
    let name = find_child_by_kind(node, "identifier")
        .map(|n| node_text(n, content))
        .unwrap_or_default();
    let params = find_child_by_kind(node, "parameters")
        .map(|n| collapse_whitespace(&node_text(n, content)))
        .unwrap_or_else(|| "()".to_string());
    let ret = node
        .child_by_field_name("return_type")
        .map(|n| format!(" -> {}", collapse_whitespace(&node_text(n, content))))
        .unwrap_or_default();
    let prefix = if is_async(node, content) { "async def" } else { "def" };

    let mut lines = vec![format!("{indent}{prefix} {name}{params}{ret}:")];
    if let Some(doc) = body_docstring(node, content) {
        lines.push(format!("{indent}    \"\"\"{doc}\"\"\""));
    }
    lines.push(format!("{indent}    ..."));
    lines.join("\n")
}

fn render_class(node: Node, content: &str) -> String {
    let name = find_child_by_kind(node, "identifier")
        .map(|n| node_text(n, content))
        .unwrap_or_default();

    let mut lines = vec![format!("class {name}:")];
    if let Some(doc) = body_docstring(node, content) {
        lines.push(format!("    \"\"\"{doc}\"\"\""));
    }

    let mut rendered_any = false;
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            let def = match child.kind() {
                "function_definition" => Some(child),
                "decorated_definition" => find_child_by_kind(child, "function_definition"),
                _ => None,
            };
            if let Some(def) = def {
                lines.push(render_function(def, content, "    "));
                rendered_any = true;
            }
        }
    }

    if !rendered_any && lines.len() == 1 {
        lines.push("    ...".to_string());
    }
    lines.join("\n")
}

/// First line of the docstring of a function or class body, if present.
fn body_docstring(node: Node, content: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    docstring_first_line(first, content)
}

fn docstring_first_line(stmt: Node, content: &str) -> Option<String> {
    let string = find_child_by_kind(stmt, "string")?;
    let text = node_text(string, content);
    let inner = text
        .trim_start_matches(['r', 'b', 'u', 'f'])
        .trim_start_matches(['"', '\''])
        .trim_end_matches(['"', '\'']);
    inner
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.to_string())
}

fn is_async(node: Node, content: &str) -> bool {
    node_text(node, content).starts_with("async ")
}

fn collapse_whitespace(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace("( ", "(").replace(" )", ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_signature_with_docstring() {
        let code = r#"
def fetch(url: str, timeout: int = 30) -> bytes:
    """Fetch a URL.

    Longer explanation.
    """
    return b""
"#;
        let (text, _) = extract(code).unwrap();
        assert!(text.contains("def fetch(url: str, timeout: int = 30) -> bytes:"));
        assert!(text.contains("\"\"\"Fetch a URL.\"\"\""));
        assert!(text.contains("    ..."));
        assert!(!text.contains("Longer explanation"));
        assert!(!text.contains("return"));
    }

    #[test]
    fn test_class_with_methods() {
        let code = r#"
class Store:
    """Key-value store."""

    def get(self, key):
        return self.data[key]

    async def put(self, key, value):
        self.data[key] = value
"#;
        let (text, _) = extract(code).unwrap();
        assert!(text.contains("class Store:"));
        assert!(text.contains("    \"\"\"Key-value store.\"\"\""));
        assert!(text.contains("    def get(self, key):"));
        assert!(text.contains("    async def put(self, key, value):"));
        assert!(!text.contains("self.data[key]"));
    }

    #[test]
    fn test_module_docstring_first_line() {
        let code = "\"\"\"HTTP helpers.\n\nDetails.\n\"\"\"\n\ndef f():\n    pass\n";
        let (text, _) = extract(code).unwrap();
        assert!(text.starts_with("\"\"\"HTTP helpers.\"\"\""));
        assert!(!text.contains("Details"));
    }

    #[test]
    fn test_import_roots() {
        let code = "
import os
import os.path
from collections import OrderedDict
from .utils import helper
import json, sys

def f():
    pass
";
        let (_, imports) = extract(code).unwrap();
        assert_eq!(imports, vec!["os", "os", "collections", "utils", "json", "sys"]);
    }

    #[test]
    fn test_no_definitions_falls_back_to_raw_head() {
        let code = "x = 1\n";
        let (text, imports) = extract(code).unwrap();
        assert_eq!(text, "x = 1");
        assert!(imports.is_empty());
    }

    #[test]
    fn test_reexport_module_keeps_imports() {
        let code = "import os\nimport sys\nfrom collections import OrderedDict\n";
        let (text, imports) = extract(code).unwrap();
        assert_eq!(imports, vec!["os", "sys", "collections"]);
        assert!(text.contains("import os"));
    }
}
