//! JavaScript and TypeScript skeleton extraction.
//!
//! Line-oriented pattern matching rather than a full parse: declaration
//! headers and import targets carry most of the structural signal for
//! these languages.

use std::sync::LazyLock;

use regex::Regex;

use super::raw_head;

static DECLARATION_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+\w+",
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*\w+\s*\(",
        r"^\s*(?:export\s+)?const\s+\w+\s*=\s*(?:async\s+)?(?:\([^)]*\)|\w+)\s*=>",
        r"^\s*(?:export\s+)?(?:interface|type|enum)\s+\w+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("declaration regex is valid"))
    .collect()
});

static IMPORT_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:from|require\()\s*['"]([^'"]+)['"]"#).expect("import target regex is valid")
});

fn is_import_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("import ")
        || (trimmed.starts_with("const ") && trimmed.contains("require("))
}

/// Last path segment of an import target, without a leading extension split:
/// `./lib/parser.js` resolves to `parser.js`, a bare `react` stays `react`.
fn import_target(line: &str) -> String {
    match IMPORT_TARGET_RE.captures(line) {
        Some(caps) => {
            let target = &caps[1];
            target.rsplit('/').next().unwrap_or(target).to_string()
        }
        None => line.trim().to_string(),
    }
}

/// Extract declaration headers and import targets. Falls back to the raw
/// head of the file when no declarations match.
pub fn extract(content: &str) -> (String, Vec<String>) {
    let mut imports: Vec<String> = Vec::new();
    let mut declarations: Vec<String> = Vec::new();

    for line in content.lines() {
        if is_import_line(line) {
            imports.push(import_target(line));
            continue;
        }
        if DECLARATION_RES.iter().any(|re| re.is_match(line)) {
            declarations.push(line.trim_end().to_string());
        }
    }

    let text = if declarations.is_empty() {
        raw_head(content)
    } else {
        declarations.join("\n")
    };

    (text, imports)
}
