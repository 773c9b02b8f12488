//! Context assembly — renders budgeted slots into one labeled text block.
//!
//! Purely deterministic rendering; every truncation and scoring decision has
//! already happened by the time content reaches this module.

use crate::budget::BudgetedContent;

/// Human-readable section header per slot name.
const HEADERS: &[(&str, &str)] = &[
    ("languages", "## Repository Languages"),
    ("readme", "## README"),
    ("config", "## Configuration / Metadata Files"),
    ("tree", "## Directory Structure"),
    ("source", "## Key Source Files (Skeletons)"),
];

const SECTION_SEPARATOR: &str = "\n\n---\n\n";

fn header_for(name: &str) -> String {
    HEADERS
        .iter()
        .find(|(slot, _)| *slot == name)
        .map(|(_, header)| (*header).to_string())
        .unwrap_or_else(|| format!("## {}", title_case(name)))
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Combine all non-empty budget slots into a single structured context block.
pub fn assemble(budget: &BudgetedContent) -> String {
    let sections: Vec<String> = budget
        .slots
        .iter()
        .filter(|slot| !slot.content.is_empty())
        .map(|slot| format!("{}\n\n{}", header_for(slot.name), slot.content))
        .collect();

    sections.join(SECTION_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::allocate;
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_budget_renders_nothing() {
        let budgeted = allocate(&BTreeMap::new(), 1000);
        assert_eq!(assemble(&budgeted), "");
    }

    #[test]
    fn test_sections_labeled_and_separated() {
        let contents: BTreeMap<&str, String> = [
            ("readme", "# Hello".to_string()),
            ("tree", "src/\nsrc/main.rs".to_string()),
        ]
        .into_iter()
        .collect();
        let budgeted = allocate(&contents, 10_000);
        let out = assemble(&budgeted);

        assert!(out.contains("## README\n\n# Hello"));
        assert!(out.contains("## Directory Structure\n\nsrc/"));
        assert!(out.contains("---"));
        // empty slots are skipped entirely
        assert!(!out.contains("## Repository Languages"));
    }

    #[test]
    fn test_unknown_slot_gets_title_cased_fallback() {
        assert_eq!(header_for("notes"), "## Notes");
        assert_eq!(header_for("readme"), "## README");
    }
}
