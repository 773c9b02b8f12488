//! Deterministic token-budget allocation with rollover across slots.
//!
//! A fixed, ordered table assigns each named slot a share of the usable
//! budget (the total minus a 5% safety reserve). Slots are filled strictly
//! in table order; capacity a slot does not consume rolls over to the slots
//! after it. Overflowing content is truncated at a line boundary.

use std::collections::BTreeMap;

use crate::tokens::{count_tokens, truncate_to_budget};

/// Fraction of the total budget withheld as a safety margin.
const RESERVE_FRACTION: f64 = 0.05;

/// Slot order and target proportions of the usable budget.
///
/// Proportions do not have to sum to 1.0, but must not exceed it.
const SLOT_PROPORTIONS: &[(&str, f64)] = &[
    ("languages", 0.02),
    ("readme", 0.28),
    ("config", 0.15),
    ("tree", 0.10),
    ("source", 0.40),
];

/// One named slot of budgeted content.
#[derive(Debug, Clone)]
pub struct BudgetSlot {
    pub name: &'static str,
    pub max_tokens: usize,
    pub content: String,
    pub used_tokens: usize,
}

impl BudgetSlot {
    fn empty(name: &'static str, max_tokens: usize) -> Self {
        Self {
            name,
            max_tokens,
            content: String::new(),
            used_tokens: 0,
        }
    }
}

/// The full set of allocated slots for one pipeline run.
#[derive(Debug, Clone)]
pub struct BudgetedContent {
    pub slots: Vec<BudgetSlot>,
    pub total_tokens: usize,
    pub budget_limit: usize,
}

impl BudgetedContent {
    /// Look up a slot by name.
    pub fn slot(&self, name: &str) -> Option<&BudgetSlot> {
        self.slots.iter().find(|s| s.name == name)
    }
}

/// Allocate `contents` within `total_budget` tokens.
///
/// Each slot's effective cap is its target share plus whatever earlier slots
/// left unspent, never more than the running remainder. Empty slots record
/// their cap but consume nothing; oversized slots are truncated to fit.
/// The returned total never exceeds `total_budget`.
pub fn allocate(contents: &BTreeMap<&str, String>, total_budget: usize) -> BudgetedContent {
    let reserve = (total_budget as f64 * RESERVE_FRACTION) as usize;
    let usable = total_budget - reserve;

    let mut slots: Vec<BudgetSlot> = Vec::with_capacity(SLOT_PROPORTIONS.len());
    let mut remaining = usable;

    for &(name, proportion) in SLOT_PROPORTIONS {
        let slot_max = (usable as f64 * proportion) as usize;

        // Rollover: the slot may consume its share plus the unspent surplus.
        let surplus = remaining.saturating_sub(slot_max);
        let effective_max = (slot_max + surplus).min(remaining);

        let raw_text = contents.get(name).map(String::as_str).unwrap_or("");
        if raw_text.is_empty() {
            slots.push(BudgetSlot::empty(name, effective_max));
            continue;
        }

        let actual_tokens = count_tokens(raw_text);
        let (fitted, used) = if actual_tokens <= effective_max {
            (raw_text.to_string(), actual_tokens)
        } else {
            let fitted = truncate_to_budget(raw_text, effective_max);
            let used = count_tokens(&fitted);
            (fitted, used)
        };

        remaining = remaining.saturating_sub(used);
        slots.push(BudgetSlot {
            name,
            max_tokens: effective_max,
            content: fitted,
            used_tokens: used,
        });
    }

    let total_tokens = slots.iter().map(|s| s.used_tokens).sum();
    BudgetedContent {
        slots,
        total_tokens,
        budget_limit: total_budget,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(pairs: &[(&'static str, &str)]) -> BTreeMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_all_empty_slots() {
        let budgeted = allocate(&BTreeMap::new(), 1000);
        assert_eq!(budgeted.total_tokens, 0);
        assert_eq!(budgeted.slots.len(), 5);
        for slot in &budgeted.slots {
            assert_eq!(slot.used_tokens, 0);
            assert!(slot.content.is_empty());
        }
    }

    #[test]
    fn test_small_content_kept_verbatim() {
        let c = contents(&[("readme", "# My Project\n\nA thing that does stuff.\n")]);
        let budgeted = allocate(&c, 10_000);
        let readme = budgeted.slot("readme").unwrap();
        assert_eq!(readme.content, c["readme"]);
        assert_eq!(readme.used_tokens, count_tokens(&c["readme"]));
    }

    #[test]
    fn test_total_never_exceeds_budget() {
        let big = "pub fn handler(req: Request) -> Response { todo!() }\n".repeat(500);
        let c = contents(&[
            ("languages", "- Rust: 100.0%"),
            ("readme", &big),
            ("config", &big),
            ("tree", &big),
            ("source", &big),
        ]);
        for budget in [200, 1000, 4000, 12_000] {
            let budgeted = allocate(&c, budget);
            assert!(
                budgeted.total_tokens <= budget,
                "{} > {budget}",
                budgeted.total_tokens
            );
            let sum: usize = budgeted.slots.iter().map(|s| s.used_tokens).sum();
            assert_eq!(sum, budgeted.total_tokens);
            for slot in &budgeted.slots {
                assert!(slot.used_tokens <= slot.max_tokens);
            }
        }
    }

    #[test]
    fn test_rollover_enlarges_later_slots() {
        // Everything empty except source: it should see nearly the whole
        // usable budget as its cap, not just its 40% share.
        let big = "line of source\n".repeat(2000);
        let c = contents(&[("source", &big)]);
        let budgeted = allocate(&c, 10_000);
        let source = budgeted.slot("source").unwrap();
        assert!(source.max_tokens > 9_000, "cap was {}", source.max_tokens);
    }

    #[test]
    fn test_early_usage_shrinks_later_caps() {
        let big = "a long line of readme prose that keeps going\n".repeat(2000);
        let c = contents(&[("readme", &big), ("source", &big)]);
        let budgeted = allocate(&c, 10_000);
        let readme = budgeted.slot("readme").unwrap();
        let source = budgeted.slot("source").unwrap();
        assert!(source.max_tokens <= readme.max_tokens - readme.used_tokens + 1);
    }

    #[test]
    fn test_truncated_slot_carries_marker() {
        let big = "one line of configuration = true\n".repeat(2000);
        let c = contents(&[("config", &big)]);
        let budgeted = allocate(&c, 2_000);
        let config = budgeted.slot("config").unwrap();
        assert!(config.content.ends_with(crate::tokens::TRUNCATION_MARKER));
        assert!(config.used_tokens <= config.max_tokens);
    }
}
