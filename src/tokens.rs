//! Token counting and truncation for the context budget.
//!
//! Uses tiktoken-rs (cl100k_base) for accurate counts, with a ~4 chars per
//! token heuristic when the encoder cannot be built. The encoder is
//! initialized once and shared read-only for the process lifetime.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

/// Marker appended to any slot that had to be cut to fit its budget.
pub const TRUNCATION_MARKER: &str = "\n[… truncated to fit token budget]";

// Cached tokenizer - initialized once
static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn get_tokenizer() -> Option<&'static CoreBPE> {
    CL100K
        .get_or_init(|| tiktoken_rs::cl100k_base().ok())
        .as_ref()
}

/// Fallback heuristic: ~4 characters per token.
fn fallback_count(text: &str) -> usize {
    (text.len() + 3) / 4
}

/// Count tokens in text.
///
/// Never fails - falls back to the character heuristic if tiktoken is
/// unavailable.
pub fn count_tokens(text: &str) -> usize {
    match get_tokenizer() {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => fallback_count(text),
    }
}

/// Cut `text` down to at most `max_tokens` tokens, without any marker.
fn cut_to_tokens(text: &str, max_tokens: usize) -> String {
    let Some(bpe) = get_tokenizer() else {
        // Heuristic path: 4 bytes per token, respecting char boundaries.
        let limit = max_tokens.saturating_mul(4);
        if text.len() <= limit {
            return text.to_string();
        }
        let mut end = limit;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        return text[..end].to_string();
    };

    let tokens = bpe.encode_ordinary(text);
    if tokens.len() <= max_tokens {
        return text.to_string();
    }

    // A token prefix can end mid-codepoint; back off until it decodes.
    let mut end = max_tokens;
    loop {
        match bpe.decode(tokens[..end].to_vec()) {
            Ok(decoded) => return decoded,
            Err(_) if end > 0 => end -= 1,
            Err(_) => return String::new(),
        }
    }
}

/// Truncate text to fit within `max_tokens`, cutting at a line boundary
/// where possible and appending [`TRUNCATION_MARKER`].
///
/// The marker's own token cost is reserved before cutting, so the result
/// never exceeds `max_tokens`. Budgets too small to hold the marker get a
/// bare cut instead.
pub fn truncate_to_budget(text: &str, max_tokens: usize) -> String {
    if count_tokens(text) <= max_tokens {
        return text.to_string();
    }

    let marker_cost = count_tokens(TRUNCATION_MARKER);
    if max_tokens <= marker_cost {
        return cut_to_tokens(text, max_tokens);
    }

    let mut truncated = cut_to_tokens(text, max_tokens - marker_cost);

    // Roll back to the last newline for a clean cut, but only if it falls in
    // the back half of the truncated text.
    if let Some(last_nl) = truncated.rfind('\n') {
        if last_nl > truncated.len() / 2 {
            truncated.truncate(last_nl + 1);
        }
    }

    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        assert_eq!(count_tokens(""), 0);
    }

    #[test]
    fn test_simple_text() {
        let count = count_tokens("Hello, world!");
        assert!(count > 0 && count < 10);
    }

    #[test]
    fn test_fallback_approximation() {
        assert_eq!(fallback_count(""), 0);
        assert_eq!(fallback_count("a"), 1);
        assert_eq!(fallback_count("abcd"), 1);
        assert_eq!(fallback_count("abcde"), 2);
    }

    #[test]
    fn test_truncate_noop_when_within_budget() {
        let text = "short text\n";
        assert_eq!(truncate_to_budget(text, 1000), text);
    }

    #[test]
    fn test_truncate_never_exceeds_budget() {
        let text = "fn main() {\n    println!(\"hello\");\n}\n".repeat(200);
        for max in [0, 5, 17, 64, 250] {
            let cut = truncate_to_budget(&text, max);
            assert!(
                count_tokens(&cut) <= max,
                "budget {max} exceeded: {}",
                count_tokens(&cut)
            );
        }
    }

    #[test]
    fn test_truncate_appends_marker() {
        let text = "line one is here\n".repeat(500);
        let cut = truncate_to_budget(&text, 100);
        assert!(cut.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_cuts_at_line_boundary() {
        let text = "alpha beta gamma delta\n".repeat(500);
        let cut = truncate_to_budget(&text, 100);
        let body = cut.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert!(body.ends_with('\n'));
    }
}
