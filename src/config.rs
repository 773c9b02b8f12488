//! Runtime configuration from environment variables.

use crate::llm::DEFAULT_MODEL;

/// Settings resolved from the process environment. CLI flags override
/// individual fields after loading.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub github_token: Option<String>,
    pub max_context_tokens: usize,
    pub max_file_size_kb: u64,
    pub max_files_to_fetch: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: non_empty_var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            github_token: non_empty_var("GITHUB_TOKEN"),
            max_context_tokens: parsed_var("MAX_CONTEXT_TOKENS", 32_000),
            max_file_size_kb: parsed_var("MAX_FILE_SIZE_KB", 200),
            max_files_to_fetch: parsed_var("MAX_FILES_TO_FETCH", 30),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_var_falls_back_on_garbage() {
        std::env::set_var("MARROW_TEST_BAD_NUMBER", "not-a-number");
        let value: usize = parsed_var("MARROW_TEST_BAD_NUMBER", 42);
        assert_eq!(value, 42);
        std::env::remove_var("MARROW_TEST_BAD_NUMBER");
    }

    #[test]
    fn test_parsed_var_reads_value() {
        std::env::set_var("MARROW_TEST_GOOD_NUMBER", "64000");
        let value: usize = parsed_var("MARROW_TEST_GOOD_NUMBER", 42);
        assert_eq!(value, 64_000);
        std::env::remove_var("MARROW_TEST_GOOD_NUMBER");
    }
}
