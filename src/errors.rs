//! Error types for marrow.
//!
//! Every failure that can surface from a pipeline run maps to one variant
//! here, each with a stable machine-readable kind and a human-readable
//! message. Inner stages raise these; the binary translates them to exit
//! codes. No partial output is ever returned alongside an error.

/// Top-level error type for summarization runs.
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("invalid repository reference: {0}")]
    InvalidReference(String),

    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("access denied to repository: {0}")]
    RepositoryAccessDenied(String),

    #[error("repository is empty: {0}")]
    EmptyRepository(String),

    #[error("rate limited by upstream provider{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<String> },

    #[error("generation service error: {0}")]
    Generation(String),

    #[error("content extraction failed: {0}")]
    ContentExtraction(String),
}

fn retry_hint(retry_after: &Option<String>) -> String {
    match retry_after {
        Some(when) => format!(" (resets at {when})"),
        None => String::new(),
    }
}

impl SummarizeError {
    /// Stable machine-readable kind for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            SummarizeError::InvalidReference(_) => "invalid_reference",
            SummarizeError::RepositoryNotFound(_) => "repository_not_found",
            SummarizeError::RepositoryAccessDenied(_) => "repository_access_denied",
            SummarizeError::EmptyRepository(_) => "empty_repository",
            SummarizeError::RateLimited { .. } => "rate_limited",
            SummarizeError::Generation(_) => "generation_service_error",
            SummarizeError::ContentExtraction(_) => "content_extraction_error",
        }
    }
}

/// Map an error to its exit code.
pub fn exit_code(error: &SummarizeError) -> i32 {
    match error {
        SummarizeError::InvalidReference(_) => 2,
        SummarizeError::RepositoryNotFound(_) => 3,
        SummarizeError::RepositoryAccessDenied(_) => 4,
        SummarizeError::EmptyRepository(_) => 5,
        SummarizeError::RateLimited { .. } => 6,
        SummarizeError::Generation(_) => 7,
        SummarizeError::ContentExtraction(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable() {
        let err = SummarizeError::RepositoryNotFound("octocat/nope".into());
        assert_eq!(err.kind(), "repository_not_found");
    }

    #[test]
    fn test_rate_limited_message_includes_hint() {
        let err = SummarizeError::RateLimited {
            retry_after: Some("2026-01-01 00:00:00 UTC".into()),
        };
        assert!(err.to_string().contains("resets at"));

        let bare = SummarizeError::RateLimited { retry_after: None };
        assert!(!bare.to_string().contains("resets at"));
    }

    #[test]
    fn test_exit_codes_distinct_per_kind() {
        let errors = [
            SummarizeError::InvalidReference("x".into()),
            SummarizeError::RepositoryNotFound("x".into()),
            SummarizeError::RepositoryAccessDenied("x".into()),
            SummarizeError::EmptyRepository("x".into()),
            SummarizeError::RateLimited { retry_after: None },
            SummarizeError::Generation("x".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
