//! Marrow - Distill a GitHub repository into a structured LLM summary.
//!
//! Marrow fetches a repository's tree and key files, extracts structural
//! skeletons from source code, scores files by import-graph centrality and
//! path heuristics, redacts secret-shaped content, fits everything into a
//! hard token budget, and asks a chat-completion model for a structured
//! JSON analysis.
//!
//! # Quick Start
//!
//! ```no_run
//! use marrow::fetch::GitHubFetcher;
//! use marrow::llm::OpenAiGateway;
//! use marrow::pipeline::Summarizer;
//!
//! # async fn run() -> Result<(), marrow::errors::SummarizeError> {
//! let fetcher = GitHubFetcher::new(std::env::var("GITHUB_TOKEN").ok());
//! let gateway = OpenAiGateway::new(
//!     std::env::var("OPENAI_API_KEY").unwrap_or_default(),
//!     "gpt-4o-mini".to_string(),
//! );
//!
//! let summary = Summarizer::new(fetcher, gateway)
//!     .max_context_tokens(12_000)
//!     .execute("https://github.com/rust-lang/cargo")
//!     .await?;
//!
//! println!("{}", summary.summary);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`repo`] - Repository references, tree entries, categories
//! - [`filter`] - Tree filtering and file classification
//! - [`skeleton`] - Structural skeleton extraction per language tier
//! - [`scorer`] - Import-graph centrality and composite scoring
//! - [`redact`] - Secret-shaped substring redaction
//! - [`tokens`] - Token counting and budget-safe truncation
//! - [`budget`] - Slot-based token budget allocation with rollover
//! - [`assemble`] - Deterministic context rendering
//! - [`fetch`] - Repository providers (GitHub REST)
//! - [`llm`] - Generation gateways (OpenAI chat completions)
//! - [`pipeline`] - The orchestrating use case

pub mod assemble;
pub mod budget;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod filter;
pub mod llm;
pub mod pipeline;
pub mod redact;
pub mod repo;
pub mod scorer;
pub mod skeleton;
pub mod tokens;

// Re-export key types at crate root for convenience
pub use budget::{BudgetSlot, BudgetedContent};
pub use errors::{exit_code, SummarizeError};
pub use pipeline::Summarizer;
pub use repo::{FileCategory, RepoRef, Summary, TreeEntry};
pub use scorer::ScoredFile;
pub use skeleton::Skeleton;
pub use tokens::count_tokens;
