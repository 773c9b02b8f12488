//! The summarization pipeline.
//!
//! Orchestrates the full run: fetch metadata and tree, filter and
//! classify, fetch file bodies, extract skeletons, score, build raw
//! slot contents, redact, allocate the token budget, and call the
//! generation gateway once (or per-file for oversized repositories).
//!
//! Stage order is load-bearing: redaction always runs on raw,
//! pre-truncation slot content, so a secret can never straddle a
//! truncation boundary unseen.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rayon::prelude::*;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::assemble::assemble;
use crate::budget::{allocate, BudgetedContent};
use crate::errors::SummarizeError;
use crate::fetch::RepoFetcher;
use crate::filter::filter_and_classify;
use crate::llm::LlmGateway;
use crate::repo::{
    infer_language, EntryKind, FetchedFile, FileCategory, RepoRef, Summary, TreeEntry,
};
use crate::scorer::{score_files, ScoredFile};
use crate::skeleton::{extract_skeleton, Skeleton};
use crate::tokens::count_tokens;

const FETCH_CONCURRENCY: usize = 10;
const TREE_LISTING_MAX_LINES: usize = 200;
const UNSCORED_BODY_MAX_CHARS: usize = 2000;
const FILE_SUMMARY_MAX_CHARS: usize = 3000;
const MULTI_PASS_TOP_FILES: usize = 8;

pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 12_000;
pub const DEFAULT_MAX_FILES_TO_FETCH: usize = 30;
pub const DEFAULT_MAX_FILE_SIZE_KB: u64 = 200;

const SYSTEM_PROMPT: &str = "\
You are a senior software analyst. Given information about a GitHub \
repository (language breakdown, README, configuration files, directory \
tree, and structural skeletons of key source files), produce a structured \
JSON analysis.

Return **only** valid JSON with exactly these three keys:

{
  \"summary\": \"<description>\",
  \"technologies\": [\"<lang>\", \"<framework>\", ...],
  \"structure\": \"<layout>\"
}

Guidelines:
- Be specific and factual. Only mention technologies you see evidence of.
- For *technologies*, include languages ordered by percentage, then frameworks and notable libraries.
- For *structure*, write 1-2 sentences describing how the project is organised, referencing the concrete directory and file names you see in the tree.
- Do NOT invent information not supported by the provided content.
";

const FILE_SUMMARY_SYSTEM_PROMPT: &str = "\
You are a code analyst. Summarise the following source file in 2-3 sentences: \
what it does, what it exports, and its role in the project.

Return a JSON object with a single key \"file_summary\" containing your summary.
";

/// Drives the full repository → summary pipeline.
pub struct Summarizer<F, L> {
    fetcher: Arc<F>,
    llm: L,
    max_context_tokens: usize,
    max_files_to_fetch: usize,
    max_file_size_kb: u64,
}

impl<F, L> Summarizer<F, L>
where
    F: RepoFetcher + 'static,
    L: LlmGateway,
{
    pub fn new(fetcher: F, llm: L) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            llm,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            max_files_to_fetch: DEFAULT_MAX_FILES_TO_FETCH,
            max_file_size_kb: DEFAULT_MAX_FILE_SIZE_KB,
        }
    }

    pub fn max_context_tokens(mut self, tokens: usize) -> Self {
        self.max_context_tokens = tokens;
        self
    }

    pub fn max_files_to_fetch(mut self, count: usize) -> Self {
        self.max_files_to_fetch = count;
        self
    }

    pub fn max_file_size_kb(mut self, kb: u64) -> Self {
        self.max_file_size_kb = kb;
        self
    }

    /// Run the pipeline for a repository reference and return the summary.
    pub async fn execute(&self, reference: &str) -> Result<Summary, SummarizeError> {
        let repo = RepoRef::parse(reference)?;
        info!(repo = %repo, "summarizing");

        // Metadata first (the tree request needs the default branch), then
        // tree and languages concurrently.
        let metadata = self.fetcher.fetch_metadata(&repo).await?;
        let (tree, languages) = tokio::join!(
            self.fetcher.fetch_tree(&repo, &metadata.default_branch),
            self.fetcher.fetch_languages(&repo),
        );
        let tree = tree?;

        if tree.is_empty() {
            return Err(SummarizeError::EmptyRepository(format!(
                "{} has no files",
                repo.full_name()
            )));
        }

        let classified = filter_and_classify(&tree, self.max_file_size_kb);
        if classified.is_empty() {
            return Err(SummarizeError::EmptyRepository(format!(
                "{} has no processable files after filtering",
                repo.full_name()
            )));
        }

        let to_fetch = self.select_files_to_fetch(classified);
        info!(repo = %repo, count = to_fetch.len(), "fetching files");

        let files = self
            .fetch_files(&repo, &metadata.default_branch, to_fetch)
            .await;
        if files.is_empty() {
            return Err(SummarizeError::ContentExtraction(format!(
                "every file fetch from {} failed",
                repo.full_name()
            )));
        }

        let skeletons: Vec<Skeleton> = files
            .par_iter()
            .filter(|f| {
                matches!(
                    f.category,
                    FileCategory::Source | FileCategory::EntryPoint | FileCategory::Test
                )
            })
            .map(|f| extract_skeleton(&f.path, &f.content))
            .collect();

        let categories: BTreeMap<String, FileCategory> = files
            .iter()
            .map(|f| (f.path.clone(), f.category))
            .collect();
        let sizes: BTreeMap<String, u64> = files
            .iter()
            .map(|f| (f.path.clone(), f.size_bytes))
            .collect();

        let scored = if skeletons.is_empty() {
            Vec::new()
        } else {
            score_files(&skeletons, &categories, &sizes)
        };

        let raw_contents = build_raw_contents(&tree, &files, &skeletons, &scored, &languages);

        let (sanitized, redaction_count) = crate::redact::sanitize_batch(&raw_contents);
        if redaction_count > 0 {
            warn!(count = redaction_count, "redacted potential secrets from context");
        }

        let budgeted = allocate(&sanitized, self.max_context_tokens);
        info!(
            used = budgeted.total_tokens,
            limit = budgeted.budget_limit,
            "token budget"
        );

        if needs_multi_pass(&budgeted, &raw_contents) {
            info!(repo = %repo, "using multi-pass summarization");
            self.multi_pass(&files, &scored, &budgeted).await
        } else {
            self.single_pass(&budgeted).await
        }
    }

    /// Highest-value categories first, path order within a category.
    fn select_files_to_fetch(
        &self,
        mut classified: Vec<(TreeEntry, FileCategory)>,
    ) -> Vec<(TreeEntry, FileCategory)> {
        classified.sort_by(|a, b| {
            a.1.fetch_priority()
                .cmp(&b.1.fetch_priority())
                .then_with(|| a.0.path.cmp(&b.0.path))
        });
        classified.truncate(self.max_files_to_fetch);
        classified
    }

    /// Fetch file bodies with bounded concurrency. Individual failures are
    /// dropped; the pipeline proceeds with whatever arrived.
    async fn fetch_files(
        &self,
        repo: &RepoRef,
        branch: &str,
        to_fetch: Vec<(TreeEntry, FileCategory)>,
    ) -> Vec<FetchedFile> {
        let semaphore = Arc::new(Semaphore::new(FETCH_CONCURRENCY));
        let mut tasks = JoinSet::new();

        for (index, (entry, category)) in to_fetch.into_iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let repo = repo.clone();
            let branch = branch.to_string();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };
                match fetcher.fetch_file_content(&repo, &entry.path, &branch).await {
                    Ok(content) => Some((
                        index,
                        FetchedFile {
                            language: infer_language(&entry.path),
                            path: entry.path,
                            content,
                            size_bytes: entry.size_bytes,
                            category,
                        },
                    )),
                    Err(e) => {
                        debug!(path = %entry.path, error = %e, "fetch failed, skipping");
                        None
                    }
                }
            });
        }

        let mut fetched: Vec<(usize, FetchedFile)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(item)) => fetched.push(item),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "fetch task aborted"),
            }
        }
        fetched.sort_by_key(|(index, _)| *index);
        fetched.into_iter().map(|(_, file)| file).collect()
    }

    async fn single_pass(&self, budgeted: &BudgetedContent) -> Result<Summary, SummarizeError> {
        let context = assemble(budgeted);
        let raw = self.llm.complete(SYSTEM_PROMPT, &context, true).await?;
        parse_reply(&raw)
    }

    /// Summarize the top-ranked source files one by one, then re-budget
    /// with those summaries standing in for raw source.
    async fn multi_pass(
        &self,
        files: &[FetchedFile],
        scored: &[ScoredFile],
        budgeted: &BudgetedContent,
    ) -> Result<Summary, SummarizeError> {
        let top_paths: BTreeSet<&str> = scored
            .iter()
            .take(MULTI_PASS_TOP_FILES)
            .map(|s| s.path.as_str())
            .collect();

        let mut file_summaries: Vec<String> = Vec::new();
        for file in files {
            if !matches!(file.category, FileCategory::Source | FileCategory::EntryPoint) {
                continue;
            }
            if !top_paths.contains(file.path.as_str()) {
                continue;
            }

            let prompt = format!(
                "File: {}\n\n{}",
                file.path,
                char_prefix(&file.content, FILE_SUMMARY_MAX_CHARS)
            );
            match self.llm.complete(FILE_SUMMARY_SYSTEM_PROMPT, &prompt, true).await {
                Ok(raw) => {
                    let text = match serde_json::from_str::<serde_json::Value>(&raw) {
                        Ok(data) => data
                            .get("file_summary")
                            .and_then(|v| v.as_str())
                            .unwrap_or(raw.trim())
                            .to_string(),
                        Err(_) => raw.trim().to_string(),
                    };
                    file_summaries.push(format!("**{}**: {text}", file.path));
                }
                Err(e) => {
                    debug!(path = %file.path, error = %e, "per-file summary failed, skipping");
                }
            }
        }

        let slot_content =
            |name: &str| budgeted.slot(name).map(|s| s.content.clone()).unwrap_or_default();

        let mut pass2: BTreeMap<&str, String> = BTreeMap::new();
        pass2.insert("readme", slot_content("readme"));
        pass2.insert("config", slot_content("config"));
        pass2.insert("tree", slot_content("tree"));
        pass2.insert("source", file_summaries.join("\n\n"));

        let rebudgeted = allocate(&pass2, self.max_context_tokens);
        let context = assemble(&rebudgeted);
        let raw = self.llm.complete(SYSTEM_PROMPT, &context, true).await?;
        parse_reply(&raw)
    }
}

/// Raw, pre-budget content per slot name.
fn build_raw_contents(
    tree: &[TreeEntry],
    files: &[FetchedFile],
    skeletons: &[Skeleton],
    scored: &[ScoredFile],
    languages: &BTreeMap<String, u64>,
) -> BTreeMap<&'static str, String> {
    let mut contents: BTreeMap<&'static str, String> = BTreeMap::new();

    if !languages.is_empty() {
        let total: u64 = languages.values().sum();
        let total = total.max(1);
        let mut ordered: Vec<(&String, &u64)> = languages.iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let lines: Vec<String> = ordered
            .iter()
            .map(|(lang, bytes)| {
                format!("- {lang}: {:.1}%", **bytes as f64 / total as f64 * 100.0)
            })
            .collect();
        contents.insert("languages", lines.join("\n"));
    }

    if let Some(readme) = files.iter().find(|f| f.category == FileCategory::Readme) {
        contents.insert("readme", readme.content.clone());
    }

    let config_parts: Vec<String> = files
        .iter()
        .filter(|f| f.category == FileCategory::Config)
        .map(|f| format!("### {}\n\n{}", f.path, f.content))
        .collect();
    if !config_parts.is_empty() {
        contents.insert("config", config_parts.join("\n\n"));
    }

    contents.insert("tree", render_tree(tree));

    let skeleton_by_path: BTreeMap<&str, &str> = skeletons
        .iter()
        .map(|sk| (sk.path.as_str(), sk.text.as_str()))
        .collect();
    let scored_paths: BTreeSet<&str> = scored.iter().map(|s| s.path.as_str()).collect();

    let mut source_parts: Vec<String> = Vec::new();
    for sf in scored {
        if let Some(text) = skeleton_by_path.get(sf.path.as_str()) {
            source_parts.push(format!("### {}\n\n{text}", sf.path));
        }
    }
    for file in files {
        if scored_paths.contains(file.path.as_str()) {
            continue;
        }
        if matches!(file.category, FileCategory::EntryPoint | FileCategory::Source) {
            source_parts.push(format!(
                "### {}\n\n{}",
                file.path,
                char_prefix(&file.content, UNSCORED_BODY_MAX_CHARS)
            ));
        }
    }
    if !source_parts.is_empty() {
        contents.insert("source", source_parts.join("\n\n"));
    }

    contents
}

/// Flat tree listing, directories suffixed with `/`, capped at 200 lines.
fn render_tree(tree: &[TreeEntry]) -> String {
    let mut lines: Vec<String> = tree
        .iter()
        .map(|entry| match entry.kind {
            EntryKind::Tree => format!("{}/", entry.path),
            EntryKind::Blob => entry.path.clone(),
        })
        .collect();

    if lines.len() > TREE_LISTING_MAX_LINES {
        let overflow = tree.len() - TREE_LISTING_MAX_LINES;
        lines.truncate(TREE_LISTING_MAX_LINES);
        lines.push(format!("… and {overflow} more files"));
    }
    lines.join("\n")
}

/// Multi-pass kicks in when raw source content is more than double the
/// source slot's budget.
fn needs_multi_pass(budgeted: &BudgetedContent, raw: &BTreeMap<&'static str, String>) -> bool {
    let Some(source_slot) = budgeted.slot("source") else {
        return false;
    };
    let Some(raw_source) = raw.get("source").filter(|s| !s.is_empty()) else {
        return false;
    };
    count_tokens(raw_source) > source_slot.max_tokens * 2
}

/// Prefix of at most `max_chars` characters, on a char boundary.
fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn coerce_technology(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Parse the gateway's reply into a [`Summary`], tolerating code fences
/// and sloppy field types but never a missing summary.
fn parse_reply(raw: &str) -> Result<Summary, SummarizeError> {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
        text = text.strip_suffix("```").unwrap_or(text).trim();
    }

    let data: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| SummarizeError::Generation(format!("LLM returned invalid JSON: {e}")))?;

    let summary = match data.get("summary").and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => {
            return Err(SummarizeError::Generation(
                "LLM response missing 'summary' field".to_string(),
            ));
        }
    };

    let technologies = data
        .get("technologies")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(coerce_technology).collect())
        .unwrap_or_default();

    let structure = data
        .get("structure")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(Summary {
        summary,
        technologies,
        structure,
    })
}
