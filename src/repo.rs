//! Domain types for repository summarization.
//!
//! Pure data carried between pipeline stages: the validated repository
//! reference, tree entries from the provider listing, fetched files, and
//! the final structured summary. Nothing here performs I/O.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::errors::SummarizeError;

static GITHUB_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://github\.com/(?P<owner>[A-Za-z0-9\-_.]+)/(?P<repo>[A-Za-z0-9\-_.]+?)(?:\.git)?/?$",
    )
    .expect("github url regex is valid")
});

static SHORTHAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<owner>[A-Za-z0-9\-_.]+)/(?P<repo>[A-Za-z0-9\-_.]+)$")
        .expect("shorthand regex is valid")
});

/// Validated reference to a hosted repository.
///
/// Accepts full `https://github.com/<owner>/<repo>` URLs (with or without a
/// trailing `.git`) and the `owner/repo` shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse and validate a raw reference string.
    pub fn parse(raw: &str) -> Result<Self, SummarizeError> {
        let raw = raw.trim();
        let captures = GITHUB_URL_RE
            .captures(raw)
            .or_else(|| SHORTHAND_RE.captures(raw))
            .ok_or_else(|| {
                SummarizeError::InvalidReference(format!(
                    "'{raw}' — expected https://github.com/<owner>/<repo>"
                ))
            })?;

        Ok(Self {
            owner: captures["owner"].to_string(),
            repo: captures["repo"].to_string(),
        })
    }

    /// `owner/repo` form, used in messages and provider paths.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// High-level repository metadata from the provider.
#[derive(Debug, Clone)]
pub struct RepoMetadata {
    pub default_branch: String,
    pub description: Option<String>,
}

/// Kind of a tree listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A file.
    Blob,
    /// A sub-directory.
    Tree,
}

/// A single entry from the provider's recursive tree listing.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    pub size_bytes: u64,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
            size_bytes,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
            size_bytes: 0,
        }
    }
}

/// Classification bucket for repository files. Assigned once, never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Readme,
    Config,
    EntryPoint,
    Source,
    Test,
    Docs,
    Other,
}

impl FileCategory {
    /// Fetch priority: lower is fetched first when the file budget is tight.
    pub fn fetch_priority(self) -> u8 {
        match self {
            FileCategory::Readme => 0,
            FileCategory::Config => 1,
            FileCategory::EntryPoint => 2,
            FileCategory::Source => 3,
            FileCategory::Docs => 4,
            FileCategory::Test => 5,
            FileCategory::Other => 6,
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FileCategory::Readme => "readme",
            FileCategory::Config => "config",
            FileCategory::EntryPoint => "entry_point",
            FileCategory::Source => "source",
            FileCategory::Test => "test",
            FileCategory::Docs => "docs",
            FileCategory::Other => "other",
        };
        write!(f, "{name}")
    }
}

/// A fetched file with its decoded content. Lives for one pipeline run.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub path: String,
    pub content: String,
    pub size_bytes: u64,
    pub language: &'static str,
    pub category: FileCategory,
}

/// The final structured output returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub summary: String,
    pub technologies: Vec<String>,
    pub structure: String,
}

/// Extension → display-language table for fetched files.
const LANGUAGE_MAP: &[(&str, &str)] = &[
    (".py", "Python"),
    (".js", "JavaScript"),
    (".ts", "TypeScript"),
    (".tsx", "TypeScript"),
    (".jsx", "JavaScript"),
    (".go", "Go"),
    (".rs", "Rust"),
    (".rb", "Ruby"),
    (".java", "Java"),
    (".kt", "Kotlin"),
    (".cs", "C#"),
    (".c", "C"),
    (".cpp", "C++"),
    (".h", "C"),
    (".hpp", "C++"),
    (".swift", "Swift"),
    (".php", "PHP"),
    (".sh", "Shell"),
    (".bash", "Shell"),
    (".yaml", "YAML"),
    (".yml", "YAML"),
    (".toml", "TOML"),
    (".json", "JSON"),
    (".md", "Markdown"),
    (".html", "HTML"),
    (".css", "CSS"),
    (".scss", "SCSS"),
];

/// Infer a display language from a path's extension.
pub fn infer_language(path: &str) -> &'static str {
    let Some(dot) = path.rfind('.') else {
        return "unknown";
    };
    let ext = path[dot..].to_lowercase();
    LANGUAGE_MAP
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
        .unwrap_or("unknown")
}
