//! Tree filtering and classification.
//!
//! Decides which tree entries are worth fetching and assigns each a
//! [`FileCategory`]. Pure functions over static tables; no I/O.

use crate::repo::{EntryKind, FileCategory, TreeEntry};

/// Directory segments that never contain useful context (build artifacts,
/// VCS internals, caches, vendored trees).
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    "venv",
    ".venv",
    "env",
    "__pycache__",
    ".tox",
    ".nox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    "vendor",
    ".idea",
    ".vscode",
    ".next",
    ".nuxt",
    "coverage",
    ".coverage",
    "htmlcov",
    ".eggs",
    "target",
    "Pods",
    ".gradle",
    ".terraform",
];

/// Binary, media, archive, and minified suffixes, matched against the
/// lowercased path.
const SKIP_EXTENSIONS: &[&str] = &[
    ".pyc", ".pyo", ".so", ".o", ".a", ".dylib",
    ".dll", ".exe", ".bin", ".class", ".jar",
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".svg", ".ico",
    ".webp", ".mp3", ".mp4", ".avi", ".mov", ".wav",
    ".woff", ".woff2", ".ttf", ".eot", ".otf",
    ".zip", ".tar", ".gz", ".bz2", ".rar", ".7z",
    ".pdf", ".doc", ".docx", ".xls", ".xlsx",
    ".lock",
    ".min.js", ".min.css", ".map",
    ".ds_store",
];

/// Lock files and editor junk, matched on the lowercased filename.
const SKIP_FILENAMES: &[&str] = &[
    ".ds_store",
    "thumbs.db",
    ".gitattributes",
    ".editorconfig",
    "yarn.lock",
    "package-lock.json",
    "pnpm-lock.yaml",
    "pipfile.lock",
    "poetry.lock",
    "composer.lock",
    "gemfile.lock",
    "cargo.lock",
];

/// Files that exist specifically to hold secrets. Never fetched.
const SECRET_FILES: &[&str] = &[".env", ".env.local", ".env.production", ".env.development"];

const README_NAMES: &[&str] = &["readme.md", "readme.rst", "readme.txt", "readme"];

const CONFIG_NAMES: &[&str] = &[
    "pyproject.toml", "setup.py", "setup.cfg",
    "package.json", "tsconfig.json", "webpack.config.js", "vite.config.ts",
    "requirements.txt", "requirements.in",
    "pipfile", "cargo.toml", "go.mod", "go.sum",
    "gemfile", "build.gradle", "pom.xml",
    "makefile", "cmakelists.txt", "justfile",
    "dockerfile", "docker-compose.yml", "docker-compose.yaml",
    ".env.example",
    "tox.ini", ".flake8", "ruff.toml", ".prettierrc",
];

const ENTRY_POINT_NAMES: &[&str] = &[
    "main.py", "app.py", "manage.py", "wsgi.py", "asgi.py",
    "index.js", "index.ts", "index.tsx",
    "server.py", "server.js", "server.ts",
    "cli.py", "cli.js",
    "main.go", "main.rs", "main.c", "main.cpp",
    "program.cs",
];

const TEST_INDICATORS: &[&str] = &["test_", "_test.", ".test.", "tests/", "spec/", "__tests__/"];

const DOCS_INDICATORS: &[&str] = &["docs/", "doc/", "documentation/"];

fn filename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn segment_in_skip_dirs(path: &str) -> bool {
    path.split('/')
        .any(|part| SKIP_DIRS.contains(&part) || part.ends_with(".egg-info"))
}

fn has_skip_extension(path_lower: &str) -> bool {
    SKIP_EXTENSIONS.iter().any(|ext| path_lower.ends_with(ext))
}

/// Return true if the entry should be excluded from processing.
pub fn should_skip(entry: &TreeEntry, max_size_kb: u64) -> bool {
    if entry.kind != EntryKind::Blob {
        return true;
    }

    let path_lower = entry.path.to_lowercase();
    let name = filename(&path_lower);

    if SECRET_FILES.contains(&name) {
        return true;
    }
    if SKIP_FILENAMES.contains(&name) {
        return true;
    }
    if segment_in_skip_dirs(&entry.path) {
        return true;
    }
    if has_skip_extension(&path_lower) {
        return true;
    }
    if entry.size_bytes > max_size_kb * 1024 {
        return true;
    }

    false
}

/// Assign a [`FileCategory`] from filename and path heuristics.
///
/// First match wins: README names, then known config/build manifests, then
/// entry-point names, then test indicators anywhere in the path, then docs
/// indicators. Everything else is `Source`.
pub fn classify(path: &str) -> FileCategory {
    let path_lower = path.to_lowercase();
    let name_lower = filename(&path_lower);

    if README_NAMES.contains(&name_lower) {
        return FileCategory::Readme;
    }
    if CONFIG_NAMES.contains(&name_lower) {
        return FileCategory::Config;
    }
    if ENTRY_POINT_NAMES.contains(&name_lower) {
        return FileCategory::EntryPoint;
    }
    if TEST_INDICATORS.iter().any(|ind| path_lower.contains(ind)) {
        return FileCategory::Test;
    }
    if DOCS_INDICATORS.iter().any(|ind| path_lower.contains(ind)) {
        return FileCategory::Docs;
    }

    FileCategory::Source
}

/// Filter the raw tree and return (entry, category) pairs for relevant files.
pub fn filter_and_classify(
    entries: &[TreeEntry],
    max_size_kb: u64,
) -> Vec<(TreeEntry, FileCategory)> {
    entries
        .iter()
        .filter(|entry| !should_skip(entry, max_size_kb))
        .map(|entry| (entry.clone(), classify(&entry.path)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_directories() {
        assert!(should_skip(&TreeEntry::dir("src"), 200));
    }

    #[test]
    fn test_skips_secret_and_lock_files() {
        assert!(should_skip(&TreeEntry::blob(".env", 100), 200));
        assert!(should_skip(&TreeEntry::blob("config/.env.production", 100), 200));
        assert!(should_skip(&TreeEntry::blob("Cargo.lock", 100), 200));
        assert!(should_skip(&TreeEntry::blob("package-lock.json", 100), 200));
    }

    #[test]
    fn test_skips_vendor_and_build_trees() {
        assert!(should_skip(&TreeEntry::blob("node_modules/a/index.js", 10), 200));
        assert!(should_skip(&TreeEntry::blob("target/debug/foo.rs", 10), 200));
        assert!(should_skip(&TreeEntry::blob("pkg.egg-info/PKG-INFO", 10), 200));
        assert!(!should_skip(&TreeEntry::blob("src/lib.rs", 10), 200));
    }

    #[test]
    fn test_skips_binary_extensions_and_oversize() {
        assert!(!should_skip(&TreeEntry::blob("README.md", 1_000), 200));
        assert!(should_skip(&TreeEntry::blob("assets/x.png", 500 * 1024), 200));
        assert!(should_skip(&TreeEntry::blob("big.rs", 201 * 1024), 200));
        assert!(should_skip(&TreeEntry::blob("bundle.min.js", 10), 200));
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(classify("README.md"), FileCategory::Readme);
        assert_eq!(classify("docs/Readme.rst"), FileCategory::Readme);
        assert_eq!(classify("pyproject.toml"), FileCategory::Config);
        assert_eq!(classify("Makefile"), FileCategory::Config);
        assert_eq!(classify("src/main.rs"), FileCategory::EntryPoint);
        // tests/ wins over docs/ because test indicators are checked first
        assert_eq!(classify("tests/docs/check.py"), FileCategory::Test);
        assert_eq!(classify("app/user.test.ts"), FileCategory::Test);
        assert_eq!(classify("docs/guide.md"), FileCategory::Docs);
        assert_eq!(classify("src/handlers.py"), FileCategory::Source);
    }

    #[test]
    fn test_filter_and_classify() {
        let entries = vec![
            TreeEntry::blob("README.md", 1_000),
            TreeEntry::dir("src"),
            TreeEntry::blob("src/main.py", 2_000),
            TreeEntry::blob("assets/logo.png", 500 * 1024),
        ];
        let kept = filter_and_classify(&entries, 200);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].1, FileCategory::Readme);
        assert_eq!(kept[1].1, FileCategory::EntryPoint);
    }
}
