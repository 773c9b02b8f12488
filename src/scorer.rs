//! File importance scoring.
//!
//! Blends PageRank centrality on the import graph with filename, depth
//! and size heuristics into one composite score per file. Output order
//! is fully deterministic for identical input.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::repo::FileCategory;
use crate::skeleton::Skeleton;

const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 50;
const CONVERGENCE_TOLERANCE: f64 = 1e-8;

/// Filenames that score highest in the name heuristic.
const ENTRY_POINT_NAMES: &[&str] = &[
    "main.py", "app.py", "index.js", "index.ts", "index.tsx",
    "server.py", "server.js", "server.ts", "manage.py",
    "cli.py", "wsgi.py", "asgi.py", "main.go", "main.rs",
];

const PACKAGE_ROOT_NAMES: &[&str] = &["__init__.py", "mod.rs", "lib.rs"];

/// A file with its composite importance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFile {
    pub path: String,
    pub score: f64,
    pub category: FileCategory,
}

fn category_bonus(category: FileCategory) -> f64 {
    match category {
        FileCategory::Readme => 1.0,
        FileCategory::EntryPoint => 0.9,
        FileCategory::Config => 0.7,
        FileCategory::Source => 0.5,
        FileCategory::Docs => 0.4,
        FileCategory::Test => 0.3,
        FileCategory::Other => 0.1,
    }
}

fn name_heuristic(path: &str) -> f64 {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    if ENTRY_POINT_NAMES.contains(&name.as_str()) || name.starts_with("readme") {
        1.0
    } else if PACKAGE_ROOT_NAMES.contains(&name.as_str()) {
        0.6
    } else {
        0.0
    }
}

/// Shallower files score higher; root files are close to 1.0.
fn depth_heuristic(path: &str) -> f64 {
    let depth = path.matches('/').count();
    1.0 / (1.0 + depth as f64)
}

/// Medium-sized files (1-20 KB) score highest, peaking around 5 KB.
fn size_heuristic(size_bytes: u64) -> f64 {
    if size_bytes == 0 {
        return 0.1;
    }
    let kb = size_bytes as f64 / 1024.0;
    if kb < 0.1 {
        return 0.2;
    }
    if kb > 100.0 {
        return 0.3;
    }
    (1.0 - (kb / 5.0).log10().abs() * 0.3).max(0.1)
}

/// Basename without its extension, used to resolve import identifiers
/// against file paths.
fn module_key(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

fn import_key(import: &str) -> Option<&str> {
    let last = import.rsplit('/').next().unwrap_or(import);
    last.split('.').find(|s| !s.is_empty())
}

/// One node per skeleton path; an edge per resolved import. Unresolved
/// imports are dropped rather than becoming external nodes.
fn build_import_graph(
    skeletons: &[Skeleton],
) -> (DiGraph<(), ()>, BTreeMap<&str, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut node_by_path: BTreeMap<&str, NodeIndex> = BTreeMap::new();
    let mut path_by_module: BTreeMap<String, &str> = BTreeMap::new();

    let mut ordered: Vec<&Skeleton> = skeletons.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    for sk in &ordered {
        let idx = graph.add_node(());
        node_by_path.insert(sk.path.as_str(), idx);
        path_by_module.insert(module_key(&sk.path), sk.path.as_str());
    }

    // Dedup: importing the same module twice is still one edge.
    let mut edges: BTreeSet<(NodeIndex, NodeIndex)> = BTreeSet::new();
    for sk in &ordered {
        let source = node_by_path[sk.path.as_str()];
        for import in &sk.imports {
            let Some(key) = import_key(import) else {
                continue;
            };
            if let Some(&target_path) = path_by_module.get(key) {
                if target_path != sk.path {
                    edges.insert((source, node_by_path[target_path]));
                }
            }
        }
    }
    for (source, target) in edges {
        graph.add_edge(source, target, ());
    }

    (graph, node_by_path)
}

/// Damped power iteration. Dangling nodes spread their mass uniformly.
fn pagerank(graph: &DiGraph<(), ()>) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let out_degree: Vec<usize> = graph
        .node_indices()
        .map(|idx| graph.neighbors(idx).count())
        .collect();

    let uniform = 1.0 / n as f64;
    let mut rank = vec![uniform; n];

    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![(1.0 - DAMPING) * uniform; n];

        let mut dangling_mass = 0.0;
        for idx in graph.node_indices() {
            let i = idx.index();
            if out_degree[i] == 0 {
                dangling_mass += rank[i];
                continue;
            }
            let share = DAMPING * rank[i] / out_degree[i] as f64;
            for target in graph.neighbors(idx) {
                next[target.index()] += share;
            }
        }

        let dangling_share = DAMPING * dangling_mass * uniform;
        for value in next.iter_mut() {
            *value += dangling_share;
        }

        let delta: f64 = next
            .iter()
            .zip(&rank)
            .map(|(a, b)| (a - b).abs())
            .sum();
        rank = next;
        if delta < CONVERGENCE_TOLERANCE {
            break;
        }
    }

    rank
}

/// Normalized centrality per path: raw PageRank divided by the maximum,
/// so the top node scores 1.0. Empty when the graph has fewer than two
/// nodes.
fn compute_centrality(
    graph: &DiGraph<(), ()>,
    node_by_path: &BTreeMap<&str, NodeIndex>,
) -> BTreeMap<String, f64> {
    if graph.node_count() < 2 {
        return BTreeMap::new();
    }

    let raw = pagerank(graph);
    let max_val = raw.iter().cloned().fold(0.0_f64, f64::max);
    if max_val == 0.0 {
        return node_by_path
            .keys()
            .map(|path| (path.to_string(), 0.0))
            .collect();
    }

    node_by_path
        .iter()
        .map(|(path, idx)| (path.to_string(), raw[idx.index()] / max_val))
        .collect()
}

/// Score files by descending composite importance.
///
/// Centrality is only trusted when at least three nodes received a
/// nonzero value; otherwise a heuristic-only blend is used. Ties are
/// broken by path so reruns on identical input produce identical order.
pub fn score_files(
    skeletons: &[Skeleton],
    categories: &BTreeMap<String, FileCategory>,
    sizes: &BTreeMap<String, u64>,
) -> Vec<ScoredFile> {
    let (graph, node_by_path) = build_import_graph(skeletons);
    let centrality = compute_centrality(&graph, &node_by_path);
    let use_centrality = centrality.values().filter(|v| **v > 0.0).count() >= 3;

    let mut scored: Vec<ScoredFile> = skeletons
        .iter()
        .map(|sk| {
            let category = categories
                .get(&sk.path)
                .copied()
                .unwrap_or(FileCategory::Source);
            let cat_bonus = category_bonus(category);
            let name_h = name_heuristic(&sk.path);
            let depth_h = depth_heuristic(&sk.path);
            let size_h = size_heuristic(sizes.get(&sk.path).copied().unwrap_or(0));

            let score = if use_centrality {
                let cent = centrality.get(&sk.path).copied().unwrap_or(0.0);
                0.30 * cent + 0.25 * cat_bonus + 0.20 * name_h + 0.15 * depth_h + 0.10 * size_h
            } else {
                0.35 * cat_bonus + 0.30 * name_h + 0.20 * depth_h + 0.15 * size_h
            };

            ScoredFile {
                path: sk.path.clone(),
                score,
                category,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton(path: &str, imports: &[&str]) -> Skeleton {
        Skeleton {
            path: path.to_string(),
            text: String::new(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_name_heuristic_tiers() {
        assert_eq!(name_heuristic("src/main.rs"), 1.0);
        assert_eq!(name_heuristic("README.md"), 1.0);
        assert_eq!(name_heuristic("readme.rst"), 1.0);
        assert_eq!(name_heuristic("src/lib.rs"), 0.6);
        assert_eq!(name_heuristic("pkg/__init__.py"), 0.6);
        assert_eq!(name_heuristic("src/util.rs"), 0.0);
    }

    #[test]
    fn test_depth_heuristic() {
        assert_eq!(depth_heuristic("main.rs"), 1.0);
        assert_eq!(depth_heuristic("src/deep/nested.rs"), 1.0 / 3.0);
    }

    #[test]
    fn test_size_heuristic_boundaries() {
        assert_eq!(size_heuristic(0), 0.1);
        assert_eq!(size_heuristic(50), 0.2);
        assert_eq!(size_heuristic(200 * 1024), 0.3);
        // Bell-curve peak at 5 KB
        assert!((size_heuristic(5 * 1024) - 1.0).abs() < 1e-9);
        assert!(size_heuristic(50 * 1024) < size_heuristic(5 * 1024));
    }

    #[test]
    fn test_import_graph_resolves_basenames() {
        let skeletons = vec![
            skeleton("src/main.py", &["helpers", "helpers", "missing_module"]),
            skeleton("src/helpers.py", &[]),
        ];
        let (graph, _) = build_import_graph(&skeletons);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_self_import_adds_no_edge() {
        let skeletons = vec![skeleton("a.py", &["a"]), skeleton("b.py", &[])];
        let (graph, _) = build_import_graph(&skeletons);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_heavily_imported_file_ranks_high() {
        let skeletons = vec![
            skeleton("src/core.py", &[]),
            skeleton("src/a.py", &["core"]),
            skeleton("src/b.py", &["core"]),
            skeleton("src/c.py", &["core"]),
            skeleton("src/d.py", &["core"]),
        ];
        let categories: BTreeMap<String, FileCategory> = skeletons
            .iter()
            .map(|s| (s.path.clone(), FileCategory::Source))
            .collect();
        let sizes: BTreeMap<String, u64> = skeletons
            .iter()
            .map(|s| (s.path.clone(), 4096))
            .collect();

        let scored = score_files(&skeletons, &categories, &sizes);
        assert_eq!(scored[0].path, "src/core.py");
        assert!(scored[0].score > scored[1].score);
    }

    #[test]
    fn test_ties_break_by_path() {
        let skeletons = vec![
            skeleton("src/zeta.py", &[]),
            skeleton("src/alpha.py", &[]),
        ];
        let categories: BTreeMap<String, FileCategory> = skeletons
            .iter()
            .map(|s| (s.path.clone(), FileCategory::Source))
            .collect();
        let sizes: BTreeMap<String, u64> = skeletons
            .iter()
            .map(|s| (s.path.clone(), 4096))
            .collect();

        let scored = score_files(&skeletons, &categories, &sizes);
        assert_eq!(scored[0].path, "src/alpha.py");
        assert_eq!(scored[1].path, "src/zeta.py");
    }

    #[test]
    fn test_readme_outranks_test_file() {
        let skeletons = vec![
            skeleton("README.md", &[]),
            skeleton("tests/test_app.py", &[]),
        ];
        let mut categories = BTreeMap::new();
        categories.insert("README.md".to_string(), FileCategory::Readme);
        categories.insert("tests/test_app.py".to_string(), FileCategory::Test);
        let sizes: BTreeMap<String, u64> = skeletons
            .iter()
            .map(|s| (s.path.clone(), 2048))
            .collect();

        let scored = score_files(&skeletons, &categories, &sizes);
        assert_eq!(scored[0].path, "README.md");
    }
}
