//! Hygiene: source-level budgets for the browser-side crates.
//!
//! Scans production `.rs` files of `canvas` and the `replica` crate it
//! depends on (both run inside the page, where a panic kills the board).
//! Every pattern has a budget of zero. Test files (`*_test.rs`) are exempt.

use std::fs;
use std::path::{Path, PathBuf};

struct Budget {
    pattern: &'static str,
    max: usize,
    reason: &'static str,
}

const BUDGETS: &[Budget] = &[
    Budget { pattern: ".unwrap()", max: 0, reason: "propagate or fall back instead" },
    Budget { pattern: ".expect(", max: 0, reason: "propagate or fall back instead" },
    Budget { pattern: "panic!(", max: 0, reason: "a panic takes the whole board down" },
    Budget { pattern: "unreachable!(", max: 0, reason: "model the case in the type" },
    Budget { pattern: "todo!(", max: 0, reason: "unfinished stub" },
    Budget { pattern: "unimplemented!(", max: 0, reason: "unfinished stub" },
    Budget { pattern: "let _ =", max: 0, reason: "discarded result; log it or handle it" },
    Budget { pattern: ".ok()", max: 0, reason: "error turned into None without a trace" },
    Budget { pattern: "#[allow(dead_code)]", max: 0, reason: "delete the code instead" },
];

fn roots() -> [PathBuf; 2] {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    [manifest.join("src"), manifest.join("../replica/src")]
}

fn production_files(dir: &Path, out: &mut Vec<(PathBuf, String)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            production_files(&path, out);
            continue;
        }
        let is_rs = path.extension().is_some_and(|e| e == "rs");
        let is_test = path.file_name().is_some_and(|n| n.to_string_lossy().ends_with("_test.rs"));
        if is_rs && !is_test {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push((path, content));
            }
        }
    }
}

/// Lines before the first inline `#[cfg(test)] mod` block.
fn non_test_lines(content: &str) -> impl Iterator<Item = &str> {
    let mut in_tests = false;
    content.lines().filter(move |line| {
        if line.trim_start().starts_with("mod tests") {
            in_tests = true;
        }
        !in_tests
    })
}

#[test]
fn scanned_tree_is_not_empty() {
    let mut files = Vec::new();
    for root in roots() {
        production_files(&root, &mut files);
    }
    assert!(files.len() > 10, "expected both crates to be scanned, found {} files", files.len());
}

#[test]
fn production_code_stays_within_budgets() {
    let mut files = Vec::new();
    for root in roots() {
        production_files(&root, &mut files);
    }

    let mut failures = Vec::new();
    for budget in BUDGETS {
        let hits: Vec<(String, usize)> = files
            .iter()
            .filter_map(|(path, content)| {
                let n = non_test_lines(content).filter(|l| l.contains(budget.pattern)).count();
                (n > 0).then(|| (path.display().to_string(), n))
            })
            .collect();
        let found: usize = hits.iter().map(|(_, n)| n).sum();
        if found > budget.max {
            failures.push(format!(
                "`{}` found {found}, max {} ({})\n{}",
                budget.pattern,
                budget.max,
                budget.reason,
                hits.iter().map(|(p, n)| format!("    {p}: {n}")).collect::<Vec<_>>().join("\n")
            ));
        }
    }
    assert!(failures.is_empty(), "hygiene budgets exceeded:\n{}", failures.join("\n"));
}
