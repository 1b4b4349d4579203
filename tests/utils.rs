#![allow(dead_code)]

use log::debug;
use preprocess::cli::{Args, RunSummary, Runner};
use preprocess::config::InterpolationContext;
use preprocess::error::Result;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

pub const FIXTURE: &str = "tests/fixtures/android";
pub const FIXTURE_EXPECTED: &str = "tests/fixtures/android_expected";

/// Fixed values so rendered output does not depend on who runs the tests, or when.
pub fn test_context() -> InterpolationContext {
    InterpolationContext::new("tester", 1_700_000_000)
}

/// Copies a fixture tree into a fresh temporary directory.
pub fn copy_fixture(fixture: &str) -> TempDir {
    let tmp_dir = tempfile::tempdir().unwrap();
    for entry in WalkDir::new(fixture).into_iter().filter_map(|e| e.ok()) {
        let rel = entry.path().strip_prefix(fixture).unwrap();
        let target = tmp_dir.path().join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
    tmp_dir
}

/// Runs the preprocessor in `root` with extra command line flags.
pub fn run_in(root: &Path, extra_args: &[&str]) -> Result<RunSummary> {
    let root = root.to_str().unwrap();
    let mut argv = vec!["preprocess", "--root", root];
    argv.extend_from_slice(extra_args);
    let args = <Args as clap::Parser>::parse_from(argv);
    Runner::new(args).with_context(test_context()).run()
}

/// Prints a diff of files and their contents between two directories.
/// Shows files only present in one directory and content differences for files present in both.
pub fn print_dir_diff(dir1: &Path, dir2: &Path) {
    let collect = |dir: &Path| -> std::collections::BTreeSet<_> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
            .collect()
    };
    let files1 = collect(dir1);
    let files2 = collect(dir2);

    println!("\n=== Directory Comparison ===");
    println!("Actual output:   {:?}", dir1);
    println!("Expected output: {:?}", dir2);

    for file in files1.difference(&files2) {
        println!("  + {:?} (only in actual)", file);
    }
    for file in files2.difference(&files1) {
        println!("  - {:?} (only in expected)", file);
    }
    for file in files1.intersection(&files2) {
        let actual = fs::read(dir1.join(file)).unwrap();
        let expected = fs::read(dir2.join(file)).unwrap();
        if actual != expected {
            println!("\n  File: {:?}", file);
            println!("  --- Actual content:\n{}", String::from_utf8_lossy(&actual));
            println!("  --- Expected content:\n{}", String::from_utf8_lossy(&expected));
        }
    }
    println!("=== End of Comparison ===\n");
}

/// Asserts that two directory trees are identical, printing the differences if not.
pub fn assert_same_tree(actual: &Path, expected: &str) {
    match dir_diff::is_different(actual, expected) {
        Ok(true) => {
            print_dir_diff(actual, expected.as_ref());
            panic!("Directories differ. See above for details.");
        }
        Ok(false) => {}
        Err(e) => {
            debug!("Error comparing directories: {e:?}");
            panic!("Cannot compare '{}' with '{expected}'", actual.display());
        }
    }
}
