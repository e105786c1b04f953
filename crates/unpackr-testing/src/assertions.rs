//! Assertions over extracted directory trees

use anyhow::Result;
use std::path::Path;
use walkdir::WalkDir;

/// Relative paths of every regular file under `dir`, `/`-separated and sorted
pub fn relative_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(dir)?;
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
    }
    files.sort();
    Ok(files)
}

/// Asserts that `dir` holds exactly `expected` files with the given contents
pub fn assert_tree(dir: &Path, expected: &[(&str, &[u8])]) -> Result<()> {
    let mut expected_names: Vec<String> = expected.iter().map(|(n, _)| n.to_string()).collect();
    expected_names.sort();

    assert_eq!(
        relative_files(dir)?,
        expected_names,
        "Unexpected files under {:?}",
        dir
    );

    for (name, content) in expected {
        let actual = std::fs::read(dir.join(name))?;
        assert_eq!(actual, *content, "Content mismatch for {}", name);
    }

    Ok(())
}

/// Asserts that `dir` contains no entry at all named `name`
pub fn assert_absent(dir: &Path, name: &str) {
    let path = dir.join(name);
    assert!(
        std::fs::symlink_metadata(&path).is_err(),
        "Expected {:?} not to exist",
        path
    );
}
